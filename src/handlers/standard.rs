use std::any::TypeId;
use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num_bigint::{BigInt, BigUint};
use uuid::Uuid;

use crate::address;
use crate::engine::{empty, single, Entries, Entry, Flatten, Handler};
use crate::reflect::{Kind, Member, MemberKind, Reflect};
use crate::values::Decimal;

/// Exact types that are always reported as leaves.
///
/// Membership is by exact type; wrappers such as `Option<T>` are not members even when
/// `T` is.
#[derive(Debug, Clone)]
pub struct LeafTypes {
    types: HashMap<TypeId, &'static str>,
}

impl LeafTypes {
    pub fn empty() -> Self {
        LeafTypes {
            types: HashMap::new(),
        }
    }

    pub fn insert<T: Reflect>(&mut self) -> &mut Self {
        self.types
            .insert(TypeId::of::<T>(), std::any::type_name::<T>());
        self
    }

    /// Builder form of [`LeafTypes::insert`].
    pub fn with<T: Reflect>(mut self) -> Self {
        self.insert::<T>();
        self
    }

    pub fn remove<T: Reflect>(&mut self) -> bool {
        self.types.remove(&TypeId::of::<T>()).is_some()
    }

    pub fn contains<T: Reflect>(&self) -> bool {
        self.contains_type(TypeId::of::<T>())
    }

    pub fn contains_type(&self, type_id: TypeId) -> bool {
        self.types.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Sorted type names, for diagnostics.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.types.values().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for LeafTypes {
    /// Text, characters, booleans, every primitive number, the exact decimal and big
    /// integers, calendar and clock types, durations, UUIDs and byte buffers.
    fn default() -> Self {
        LeafTypes::empty()
            .with::<String>()
            .with::<&'static str>()
            .with::<char>()
            .with::<bool>()
            .with::<i8>()
            .with::<i16>()
            .with::<i32>()
            .with::<i64>()
            .with::<i128>()
            .with::<isize>()
            .with::<u8>()
            .with::<u16>()
            .with::<u32>()
            .with::<u64>()
            .with::<u128>()
            .with::<usize>()
            .with::<f32>()
            .with::<f64>()
            .with::<Decimal>()
            .with::<BigInt>()
            .with::<BigUint>()
            .with::<NaiveDate>()
            .with::<NaiveTime>()
            .with::<NaiveDateTime>()
            .with::<DateTime<Utc>>()
            .with::<DateTime<FixedOffset>>()
            .with::<DateTime<Local>>()
            .with::<chrono::Duration>()
            .with::<std::time::Duration>()
            .with::<Uuid>()
            .with::<Vec<u8>>()
    }
}

/// Fallback handler for arbitrary values: classifies leaves and decomposes records into
/// their named members.
///
/// Accepts every value, so it belongs at the end of the handler list.
#[derive(Debug, Clone)]
pub struct StandardHandler {
    pub leaf_types: LeafTypes,
    /// Report enumeration values as leaves.
    pub enums_as_leaf: bool,
    /// Report optional wrappers of leaf types as leaves (null when empty).
    pub optionals_as_leaf: bool,
    /// Report arrays whole instead of leaving them to an array handler.
    pub arrays_as_leaf: bool,
    pub include_properties: bool,
    pub include_fields: bool,
}

impl Default for StandardHandler {
    fn default() -> Self {
        StandardHandler {
            leaf_types: LeafTypes::default(),
            enums_as_leaf: true,
            optionals_as_leaf: true,
            arrays_as_leaf: true,
            include_properties: true,
            include_fields: false,
        }
    }
}

impl StandardHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_leaf_types(mut self, leaf_types: LeafTypes) -> Self {
        self.leaf_types = leaf_types;
        self
    }

    /// Adds `T` to the leaf set.
    pub fn with_leaf<T: Reflect>(mut self) -> Self {
        self.leaf_types.insert::<T>();
        self
    }

    pub fn with_enums_as_leaf(mut self, enabled: bool) -> Self {
        self.enums_as_leaf = enabled;
        self
    }

    pub fn with_optionals_as_leaf(mut self, enabled: bool) -> Self {
        self.optionals_as_leaf = enabled;
        self
    }

    pub fn with_arrays_as_leaf(mut self, enabled: bool) -> Self {
        self.arrays_as_leaf = enabled;
        self
    }

    pub fn with_properties(mut self, enabled: bool) -> Self {
        self.include_properties = enabled;
        self
    }

    pub fn with_fields(mut self, enabled: bool) -> Self {
        self.include_fields = enabled;
        self
    }

    pub fn is_leaf(&self, value: &dyn Reflect) -> bool {
        if self.leaf_types.contains_type(value.value_type_id()) {
            return true;
        }
        if self.enums_as_leaf && matches!(value.kind(), Kind::Enum) {
            return true;
        }
        self.arrays_as_leaf && value.as_array().is_some()
    }

    fn selects(&self, member: &Member<'_>) -> bool {
        match member.kind {
            MemberKind::Property => self.include_properties,
            MemberKind::Field => self.include_fields,
            MemberKind::Static | MemberKind::Indexer => false,
        }
    }

    fn decompose<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(record) = value.as_record() else {
            return empty();
        };
        let members = record.members();

        // Properties first, then fields, each in declaration order.
        let selected: Vec<(&'a str, &'a dyn Reflect)> = [MemberKind::Property, MemberKind::Field]
            .into_iter()
            .flat_map(|kind| members.iter().filter(move |m| m.kind == kind))
            .filter(|m| self.selects(m))
            .filter_map(|m| m.value.map(|v| (m.name, v)))
            .collect();

        Box::new(
            selected
                .into_iter()
                .flat_map(move |(name, child)| engine.flatten(address::member(&prefix, name), child)),
        )
    }
}

impl Handler for StandardHandler {
    fn can_handle(&self, _prefix: &str, _value: &dyn Reflect) -> bool {
        true
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let kind = value.kind();

        if let Kind::Null = kind {
            return single(Entry::null(prefix));
        }

        if self.is_leaf(value) {
            return single(Entry::borrowed(prefix, value));
        }

        if let Kind::Optional { inner, inner_type } = kind {
            if self.optionals_as_leaf && self.leaf_types.contains_type(inner_type) {
                return single(match inner {
                    Some(inner) => Entry::borrowed(prefix, inner),
                    None => Entry::null(prefix),
                });
            }
            return match inner {
                Some(inner) => engine.flatten(prefix, inner),
                None => single(Entry::null(prefix)),
            };
        }

        self.decompose(engine, prefix, value)
    }
}
