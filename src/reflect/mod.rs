//! Introspection capabilities the engine uses to look inside values
//!
//! Rust has no runtime reflection, so every value that can be flattened implements
//! [`Reflect`]. The trait answers three questions for the handlers:
//!
//! - **what exact type is this?** via [`Reflect::as_any`], used for leaf-type sets and downcasts
//! - **what kind of value is this?** via [`Reflect::kind`] (null, enum, optional wrapper or plain)
//! - **which views does it offer?** via the `as_*` methods: named members ([`Record`]),
//!   indexed elements ([`List`]), keyed entries ([`Map`]), enumeration ([`Iterable`]) and
//!   rectangular indexing ([`Array`])
//!
//! Standard library, chrono, uuid, num-bigint, indexmap and serde_json types are covered in
//! [`impls`]. Callers opt their own types in with [`reflect_record!`](crate::reflect_record),
//! [`reflect_enum!`](crate::reflect_enum) and [`reflect_value!`](crate::reflect_value).

use std::any::{Any, TypeId};
use std::fmt;

mod impls;
pub mod ndarray;

pub use ndarray::NdArray;

/// A value the flattening engine can inspect.
pub trait Reflect: Any + fmt::Debug {
    /// The value as `Any`, for exact-type checks and downcasts.
    fn as_any(&self) -> &dyn Any;

    /// Name of the concrete type, for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn kind(&self) -> Kind<'_> {
        Kind::Plain
    }

    /// Named members, for records.
    fn as_record(&self) -> Option<&dyn Record> {
        None
    }

    /// Positional access, for ordered indexable collections.
    fn as_list(&self) -> Option<&dyn List> {
        None
    }

    /// Keyed access, for associative containers.
    fn as_map(&self) -> Option<&dyn Map> {
        None
    }

    /// Plain enumeration, for anything that can be iterated.
    fn as_iterable(&self) -> Option<&dyn Iterable> {
        None
    }

    /// Rectangular access with per-dimension bounds.
    fn as_array(&self) -> Option<&dyn Array> {
        None
    }
}

impl dyn Reflect {
    pub fn is<T: Reflect>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// `TypeId` of the concrete value behind the trait object.
    pub fn value_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }
}

/// Coarse classification used by the leaf classifier.
#[derive(Debug, Clone, Copy)]
pub enum Kind<'a> {
    /// An absent value.
    Null,
    /// A value of a closed, enumerated type.
    Enum,
    /// An optional wrapper; `inner_type` is the wrapped type even when empty.
    Optional {
        inner: Option<&'a dyn Reflect>,
        inner_type: TypeId,
    },
    /// Anything else.
    Plain,
}

/// How a member of a record is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// An accessor; visited by default.
    Property,
    /// A data member; visited only when the standard handler includes fields.
    Field,
    /// A member that does not belong to the instance. Never visited.
    Static,
    /// A parameterised accessor. Never visited.
    Indexer,
}

/// One named member of a record. A `None` value means the member cannot be read.
#[derive(Debug, Clone, Copy)]
pub struct Member<'a> {
    pub name: &'a str,
    pub kind: MemberKind,
    pub value: Option<&'a dyn Reflect>,
}

impl<'a> Member<'a> {
    pub fn property(name: &'a str, value: &'a dyn Reflect) -> Self {
        Member {
            name,
            kind: MemberKind::Property,
            value: Some(value),
        }
    }

    pub fn field(name: &'a str, value: &'a dyn Reflect) -> Self {
        Member {
            name,
            kind: MemberKind::Field,
            value: Some(value),
        }
    }

    /// A property that can be set but not read.
    pub fn write_only(name: &'a str) -> Self {
        Member {
            name,
            kind: MemberKind::Property,
            value: None,
        }
    }

    pub fn associated(name: &'a str, value: &'a dyn Reflect) -> Self {
        Member {
            name,
            kind: MemberKind::Static,
            value: Some(value),
        }
    }

    pub fn indexer(name: &'a str) -> Self {
        Member {
            name,
            kind: MemberKind::Indexer,
            value: None,
        }
    }

    /// Whether the member is an instance member whose value can be read.
    pub fn is_readable_instance(&self) -> bool {
        matches!(self.kind, MemberKind::Property | MemberKind::Field) && self.value.is_some()
    }
}

/// Enumerates the named children of a composite, in declaration order.
pub trait Record {
    fn members(&self) -> Vec<Member<'_>>;
}

pub trait List {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&dyn Reflect>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub trait Map {
    /// `TypeId` of the key type, used to match map handlers.
    fn key_type(&self) -> TypeId;

    /// Entries in the container's own iteration order.
    fn entries(&self) -> Box<dyn Iterator<Item = (&dyn Any, &dyn Reflect)> + '_>;
}

pub trait Iterable {
    fn elements(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;
}

/// A fixed-rank array addressed by one index per dimension.
pub trait Array {
    fn rank(&self) -> usize;

    /// Inclusive `(lower, upper)` bounds of a dimension. An empty dimension has
    /// `upper < lower`.
    fn bounds(&self, dimension: usize) -> (isize, isize);

    fn element(&self, indices: &[isize]) -> Option<&dyn Reflect>;
}

/// Implements [`Reflect`] and [`Record`] for a struct by listing its members.
///
/// Members listed in the braces are properties; the optional `fields { .. }` section
/// lists data members, which the standard handler only visits when asked to.
///
/// ```rust
/// use objflat::reflect_record;
///
/// #[derive(Debug)]
/// struct Point { x: i32, y: i32, label: String }
///
/// reflect_record!(Point { x, y } fields { label });
/// ```
#[macro_export]
macro_rules! reflect_record {
    ($ty:ty { $($prop:ident),* $(,)? } $(fields { $($field:ident),* $(,)? })?) => {
        impl $crate::reflect::Reflect for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_record(&self) -> ::std::option::Option<&dyn $crate::reflect::Record> {
                ::std::option::Option::Some(self)
            }
        }

        impl $crate::reflect::Record for $ty {
            fn members(&self) -> ::std::vec::Vec<$crate::reflect::Member<'_>> {
                ::std::vec![
                    $($crate::reflect::Member::property(stringify!($prop), &self.$prop),)*
                    $($($crate::reflect::Member::field(stringify!($field), &self.$field),)*)?
                ]
            }
        }
    };
}

/// Implements [`Reflect`] for closed enumerations, which the standard handler treats as leaves.
#[macro_export]
macro_rules! reflect_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::reflect::Reflect for $ty {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }

                fn kind(&self) -> $crate::reflect::Kind<'_> {
                    $crate::reflect::Kind::Enum
                }
            }
        )+
    };
}

/// Implements [`Reflect`] for opaque values with no views, e.g. custom leaf types.
#[macro_export]
macro_rules! reflect_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::reflect::Reflect for $ty {
                fn as_any(&self) -> &dyn ::std::any::Any {
                    self
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Sample {
        a: i32,
        b: String,
        hidden: bool,
    }

    crate::reflect_record!(Sample { a, b } fields { hidden });

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Colour {
        Red,
    }

    crate::reflect_enum!(Colour);

    #[test]
    fn test_record_macro_lists_members_in_order() {
        let sample = Sample {
            a: 1,
            b: "x".to_string(),
            hidden: true,
        };

        let record = sample.as_record().unwrap();
        let members = record.members();
        let names: Vec<_> = members.iter().map(|m| (m.name, m.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("a", MemberKind::Property),
                ("b", MemberKind::Property),
                ("hidden", MemberKind::Field)
            ]
        );
        assert_eq!(members[0].value.unwrap().downcast_ref::<i32>(), Some(&1));
    }

    #[test]
    fn test_enum_macro_reports_enum_kind() {
        let colour = Colour::Red;
        assert!(matches!(colour.kind(), Kind::Enum));
        let value: &dyn Reflect = &colour;
        assert_eq!(value.downcast_ref::<Colour>(), Some(&Colour::Red));
    }

    #[test]
    fn test_member_readability() {
        let value = 3u8;
        assert!(Member::property("p", &value).is_readable_instance());
        assert!(Member::field("f", &value).is_readable_instance());
        assert!(!Member::write_only("w").is_readable_instance());
        assert!(!Member::associated("s", &value).is_readable_instance());
        assert!(!Member::indexer("Item").is_readable_instance());
    }

    #[test]
    fn test_value_type_id_sees_concrete_type() {
        let value: &dyn Reflect = &5i64;
        assert_eq!(value.value_type_id(), TypeId::of::<i64>());
        assert!(value.is::<i64>());
        assert!(!value.is::<i32>());
    }
}
