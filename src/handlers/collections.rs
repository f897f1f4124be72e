use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::address;
use crate::engine::{empty, Entries, Flatten, Handler};
use crate::reflect::Reflect;

/// Flattens indexable collections as `prefix[i]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListHandler;

impl Handler for ListHandler {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.as_list().is_some()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(list) = value.as_list() else {
            return empty();
        };
        Box::new(
            (0..list.len())
                .filter_map(move |i| list.get(i).map(|item| (i, item)))
                .flat_map(move |(i, item)| engine.flatten(address::index(&prefix, i), item)),
        )
    }
}

/// Renders a map key as an address fragment.
pub type KeyFormatter<K> = Arc<dyn Fn(&K) -> String + Send + Sync>;

/// Flattens maps keyed by `K` as `prefix.key`, in the map's own iteration order.
pub struct MapHandler<K> {
    key_formatter: KeyFormatter<K>,
}

impl<K: Any> MapHandler<K> {
    pub fn new(key_formatter: impl Fn(&K) -> String + Send + Sync + 'static) -> Self {
        MapHandler {
            key_formatter: Arc::new(key_formatter),
        }
    }

    pub fn format_key(&self, key: &K) -> String {
        (self.key_formatter)(key)
    }
}

impl<K: Any + fmt::Display> MapHandler<K> {
    /// Uses the key's `Display` form.
    pub fn display() -> Self {
        MapHandler::new(|key: &K| key.to_string())
    }
}

impl<K> Clone for MapHandler<K> {
    fn clone(&self) -> Self {
        MapHandler {
            key_formatter: Arc::clone(&self.key_formatter),
        }
    }
}

impl<K: Any> Handler for MapHandler<K> {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value
            .as_map()
            .map_or(false, |map| map.key_type() == TypeId::of::<K>())
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(map) = value.as_map() else {
            return empty();
        };
        Box::new(map.entries().flat_map(move |(key, item)| {
            match key.downcast_ref::<K>() {
                Some(key) => engine.flatten(address::member(&prefix, &self.format_key(key)), item),
                None => empty(),
            }
        }))
    }
}

/// Flattens anything enumerable as `prefix[i]`, numbering elements in enumeration order.
///
/// Strings are enumerable too, so this handler should sit after whatever classifies
/// them as leaves, or behind a [`FilterHandler`](super::FilterHandler).
#[derive(Debug, Clone, Copy, Default)]
pub struct IterableHandler;

impl Handler for IterableHandler {
    fn can_handle(&self, _prefix: &str, value: &dyn Reflect) -> bool {
        value.as_iterable().is_some()
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        let Some(iterable) = value.as_iterable() else {
            return empty();
        };
        Box::new(
            iterable
                .elements()
                .enumerate()
                .flat_map(move |(i, item)| engine.flatten(address::index(&prefix, i), item)),
        )
    }
}
