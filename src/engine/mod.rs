//! The flattening engine: entries, the handler contract and the dispatcher.
//!
//! A [`Flattener`] owns an ordered list of [`Handler`]s. Flattening a value asks each
//! handler in turn whether it accepts the value at its address; the first one that does
//! produces the entries for it, usually by handing children back to the engine through
//! the [`Flatten`] trait. Output is a lazy sequence of `Result<Entry>`: nothing is
//! visited until the caller pulls from it.

use std::fmt;

use crate::error::{FlattenError, Result};
use crate::reflect::Reflect;

mod flattener;

pub use flattener::{Flattener, NoHandlerPolicy};

/// The value half of an entry.
pub enum Leaf<'a> {
    Null,
    /// A value borrowed from the input graph.
    Ref(&'a dyn Reflect),
    /// A value produced while flattening, e.g. an interpreted document string.
    Owned(Box<dyn Reflect>),
}

impl<'a> Leaf<'a> {
    pub fn owned<T: Reflect>(value: T) -> Self {
        Leaf::Owned(Box::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Leaf::Null)
    }

    pub fn get(&self) -> Option<&dyn Reflect> {
        match self {
            Leaf::Null => None,
            Leaf::Ref(value) => Some(*value),
            Leaf::Owned(value) => Some(value.as_ref()),
        }
    }

    pub fn downcast_ref<T: Reflect>(&self) -> Option<&T> {
        self.get().and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for Leaf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            None => f.write_str("null"),
            Some(value) => fmt::Debug::fmt(value, f),
        }
    }
}

/// One `(address, value)` pair of the flattened output.
#[derive(Debug)]
pub struct Entry<'a> {
    pub address: String,
    pub value: Leaf<'a>,
}

impl<'a> Entry<'a> {
    pub fn new(address: String, value: Leaf<'a>) -> Self {
        Entry { address, value }
    }

    pub fn null(address: String) -> Self {
        Entry::new(address, Leaf::Null)
    }

    pub fn borrowed(address: String, value: &'a dyn Reflect) -> Self {
        Entry::new(address, Leaf::Ref(value))
    }

    pub fn owned<T: Reflect>(address: String, value: T) -> Self {
        Entry::new(address, Leaf::owned(value))
    }
}

/// A lazy sequence of entries. An `Err` item ends the useful part of the sequence.
pub type Entries<'a> = Box<dyn Iterator<Item = Result<Entry<'a>>> + 'a>;

pub fn empty<'a>() -> Entries<'a> {
    Box::new(std::iter::empty())
}

pub fn single<'a>(entry: Entry<'a>) -> Entries<'a> {
    Box::new(std::iter::once(Ok(entry)))
}

pub fn failed<'a>(error: FlattenError) -> Entries<'a> {
    Box::new(std::iter::once(Err(error)))
}

/// Recursive access to the engine, handed to handlers so they can flatten children.
pub trait Flatten {
    fn flatten<'a>(&'a self, prefix: String, value: &'a dyn Reflect) -> Entries<'a>;
}

/// A strategy for flattening one family of values.
///
/// `can_handle` must be side-effect free. `process` is only called after `can_handle`
/// returned `true` for the same address and value.
pub trait Handler: Send + Sync {
    fn can_handle(&self, prefix: &str, value: &dyn Reflect) -> bool;

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a>;

    /// Name used in diagnostics.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_accessors() {
        let value = 4u16;
        let borrowed = Leaf::Ref(&value);
        assert_eq!(borrowed.downcast_ref::<u16>(), Some(&4));
        assert!(!borrowed.is_null());

        let owned = Leaf::owned("text".to_string());
        assert_eq!(owned.downcast_ref::<String>().map(String::as_str), Some("text"));
        assert!(owned.downcast_ref::<u16>().is_none());

        assert!(Leaf::Null.is_null());
        assert!(Leaf::Null.get().is_none());
    }

    #[test]
    fn test_leaf_debug_shows_value() {
        assert_eq!(format!("{:?}", Leaf::Null), "null");
        assert_eq!(format!("{:?}", Leaf::owned(12i32)), "12");
    }

    #[test]
    fn test_sequence_helpers() {
        assert_eq!(empty().count(), 0);
        let entries: Vec<_> = single(Entry::null("a".to_string())).collect();
        assert_eq!(entries.len(), 1);
        assert!(failed(FlattenError::configuration("x")).next().unwrap().is_err());
    }
}
