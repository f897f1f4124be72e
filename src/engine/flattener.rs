use tracing::{debug, trace};

use super::{empty, failed, single, Entries, Entry, Flatten, Handler};
use crate::error::{FlattenError, Result};
use crate::handlers::{ArrayHandler, ListHandler, MapHandler, StandardHandler};
use crate::reflect::Reflect;

/// What the engine does with a value no handler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoHandlerPolicy {
    /// Report an unresolved-value error in the sequence.
    #[default]
    Fail,
    /// Produce nothing for the value.
    Ignore,
    /// Emit the value itself as a leaf at its address.
    PassThrough,
}

mode_names!(NoHandlerPolicy, "no-handler policy", {
    Fail => "fail",
    Ignore => "ignore",
    PassThrough => "pass-through",
});

/// Dispatches values to the first handler that accepts them.
///
/// Handlers are consulted in insertion order, so specific handlers go before general
/// ones. The engine holds no per-walk state and can be shared between threads.
pub struct Flattener {
    handlers: Vec<Box<dyn Handler>>,
    policy: NoHandlerPolicy,
}

impl Flattener {
    /// An engine with no handlers.
    pub fn new() -> Self {
        Flattener {
            handlers: Vec::new(),
            policy: NoHandlerPolicy::default(),
        }
    }

    /// String-keyed maps, arrays, indexable lists and records with the default leaf set.
    pub fn standard() -> Self {
        Flattener::new()
            .with_handler(MapHandler::<String>::display())
            .with_handler(ArrayHandler)
            .with_handler(ListHandler)
            .with_handler(StandardHandler::default())
    }

    pub fn with_handler(mut self, handler: impl Handler + 'static) -> Self {
        self.push(handler);
        self
    }

    pub fn with_policy(mut self, policy: NoHandlerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Appends a handler after all existing ones.
    pub fn push(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Inserts a handler at `index`, clamped to the end of the list.
    pub fn insert(&mut self, index: usize, handler: impl Handler + 'static) {
        let index = index.min(self.handlers.len());
        self.handlers.insert(index, Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in consultation order.
    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn policy(&self) -> NoHandlerPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: NoHandlerPolicy) {
        self.policy = policy;
    }

    /// Lazily flattens `value` under `prefix`.
    pub fn flatten<'a>(&'a self, prefix: String, value: &'a dyn Reflect) -> Entries<'a> {
        match self.handlers.iter().find(|h| h.can_handle(&prefix, value)) {
            Some(handler) => {
                trace!(address = %prefix, handler = handler.name(), "Dispatching value");
                handler.process(self, prefix, value)
            }
            None => self.unhandled(prefix, value),
        }
    }

    /// Flattens eagerly, stopping at the first error.
    pub fn collect<'a>(&'a self, prefix: &str, value: &'a dyn Reflect) -> Result<Vec<Entry<'a>>> {
        self.flatten(prefix.to_string(), value).collect()
    }

    fn unhandled<'a>(&'a self, prefix: String, value: &'a dyn Reflect) -> Entries<'a> {
        debug!(
            address = %prefix,
            value_type = value.type_name(),
            policy = %self.policy,
            "No handler accepted value"
        );
        match self.policy {
            NoHandlerPolicy::Fail => failed(FlattenError::Unresolved {
                address: prefix,
                value: format!("{:?}", value),
            }),
            NoHandlerPolicy::Ignore => empty(),
            NoHandlerPolicy::PassThrough => single(Entry::borrowed(prefix, value)),
        }
    }
}

impl Default for Flattener {
    fn default() -> Self {
        Flattener::new()
    }
}

impl Flatten for Flattener {
    fn flatten<'a>(&'a self, prefix: String, value: &'a dyn Reflect) -> Entries<'a> {
        Flattener::flatten(self, prefix, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FunctionHandler;

    #[derive(Debug)]
    struct Opaque;

    crate::reflect_value!(Opaque);

    #[test]
    fn test_empty_engine_fails_by_default() {
        let flattener = Flattener::new();
        let results: Vec<_> = flattener.flatten("root".to_string(), &Opaque).collect();
        assert_eq!(results.len(), 1);
        match &results[0] {
            Err(FlattenError::Unresolved { address, value }) => {
                assert_eq!(address, "root");
                assert_eq!(value, "Opaque");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ignore_policy_produces_nothing() {
        let flattener = Flattener::new().with_policy(NoHandlerPolicy::Ignore);
        assert_eq!(flattener.flatten("root".to_string(), &Opaque).count(), 0);
    }

    #[test]
    fn test_pass_through_emits_value_itself() {
        let flattener = Flattener::new().with_policy(NoHandlerPolicy::PassThrough);
        let entries = flattener.collect("root", &Opaque).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, "root");
        assert!(entries[0].value.downcast_ref::<Opaque>().is_some());
    }

    #[test]
    fn test_first_accepting_handler_wins() {
        let mut flattener = Flattener::new().with_handler(FunctionHandler::new(
            |_, _| true,
            |_, prefix, _| single(Entry::owned(prefix, "second")),
        ));
        flattener.insert(
            0,
            FunctionHandler::new(
                |_, value| value.is::<u8>(),
                |_, prefix, _| single(Entry::owned(prefix, "first")),
            ),
        );

        let entries = flattener.collect("x", &1u8).unwrap();
        assert_eq!(entries[0].value.downcast_ref::<&str>(), Some(&"first"));

        let entries = flattener.collect("x", &1u16).unwrap();
        assert_eq!(entries[0].value.downcast_ref::<&str>(), Some(&"second"));
        assert_eq!(flattener.len(), 2);
    }

    #[test]
    fn test_policy_names() {
        assert_eq!("pass-through".parse::<NoHandlerPolicy>().unwrap(), NoHandlerPolicy::PassThrough);
        assert_eq!(NoHandlerPolicy::Ignore.to_string(), "ignore");
        assert!("skip".parse::<NoHandlerPolicy>().is_err());
    }

    #[test]
    fn test_standard_engine_handler_order() {
        let names = Flattener::standard().handler_names();
        assert_eq!(names.len(), 4);
        assert!(names[3].ends_with("StandardHandler"));
    }
}
