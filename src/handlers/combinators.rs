use std::sync::Arc;

use crate::engine::{single, Entries, Entry, Flatten, Handler};
use crate::reflect::Reflect;

/// Decides whether a handler applies to a value at an address.
pub type Predicate = Arc<dyn Fn(&str, &dyn Reflect) -> bool + Send + Sync>;

/// Produces the entries for a value, with access to the engine for recursion.
pub type ProcessFn =
    Arc<dyn for<'a> Fn(&'a dyn Flatten, String, &'a dyn Reflect) -> Entries<'a> + Send + Sync>;

/// Scopes another handler with its own predicate.
///
/// The predicate alone decides whether a value is taken; the wrapped handler's
/// `can_handle` is not consulted. Processing is delegated unchanged.
pub struct FilterHandler {
    inner: Box<dyn Handler>,
    predicate: Predicate,
}

impl FilterHandler {
    pub fn new<P>(inner: impl Handler + 'static, predicate: P) -> Self
    where
        P: Fn(&str, &dyn Reflect) -> bool + Send + Sync + 'static,
    {
        FilterHandler {
            inner: Box::new(inner),
            predicate: Arc::new(predicate),
        }
    }

    /// Applies `inner` only to values of exactly type `T`.
    pub fn for_type<T: Reflect>(inner: impl Handler + 'static) -> Self {
        FilterHandler::new(inner, |_, value| value.is::<T>())
    }

    /// Applies `inner` only to values whose address starts with `prefix`.
    pub fn under(inner: impl Handler + 'static, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        FilterHandler::new(inner, move |address, _| address.starts_with(&prefix))
    }
}

impl Handler for FilterHandler {
    fn can_handle(&self, prefix: &str, value: &dyn Reflect) -> bool {
        (self.predicate)(prefix, value)
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        self.inner.process(engine, prefix, value)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// A handler assembled from a predicate and a processing function.
#[derive(Clone)]
pub struct FunctionHandler {
    predicate: Predicate,
    process: ProcessFn,
}

impl FunctionHandler {
    pub fn new<P, F>(predicate: P, process: F) -> Self
    where
        P: Fn(&str, &dyn Reflect) -> bool + Send + Sync + 'static,
        F: for<'a> Fn(&'a dyn Flatten, String, &'a dyn Reflect) -> Entries<'a>
            + Send
            + Sync
            + 'static,
    {
        FunctionHandler {
            predicate: Arc::new(predicate),
            process: Arc::new(process),
        }
    }

    /// Reports every value of exactly type `T` as a leaf, whatever views it offers.
    pub fn leaf<T: Reflect>() -> Self {
        FunctionHandler::new(
            |_, value| value.is::<T>(),
            |_, prefix, value| single(Entry::borrowed(prefix, value)),
        )
    }
}

impl Handler for FunctionHandler {
    fn can_handle(&self, prefix: &str, value: &dyn Reflect) -> bool {
        (self.predicate)(prefix, value)
    }

    fn process<'a>(
        &'a self,
        engine: &'a dyn Flatten,
        prefix: String,
        value: &'a dyn Reflect,
    ) -> Entries<'a> {
        (self.process)(engine, prefix, value)
    }
}
