//! General-purpose handlers.
//!
//! - [`StandardHandler`]: leaf classification and named-member decomposition of records
//! - [`ListHandler`], [`MapHandler`], [`IterableHandler`]: collections
//! - [`ArrayHandler`]: rectangular arrays of any rank
//! - [`FilterHandler`], [`FunctionHandler`]: composition from caller-supplied functions

mod array;
mod collections;
mod combinators;
mod standard;

pub use array::{ArrayHandler, Odometer};
pub use collections::{IterableHandler, KeyFormatter, ListHandler, MapHandler};
pub use combinators::{FilterHandler, FunctionHandler, Predicate, ProcessFn};
pub use standard::{LeafTypes, StandardHandler};
