//! Handlers for structured documents.
//!
//! - [`TreeHandler`]: markup trees through the [`MarkupNode`] capability, with
//!   [`XmlNode`] as the in-memory implementation
//! - [`JsonHandler`]: `serde_json::Value` documents with typed number and string
//!   interpretation

pub mod json;
pub mod markup;
pub mod tree;

pub use json::{ExtractFn, JsonHandler, JsonHandlerBuilder, NumberMode, StringMode};
pub use markup::XmlNode;
pub use tree::{
    DuplicatePolicy, LeafReporting, MarkupNode, NodeNamer, NodeNaming, NodeType, TreeHandler,
    TreeHandlerBuilder,
};
