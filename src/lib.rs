//! # objflat - Object Graph Flattening
//!
//! Walks an arbitrary value graph and turns it into a lazy sequence of
//! `(address, leaf value)` entries, where the address is a path expression such as
//! `order.lines[2].product.name`.
//!
//! ## Modules
//!
//! - **engine**: the dispatcher that selects the first handler accepting a value
//! - **handlers**: the standard record handler, collection and array handlers, combinators
//! - **document**: markup trees (XML-style) and JSON documents
//! - **tabular**: rows, tables, filtered views and table sets
//! - **reflect**: the introspection traits values implement to be flattened
//! - **config**: serde-loadable settings that assemble a configured engine
//!
//! ## Quick Start
//!
//! ```rust
//! use objflat::{reflect_record, Flattener};
//!
//! #[derive(Debug)]
//! struct Address { city: String, zip: Option<u32> }
//!
//! #[derive(Debug)]
//! struct Person { name: String, address: Address, tags: Vec<String> }
//!
//! reflect_record!(Address { city, zip });
//! reflect_record!(Person { name, address, tags });
//!
//! # fn main() -> objflat::Result<()> {
//! let person = Person {
//!     name: "Ada".to_string(),
//!     address: Address { city: "London".to_string(), zip: None },
//!     tags: vec!["math".to_string()],
//! };
//!
//! let flattener = Flattener::standard();
//! let entries = flattener.collect("person", &person)?;
//!
//! let addresses: Vec<&str> = entries.iter().map(|e| e.address.as_str()).collect();
//! assert_eq!(
//!     addresses,
//!     vec!["person.name", "person.address.city", "person.address.zip", "person.tags[0]"]
//! );
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result as AnyResult};
use serde_json::Value;
use std::io::{BufRead, Write};

/// Display, `FromStr` and serde support for a fieldless mode enum, driven by one name table.
macro_rules! mode_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::error::FlattenError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($name => Ok($ty::$variant),)+
                    other => Err($crate::error::FlattenError::unsupported_mode($kind, other)),
                }
            }
        }

        impl ::serde::Serialize for $ty {
            fn serialize<S: ::serde::Serializer>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $ty {
            fn deserialize<D: ::serde::Deserializer<'de>>(deserializer: D) -> ::std::result::Result<Self, D::Error> {
                let name = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                name.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub mod address;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod reflect;
pub mod tabular;
pub mod values;
pub mod writer;

// Re-export commonly used types for convenience
pub use config::FlattenConfig;
pub use engine::{Entries, Entry, Flatten, Flattener, Handler, Leaf, NoHandlerPolicy};
pub use error::{FlattenError, Result};
pub use handlers::{
    ArrayHandler, FilterHandler, FunctionHandler, IterableHandler, LeafTypes, ListHandler,
    MapHandler, StandardHandler,
};
pub use reflect::{Kind, Member, MemberKind, NdArray, Reflect};
pub use values::Decimal;
pub use writer::{EntryWriter, OutputFormat};

/// Main entry point: flatten a stream of newline-delimited JSON documents
///
/// Every document is flattened under `prefix` and its entries written as they are
/// produced. Returns the number of entries written.
pub fn flatten_json<R: BufRead, W: Write>(
    reader: R,
    writer: &mut EntryWriter<W>,
    flattener: &Flattener,
    prefix: &str,
) -> AnyResult<usize> {
    let mut written = 0;

    for (number, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse JSON on line {}", number + 1))?;

        written += writer.write_entries(flattener.flatten(prefix.to_string(), &value))?;
    }

    writer.flush()?;
    Ok(written)
}
