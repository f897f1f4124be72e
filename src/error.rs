//! Error types raised while configuring handlers or flattening values.
//!
//! ## Error Categories
//!
//! - **Configuration**: a handler was built in a mode that needs a function it was not given
//! - **Unresolved**: no handler accepted a value and the engine policy is `Fail`
//! - **Duplicate names**: two columns, tables or sibling elements would share an address
//! - **Interpretation**: a JSON number or string could not be read in the declared mode
//! - **Unsupported mode**: a mode name read from configuration text is not recognised
//!
//! Errors travel inside the lazy entry sequence. Entries produced before an error
//! are still valid; the sequence should not be consumed further after one.

use thiserror::Error;

/// Every failure the flattening engine and its handlers can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    /// A handler was configured inconsistently, detected when it was built.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No handler accepted the value and the no-handler policy is `Fail`.
    #[error("Unable to find a handler for '{address}' - {value}")]
    Unresolved { address: String, value: String },

    /// Two children of one composite would be reported under the same name.
    #[error("Duplicate name '{name}' found under '{address}'")]
    DuplicateName { address: String, name: String },

    /// A document value could not be interpreted in the configured mode.
    #[error("Unable to interpret '{address}' as {mode}")]
    Interpretation { address: String, mode: String },

    /// A mode name was not recognised.
    #[error("Unsupported {kind} '{value}'")]
    UnsupportedMode { kind: &'static str, value: String },
}

impl FlattenError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        FlattenError::Configuration(msg.into())
    }

    pub fn duplicate_name(address: &str, name: impl Into<String>) -> Self {
        FlattenError::DuplicateName {
            address: address.to_string(),
            name: name.into(),
        }
    }

    pub fn interpretation(address: &str, mode: impl std::fmt::Display) -> Self {
        FlattenError::Interpretation {
            address: address.to_string(),
            mode: mode.to_string(),
        }
    }

    pub fn unsupported_mode(kind: &'static str, value: &str) -> Self {
        FlattenError::UnsupportedMode {
            kind,
            value: value.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlattenError>;
