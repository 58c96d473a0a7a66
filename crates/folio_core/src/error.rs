//! Error types for folio_core

use thiserror::Error;

/// Errors produced by core primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A selector string could not be parsed
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Result type for folio_core operations
pub type Result<T> = std::result::Result<T, CoreError>;
