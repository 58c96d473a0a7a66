//! Error types for folio_content

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a content bundle
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for folio_content operations
pub type Result<T> = std::result::Result<T, ContentError>;
