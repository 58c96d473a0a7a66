//! Error types for folio_theme

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or saving preferences
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("failed to access preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse preferences at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown {key} `{value}`")]
    Unknown { key: &'static str, value: String },

    #[error("preference store lock poisoned")]
    Poisoned,
}

/// Result type for folio_theme operations
pub type Result<T> = std::result::Result<T, PreferenceError>;
