//! Error types for folio_scroll

use folio_animation::ClockError;
use thiserror::Error;

/// Errors raised while mounting the animation coordinator
#[derive(Error, Debug)]
pub enum CoordinatorError {
    /// The frame clock could not schedule frames
    #[error(transparent)]
    Clock(#[from] ClockError),

    /// A trigger position string could not be parsed
    #[error("invalid trigger position `{position}`: {reason}")]
    InvalidPosition { position: String, reason: String },

    /// Configuration is self-contradictory
    #[error("invalid coordinator config: {0}")]
    InvalidConfig(String),
}

/// Result type for folio_scroll operations
pub type Result<T> = std::result::Result<T, CoordinatorError>;
