//! Error types for folio_animation

use thiserror::Error;

/// Errors raised by the frame clock
///
/// A clock that cannot schedule frames leaves nothing to animate, so callers
/// surface these immediately instead of degrading.
#[derive(Error, Debug)]
pub enum ClockError {
    /// The frame driver could not start its loop
    #[error("frame driver failed to start: {0}")]
    DriverStart(String),

    /// The clock behind a handle has been dropped
    #[error("frame clock is no longer alive")]
    Dropped,
}

/// Result type for folio_animation operations
pub type Result<T> = std::result::Result<T, ClockError>;
