//! Input errors raised by the core before any work is done.
//!
//! Every variant is user-correctable: the caller should report it and let
//! the user fix the input. Transport failures live in the application crate.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KpError {
    #[error("at least one search criterion is required")]
    EmptyCriteria,

    #[error("latitude must be between -90 and 90, got {0}")]
    InvalidLatitude(f64),

    #[error("longitude must be between -180 and 180, got {0}")]
    InvalidLongitude(f64),

    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("start date {start} must be before end date {end}")]
    InvalidRange { start: String, end: String },

    #[error("malformed table at line {line}: {reason}")]
    MalformedTable { line: usize, reason: String },
}

impl KpError {
    /// True for errors the user can fix by changing their input.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, KpError::MalformedTable { .. })
    }
}
