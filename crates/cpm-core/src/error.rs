//! # Error Types
//!
//! Value-level validation failures. Domain crates define their own
//! transition errors and wrap [`ValidationError`] where they need it.

use thiserror::Error;

/// Rejection of a malformed domain value at construction time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A monetary amount could not be parsed.
    #[error("invalid amount {0:?}: expected digits with at most two decimal places")]
    InvalidAmount(String),

    /// A monetary amount does not fit in 64-bit cents.
    #[error("amount {0:?} overflows the representable range")]
    AmountOverflow(String),

    /// A percentage could not be parsed or is out of range.
    #[error("invalid percentage {0:?}")]
    InvalidPercentage(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier {0:?}")]
    InvalidIdentifier(String),

    /// A timestamp is not RFC 3339 UTC.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A required text field is empty.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}
