//! Error types for renewal policy checks.

use thiserror::Error;

/// Configuration problems detected before any renewal decision is made.
///
/// These are never corrected automatically: a window that is as long as the
/// token lifetime would put every freshly issued token straight back into
/// its renewal window.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// `renew_before_days` must be strictly smaller than `expiration_days`.
    #[error(
        "invalid configuration: `expiration_days` ({expiration_days}) must be greater than `renew_before_days` ({renew_before_days}) to prevent a renewal loop"
    )]
    InvalidWindow {
        renew_before_days: i64,
        expiration_days: i64,
    },

    /// `expiration_days` must be positive.
    #[error("invalid configuration: `expiration_days` ({0}) must be at least 1")]
    NonPositiveExpiration(i64),

    /// `expiration_days` is longer than any token the service issues.
    #[error("invalid configuration: `expiration_days` ({expiration_days}) must be at most {max}")]
    ExpirationTooLong { expiration_days: i64, max: i64 },

    /// A day offset does not fit in the representable date range.
    #[error("offset of {days} days is out of the representable date range")]
    OutOfRange { days: i64 },

    /// `renew_before_days` must not be negative.
    #[error("invalid configuration: `renew_before_days` ({0}) must not be negative")]
    NegativeRenewWindow(i64),

    /// The recorded expiry could not be parsed as RFC3339.
    #[error("failed to parse valid_to date '{value}': {reason}")]
    InvalidValidTo { value: String, reason: String },
}
