//! Renewal window classification.

use crate::error::PolicyError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest token lifetime accepted, in days (100 years).
pub const MAX_EXPIRATION_DAYS: i64 = 36_500;

/// Where a credential stands relative to its expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalVerdict {
    /// Before the renewal window.
    Valid,
    /// Inside `[valid_to - renew_before_days, valid_to)`.
    DueForRenewal,
    /// At or past `valid_to`.
    Expired,
}

impl RenewalVerdict {
    /// Whether the credential must be reissued.
    pub fn needs_reissue(&self) -> bool {
        !matches!(self, RenewalVerdict::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenewalVerdict::Valid => "valid",
            RenewalVerdict::DueForRenewal => "due_for_renewal",
            RenewalVerdict::Expired => "expired",
        }
    }
}

impl fmt::Display for RenewalVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start of the renewal window.
pub fn renewal_threshold(
    valid_to: DateTime<Utc>,
    renew_before_days: i64,
) -> Result<DateTime<Utc>, PolicyError> {
    TimeDelta::try_days(renew_before_days)
        .and_then(|window| valid_to.checked_sub_signed(window))
        .ok_or(PolicyError::OutOfRange {
            days: renew_before_days,
        })
}

/// Classify `valid_to` against `now`.
pub fn classify(
    now: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    renew_before_days: i64,
) -> RenewalVerdict {
    if now >= valid_to {
        RenewalVerdict::Expired
    } else {
        // A window reaching past the earliest representable instant covers all of `now`.
        match renewal_threshold(valid_to, renew_before_days) {
            Ok(threshold) if now < threshold => RenewalVerdict::Valid,
            _ => RenewalVerdict::DueForRenewal,
        }
    }
}

/// Check that the renewal window fits strictly inside the token lifetime.
pub fn validate_window(renew_before_days: i64, expiration_days: i64) -> Result<(), PolicyError> {
    if expiration_days < 1 {
        return Err(PolicyError::NonPositiveExpiration(expiration_days));
    }
    if expiration_days > MAX_EXPIRATION_DAYS {
        return Err(PolicyError::ExpirationTooLong {
            expiration_days,
            max: MAX_EXPIRATION_DAYS,
        });
    }
    if renew_before_days < 0 {
        return Err(PolicyError::NegativeRenewWindow(renew_before_days));
    }
    if renew_before_days >= expiration_days {
        return Err(PolicyError::InvalidWindow {
            renew_before_days,
            expiration_days,
        });
    }
    Ok(())
}

/// Parse a recorded `valid_to` (RFC3339, any offset) into UTC.
pub fn parse_valid_to(value: &str) -> Result<DateTime<Utc>, PolicyError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PolicyError::InvalidValidTo {
            value: value.to_string(),
            reason: e.to_string(),
        })
}
