//! # patman-policy
//!
//! Pure renewal decisions for a time-bounded credential.
//!
//! Given the current time, the credential's recorded `valid_to`, and the
//! renewal window length, [`classify`] returns exactly one
//! [`RenewalVerdict`]. Both the read and update paths of the lifecycle
//! controller consult it, so they never disagree about whether renewal is due.
//!
//! ```text
//!                 renewal window
//!          |<-- renew_before_days -->|
//! ---------+-------------------------+----------------->
//!   Valid  |     DueForRenewal       |    Expired
//!          valid_to - window         valid_to
//! ```

pub mod error;
pub mod renewal;

pub use error::PolicyError;
pub use renewal::{
    MAX_EXPIRATION_DAYS, RenewalVerdict, classify, parse_valid_to, renewal_threshold,
    validate_window,
};
