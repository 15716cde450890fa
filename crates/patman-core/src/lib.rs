//! # patman-core
//!
//! Shared types for the patman Personal Access Token lifecycle manager.
//!
//! This crate provides:
//! - The desired-state configuration of a managed PAT ([`PatConfig`])
//! - The persisted resource state and change detection ([`ResourceState`], [`PatField`])
//! - Provider configuration loaded from YAML ([`PatmanConfig`], [`ProviderConfig`])
//! - A [`Clock`] abstraction so renewal decisions can be driven from a fixed instant
//!
//! ## Resource model
//!
//! | Field | Kind | Notes |
//! |-------|------|-------|
//! | `display_name` | mutable | changed in place (rotate) |
//! | `scope` | mutable | changed in place (rotate) |
//! | `expiration_days` | mutable | changed in place (rotate) |
//! | `renew_before_days` | policy only | never sent to the remote service |
//! | `all_organizations` | immutable | change forces revoke + reissue |
//! | `project` | informational | never sent to the remote service |

pub mod clock;
pub mod config;
pub mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{
    AuthConfig, ConfigError, PatConfig, PatmanConfig, ProviderConfig, DEFAULT_API_VERSION,
    DEFAULT_BASE_URL,
};
pub use state::{PatField, ResourceState};
