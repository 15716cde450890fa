//! Desired configuration of a managed PAT.

use serde::{Deserialize, Serialize};

/// Desired state of one managed Personal Access Token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatConfig {
    /// Label shown in the remote service.
    pub display_name: String,

    /// Access scope string (e.g., "app_token", "vso.code vso.build").
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Lifetime requested for each newly issued token, in days.
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,

    /// Size of the renewal window before `valid_to`, in days.
    #[serde(default = "default_renew_before_days")]
    pub renew_before_days: i64,

    /// Whether the token is valid across all organizations. Immutable once issued.
    #[serde(default)]
    pub all_organizations: bool,

    /// Project the token is associated with. Informational only.
    #[serde(default)]
    pub project: String,
}

impl PatConfig {
    /// Create a config with the given display name and default policy.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            scope: default_scope(),
            expiration_days: default_expiration_days(),
            renew_before_days: default_renew_before_days(),
            all_organizations: false,
            project: String::new(),
        }
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_expiration_days(mut self, days: i64) -> Self {
        self.expiration_days = days;
        self
    }

    pub fn with_renew_before_days(mut self, days: i64) -> Self {
        self.renew_before_days = days;
        self
    }

    pub fn with_all_organizations(mut self, all: bool) -> Self {
        self.all_organizations = all;
        self
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }
}

fn default_scope() -> String {
    "app_token".to_string()
}

fn default_expiration_days() -> i64 {
    90
}

fn default_renew_before_days() -> i64 {
    7
}
