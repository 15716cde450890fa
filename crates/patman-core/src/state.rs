//! Persisted resource state.
//!
//! [`ResourceState`] is what the host keeps between invocations: the identity
//! of the live token, its secret, its expiry, and the configuration values
//! that were last applied. Comparing those applied values against a fresh
//! [`PatConfig`] is how field changes are detected.

use crate::config::PatConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A configurable attribute of a managed PAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatField {
    DisplayName,
    Scope,
    ExpirationDays,
    RenewBeforeDays,
    AllOrganizations,
    Project,
}

impl PatField {
    pub const ALL: [PatField; 6] = [
        PatField::DisplayName,
        PatField::Scope,
        PatField::ExpirationDays,
        PatField::RenewBeforeDays,
        PatField::AllOrganizations,
        PatField::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatField::DisplayName => "display_name",
            PatField::Scope => "scope",
            PatField::ExpirationDays => "expiration_days",
            PatField::RenewBeforeDays => "renew_before_days",
            PatField::AllOrganizations => "all_organizations",
            PatField::Project => "project",
        }
    }

    /// Whether a change to this field can only be applied by reissuing the token.
    pub fn is_immutable(&self) -> bool {
        matches!(self, PatField::AllOrganizations)
    }

    /// Whether a change to this field is pushed to the remote service in place.
    pub fn is_rotatable(&self) -> bool {
        matches!(
            self,
            PatField::DisplayName | PatField::Scope | PatField::ExpirationDays
        )
    }
}

impl fmt::Display for PatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted state of one managed PAT.
///
/// An empty `id` means the resource does not exist.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource identity; equal to `authorization_id` while the token is live.
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub authorization_id: String,

    /// Token secret, present only from issuance (or rotation) onward.
    #[serde(default, with = "secret_string", skip_serializing_if = "Option::is_none")]
    pub token: Option<SecretString>,

    /// Expiry as reported by the remote service (RFC3339).
    #[serde(default)]
    pub valid_to: Option<String>,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub scope: String,

    #[serde(default)]
    pub expiration_days: i64,

    #[serde(default)]
    pub renew_before_days: i64,

    #[serde(default)]
    pub all_organizations: bool,

    #[serde(default)]
    pub project: String,
}

impl fmt::Debug for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceState")
            .field("id", &self.id)
            .field("authorization_id", &self.authorization_id)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("valid_to", &self.valid_to)
            .field("display_name", &self.display_name)
            .field("scope", &self.scope)
            .field("expiration_days", &self.expiration_days)
            .field("renew_before_days", &self.renew_before_days)
            .field("all_organizations", &self.all_organizations)
            .field("project", &self.project)
            .finish()
    }
}

impl ResourceState {
    /// Whether the resource currently has no live identity.
    pub fn is_absent(&self) -> bool {
        self.id.is_empty()
    }

    /// Set the resource identity (and the mirrored authorization id).
    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.authorization_id = id.clone();
        self.id = id;
    }

    /// Drop the identity, secret, and expiry. The host will treat the
    /// resource as gone and recreate it from scratch.
    pub fn clear_identity(&mut self) {
        self.id.clear();
        self.authorization_id.clear();
        self.token = None;
        self.valid_to = None;
    }

    /// Record `desired` as the configuration that is now applied.
    pub fn record_config(&mut self, desired: &PatConfig) {
        self.display_name = desired.display_name.clone();
        self.scope = desired.scope.clone();
        self.expiration_days = desired.expiration_days;
        self.renew_before_days = desired.renew_before_days;
        self.all_organizations = desired.all_organizations;
        self.project = desired.project.clone();
    }

    /// The configuration as last applied.
    pub fn applied_config(&self) -> PatConfig {
        PatConfig {
            display_name: self.display_name.clone(),
            scope: self.scope.clone(),
            expiration_days: self.expiration_days,
            renew_before_days: self.renew_before_days,
            all_organizations: self.all_organizations,
            project: self.project.clone(),
        }
    }

    /// Whether `field` differs between the applied state and `desired`.
    pub fn has_change(&self, desired: &PatConfig, field: PatField) -> bool {
        match field {
            PatField::DisplayName => self.display_name != desired.display_name,
            PatField::Scope => self.scope != desired.scope,
            PatField::ExpirationDays => self.expiration_days != desired.expiration_days,
            PatField::RenewBeforeDays => self.renew_before_days != desired.renew_before_days,
            PatField::AllOrganizations => self.all_organizations != desired.all_organizations,
            PatField::Project => self.project != desired.project,
        }
    }

    /// All fields that differ from `desired`.
    pub fn changed_fields(&self, desired: &PatConfig) -> Vec<PatField> {
        PatField::ALL
            .into_iter()
            .filter(|field| self.has_change(desired, *field))
            .collect()
    }

    /// Expose the stored secret, if any.
    pub fn token_secret(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.expose_secret())
    }
}

/// The state file is the host's persistence for the secret, so it is
/// written in the clear there and nowhere else.
mod secret_string {
    use secrecy::{ExposeSecret, SecretString};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<SecretString>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(secret) => serializer.serialize_some(secret.expose_secret()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()).map(SecretString::from))
    }
}
