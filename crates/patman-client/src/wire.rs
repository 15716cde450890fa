//! JSON shapes of the token administration API.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use patman_core::PatConfig;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A PAT as reported by the service.
///
/// `token` is only present in issue (and sometimes rotate) responses; the
/// listing endpoint never returns it.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatToken {
    #[serde(default)]
    pub authorization_id: String,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub scope: String,

    #[serde(default)]
    pub valid_from: Option<String>,

    #[serde(default)]
    pub valid_to: Option<String>,

    #[serde(default)]
    pub target_accounts: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_secret")]
    pub token: Option<SecretString>,
}

impl fmt::Debug for PatToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatToken")
            .field("authorization_id", &self.authorization_id)
            .field("display_name", &self.display_name)
            .field("scope", &self.scope)
            .field("valid_from", &self.valid_from)
            .field("valid_to", &self.valid_to)
            .field("target_accounts", &self.target_accounts)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()).map(SecretString::from))
}

/// Parameters of an issue or rotate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatRequest {
    pub display_name: String,
    pub scope: String,
    pub expiration_days: i64,
    pub all_organizations: bool,
}

impl PatRequest {
    /// Expiry to request when sending at `now`. `None` when it falls
    /// outside the representable date range.
    pub fn valid_to(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        TimeDelta::try_days(self.expiration_days).and_then(|lifetime| now.checked_add_signed(lifetime))
    }
}

impl From<&PatConfig> for PatRequest {
    fn from(config: &PatConfig) -> Self {
        Self {
            display_name: config.display_name.clone(),
            scope: config.scope.clone(),
            expiration_days: config.expiration_days,
            all_organizations: config.all_organizations,
        }
    }
}

/// Body of POST (issue) and PUT (rotate).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatRequestBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_id: Option<&'a str>,
    pub display_name: &'a str,
    pub scope: &'a str,
    pub valid_to: String,
    pub all_orgs: bool,
}

impl<'a> PatRequestBody<'a> {
    pub fn new(
        request: &'a PatRequest,
        authorization_id: Option<&'a str>,
        now: DateTime<Utc>,
    ) -> Option<Self> {
        let valid_to = request.valid_to(now)?;
        Some(Self {
            authorization_id,
            display_name: &request.display_name,
            scope: &request.scope,
            valid_to: valid_to.to_rfc3339_opts(SecondsFormat::Secs, true),
            all_orgs: request.all_organizations,
        })
    }
}

/// Response of POST and PUT.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PatTokenResult {
    #[serde(default)]
    pub pat_token: Option<PatToken>,

    #[serde(default)]
    pub pat_token_error: Option<String>,
}

impl PatTokenResult {
    /// The service reports success as `"none"`.
    pub fn error(&self) -> Option<&str> {
        self.pat_token_error
            .as_deref()
            .filter(|e| !e.is_empty() && !e.eq_ignore_ascii_case("none"))
    }
}

/// One page of GET.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PagedPatTokens {
    #[serde(default)]
    pub continuation_token: Option<String>,

    #[serde(default)]
    pub pat_tokens: Vec<PatToken>,
}

impl PagedPatTokens {
    pub fn next_page(&self) -> Option<&str> {
        self.continuation_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}
