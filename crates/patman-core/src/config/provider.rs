//! Remote service and authentication configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Azure DevOps token administration host.
pub const DEFAULT_BASE_URL: &str = "https://vssps.dev.azure.com";

/// Default REST API version for the PAT endpoints.
pub const DEFAULT_API_VERSION: &str = "7.2-preview.1";

/// Connection settings for the token administration API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Organization owning the tokens.
    pub organization: String,

    /// Project name. Informational only.
    #[serde(default)]
    pub project: String,

    /// REST API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Base URL of the token administration service.
    #[serde(default = "default_base_url")]
    pub devops_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Listing attempts before a just-issued token is reported missing.
    #[serde(default = "default_fetch_attempts")]
    pub fetch_attempts: u32,

    /// Delay between listing attempts in seconds.
    #[serde(default = "default_fetch_delay_secs")]
    pub fetch_delay_secs: u64,

    /// How the bearer token for the API is obtained.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ProviderConfig {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            project: String::new(),
            api_version: default_api_version(),
            devops_base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            fetch_attempts: default_fetch_attempts(),
            fetch_delay_secs: default_fetch_delay_secs(),
            auth: AuthConfig::default(),
        }
    }

    /// Root of the organization's REST API, e.g. `https://vssps.dev.azure.com/my-org/_apis`.
    pub fn api_root(&self) -> String {
        let base = self.devops_base_url.trim_end_matches('/');
        format!("{}/{}/_apis", base, self.organization)
    }
}

/// Bearer token acquisition settings.
///
/// Resolution order: explicit `token`, then the `token_env` variable, then an
/// OAuth2 client-credentials grant using `client_id` / `client_secret` /
/// `tenant_id` (each falling back to the standard `AZURE_*` variables).
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Explicit bearer token.
    #[serde(default)]
    pub token: Option<String>,

    /// Environment variable holding a bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: Option<String>,

    /// Service principal client id (falls back to `AZURE_CLIENT_ID`).
    #[serde(default)]
    pub client_id: Option<String>,

    /// Service principal secret (falls back to `AZURE_CLIENT_SECRET`).
    #[serde(default)]
    pub client_secret: Option<String>,

    /// Directory tenant (falls back to `AZURE_TENANT_ID`).
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Identity platform authority.
    #[serde(default = "default_authority")]
    pub authority: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_env: default_token_env(),
            client_id: None,
            client_secret: None,
            tenant_id: None,
            authority: default_authority(),
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_env", &self.token_env)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "[REDACTED]"))
            .field("tenant_id", &self.tenant_id)
            .field("authority", &self.authority)
            .finish()
    }
}

impl AuthConfig {
    /// Resolve an explicitly supplied bearer token (inline or via `token_env`).
    pub fn resolve_token(&self) -> Option<String> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Some(token.clone());
        }
        self.token_env.as_deref().and_then(non_empty_env)
    }

    /// Resolve `(tenant_id, client_id, client_secret)` for a client-credentials grant.
    pub fn resolve_client_credentials(&self) -> Option<(String, String, String)> {
        let tenant = self
            .tenant_id
            .clone()
            .or_else(|| non_empty_env("AZURE_TENANT_ID"))?;
        let client_id = self
            .client_id
            .clone()
            .or_else(|| non_empty_env("AZURE_CLIENT_ID"))?;
        let secret = self
            .client_secret
            .clone()
            .or_else(|| non_empty_env("AZURE_CLIENT_SECRET"))?;
        Some((tenant, client_id, secret))
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_fetch_attempts() -> u32 {
    3
}

fn default_fetch_delay_secs() -> u64 {
    2
}

fn default_token_env() -> Option<String> {
    Some("AZURE_DEVOPS_TOKEN".to_string())
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}
