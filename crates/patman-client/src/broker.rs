//! Bearer token acquisition.
//!
//! The API client asks its broker for a token exactly once, at construction.

use crate::error::{BrokerError, truncate_body};
use async_trait::async_trait;
use patman_core::AuthConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

/// OAuth2 scope of the Azure DevOps resource.
pub const AZURE_DEVOPS_SCOPE: &str = "499b84ac-1321-427f-aa17-267ca6975798/.default";

/// Supplies the bearer token used against the token administration API.
#[async_trait]
pub trait CredentialBroker: Send + Sync {
    async fn bearer_token(&self) -> Result<SecretString, BrokerError>;
}

/// A broker handing out a token it was given.
pub struct StaticTokenBroker {
    token: SecretString,
}

impl StaticTokenBroker {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }
}

#[async_trait]
impl CredentialBroker for StaticTokenBroker {
    async fn bearer_token(&self) -> Result<SecretString, BrokerError> {
        Ok(self.token.clone())
    }
}

/// OAuth2 client-credentials grant against the Microsoft identity platform.
pub struct ClientCredentialsBroker {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    scope: String,
}

#[derive(Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl ClientCredentialsBroker {
    pub fn new(
        authority: &str,
        tenant_id: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: format!(
                "{}/{}/oauth2/v2.0/token",
                authority.trim_end_matches('/'),
                tenant_id
            ),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            scope: AZURE_DEVOPS_SCOPE.to_string(),
        }
    }

    /// Token endpoint this broker posts to.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl CredentialBroker for ClientCredentialsBroker {
    async fn bearer_token(&self) -> Result<SecretString, BrokerError> {
        debug!(token_url = %self.token_url, client_id = %self.client_id, "Requesting bearer token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("scope", self.scope.as_str()),
        ];
        let response = self.http.post(&self.token_url).form(&form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BrokerError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: TokenEndpointResponse =
            serde_json::from_str(&body).map_err(|e| BrokerError::Deserialize(e.to_string()))?;
        info!(expires_in = ?parsed.expires_in, "Acquired bearer token");
        Ok(SecretString::from(parsed.access_token))
    }
}

/// Pick a broker from configuration.
///
/// Explicit token (inline or env) first, then client credentials.
pub fn broker_from_config(auth: &AuthConfig) -> Result<Box<dyn CredentialBroker>, BrokerError> {
    if let Some(token) = auth.resolve_token() {
        debug!("Using explicitly supplied bearer token");
        return Ok(Box::new(StaticTokenBroker::new(token)));
    }
    if let Some((tenant, client_id, secret)) = auth.resolve_client_credentials() {
        debug!(tenant = %tenant, "Using client-credentials broker");
        return Ok(Box::new(ClientCredentialsBroker::new(
            &auth.authority,
            &tenant,
            client_id,
            secret,
        )));
    }
    Err(BrokerError::NoCredentials)
}
