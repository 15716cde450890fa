//! HTTP implementation of [`RemoteCredentialApi`].

use crate::api::RemoteCredentialApi;
use crate::broker::CredentialBroker;
use crate::error::{ClientError, RemoteCall, truncate_body};
use crate::wire::{PagedPatTokens, PatRequest, PatRequestBody, PatToken, PatTokenResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use patman_core::{Clock, ProviderConfig, SystemClock};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Upper bound on listing pages followed within one fetch attempt.
pub const MAX_LIST_PAGES: usize = 100;

/// How `fetch` re-polls the listing when a token is not visible yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total listing attempts (at least one is always made).
    pub attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            attempts: config.fetch_attempts.max(1),
            delay: Duration::from_secs(config.fetch_delay_secs),
        }
    }
}

/// Client for the `_apis/tokens/pats` endpoints of one organization.
pub struct PatClient {
    http: reqwest::Client,
    pats_url: String,
    api_version: String,
    token: SecretString,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl PatClient {
    /// Build a client using a bearer token the caller already holds.
    pub fn new(config: &ProviderConfig, token: SecretString) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ClientError::HttpClient)?;

        Ok(Self {
            http,
            pats_url: format!("{}/tokens/pats", config.api_root()),
            api_version: config.api_version.clone(),
            token,
            retry: RetryPolicy::from_config(config),
            clock: Arc::new(SystemClock),
            cancel: CancellationToken::new(),
        })
    }

    /// Build a client, acquiring the bearer token from `broker` once.
    pub async fn connect(
        config: &ProviderConfig,
        broker: &dyn CredentialBroker,
    ) -> Result<Self, ClientError> {
        let token = broker.bearer_token().await?;
        info!(
            organization = %config.organization,
            api_version = %config.api_version,
            "Connected to token administration API"
        );
        Self::new(config, token)
    }

    /// Use `clock` to compute requested expiry dates.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Abort retry waits when `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn pats_url(&self) -> &str {
        &self.pats_url
    }

    /// Send a request and read its body, without interpreting the status.
    async fn send(
        &self,
        operation: RemoteCall,
        builder: RequestBuilder,
    ) -> Result<(StatusCode, String), ClientError> {
        debug!(%operation, "Sending request");
        let response = builder
            .bearer_auth(self.token.expose_secret())
            .send()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ClientError::Transport { operation, source })?;
        debug!(%operation, status = status.as_u16(), "Received response");
        Ok((status, body))
    }

    /// Map everything but 200 to an error.
    fn expect_ok(operation: RemoteCall, status: StatusCode, body: &str) -> Result<(), ClientError> {
        match status {
            StatusCode::OK => Ok(()),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized { operation }),
            other => Err(ClientError::Status {
                operation,
                status: other.as_u16(),
                body: truncate_body(body),
            }),
        }
    }

    fn decode<T: DeserializeOwned>(operation: RemoteCall, body: &str) -> Result<T, ClientError> {
        serde_json::from_str(body).map_err(|e| ClientError::Deserialize {
            operation,
            reason: e.to_string(),
        })
    }

    fn request_body<'a>(
        operation: RemoteCall,
        request: &'a PatRequest,
        authorization_id: Option<&'a str>,
        now: DateTime<Utc>,
    ) -> Result<PatRequestBody<'a>, ClientError> {
        PatRequestBody::new(request, authorization_id, now).ok_or_else(|| {
            ClientError::InvalidRequest {
                operation,
                reason: format!(
                    "expiration_days ({}) is out of the representable date range",
                    request.expiration_days
                ),
            }
        })
    }

    /// Shared tail of issue and rotate.
    fn token_from_result(operation: RemoteCall, body: &str) -> Result<PatToken, ClientError> {
        let result: PatTokenResult = Self::decode(operation, body)?;
        if let Some(reason) = result.error() {
            return Err(ClientError::Rejected {
                operation,
                reason: reason.to_string(),
            });
        }
        result.pat_token.ok_or_else(|| ClientError::Deserialize {
            operation,
            reason: "response has no patToken".to_string(),
        })
    }

    /// Walk every page of the listing looking for `authorization_id`.
    ///
    /// `Ok(None)` only after the last page has been seen.
    async fn scan_listing(&self, authorization_id: &str) -> Result<Option<PatToken>, ClientError> {
        let operation = RemoteCall::Fetch;
        let mut continuation: Option<String> = None;

        for _ in 0..MAX_LIST_PAGES {
            let mut builder = self
                .http
                .get(&self.pats_url)
                .query(&[("api-version", self.api_version.as_str())]);
            if let Some(token) = &continuation {
                builder = builder.query(&[("continuationToken", token.as_str())]);
            }

            let (status, body) = self.send(operation, builder).await?;
            Self::expect_ok(operation, status, &body)?;
            let page: PagedPatTokens = Self::decode(operation, &body)?;

            if let Some(found) = page
                .pat_tokens
                .iter()
                .find(|pat| pat.authorization_id == authorization_id)
            {
                return Ok(Some(found.clone()));
            }

            match page.next_page() {
                Some(next) => continuation = Some(next.to_string()),
                None => return Ok(None),
            }
        }

        // An incomplete scan says nothing about whether the token exists.
        warn!(max_pages = MAX_LIST_PAGES, "Listing did not end within the page limit");
        Err(ClientError::ListingTruncated {
            pages: MAX_LIST_PAGES,
        })
    }
}

#[async_trait]
impl RemoteCredentialApi for PatClient {
    async fn issue(&self, request: &PatRequest) -> Result<PatToken, ClientError> {
        let operation = RemoteCall::Issue;
        let body = Self::request_body(operation, request, None, self.clock.now())?;
        let builder = self
            .http
            .post(&self.pats_url)
            .query(&[("api-version", self.api_version.as_str())])
            .json(&body);

        let (status, text) = self.send(operation, builder).await?;
        Self::expect_ok(operation, status, &text)?;
        let pat = Self::token_from_result(operation, &text)?;
        info!(
            authorization_id = %pat.authorization_id,
            display_name = %pat.display_name,
            valid_to = ?pat.valid_to,
            "Issued PAT"
        );
        Ok(pat)
    }

    async fn rotate(
        &self,
        authorization_id: &str,
        request: &PatRequest,
    ) -> Result<PatToken, ClientError> {
        let operation = RemoteCall::Rotate;
        let body =
            Self::request_body(operation, request, Some(authorization_id), self.clock.now())?;
        let builder = self
            .http
            .put(&self.pats_url)
            .query(&[("api-version", self.api_version.as_str())])
            .json(&body);

        let (status, text) = self.send(operation, builder).await?;
        Self::expect_ok(operation, status, &text)?;
        let pat = Self::token_from_result(operation, &text)?;
        info!(authorization_id = %authorization_id, "Updated PAT");
        Ok(pat)
    }

    async fn revoke(&self, authorization_id: &str) -> Result<(), ClientError> {
        let operation = RemoteCall::Revoke;
        let builder = self.http.delete(&self.pats_url).query(&[
            ("authorizationId", authorization_id),
            ("api-version", self.api_version.as_str()),
        ]);

        let (status, body) = self.send(operation, builder).await?;
        match status {
            StatusCode::NO_CONTENT => {
                info!(authorization_id = %authorization_id, "Revoked PAT");
                Ok(())
            }
            StatusCode::METHOD_NOT_ALLOWED | StatusCode::BAD_REQUEST => {
                Err(ClientError::Unsupported {
                    operation,
                    status: status.as_u16(),
                })
            }
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized { operation }),
            other => Err(ClientError::Status {
                operation,
                status: other.as_u16(),
                body: truncate_body(&body),
            }),
        }
    }

    async fn fetch(&self, authorization_id: &str) -> Result<PatToken, ClientError> {
        let attempts = self.retry.attempts.max(1);

        for attempt in 1..=attempts {
            if let Some(pat) = self.scan_listing(authorization_id).await? {
                debug!(authorization_id = %authorization_id, attempt, "Found PAT in listing");
                return Ok(pat);
            }
            if attempt == attempts {
                break;
            }

            debug!(
                authorization_id = %authorization_id,
                attempt,
                delay_ms = self.retry.delay.as_millis() as u64,
                "PAT not listed yet, retrying"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(ClientError::Cancelled { operation: RemoteCall::Fetch });
                }
                _ = tokio::time::sleep(self.retry.delay) => {}
            }
        }

        Err(ClientError::NotFound {
            authorization_id: authorization_id.to_string(),
            attempts,
        })
    }
}
