//! Error types for the client crate.

use std::fmt;
use thiserror::Error;

/// Longest response body carried in an error.
pub const MAX_ERROR_BODY: usize = 512;

/// Remote calls made against the token administration API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteCall {
    Issue,
    Rotate,
    Revoke,
    Fetch,
}

impl RemoteCall {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteCall::Issue => "issue",
            RemoteCall::Rotate => "rotate",
            RemoteCall::Revoke => "revoke",
            RemoteCall::Fetch => "fetch",
        }
    }
}

impl fmt::Display for RemoteCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the token administration API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or its response not received.
    #[error("{operation}: failed to execute request: {source}")]
    Transport {
        operation: RemoteCall,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{operation}: unexpected status code {status}: {body}")]
    Status {
        operation: RemoteCall,
        status: u16,
        body: String,
    },

    /// The endpoint refused the method (400/405). Not retried.
    #[error("{operation}: API returned status {status}: check if this operation is supported for this endpoint")]
    Unsupported { operation: RemoteCall, status: u16 },

    /// The bearer token was rejected.
    #[error("{operation}: unauthorized: check token or authentication method")]
    Unauthorized { operation: RemoteCall },

    /// The token was not listed after every attempt.
    #[error("PAT with authorization ID {authorization_id} not found after {attempts} attempts")]
    NotFound {
        authorization_id: String,
        attempts: u32,
    },

    /// The listing still had more pages after the page limit.
    #[error("fetch: listing not exhausted after {pages} pages")]
    ListingTruncated { pages: usize },

    /// The response body was not the expected JSON.
    #[error("{operation}: failed to decode response: {reason}")]
    Deserialize { operation: RemoteCall, reason: String },

    /// The request could not be built from its parameters. Nothing was sent.
    #[error("{operation}: invalid request: {reason}")]
    InvalidRequest { operation: RemoteCall, reason: String },

    /// A success status carried a `patTokenError`.
    #[error("{operation}: rejected by service: {reason}")]
    Rejected { operation: RemoteCall, reason: String },

    /// The caller cancelled while the call was waiting.
    #[error("{operation}: cancelled")]
    Cancelled { operation: RemoteCall },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// No bearer token could be obtained.
    #[error("credential broker: {0}")]
    Broker(#[from] BrokerError),
}

impl ClientError {
    /// Whether this error means the token does not exist remotely.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } | ClientError::Unsupported { status, .. } => {
                Some(*status)
            }
            ClientError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }
}

/// Errors while acquiring a bearer token.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Nothing in the configuration or environment yields a token.
    #[error(
        "no credentials available: set auth.token, the auth.token_env variable, or AZURE_CLIENT_ID/AZURE_CLIENT_SECRET/AZURE_TENANT_ID"
    )]
    NoCredentials,

    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("token endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode token response: {0}")]
    Deserialize(String),
}

/// Cut a response body down to [`MAX_ERROR_BODY`] characters.
pub(crate) fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
