//! The remote credential API seam.

use crate::error::ClientError;
use crate::wire::{PatRequest, PatToken};
use async_trait::async_trait;
use std::sync::Arc;

/// Issue, rotate, revoke and look up one PAT.
#[async_trait]
pub trait RemoteCredentialApi: Send + Sync {
    /// Request a new token. The service allocates a new authorization id and secret.
    async fn issue(&self, request: &PatRequest) -> Result<PatToken, ClientError>;

    /// Change the mutable fields of an existing token in place.
    async fn rotate(
        &self,
        authorization_id: &str,
        request: &PatRequest,
    ) -> Result<PatToken, ClientError>;

    /// Revoke a token. Revoking an unknown id is an error, not a silent success.
    async fn revoke(&self, authorization_id: &str) -> Result<(), ClientError>;

    /// Look a token up by authorization id, tolerating listing lag.
    async fn fetch(&self, authorization_id: &str) -> Result<PatToken, ClientError>;
}

#[async_trait]
impl<T: RemoteCredentialApi + ?Sized> RemoteCredentialApi for Arc<T> {
    async fn issue(&self, request: &PatRequest) -> Result<PatToken, ClientError> {
        (**self).issue(request).await
    }

    async fn rotate(
        &self,
        authorization_id: &str,
        request: &PatRequest,
    ) -> Result<PatToken, ClientError> {
        (**self).rotate(authorization_id, request).await
    }

    async fn revoke(&self, authorization_id: &str) -> Result<(), ClientError> {
        (**self).revoke(authorization_id).await
    }

    async fn fetch(&self, authorization_id: &str) -> Result<PatToken, ClientError> {
        (**self).fetch(authorization_id).await
    }
}
