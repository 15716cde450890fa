//! # patman-client
//!
//! Remote side of the PAT lifecycle: the Azure DevOps token administration
//! API and the brokers that supply the bearer token used to call it.
//!
//! | Call | HTTP | Success |
//! |------|------|---------|
//! | [`RemoteCredentialApi::issue`] | `POST tokens/pats` | 200 |
//! | [`RemoteCredentialApi::rotate`] | `PUT tokens/pats` | 200 |
//! | [`RemoteCredentialApi::revoke`] | `DELETE tokens/pats?authorizationId=` | 204 |
//! | [`RemoteCredentialApi::fetch`] | `GET tokens/pats` (scan, paged, retried) | 200 + match |
//!
//! The listing endpoint has no point lookup, and a freshly issued token may
//! not be listed yet, so `fetch` re-polls a bounded number of times before
//! reporting [`ClientError::NotFound`].

pub mod api;
pub mod broker;
pub mod client;
pub mod error;
pub mod wire;

pub use api::RemoteCredentialApi;
pub use broker::{
    AZURE_DEVOPS_SCOPE, ClientCredentialsBroker, CredentialBroker, StaticTokenBroker,
    broker_from_config,
};
pub use client::{MAX_LIST_PAGES, PatClient, RetryPolicy};
pub use error::{BrokerError, ClientError, RemoteCall};
pub use wire::{PatRequest, PatToken};
