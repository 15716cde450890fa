use patman_client::RemoteCall;
use patman_policy::RenewalVerdict;
use std::sync::Arc;
use tracing::{info, warn};

/// Why the controller dropped a resource's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// The recorded expiry has passed.
    Expired,
    /// The token is no longer listed remotely.
    NotFound,
    /// The token was revoked on request.
    Revoked,
    /// The old token was revoked but its replacement could not be issued.
    ReissueFailed,
}

impl ClearReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearReason::Expired => "expired",
            ClearReason::NotFound => "not_found",
            ClearReason::Revoked => "revoked",
            ClearReason::ReissueFailed => "reissue_failed",
        }
    }
}

/// A transition point in the lifecycle of one managed PAT.
///
/// Events never carry the token secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Classified {
        authorization_id: String,
        verdict: RenewalVerdict,
        valid_to: String,
    },
    RemoteCallStarted {
        call: RemoteCall,
        authorization_id: Option<String>,
    },
    RemoteCallFinished {
        call: RemoteCall,
        authorization_id: Option<String>,
        error: Option<String>,
    },
    IdentityCleared {
        authorization_id: String,
        reason: ClearReason,
    },
}

/// Receives lifecycle events. Kept out of the renewal decision itself.
pub trait LifecycleSink: Send + Sync {
    fn record(&self, event: LifecycleEvent);
}

impl<T: LifecycleSink + ?Sized> LifecycleSink for Arc<T> {
    fn record(&self, event: LifecycleEvent) {
        (**self).record(event)
    }
}

/// Emits every event as a structured `tracing` record.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LifecycleSink for TracingSink {
    fn record(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Classified {
                authorization_id,
                verdict,
                valid_to,
            } => {
                info!(authorization_id = %authorization_id, %verdict, valid_to = %valid_to, "Classified PAT");
            }
            LifecycleEvent::RemoteCallStarted {
                call,
                authorization_id,
            } => {
                info!(%call, authorization_id = ?authorization_id, "Calling token administration API");
            }
            LifecycleEvent::RemoteCallFinished {
                call,
                authorization_id,
                error: None,
            } => {
                info!(%call, authorization_id = ?authorization_id, "Remote call succeeded");
            }
            LifecycleEvent::RemoteCallFinished {
                call,
                authorization_id,
                error: Some(error),
            } => {
                warn!(%call, authorization_id = ?authorization_id, error = %error, "Remote call failed");
            }
            LifecycleEvent::IdentityCleared {
                authorization_id,
                reason,
            } => {
                warn!(
                    authorization_id = %authorization_id,
                    reason = reason.as_str(),
                    "Cleared PAT identity, it will be recreated"
                );
            }
        }
    }
}
