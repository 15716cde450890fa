//! The PAT lifecycle state machine.
//!
//! Every decision is re-derived at call time from the recorded `valid_to`,
//! the desired configuration, and the injected clock. A single operation
//! performs at most one renewal: the read that follows an issue only looks
//! the token up, it never classifies again.

use crate::error::LifecycleError;
use crate::events::{ClearReason, LifecycleEvent, LifecycleSink, TracingSink};
use crate::operation::{Operation, Outcome};
use chrono::{DateTime, Utc};
use patman_client::{ClientError, PatRequest, PatToken, RemoteCall, RemoteCredentialApi};
use patman_core::{Clock, PatConfig, PatField, ResourceState, SystemClock};
use patman_policy::{
    RenewalVerdict, classify, parse_valid_to, renewal_threshold, validate_window,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

/// Offline view of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assessment {
    pub valid_to: DateTime<Utc>,
    pub renewal_starts: DateTime<Utc>,
    pub verdict: RenewalVerdict,
}

/// Classify the stored credential at `now` without calling the remote service.
///
/// `None` when the resource is absent.
pub fn assess(
    desired: &PatConfig,
    state: &ResourceState,
    now: DateTime<Utc>,
) -> Result<Option<Assessment>, LifecycleError> {
    validate_window(desired.renew_before_days, desired.expiration_days)?;
    if state.is_absent() {
        return Ok(None);
    }

    let valid_to = recorded_valid_to(state)?;
    Ok(Some(Assessment {
        valid_to,
        renewal_starts: renewal_threshold(valid_to, desired.renew_before_days)?,
        verdict: classify(now, valid_to, desired.renew_before_days),
    }))
}

fn recorded_valid_to(state: &ResourceState) -> Result<DateTime<Utc>, LifecycleError> {
    let raw = state
        .valid_to
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| LifecycleError::MissingValidTo {
            authorization_id: state.id.clone(),
        })?;
    Ok(parse_valid_to(raw)?)
}

pub struct LifecycleController<A: RemoteCredentialApi, S: LifecycleSink = TracingSink> {
    api: A,
    sink: S,
    clock: Arc<dyn Clock>,
}

impl<A: RemoteCredentialApi> LifecycleController<A, TracingSink> {
    pub fn new(api: A) -> Self {
        Self::with_sink(api, TracingSink)
    }
}

impl<A: RemoteCredentialApi, S: LifecycleSink> LifecycleController<A, S> {
    pub fn with_sink(api: A, sink: S) -> Self {
        Self {
            api,
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run one host operation against `state`.
    pub async fn dispatch(
        &self,
        operation: Operation,
        desired: &PatConfig,
        state: &mut ResourceState,
    ) -> Result<Outcome, LifecycleError> {
        info!(
            %operation,
            display_name = %desired.display_name,
            authorization_id = %state.authorization_id,
            "Running lifecycle operation"
        );
        match operation {
            Operation::Create => self.create(desired, state).await,
            Operation::Read => self.read(desired, state).await,
            Operation::Update => self.update(desired, state).await,
            Operation::Delete => self.delete(state).await,
        }
    }

    /// Issue a new token and record it.
    pub async fn create(
        &self,
        desired: &PatConfig,
        state: &mut ResourceState,
    ) -> Result<Outcome, LifecycleError> {
        validate_window(desired.renew_before_days, desired.expiration_days)?;
        self.issue(desired, state).await?;
        self.refresh(state).await
    }

    /// Observe the token, renewing it if it is inside its renewal window.
    pub async fn read(
        &self,
        desired: &PatConfig,
        state: &mut ResourceState,
    ) -> Result<Outcome, LifecycleError> {
        validate_window(desired.renew_before_days, desired.expiration_days)?;
        if state.is_absent() {
            debug!("Nothing to read, resource is absent");
            return Ok(Outcome::Absent);
        }

        match self.classify(desired, state)? {
            RenewalVerdict::Expired => {
                self.clear(state, ClearReason::Expired);
                Ok(Outcome::Absent)
            }
            RenewalVerdict::DueForRenewal => {
                info!(authorization_id = %state.id, "PAT is within its renewal window, renewing");
                self.replace(desired, state).await?;
                self.refresh(state).await
            }
            RenewalVerdict::Valid => self.refresh(state).await,
        }
    }

    /// Converge the token on `desired`.
    ///
    /// Renewal wins over an immutable-field change, which wins over a
    /// mutable-field change.
    pub async fn update(
        &self,
        desired: &PatConfig,
        state: &mut ResourceState,
    ) -> Result<Outcome, LifecycleError> {
        validate_window(desired.renew_before_days, desired.expiration_days)?;
        if state.is_absent() {
            return self.create(desired, state).await;
        }

        let verdict = self.classify(desired, state)?;
        if verdict.needs_reissue() {
            info!(authorization_id = %state.id, %verdict, "Reissuing PAT");
            self.replace(desired, state).await?;
        } else if state.has_change(desired, PatField::AllOrganizations) {
            info!(
                authorization_id = %state.id,
                field = %PatField::AllOrganizations,
                "Immutable field changed, reissuing PAT"
            );
            self.replace(desired, state).await?;
        } else if PatField::ALL
            .iter()
            .any(|field| field.is_rotatable() && state.has_change(desired, *field))
        {
            let changed: Vec<&str> = state
                .changed_fields(desired)
                .iter()
                .map(|field| field.as_str())
                .collect();
            info!(authorization_id = %state.id, changed = ?changed, "Updating PAT in place");
            self.rotate(desired, state).await?;
        } else {
            state.record_config(desired);
        }

        self.refresh(state).await
    }

    /// Revoke the token. An absent resource is left alone.
    pub async fn delete(&self, state: &mut ResourceState) -> Result<Outcome, LifecycleError> {
        if state.is_absent() {
            debug!("Nothing to delete, resource is absent");
            return Ok(Outcome::Absent);
        }

        let id = state.id.clone();
        self.remote(RemoteCall::Revoke, Some(&id), self.api.revoke(&id))
            .await?;
        self.clear(state, ClearReason::Revoked);
        Ok(Outcome::Absent)
    }

    /// Classify the stored credential without calling the remote service.
    pub fn assess(
        &self,
        desired: &PatConfig,
        state: &ResourceState,
    ) -> Result<Option<Assessment>, LifecycleError> {
        assess(desired, state, self.clock.now())
    }

    fn classify(
        &self,
        desired: &PatConfig,
        state: &ResourceState,
    ) -> Result<RenewalVerdict, LifecycleError> {
        let valid_to = recorded_valid_to(state)?;
        let verdict = classify(self.clock.now(), valid_to, desired.renew_before_days);
        self.sink.record(LifecycleEvent::Classified {
            authorization_id: state.id.clone(),
            verdict,
            valid_to: valid_to.to_rfc3339(),
        });
        Ok(verdict)
    }

    /// Run one remote call, reporting it to the sink.
    async fn remote<T, F>(
        &self,
        call: RemoteCall,
        authorization_id: Option<&str>,
        fut: F,
    ) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        let authorization_id = authorization_id.map(str::to_string);
        self.sink.record(LifecycleEvent::RemoteCallStarted {
            call,
            authorization_id: authorization_id.clone(),
        });
        let result = fut.await;
        self.sink.record(LifecycleEvent::RemoteCallFinished {
            call,
            authorization_id,
            error: result.as_ref().err().map(|e| e.to_string()),
        });
        result
    }

    async fn issue(
        &self,
        desired: &PatConfig,
        state: &mut ResourceState,
    ) -> Result<(), LifecycleError> {
        let request = PatRequest::from(desired);
        let pat = self
            .remote(RemoteCall::Issue, None, self.api.issue(&request))
            .await?;
        if pat.authorization_id.is_empty() {
            return Err(ClientError::Deserialize {
                operation: RemoteCall::Issue,
                reason: "issued PAT has no authorizationId".to_string(),
            }
            .into());
        }

        state.record_config(desired);
        state.set_id(pat.authorization_id.clone());
        state.token = pat.token.clone();
        Self::apply_remote(state, pat);
        Ok(())
    }

    /// Revoke the current token, then issue its replacement.
    ///
    /// A failed revoke leaves `state` untouched. A failed issue after a
    /// successful revoke clears the identity, since it now names a dead token.
    async fn replace(
        &self,
        desired: &PatConfig,
        state: &mut ResourceState,
    ) -> Result<(), LifecycleError> {
        let old = state.id.clone();
        self.remote(RemoteCall::Revoke, Some(&old), self.api.revoke(&old))
            .await?;

        if let Err(e) = self.issue(desired, state).await {
            self.clear(state, ClearReason::ReissueFailed);
            return Err(e);
        }
        info!(old = %old, new = %state.id, "Replaced PAT");
        Ok(())
    }

    async fn rotate(
        &self,
        desired: &PatConfig,
        state: &mut ResourceState,
    ) -> Result<(), LifecycleError> {
        let id = state.id.clone();
        let request = PatRequest::from(desired);
        let pat = self
            .remote(RemoteCall::Rotate, Some(&id), self.api.rotate(&id, &request))
            .await?;

        state.record_config(desired);
        if let Some(token) = pat.token.clone() {
            state.token = Some(token);
        }
        Self::apply_remote(state, pat);
        Ok(())
    }

    /// Look the token up and copy what the service reports into `state`.
    async fn refresh(&self, state: &mut ResourceState) -> Result<Outcome, LifecycleError> {
        if state.is_absent() {
            return Ok(Outcome::Absent);
        }

        let id = state.id.clone();
        match self
            .remote(RemoteCall::Fetch, Some(&id), self.api.fetch(&id))
            .await
        {
            Ok(pat) => {
                if !pat.authorization_id.is_empty() {
                    state.authorization_id = pat.authorization_id.clone();
                }
                Self::apply_remote(state, pat);
                Ok(Outcome::Present)
            }
            Err(e) if e.is_not_found() => {
                self.clear(state, ClearReason::NotFound);
                Ok(Outcome::Absent)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fields the service is authoritative for. The token secret is not one
    /// of them: listings never return it.
    fn apply_remote(state: &mut ResourceState, pat: PatToken) {
        if !pat.display_name.is_empty() {
            state.display_name = pat.display_name;
        }
        if let Some(valid_to) = pat.valid_to.filter(|v| !v.is_empty()) {
            state.valid_to = Some(valid_to);
        }
    }

    fn clear(&self, state: &mut ResourceState, reason: ClearReason) {
        let authorization_id = state.id.clone();
        state.clear_identity();
        self.sink.record(LifecycleEvent::IdentityCleared {
            authorization_id,
            reason,
        });
    }
}
