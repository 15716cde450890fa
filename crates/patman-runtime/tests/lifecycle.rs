//! State-machine tests for the lifecycle controller.
//!
//! The remote service is replaced by an in-process fake that records every
//! call, and time is pinned with a `FixedClock`.

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use patman_client::{ClientError, PatRequest, PatToken, RemoteCall, RemoteCredentialApi};
use patman_core::{Clock, FixedClock, PatConfig, ResourceState};
use patman_policy::MAX_EXPIRATION_DAYS;
use patman_runtime::{
    ClearReason, LifecycleController, LifecycleError, LifecycleEvent, LifecycleSink,
    Operation, Outcome,
};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Issue(String),
    Rotate(String),
    Revoke(String),
    Fetch(String),
}

struct FakeApi {
    clock: Arc<FixedClock>,
    calls: Mutex<Vec<Call>>,
    live: Mutex<HashMap<String, PatToken>>,
    next_id: AtomicUsize,
    fail_issue: AtomicBool,
    fail_revoke: AtomicBool,
    fail_fetch: AtomicBool,
    truncate_listing: AtomicBool,
}

impl FakeApi {
    fn new(clock: Arc<FixedClock>) -> Self {
        Self {
            clock,
            calls: Mutex::new(Vec::new()),
            live: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            fail_issue: AtomicBool::new(false),
            fail_revoke: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            truncate_listing: AtomicBool::new(false),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn is_live(&self, id: &str) -> bool {
        self.live.lock().unwrap().contains_key(id)
    }

    /// Register a token as existing remotely without recording a call.
    fn seed(&self, id: &str, display_name: &str, valid_to: DateTime<Utc>) {
        self.live
            .lock()
            .unwrap()
            .insert(id.to_string(), pat(id, display_name, valid_to, None));
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn server_error(operation: RemoteCall) -> ClientError {
        ClientError::Status {
            operation,
            status: 500,
            body: "boom".to_string(),
        }
    }
}

fn pat(id: &str, display_name: &str, valid_to: DateTime<Utc>, token: Option<&str>) -> PatToken {
    PatToken {
        authorization_id: id.to_string(),
        display_name: display_name.to_string(),
        scope: "app_token".to_string(),
        valid_from: None,
        valid_to: Some(rfc3339(valid_to)),
        target_accounts: None,
        token: token.map(|t| SecretString::from(t.to_string())),
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl RemoteCredentialApi for FakeApi {
    async fn issue(&self, request: &PatRequest) -> Result<PatToken, ClientError> {
        self.record(Call::Issue(request.display_name.clone()));
        if self.fail_issue.load(Ordering::SeqCst) {
            return Err(Self::server_error(RemoteCall::Issue));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let id = format!("auth-{n}");
        let valid_to = request.valid_to(self.clock.now()).expect("expiry in range");
        let issued = pat(&id, &request.display_name, valid_to, Some(&format!("secret-{n}")));
        self.live.lock().unwrap().insert(
            id.clone(),
            pat(&id, &request.display_name, valid_to, None),
        );
        Ok(issued)
    }

    async fn rotate(
        &self,
        authorization_id: &str,
        request: &PatRequest,
    ) -> Result<PatToken, ClientError> {
        self.record(Call::Rotate(authorization_id.to_string()));
        let mut live = self.live.lock().unwrap();
        let Some(existing) = live.get_mut(authorization_id) else {
            return Err(ClientError::Status {
                operation: RemoteCall::Rotate,
                status: 404,
                body: "not found".to_string(),
            });
        };
        existing.display_name = request.display_name.clone();
        existing.scope = request.scope.clone();
        let valid_to = request.valid_to(self.clock.now()).expect("expiry in range");
        existing.valid_to = Some(rfc3339(valid_to));
        Ok(existing.clone())
    }

    async fn revoke(&self, authorization_id: &str) -> Result<(), ClientError> {
        self.record(Call::Revoke(authorization_id.to_string()));
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(Self::server_error(RemoteCall::Revoke));
        }
        match self.live.lock().unwrap().remove(authorization_id) {
            Some(_) => Ok(()),
            None => Err(ClientError::Status {
                operation: RemoteCall::Revoke,
                status: 404,
                body: "not found".to_string(),
            }),
        }
    }

    async fn fetch(&self, authorization_id: &str) -> Result<PatToken, ClientError> {
        self.record(Call::Fetch(authorization_id.to_string()));
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::server_error(RemoteCall::Fetch));
        }
        if self.truncate_listing.load(Ordering::SeqCst) {
            return Err(ClientError::ListingTruncated { pages: 100 });
        }
        self.live
            .lock()
            .unwrap()
            .get(authorization_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound {
                authorization_id: authorization_id.to_string(),
                attempts: 3,
            })
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl CollectingSink {
    fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl LifecycleSink for CollectingSink {
    fn record(&self, event: LifecycleEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct Harness {
    clock: Arc<FixedClock>,
    api: Arc<FakeApi>,
    sink: Arc<CollectingSink>,
    controller: LifecycleController<Arc<FakeApi>, Arc<CollectingSink>>,
}

impl Harness {
    fn new() -> Self {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let api = Arc::new(FakeApi::new(clock.clone()));
        let sink = Arc::new(CollectingSink::default());
        let controller = LifecycleController::with_sink(api.clone(), sink.clone())
            .with_clock(clock.clone());
        Self {
            clock,
            api,
            sink,
            controller,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// State of a live token `id` expiring at `valid_to`, applied with `config`.
    fn existing(&self, id: &str, config: &PatConfig, valid_to: DateTime<Utc>) -> ResourceState {
        self.api.seed(id, &config.display_name, valid_to);
        let mut state = ResourceState::default();
        state.record_config(config);
        state.set_id(id);
        state.token = Some(SecretString::from("old-secret".to_string()));
        state.valid_to = Some(rfc3339(valid_to));
        state
    }
}

fn config() -> PatConfig {
    PatConfig::new("ci-token")
        .with_expiration_days(90)
        .with_renew_before_days(7)
}

// ============================================================================
// Create / Read
// ============================================================================

#[tokio::test]
async fn test_create_issues_and_records() {
    let h = Harness::new();
    let mut state = ResourceState::default();

    let outcome = h.controller.create(&config(), &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Present);
    assert_eq!(state.id, "auth-1");
    assert_eq!(state.authorization_id, "auth-1");
    assert_eq!(state.token_secret(), Some("secret-1"));
    assert_eq!(state.display_name, "ci-token");
    assert_eq!(state.valid_to, Some(rfc3339(h.now() + Duration::days(90))));
    assert_eq!(state.applied_config(), config());
    assert_eq!(
        h.api.calls(),
        vec![Call::Issue("ci-token".to_string()), Call::Fetch("auth-1".to_string())]
    );
}

#[tokio::test]
async fn test_read_far_before_window_changes_nothing() {
    let h = Harness::new();
    let mut state = ResourceState::default();
    h.controller.create(&config(), &mut state).await.unwrap();
    let before = state.clone();
    h.api.reset_calls();

    h.clock.advance(Duration::days(10));
    let outcome = h.controller.read(&config(), &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Present);
    assert_eq!(state.authorization_id, before.authorization_id);
    assert_eq!(state.display_name, before.display_name);
    assert_eq!(state.valid_to, before.valid_to);
    assert_eq!(state.token_secret(), Some("secret-1"));
    assert_eq!(h.api.calls(), vec![Call::Fetch("auth-1".to_string())]);
}

#[tokio::test]
async fn test_read_in_window_renews_exactly_once() {
    let h = Harness::new();
    let mut state = h.existing("old-auth", &config(), h.now() + Duration::days(5));

    let outcome = h.controller.read(&config(), &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Present);
    assert_eq!(
        h.api.calls(),
        vec![
            Call::Revoke("old-auth".to_string()),
            Call::Issue("ci-token".to_string()),
            Call::Fetch("auth-1".to_string()),
        ]
    );
    assert_ne!(state.authorization_id, "old-auth");
    assert_eq!(state.id, state.authorization_id);
    assert_eq!(state.valid_to, Some(rfc3339(h.now() + Duration::days(90))));
    assert_eq!(state.token_secret(), Some("secret-1"));
    assert!(!h.api.is_live("old-auth"));
}

#[tokio::test]
async fn test_read_expired_clears_without_remote_call() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() - Duration::hours(1));

    let outcome = h.controller.read(&config(), &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Absent);
    assert!(state.is_absent());
    assert!(state.token.is_none());
    assert!(h.api.calls().is_empty());
    assert!(h.sink.events().contains(&LifecycleEvent::IdentityCleared {
        authorization_id: "auth-x".to_string(),
        reason: ClearReason::Expired,
    }));
}

#[tokio::test]
async fn test_read_expiry_instant_counts_as_expired() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now());

    let outcome = h.controller.read(&config(), &mut state).await.unwrap();
    assert_eq!(outcome, Outcome::Absent);
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_read_externally_deleted_is_absent_not_error() {
    let h = Harness::new();
    let mut state = h.existing("gone", &config(), h.now() + Duration::days(60));
    h.api.live.lock().unwrap().clear();

    let outcome = h.controller.read(&config(), &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Absent);
    assert!(state.is_absent());
    assert_eq!(h.api.calls(), vec![Call::Fetch("gone".to_string())]);
}

#[tokio::test]
async fn test_read_surfaces_other_fetch_errors() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(60));
    h.api.fail_fetch.store(true, Ordering::SeqCst);

    let err = h.controller.read(&config(), &mut state).await.unwrap_err();

    assert!(matches!(err, LifecycleError::Client(ClientError::Status { status: 500, .. })));
    assert_eq!(state.id, "auth-x");
}

#[tokio::test]
async fn test_read_incomplete_listing_keeps_identity() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(60));
    h.api.truncate_listing.store(true, Ordering::SeqCst);

    let err = h.controller.read(&config(), &mut state).await.unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Client(ClientError::ListingTruncated { .. })
    ));
    assert_eq!(state.id, "auth-x");
    assert_eq!(state.token_secret(), Some("old-secret"));
    assert_eq!(h.api.calls(), vec![Call::Fetch("auth-x".to_string())]);
}

#[tokio::test]
async fn test_read_refreshes_remote_fields() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(60));
    let remote_valid_to = h.now() + Duration::days(61);
    h.api.seed("auth-x", "renamed-elsewhere", remote_valid_to);

    h.controller.read(&config(), &mut state).await.unwrap();

    assert_eq!(state.display_name, "renamed-elsewhere");
    assert_eq!(state.valid_to, Some(rfc3339(remote_valid_to)));
    assert_eq!(state.token_secret(), Some("old-secret"));
}

#[tokio::test]
async fn test_read_absent_makes_no_call() {
    let h = Harness::new();
    let mut state = ResourceState::default();

    let outcome = h.controller.read(&config(), &mut state).await.unwrap();
    assert_eq!(outcome, Outcome::Absent);
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_unparseable_valid_to_is_an_error() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(60));
    state.valid_to = Some("next tuesday".to_string());

    let err = h.controller.read(&config(), &mut state).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(h.api.calls().is_empty());

    state.valid_to = None;
    let err = h.controller.read(&config(), &mut state).await.unwrap_err();
    assert!(matches!(err, LifecycleError::MissingValidTo { .. }));
}

// ============================================================================
// Configuration validation
// ============================================================================

#[tokio::test]
async fn test_invalid_window_fails_before_any_call() {
    let h = Harness::new();
    let bad = PatConfig::new("ci-token")
        .with_expiration_days(5)
        .with_renew_before_days(7);

    let mut state = ResourceState::default();
    let err = h.controller.create(&bad, &mut state).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(state.is_absent());

    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(3));
    let err = h.controller.read(&bad, &mut state).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(state.id, "auth-x");

    let err = h.controller.update(&bad, &mut state).await.unwrap_err();
    assert!(err.is_configuration());

    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_equal_window_is_rejected() {
    let h = Harness::new();
    let bad = PatConfig::new("ci-token")
        .with_expiration_days(7)
        .with_renew_before_days(7);

    let mut state = ResourceState::default();
    let err = h.controller.create(&bad, &mut state).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_expiration_beyond_limit_fails_before_any_call() {
    let h = Harness::new();
    let bad = PatConfig::new("ci-token")
        .with_expiration_days(MAX_EXPIRATION_DAYS + 1)
        .with_renew_before_days(MAX_EXPIRATION_DAYS);

    let mut state = ResourceState::default();
    let err = h.controller.create(&bad, &mut state).await.unwrap_err();
    assert!(err.is_configuration());
    assert!(state.is_absent());

    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(60));
    let err = h.controller.read(&bad, &mut state).await.unwrap_err();
    assert!(err.is_configuration());
    let err = h.controller.update(&bad, &mut state).await.unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(state.id, "auth-x");

    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_longest_expiration_is_accepted() {
    let h = Harness::new();
    let longest = PatConfig::new("ci-token")
        .with_expiration_days(MAX_EXPIRATION_DAYS)
        .with_renew_before_days(MAX_EXPIRATION_DAYS - 1);

    let mut state = ResourceState::default();
    h.controller.create(&longest, &mut state).await.unwrap();
    assert_eq!(
        state.valid_to,
        Some(rfc3339(h.now() + Duration::days(MAX_EXPIRATION_DAYS)))
    );

    // The window opens one day after issue.
    h.api.reset_calls();
    h.controller.read(&longest, &mut state).await.unwrap();
    assert_eq!(h.api.calls(), vec![Call::Fetch("auth-1".to_string())]);
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn test_update_immutable_change_reissues() {
    let h = Harness::new();
    let mut state = h.existing("old-auth", &config(), h.now() + Duration::days(80));
    let desired = config().with_all_organizations(true);

    h.controller.update(&desired, &mut state).await.unwrap();

    let calls = h.api.calls();
    assert_eq!(
        calls,
        vec![
            Call::Revoke("old-auth".to_string()),
            Call::Issue("ci-token".to_string()),
            Call::Fetch("auth-1".to_string()),
        ]
    );
    assert!(!calls.iter().any(|c| matches!(c, Call::Rotate(_))));
    assert!(state.all_organizations);
    assert_eq!(state.id, "auth-1");
}

#[tokio::test]
async fn test_update_mutable_change_rotates_in_place() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(80));
    let desired = PatConfig {
        display_name: "renamed".to_string(),
        ..config()
    };

    h.controller.update(&desired, &mut state).await.unwrap();

    assert_eq!(
        h.api.calls(),
        vec![
            Call::Rotate("auth-x".to_string()),
            Call::Fetch("auth-x".to_string()),
        ]
    );
    assert_eq!(state.id, "auth-x");
    assert_eq!(state.display_name, "renamed");
    assert_eq!(state.token_secret(), Some("old-secret"));
}

#[tokio::test]
async fn test_update_scope_change_rotates_in_place() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(80));
    let desired = config().with_scope("vso.code");

    h.controller.update(&desired, &mut state).await.unwrap();

    let calls = h.api.calls();
    assert_eq!(
        calls,
        vec![
            Call::Rotate("auth-x".to_string()),
            Call::Fetch("auth-x".to_string()),
        ]
    );
    assert!(!calls
        .iter()
        .any(|c| matches!(c, Call::Revoke(_) | Call::Issue(_))));
    assert_eq!(state.id, "auth-x");
    assert_eq!(state.scope, "vso.code");
    assert_eq!(state.token_secret(), Some("old-secret"));
}

#[tokio::test]
async fn test_update_expiration_change_rotates_in_place() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(80));
    let desired = config().with_expiration_days(60);

    h.controller.update(&desired, &mut state).await.unwrap();

    let calls = h.api.calls();
    assert_eq!(
        calls,
        vec![
            Call::Rotate("auth-x".to_string()),
            Call::Fetch("auth-x".to_string()),
        ]
    );
    assert!(!calls
        .iter()
        .any(|c| matches!(c, Call::Revoke(_) | Call::Issue(_))));
    assert_eq!(state.id, "auth-x");
    assert_eq!(state.expiration_days, 60);
    assert_eq!(state.valid_to, Some(rfc3339(h.now() + Duration::days(60))));
}

#[tokio::test]
async fn test_update_renewal_wins_over_field_changes() {
    let h = Harness::new();
    let mut state = h.existing("old-auth", &config(), h.now() + Duration::days(2));
    let desired = PatConfig {
        display_name: "renamed".to_string(),
        ..config().with_all_organizations(true)
    };

    h.controller.update(&desired, &mut state).await.unwrap();

    assert_eq!(
        h.api.calls(),
        vec![
            Call::Revoke("old-auth".to_string()),
            Call::Issue("renamed".to_string()),
            Call::Fetch("auth-1".to_string()),
        ]
    );
    assert_eq!(state.display_name, "renamed");
}

#[tokio::test]
async fn test_update_expired_reissues() {
    let h = Harness::new();
    let mut state = h.existing("old-auth", &config(), h.now() - Duration::days(1));

    h.controller.update(&config(), &mut state).await.unwrap();

    assert_eq!(
        h.api.calls(),
        vec![
            Call::Revoke("old-auth".to_string()),
            Call::Issue("ci-token".to_string()),
            Call::Fetch("auth-1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_update_policy_only_change_just_records() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(80));
    let desired = config().with_renew_before_days(14).with_project("infra");

    h.controller.update(&desired, &mut state).await.unwrap();

    assert_eq!(h.api.calls(), vec![Call::Fetch("auth-x".to_string())]);
    assert_eq!(state.renew_before_days, 14);
    assert_eq!(state.project, "infra");
}

#[tokio::test]
async fn test_update_absent_creates() {
    let h = Harness::new();
    let mut state = ResourceState::default();

    let outcome = h.controller.update(&config(), &mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Present);
    assert_eq!(
        h.api.calls(),
        vec![Call::Issue("ci-token".to_string()), Call::Fetch("auth-1".to_string())]
    );
}

#[tokio::test]
async fn test_revoke_failure_aborts_before_issue() {
    let h = Harness::new();
    let mut state = h.existing("old-auth", &config(), h.now() + Duration::days(5));
    h.api.fail_revoke.store(true, Ordering::SeqCst);

    let err = h.controller.read(&config(), &mut state).await.unwrap_err();

    assert!(matches!(err, LifecycleError::Client(_)));
    assert_eq!(h.api.calls(), vec![Call::Revoke("old-auth".to_string())]);
    assert_eq!(state.id, "old-auth");
    assert_eq!(state.token_secret(), Some("old-secret"));
}

#[tokio::test]
async fn test_issue_failure_after_revoke_clears_identity() {
    let h = Harness::new();
    let mut state = h.existing("old-auth", &config(), h.now() + Duration::days(5));
    h.api.fail_issue.store(true, Ordering::SeqCst);

    let err = h.controller.read(&config(), &mut state).await.unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Client(ClientError::Status {
            operation: RemoteCall::Issue,
            ..
        })
    ));
    assert!(state.is_absent());
    assert!(state.token.is_none());
    assert!(h.sink.events().contains(&LifecycleEvent::IdentityCleared {
        authorization_id: "old-auth".to_string(),
        reason: ClearReason::ReissueFailed,
    }));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_revokes_and_clears() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(80));

    let outcome = h.controller.delete(&mut state).await.unwrap();

    assert_eq!(outcome, Outcome::Absent);
    assert!(state.is_absent());
    assert_eq!(h.api.calls(), vec![Call::Revoke("auth-x".to_string())]);
}

#[tokio::test]
async fn test_delete_absent_is_noop() {
    let h = Harness::new();
    let mut state = ResourceState::default();

    let outcome = h.controller.delete(&mut state).await.unwrap();
    assert_eq!(outcome, Outcome::Absent);
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_delete_failure_leaves_state() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(80));
    h.api.fail_revoke.store(true, Ordering::SeqCst);

    let err = h.controller.delete(&mut state).await.unwrap_err();

    assert!(matches!(err, LifecycleError::Client(_)));
    assert_eq!(state.id, "auth-x");
    assert_eq!(state.token_secret(), Some("old-secret"));
}

#[tokio::test]
async fn test_second_revoke_of_same_id_errors() {
    let h = Harness::new();
    let mut state = h.existing("auth-x", &config(), h.now() + Duration::days(80));
    let stale = state.clone();

    h.controller.delete(&mut state).await.unwrap();

    let mut stale = stale;
    let err = h.controller.delete(&mut stale).await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Client(ClientError::Status { status: 404, .. })
    ));
}

// ============================================================================
// Dispatch, assessment, events
// ============================================================================

#[tokio::test]
async fn test_dispatch_full_lifecycle() {
    let h = Harness::new();
    let mut state = ResourceState::default();

    let outcome = h
        .controller
        .dispatch(Operation::Create, &config(), &mut state)
        .await
        .unwrap();
    assert!(outcome.is_present());

    let outcome = h
        .controller
        .dispatch(Operation::Read, &config(), &mut state)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Present);

    let renamed = PatConfig {
        display_name: "renamed".to_string(),
        ..config()
    };
    let outcome = h
        .controller
        .dispatch(Operation::Update, &renamed, &mut state)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Present);
    assert_eq!(state.display_name, "renamed");

    let outcome = h
        .controller
        .dispatch(Operation::Delete, &renamed, &mut state)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Absent);
    assert!(!h.api.is_live("auth-1"));
}

#[tokio::test]
async fn test_assess_is_offline() {
    let h = Harness::new();
    let valid_to = h.now() + Duration::days(5);
    let state = h.existing("auth-x", &config(), valid_to);

    let assessment = h.controller.assess(&config(), &state).unwrap().unwrap();
    assert_eq!(assessment.valid_to, valid_to);
    assert_eq!(assessment.renewal_starts, valid_to - Duration::days(7));
    assert_eq!(assessment.verdict, patman_policy::RenewalVerdict::DueForRenewal);

    assert!(h
        .controller
        .assess(&config(), &ResourceState::default())
        .unwrap()
        .is_none());
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn test_events_never_carry_secret() {
    let h = Harness::new();
    let mut state = h.existing("old-auth", &config(), h.now() + Duration::days(5));

    h.controller.read(&config(), &mut state).await.unwrap();

    let events = h.sink.events();
    assert!(matches!(
        events.first(),
        Some(LifecycleEvent::Classified {
            verdict: patman_policy::RenewalVerdict::DueForRenewal,
            ..
        })
    ));
    let rendered = format!("{events:?}");
    assert!(!rendered.contains("secret-1"));
    assert!(!rendered.contains("old-secret"));
}
