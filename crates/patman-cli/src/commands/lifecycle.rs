//! `patman create|read|update|delete|apply`.
//!
//! Each command loads the state, runs the controller, and saves the state
//! again even when the operation fails, since a failed replacement may
//! already have revoked the old token.

use super::session::Session;
use anyhow::{Context, Result};
use patman_client::{PatClient, broker_from_config};
use patman_core::ResourceState;
use patman_runtime::{LifecycleController, LifecycleError, Operation, Outcome};
use tokio_util::sync::CancellationToken;

async fn connect(
    session: &Session,
    cancel: CancellationToken,
) -> Result<LifecycleController<PatClient>> {
    let provider = &session.config.provider;
    let broker = broker_from_config(&provider.auth)
        .context("no credentials for the token administration API")?;
    let client = PatClient::connect(provider, broker.as_ref())
        .await
        .with_context(|| format!("failed to connect to organization '{}'", provider.organization))?
        .with_cancellation(cancel);
    Ok(LifecycleController::new(client))
}

async fn run(session: &Session, cancel: CancellationToken, operation: Operation) -> Result<()> {
    let controller = connect(session, cancel).await?;
    let mut state = session.load_state()?;

    let result = controller
        .dispatch(operation, &session.config.pat, &mut state)
        .await;
    finish(session, operation.as_str(), &state, result)
}

pub async fn create(session: &Session, cancel: CancellationToken) -> Result<()> {
    let state = session.load_state()?;
    if !state.is_absent() {
        anyhow::bail!(
            "state already tracks PAT {}; use `patman update` or `patman delete` first",
            state.id
        );
    }
    run(session, cancel, Operation::Create).await
}

pub async fn read(session: &Session, cancel: CancellationToken) -> Result<()> {
    run(session, cancel, Operation::Read).await
}

pub async fn update(session: &Session, cancel: CancellationToken) -> Result<()> {
    run(session, cancel, Operation::Update).await
}

pub async fn delete(session: &Session, cancel: CancellationToken) -> Result<()> {
    run(session, cancel, Operation::Delete).await
}

/// Create when absent, otherwise read (which may renew) and then update.
pub async fn apply(session: &Session, cancel: CancellationToken) -> Result<()> {
    let controller = connect(session, cancel).await?;
    let mut state = session.load_state()?;
    let desired = &session.config.pat;

    let result = if state.is_absent() {
        controller.create(desired, &mut state).await
    } else {
        match controller.read(desired, &mut state).await {
            Ok(_) => controller.update(desired, &mut state).await,
            Err(e) => Err(e),
        }
    };
    finish(session, "apply", &state, result)
}

fn finish(
    session: &Session,
    label: &str,
    state: &ResourceState,
    result: Result<Outcome, LifecycleError>,
) -> Result<()> {
    session.save_state(state)?;
    let outcome = result.with_context(|| format!("{label} failed"))?;

    println!("✔ {label}: {outcome}");
    if outcome.is_present() {
        println!("  Authorization ID: {}", state.authorization_id);
        println!("  Display name: {}", state.display_name);
        if let Some(valid_to) = &state.valid_to {
            println!("  Valid to: {valid_to}");
        }
    }
    println!("  State: {}", session.store.path().display());
    Ok(())
}
