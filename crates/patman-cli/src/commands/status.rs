//! `patman status` and `patman show-token`. Neither contacts the service.

use super::session::Session;
use anyhow::{Context, Result};
use chrono::Utc;
use patman_runtime::assess;
use serde_json::json;

pub fn status(session: &Session, as_json: bool) -> Result<()> {
    let state = session.load_state()?;
    let assessment =
        assess(&session.config.pat, &state, Utc::now()).context("cannot classify stored PAT")?;

    if as_json {
        let value = match &assessment {
            Some(a) => json!({
                "present": true,
                "authorization_id": state.authorization_id,
                "display_name": state.display_name,
                "valid_to": a.valid_to.to_rfc3339(),
                "renewal_starts": a.renewal_starts.to_rfc3339(),
                "verdict": a.verdict,
            }),
            None => json!({ "present": false }),
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match assessment {
        Some(a) => {
            println!("PAT {}", state.authorization_id);
            println!("  Display name: {}", state.display_name);
            println!("  Valid to: {}", a.valid_to.to_rfc3339());
            println!("  Renewal starts: {}", a.renewal_starts.to_rfc3339());
            println!("  Verdict: {}", a.verdict);
        }
        None => println!("No PAT recorded in {}", session.store.path().display()),
    }
    Ok(())
}

pub fn show_token(session: &Session) -> Result<()> {
    let state = session.load_state()?;
    let token = state.token_secret().with_context(|| {
        format!(
            "no token secret recorded in {}",
            session.store.path().display()
        )
    })?;
    println!("{token}");
    Ok(())
}
