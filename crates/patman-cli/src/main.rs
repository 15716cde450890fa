use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::session::Session;

#[derive(Parser, Debug)]
#[command(name = "patman", version, about = "Azure DevOps PAT lifecycle manager")]
struct Cli {
    /// Configuration file (YAML).
    #[arg(long, global = true, env = "PATMAN_CONFIG", default_value = "patman.yaml")]
    config: PathBuf,

    /// State file holding the managed token's identity and secret.
    #[arg(long, global = true, env = "PATMAN_STATE", default_value = "patman.state.json")]
    state: PathBuf,

    /// Log filter, e.g. "info" or "patman_runtime=debug".
    #[arg(long, global = true, env = "PATMAN_LOG", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue a new PAT and record it in the state file.
    Create,

    /// Observe the recorded PAT, renewing it if it is inside its renewal window.
    Read,

    /// Converge the recorded PAT on the configuration.
    Update,

    /// Revoke the recorded PAT.
    Delete,

    /// Create the PAT when absent, otherwise read and update it.
    Apply,

    /// Classify the recorded PAT without contacting the service.
    Status {
        /// Print the result as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the recorded PAT secret to stdout.
    ShowToken,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    let session = Session::open(&cli.config, &cli.state)?;

    match cli.cmd {
        Command::Create => commands::lifecycle::create(&session, cancel).await?,
        Command::Read => commands::lifecycle::read(&session, cancel).await?,
        Command::Update => commands::lifecycle::update(&session, cancel).await?,
        Command::Delete => commands::lifecycle::delete(&session, cancel).await?,
        Command::Apply => commands::lifecycle::apply(&session, cancel).await?,
        Command::Status { json } => commands::status::status(&session, json)?,
        Command::ShowToken => commands::status::show_token(&session)?,
    }

    Ok(())
}
