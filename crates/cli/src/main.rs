//! SessionGuard CLI - authenticated API calls that survive token expiry

mod commands;
mod config;
mod logging;
mod observer;
mod state_dir;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use commands::Commands;
use config::Settings;
use observer::TerminalObserver;
use sessionguard_core::FileSessionStore;
use sessionguard_http::{ClientError, SessionClient};
use state_dir::StateDir;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, debug, error};

#[derive(Parser)]
#[command(name = "sessionguard")]
#[command(about = "Call an API with a session that refreshes itself")]
#[command(version)]
struct Cli {
    /// Set logging level (overrides the configured level)
    #[arg(short = 'l', long, global = true)]
    log_level: Option<LogLevel>,

    /// Configuration file (TOML or YAML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Directory for configuration and session data
    #[arg(short = 'd', long, global = true, env = "SESSIONGUARD_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Timeout for the whole command in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "60")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let state_dir = match &cli.state_dir {
        Some(path) => StateDir::with_override(path),
        None => StateDir::new(),
    };
    let settings = Settings::load(cli.config.as_deref(), &state_dir)
        .context("failed to load configuration")?;

    logging::init_logging(&settings.log, cli.log_level.map(Level::from))?;
    debug!(base_url = %settings.api.base_url, "Loaded settings");

    let observer = Arc::new(TerminalObserver::default());
    let client = build_client(&settings, &state_dir, observer.clone()).await?;

    let outcome = if cli.timeout == 0 {
        // No timeout - run indefinitely
        cli.command.execute(&client).await
    } else {
        let timeout_duration = Duration::from_secs(cli.timeout);
        match tokio::time::timeout(timeout_duration, cli.command.execute(&client)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "command timed out after {} seconds",
                cli.timeout
            )),
        }
    };

    if let Err(e) = outcome {
        error!("Command failed: {e:#}");
        if session_expired(&e, &observer) {
            eprintln!("session expired, please run `sessionguard login`");
        } else {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn build_client(
    settings: &Settings,
    state_dir: &StateDir,
    observer: Arc<TerminalObserver>,
) -> Result<SessionClient> {
    let session_path = settings.session_path(state_dir);
    let store = FileSessionStore::open(&session_path)
        .await
        .with_context(|| format!("failed to open session at {}", session_path.display()))?;

    let config = settings.client_config();
    let client = SessionClient::builder()
        .store(Arc::new(store))
        .observer(observer)
        .user_agent(config.user_agent)
        .paths(config.paths);

    let client = match config.timeout {
        Some(timeout) => client.timeout(timeout),
        None => client,
    };

    Ok(client.base_url(config.base_url).build()?)
}

fn session_expired(error: &anyhow::Error, observer: &TerminalObserver) -> bool {
    observer.session_expired()
        || error
            .downcast_ref::<ClientError>()
            .is_some_and(ClientError::is_auth_expired)
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
