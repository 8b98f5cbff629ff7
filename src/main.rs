use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tlog_monitor::audit::{AuditRecorder, Auditor};
use tlog_monitor::config::AppConfig;
use tlog_monitor::error::MonitorError;
use tlog_monitor::notify::EmailNotifier;
use tlog_monitor::store::AuditStore;
use tlog_monitor::tlog::LogClient;
use tlog_monitor::tsa::TsaClient;
use tlog_monitor::verify::CommitmentVerifier;
use tlog_monitor::watch::{KeyMatcher, KeyWatcher};
use tlog_monitor::{api, scheduler};

#[derive(Parser)]
#[command(name = "tlog-monitor")]
#[command(about = "Transparency log key watcher and auditor")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Alert whenever the key in KEY_FILE signs a new log entry
    Watch {
        key_file: PathBuf,
        /// Recipient for email alerts (requires SENDGRID_API_KEY)
        email: Option<String>,
    },
    /// Periodically timestamp, sign and republish the log's verified state
    Audit,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tlog_monitor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    info!("Configuration loaded");

    match cli.command {
        Commands::Watch { key_file, email } => run_watch(config, key_file, email).await,
        Commands::Audit => run_audit(config).await,
    }
}

async fn run_watch(config: AppConfig, key_file: PathBuf, email: Option<String>) -> anyhow::Result<()> {
    let key = std::fs::read(&key_file)
        .map_err(|e| MonitorError::ConfigError(format!("cannot read key file {}: {}", key_file.display(), e)))?;
    let matcher = KeyMatcher::new(key)?;

    let log = LogClient::new(&config.log_url, config.http_timeout())?;
    let verifier = CommitmentVerifier::from_log(&log)
        .await
        .context("Failed to fetch the log's public key")?;

    let mut watcher = KeyWatcher::start(log, verifier, matcher, config.watch_state_path.clone()).await?;

    match (email, config.sendgrid_api_key.clone()) {
        (Some(recipient), Some(api_key)) => {
            let notifier = EmailNotifier::new(&config.sendgrid_url, api_key, recipient, config.http_timeout())?;
            info!("Email alerts go to {}", notifier.recipient());
            watcher = watcher.with_notifier(notifier);
        }
        (Some(_), None) => warn!("SENDGRID_API_KEY is not set, alerts will only be logged"),
        _ => {}
    }

    info!("Watching {} for {}", config.log_url, key_file.display());
    let watcher = Arc::new(Mutex::new(watcher));
    let fatal = scheduler::run_periodic("watch", config.watch_interval(), move || {
        let watcher = watcher.clone();
        async move { watcher.lock().await.tick().await.map(|_| ()) }
    })
    .await;

    error!("Watch stopped: {}", fatal);
    Err(fatal.into())
}

async fn run_audit(config: AppConfig) -> anyhow::Result<()> {
    let store = Arc::new(
        AuditStore::open(&config.state_path, config.history_capacity)
            .with_context(|| format!("Failed to open audit state {}", config.state_path.display()))?,
    );
    info!("Audit state loaded with {} records", store.len().await);

    let log = LogClient::new(&config.log_url, config.http_timeout())?;
    let verifier = CommitmentVerifier::from_log(&log)
        .await
        .context("Failed to fetch the log's public key")?;
    let tsa = TsaClient::new(&config.tsa_url, config.http_timeout())?;

    let auditor = Arc::new(Auditor::new(AuditRecorder::new(log, verifier, tsa), store.clone()).await);
    let period = config.audit_interval();
    tokio::spawn(async move {
        let fatal = scheduler::run_periodic("audit", period, move || {
            let auditor = auditor.clone();
            async move { auditor.tick().await.map(|_| ()).map_err(|e| e.source) }
        })
        .await;
        error!("Audit task stopped, still serving reads: {}", fatal);
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Server listening on {}", config.listen_addr);

    axum::serve(listener, api::router(store))
        .await
        .context("Server error")?;

    Ok(())
}
