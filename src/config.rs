use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MonitorError;

pub const DEFAULT_CONFIG_FILE: &str = "tlog-monitor.toml";
pub const ENV_PREFIX: &str = "TLOG_MONITOR";

impl From<config::ConfigError> for MonitorError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub log_url: String,
    pub tsa_url: String,
    pub state_path: PathBuf,
    #[serde(default)]
    pub watch_state_path: Option<PathBuf>,
    pub history_capacity: usize,
    pub watch_interval_secs: u64,
    pub audit_interval_secs: u64,
    pub http_timeout_secs: u64,
    pub listen_addr: String,
    pub sendgrid_url: String,
    #[serde(skip)]
    pub sendgrid_api_key: Option<String>,
}

impl AppConfig {
    /// Defaults, then the optional TOML file, then `TLOG_MONITOR_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let file = path
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let settings = config::Config::builder()
            .set_default("log_url", "https://api.rekor.dev")?
            .set_default("tsa_url", "https://freetsa.org/tsr")?
            .set_default("state_path", "globals.json")?
            .set_default("history_capacity", 1000_i64)?
            .set_default("watch_interval_secs", 30_i64)?
            .set_default("audit_interval_secs", 1800_i64)?
            .set_default("http_timeout_secs", 30_i64)?
            .set_default("listen_addr", "127.0.0.1:8080")?
            .set_default("sendgrid_url", "https://api.sendgrid.com/v3/mail/send")?
            .add_source(config::File::with_name(&file).required(path.is_some()))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;
        app_config.sendgrid_api_key = env::var("SENDGRID_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.log_url.trim().is_empty() {
            return Err(MonitorError::ConfigError("log_url must not be empty".into()));
        }
        if self.tsa_url.trim().is_empty() {
            return Err(MonitorError::ConfigError("tsa_url must not be empty".into()));
        }
        if self.history_capacity == 0 {
            return Err(MonitorError::ConfigError(
                "history_capacity must be at least 1".into(),
            ));
        }
        if self.watch_interval_secs == 0 || self.audit_interval_secs == 0 {
            return Err(MonitorError::ConfigError(
                "polling intervals must be at least one second".into(),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(MonitorError::ConfigError(
                "http_timeout_secs must be at least one second".into(),
            ));
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs)
    }

    pub fn audit_interval(&self) -> Duration {
        Duration::from_secs(self.audit_interval_secs)
    }
}
