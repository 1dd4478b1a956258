// src/config.rs

//! Manages relay configuration: reading environment values, applying defaults, and validation.
//!
//! Only two values are required: the transport credential (`TG_BOT_TOKEN`) and the
//! authorized principal (`TG_USER_ID`). Everything else is an optional `RELAY_*`
//! tunable with a default matching a stock n8n install.

use crate::core::packager::TRANSPORT_TEXT_LIMIT;
use crate::core::protocol::Principal;
use anyhow::{Result, anyhow};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;
use url::Url;

pub const ENV_BOT_TOKEN: &str = "TG_BOT_TOKEN";
pub const ENV_USER_ID: &str = "TG_USER_ID";

/// Configuration for the optional Prometheus metrics exporter.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    9464
}

/// Where backups live and how many of them the listing reports.
#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub script: String,
    pub dir: PathBuf,
    /// Only entries whose name ends with this suffix are listed.
    pub suffix: String,
    pub list_limit: usize,
    pub timeout: Duration,
}

/// Settings for the deploy half of the update pipeline.
#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub script: String,
    pub timeout: Duration,
}

/// Settings for log retrieval and inline-vs-file delivery.
#[derive(Debug, Clone)]
pub struct LogsConfig {
    pub tail_lines: usize,
    /// Output longer than this many characters is delivered as a file.
    pub inline_ceiling: usize,
    pub timeout: Duration,
    /// Directory for transient log dumps.
    pub dump_dir: PathBuf,
}

/// Represents the final, validated relay configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub principal: Principal,
    pub log_level: String,
    pub api_base_url: String,
    pub poll_timeout_secs: u64,
    /// The managed container, used by `logs` and `version`.
    pub container: String,
    pub probe_timeout: Duration,
    pub health_url: Option<Url>,
    pub logs: LogsConfig,
    pub backup: BackupConfig,
    pub update: UpdateConfig,
    pub metrics: MetricsConfig,
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup. Used by `from_env` and by tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bot_token = get(ENV_BOT_TOKEN);
        let user_id = get(ENV_USER_ID);
        let (bot_token, user_id) = match (bot_token, user_id) {
            (Some(token), Some(id)) => (token, id),
            (token, id) => {
                let mut missing = Vec::new();
                if token.is_none() {
                    missing.push(ENV_BOT_TOKEN);
                }
                if id.is_none() {
                    missing.push(ENV_USER_ID);
                }
                return Err(anyhow!(
                    "required environment variable(s) not set: {}",
                    missing.join(", ")
                ));
            }
        };

        let health_url = match get("RELAY_HEALTH_URL") {
            Some(raw) => Some(
                Url::parse(&raw).map_err(|e| anyhow!("RELAY_HEALTH_URL '{raw}' is invalid: {e}"))?,
            ),
            None => None,
        };

        let dump_dir = get("RELAY_DUMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        let config = Config {
            bot_token,
            principal: Principal::new(user_id),
            log_level: get("RELAY_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            api_base_url: get("RELAY_API_BASE_URL")
                .unwrap_or_else(|| "https://api.telegram.org".to_string()),
            poll_timeout_secs: parse_or(&get, "RELAY_POLL_TIMEOUT_SECS", 30)?,
            container: get("RELAY_CONTAINER").unwrap_or_else(|| "n8n-app".to_string()),
            probe_timeout: secs_or(&get, "RELAY_PROBE_TIMEOUT_SECS", 10)?,
            health_url,
            logs: LogsConfig {
                tail_lines: parse_or(&get, "RELAY_LOG_TAIL_LINES", 100)?,
                inline_ceiling: parse_or(&get, "RELAY_INLINE_CEILING", 4000)?,
                timeout: secs_or(&get, "RELAY_LOG_TIMEOUT_SECS", 20)?,
                dump_dir,
            },
            backup: BackupConfig {
                script: get("RELAY_BACKUP_SCRIPT")
                    .unwrap_or_else(|| "/opt/n8n-install/backup_n8n.sh".to_string()),
                dir: get("RELAY_BACKUP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/opt/n8n-install/backups")),
                suffix: get("RELAY_BACKUP_SUFFIX").unwrap_or_else(|| ".tar.gz".to_string()),
                list_limit: parse_or(&get, "RELAY_BACKUP_LIST_LIMIT", 10)?,
                timeout: secs_or(&get, "RELAY_BACKUP_TIMEOUT_SECS", 600)?,
            },
            update: UpdateConfig {
                script: get("RELAY_UPDATE_SCRIPT").unwrap_or_else(|| "/update_n8n.sh".to_string()),
                timeout: secs_or(&get, "RELAY_UPDATE_TIMEOUT_SECS", 900)?,
            },
            metrics: MetricsConfig {
                enabled: parse_or(&get, "RELAY_METRICS_ENABLED", false)?,
                port: parse_or(&get, "RELAY_METRICS_PORT", default_metrics_port())?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the resolved configuration to ensure logical consistency.
    fn validate(&self) -> Result<()> {
        if self.container.is_empty() {
            return Err(anyhow!("RELAY_CONTAINER cannot be empty"));
        }
        if self.poll_timeout_secs == 0 {
            return Err(anyhow!("RELAY_POLL_TIMEOUT_SECS cannot be 0"));
        }
        if self.logs.tail_lines == 0 {
            return Err(anyhow!("RELAY_LOG_TAIL_LINES cannot be 0"));
        }
        if self.logs.inline_ceiling == 0 {
            return Err(anyhow!("RELAY_INLINE_CEILING cannot be 0"));
        }
        if self.logs.inline_ceiling >= TRANSPORT_TEXT_LIMIT {
            return Err(anyhow!(
                "RELAY_INLINE_CEILING must be below the transport message limit of {} characters",
                TRANSPORT_TEXT_LIMIT
            ));
        }
        if self.backup.list_limit == 0 {
            return Err(anyhow!("RELAY_BACKUP_LIST_LIMIT cannot be 0"));
        }
        for (name, timeout) in [
            ("RELAY_PROBE_TIMEOUT_SECS", self.probe_timeout),
            ("RELAY_LOG_TIMEOUT_SECS", self.logs.timeout),
            ("RELAY_BACKUP_TIMEOUT_SECS", self.backup.timeout),
            ("RELAY_UPDATE_TIMEOUT_SECS", self.update.timeout),
        ] {
            if timeout.is_zero() {
                return Err(anyhow!("{name} cannot be 0"));
            }
        }
        if self.metrics.enabled && self.metrics.port == 0 {
            return Err(anyhow!("RELAY_METRICS_PORT cannot be 0"));
        }

        if self.probe_timeout > self.backup.timeout {
            warn!(
                "probe timeout ({}s) exceeds the backup timeout ({}s).",
                self.probe_timeout.as_secs(),
                self.backup.timeout.as_secs()
            );
        }

        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}")),
        None => Ok(default),
    }
}

fn secs_or<G>(get: &G, key: &str, default: u64) -> Result<Duration>
where
    G: Fn(&str) -> Option<String>,
{
    parse_or(get, key, default).map(Duration::from_secs)
}
