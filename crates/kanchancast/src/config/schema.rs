use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::{default_database_path, DatabaseOptions, RetryPolicy};
use crate::tracking::{AssignmentPolicy, StatusRepair, TrackerOptions};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_transaction_timeout_ms")]
    pub transaction_timeout_ms: u64,
    #[serde(default)]
    pub status_repair: StatusRepair,
    #[serde(default = "default_true")]
    pub enforce_work_area: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_transaction_timeout_ms() -> u64 {
    15_000
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            database: DatabaseConfig::default(),
            retry: RetryConfig::default(),
            transaction_timeout_ms: default_transaction_timeout_ms(),
            status_repair: StatusRepair::default(),
            enforce_work_area: true,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Resolved database file. A leading `~/` in the configured path expands
    /// to the home directory; without a configured path the default location
    /// under the home directory is used.
    pub fn database_path(&self) -> Option<PathBuf> {
        match self.database.path.as_deref() {
            Some(raw) => match raw.strip_prefix("~/") {
                Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
                None => Some(PathBuf::from(raw)),
            },
            None => default_database_path(),
        }
    }

    pub fn database_options(&self) -> DatabaseOptions {
        DatabaseOptions {
            busy_timeout: Duration::from_millis(self.database.busy_timeout_ms),
            retry: RetryPolicy::new(
                self.retry.max_attempts,
                Duration::from_millis(self.retry.backoff_ms),
                Duration::from_millis(self.transaction_timeout_ms),
            ),
        }
    }

    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            status_repair: self.status_repair,
            assignment: AssignmentPolicy {
                enforce_work_area: self.enforce_work_area,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    1_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_backoff_ms() -> u64 {
    200
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `kanchancast=debug`.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
