//! Run configuration shared by the scenario file and the CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Write a report every this many years; 0 disables writing.
    #[serde(default)]
    pub interval_years: u64,
    #[serde(default = "default_report_dir")]
    pub output_dir: PathBuf,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval_years: 0,
            output_dir: default_report_dir(),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
