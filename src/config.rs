use std::path::PathBuf;

use tracing::trace;

/// Hub configuration, read from a JSON file
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Interval between probe rounds, in minutes
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// Per-probe HTTP timeout, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Worker pool width for a probe round
    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    /// Optional CSV file to seed the target registry from at startup
    pub csv_path: Option<PathBuf>,

    /// Optional webhook receiving round summaries (check runs only)
    pub webhook_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            interval_minutes: default_interval_minutes(),
            probe_timeout_secs: default_probe_timeout_secs(),
            max_concurrent_probes: default_max_concurrent_probes(),
            csv_path: None,
            webhook_url: None,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./monitoring.db")
}

fn default_interval_minutes() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_max_concurrent_probes() -> usize {
    5
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
