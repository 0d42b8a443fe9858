// ⚙️ Configuration - TOML file with defaults for everything

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at the config file
pub const CONFIG_ENV: &str = "RSVP_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite file holding the guest documents
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Address the HTTP API binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: default_database_path(),
            bind_addr: default_bind_addr(),
            directory: DirectoryConfig::default(),
        }
    }
}

/// What to do when someone re-confirms an event they already said yes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Fail with `DuplicateConfirmation`
    #[default]
    Reject,
    /// Treat it as an idempotent update
    Accept,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Upper bound for every single store call
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,

    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl DirectoryConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        DirectoryConfig {
            store_timeout_secs: default_store_timeout_secs(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("guests.db")
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_store_timeout_secs() -> u64 {
    15
}

/// Parse a config file.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Explicit path, then `$RSVP_CONFIG`, then built-in defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => load_config(Path::new(&path)),
        None => Ok(AppConfig::default()),
    }
}
