//! CLI configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level etude configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtudeConfig {
    /// Quiz bank file or directory.
    #[serde(default = "default_bank_dir")]
    pub bank_dir: PathBuf,
    /// Snapshot file holding attempts, answers, and streaks.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    /// Platform statistics cache TTL in seconds.
    #[serde(default = "default_stats_ttl_secs")]
    pub stats_ttl_secs: u64,
    /// How many recent attempts a user summary shows.
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

fn default_bank_dir() -> PathBuf {
    PathBuf::from("banks")
}
fn default_stats_ttl_secs() -> u64 {
    300
}
fn default_recent_limit() -> usize {
    5
}

impl Default for EtudeConfig {
    fn default() -> Self {
        Self {
            bank_dir: default_bank_dir(),
            state_file: None,
            stats_ttl_secs: default_stats_ttl_secs(),
            recent_limit: default_recent_limit(),
        }
    }
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order when no path is given:
/// 1. `etude.toml` in the current directory
/// 2. `~/.config/etude/config.toml`
///
/// Falls back to defaults when neither exists. An explicit path that does
/// not exist is an error rather than a silent fallback.
pub fn load_config_from(path: Option<&Path>) -> Result<EtudeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("etude.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<EtudeConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))
        }
        None => Ok(EtudeConfig::default()),
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("etude"))
}
