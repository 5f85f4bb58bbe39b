//! Configuration management for the CLI
//!
//! Defaults come from `~/.config/pdm/config.json`. Command-line flags and
//! their environment variables take precedence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Artifact directory used when neither a flag nor the config file names one
pub const DEFAULT_ARTIFACTS_DIR: &str = "./artifacts";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Directory holding the model artifacts
    pub artifacts_dir: Option<PathBuf>,
    /// Default output format ("table" or "json")
    pub default_format: Option<String>,
    /// Groq model override
    pub groq_model: Option<String>,
    /// Upper bound on one explanation request, in seconds
    pub explanation_timeout_secs: Option<u64>,
}

impl Config {
    /// Load the config file, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn config_path() -> Option<PathBuf> {
        let home = dirs_next::home_dir()?;
        Some(home.join(".config").join("pdm").join("config.json"))
    }

    /// Flag value first, then the config file, then the default
    pub fn resolve_artifacts_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.artifacts_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACTS_DIR))
    }
}
