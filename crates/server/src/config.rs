//! Server configuration

use anyhow::Result;
use maintenance_lib::explain::DEFAULT_EXPLANATION_TIMEOUT;
use maintenance_lib::GroqConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration, read from `PDM_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding the classifier and encoder artifacts
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Upper bound on one explanation request
    #[serde(default = "default_explanation_timeout")]
    pub explanation_timeout_secs: u64,

    #[serde(default)]
    pub groq_model: Option<String>,

    #[serde(default)]
    pub groq_base_url: Option<String>,
}

fn default_port() -> u16 {
    8080
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_explanation_timeout() -> u64 {
    DEFAULT_EXPLANATION_TIMEOUT.as_secs()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            artifacts_dir: default_artifacts_dir(),
            explanation_timeout_secs: default_explanation_timeout(),
            groq_model: None,
            groq_base_url: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PDM").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn explanation_timeout(&self) -> Duration {
        Duration::from_secs(self.explanation_timeout_secs)
    }

    /// Groq settings, or `None` when no API key is set
    pub fn groq_config(&self) -> Option<GroqConfig> {
        let mut groq = GroqConfig::from_env()?.with_timeout(self.explanation_timeout());
        if let Some(model) = &self.groq_model {
            groq = groq.with_model(model.clone());
        }
        if let Some(base_url) = &self.groq_base_url {
            groq = groq.with_base_url(base_url.clone());
        }
        Some(groq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.artifacts_dir, PathBuf::from("./artifacts"));
        assert_eq!(config.explanation_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 9000, "groq_model": "llama-3.3-70b-versatile"}"#)
                .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.artifacts_dir, PathBuf::from("./artifacts"));
        assert_eq!(config.groq_model.as_deref(), Some("llama-3.3-70b-versatile"));
    }
}
