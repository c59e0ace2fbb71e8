//! Agent configuration
//!
//! TOML file in the OS config directory, overridable with
//! VIGIE_AGENT_CONFIG. A missing file is written back with defaults so the
//! first run leaves an editable config behind.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Ingestion endpoint of the central collector
    pub collector_url: String,
    /// Seconds between two sampling ticks
    pub interval_secs: u64,
    /// CPU utilization observation window (the sample blocks for this long)
    pub sample_window_ms: u64,
    /// Host pinged once per tick for the reachability probe
    pub probe_host: String,
    /// Upper bound on a single delivery attempt
    pub request_timeout_secs: u64,
    /// Hardware inventory file, overwritten at each startup
    pub specs_file: String,
    /// Local append-only error log
    pub error_log_file: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            collector_url: "http://127.0.0.1:8080/agent-data".to_string(),
            interval_secs: 300,
            sample_window_ms: 1000,
            probe_host: "google.com".to_string(),
            request_timeout_secs: 30,
            specs_file: "data/specs.json".to_string(),
            error_log_file: "logs/error_log.json".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load config from the OS-specific location, creating it on first run
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if config_path.exists() {
            let content = tokio::fs::read_to_string(&config_path).await?;
            let config: AgentConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            // First time setup - persist defaults so they can be edited
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Save config to the OS-specific location
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;

        if let Some(parent) = config_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(&config_path, content).await?;
        Ok(())
    }

    /// Get config file path (env override first, then OS config dir)
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("VIGIE_AGENT_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        path.push("vigie-agent");
        path.push("config.toml");
        Ok(path)
    }
}
