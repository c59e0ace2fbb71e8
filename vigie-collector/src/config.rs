use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CollectorConfig {
    pub listen_addr: String,
    pub data_dir: String,
    pub stale_after_secs: i64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "./data".into(),
            // trois ticks agent manqués (cadence 300s)
            stale_after_secs: 900,
        }
    }
}

pub async fn load_config() -> CollectorConfig {
    let path = std::env::var("VIGIE_COLLECTOR_CONFIG").unwrap_or_else(|_| "collector.yaml".into());
    if Path::new(&path).exists() {
        let txt = fs::read_to_string(&path).await.unwrap_or_default();
        if txt.trim().is_empty() {
            return CollectorConfig::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            eprintln!("[collector] config invalide: {e}");
            CollectorConfig::default()
        })
    } else {
        eprintln!("[collector] pas de collector.yaml, usage config par défaut");
        CollectorConfig::default()
    }
}
