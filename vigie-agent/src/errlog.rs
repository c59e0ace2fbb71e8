//! Local append-only error log
//!
//! Same policy on both ends of the pipeline: read the existing log (absent
//! file = empty), push the new entry, rewrite the whole file. Safe only
//! because the agent loop is the single writer on this host.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogEntry {
    pub timestamp: String,
    pub error: String,
}

pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    pub fn new(path: &str) -> Self {
        Self {
            path: PathBuf::from(path),
        }
    }

    /// Append one entry, rewriting the full log file
    pub async fn append(&self, error: &str) -> Result<()> {
        let mut entries = self.read_all().await?;
        entries.push(ErrorLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            error: error.to_string(),
        });

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("create log directory")?;
            }
        }
        let content = serde_json::to_string_pretty(&entries).context("serialize error log")?;
        tokio::fs::write(&self.path, content)
            .await
            .context("write error log")?;
        Ok(())
    }

    pub async fn read_all(&self) -> Result<Vec<ErrorLogEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .context("read error log")?;
        serde_json::from_str(&content).context("parse error log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(&dir.path().join("error_log.json").to_string_lossy());
        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn entries_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = ErrorLog::new(&dir.path().join("logs/error_log.json").to_string_lossy());

        log.append("first failure").await.unwrap();
        log.append("second failure").await.unwrap();

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].error, "first failure");
        assert_eq!(entries[1].error, "second failure");
        assert!(!entries[0].timestamp.is_empty());
    }
}
