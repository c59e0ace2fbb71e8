//! HTTP delivery of snapshots to the collector
//!
//! One bounded attempt per tick: any network error, timeout or non-success
//! status is reported back to the loop as a plain failure. The response
//! body is never inspected.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use crate::config::AgentConfig;
use crate::metrics::Snapshot;

pub struct Transport {
    client: Client,
    endpoint: String,
}

impl Transport {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("build http client")?;
        Ok(Self {
            client,
            endpoint: config.collector_url.clone(),
        })
    }

    pub async fn send(&self, snapshot: &Snapshot) -> Result<()> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(snapshot)
            .send()
            .await
            .context("send snapshot")?;
        if !resp.status().is_success() {
            anyhow::bail!("collector status {}", resp.status());
        }
        Ok(())
    }
}
