//! Vigie Agent - Host telemetry agent for the Vigie fleet monitor
//!
//! The agent runs on every monitored machine:
//! - One-time hardware inventory written at startup
//! - Periodic resource snapshots (CPU, RAM, GPU, reachability)
//! - Best-effort HTTP push to the central collector
//! - Local append-only error log for failed deliveries

mod config;
mod errlog;
mod inventory;
mod metrics;
mod transport;

use anyhow::{Context, Result};
use config::AgentConfig;
use errlog::ErrorLog;
use inventory::HardwareInventory;
use metrics::Snapshot;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use transport::Transport;

/// Main agent state
struct Agent {
    config: AgentConfig,
    transport: Transport,
    errlog: ErrorLog,
}

impl Agent {
    fn new(config: AgentConfig) -> Result<Self> {
        let transport = Transport::new(&config)?;
        let errlog = ErrorLog::new(&config.error_log_file);
        Ok(Agent {
            config,
            transport,
            errlog,
        })
    }

    /// Agent main loop: sample, push, sleep, forever. There is no terminal
    /// state; transient failures are logged and the next tick proceeds.
    async fn run(&self) -> Result<()> {
        info!(
            "Starting agent main loop (interval: {}s)...",
            self.config.interval_secs
        );

        let mut timer = interval(Duration::from_secs(self.config.interval_secs));
        loop {
            timer.tick().await;
            self.tick().await;
        }
    }

    /// One sampling/delivery cycle
    async fn tick(&self) {
        let (snapshot, diagnostics) = Snapshot::collect(&self.config).await;

        // sampling diagnostics (currently reachability only) also land in
        // the local log, with more detail than the wire payload carries
        for diag in diagnostics {
            if let Err(e) = self.errlog.append(&diag).await {
                warn!("Failed to record diagnostic: {e:#}");
            }
        }

        self.push(&snapshot).await;
    }

    /// Single bounded delivery attempt. A failed tick's snapshot is lost,
    /// never queued for resend.
    async fn push(&self, snapshot: &Snapshot) {
        match self.transport.send(snapshot).await {
            Ok(()) => debug!("Snapshot delivered"),
            Err(e) => {
                error!("Failed to send data: {e:#}");
                if let Err(log_err) = self
                    .errlog
                    .append(&format!("Failed to send data: {e:#}"))
                    .await
                {
                    warn!("Failed to record delivery failure: {log_err:#}");
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();

    info!("📡 Vigie Agent starting...");

    let config = AgentConfig::load()
        .await
        .context("Failed to load configuration")?;

    // One-shot inventory; its failure must not keep the loop from running
    match HardwareInventory::collect() {
        Ok(hw) => match hw.save(&config.specs_file).await {
            Ok(()) => info!("Hardware inventory written to {}", config.specs_file),
            Err(e) => error!("Failed to persist hardware inventory: {e:#}"),
        },
        Err(e) => error!("Failed to collect hardware inventory: {e:#}"),
    }

    let agent = Agent::new(config).context("Failed to create agent")?;
    agent.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &std::path::Path, collector_url: String) -> AgentConfig {
        AgentConfig {
            collector_url,
            interval_secs: 1,
            sample_window_ms: 50,
            probe_host: "host.invalid".to_string(),
            request_timeout_secs: 1,
            specs_file: dir.join("specs.json").to_string_lossy().into_owned(),
            error_log_file: dir.join("error_log.json").to_string_lossy().into_owned(),
        }
    }

    // bind then drop: nothing listens on the port afterwards, so every
    // delivery attempt fails fast with a connection error
    fn unreachable_collector_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{port}/agent-data")
    }

    #[tokio::test]
    async fn rejected_delivery_logs_one_entry_per_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Agent::new(test_config(dir.path(), unreachable_collector_url())).unwrap();

        let snapshot = Snapshot::default();
        for _ in 0..3 {
            agent.push(&snapshot).await;
        }

        let entries = agent.errlog.read_all().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries
            .iter()
            .all(|e| e.error.starts_with("Failed to send data")));
    }

    #[tokio::test]
    async fn loop_survives_a_rejecting_collector() {
        let dir = tempfile::tempdir().unwrap();
        let agent = Agent::new(test_config(dir.path(), unreachable_collector_url())).unwrap();

        let outcome = tokio::time::timeout(Duration::from_millis(2500), agent.run()).await;
        assert!(outcome.is_err(), "agent loop must never terminate on its own");

        let entries = agent.errlog.read_all().await.unwrap();
        assert!(!entries.is_empty());
    }
}
