//! Per-tick telemetry sampling for the Vigie agent
//!
//! Produces one Snapshot per tick:
//! - CPU per-core and aggregate utilization, averaged over a fixed window
//! - Memory utilization
//! - Best-effort CPU package temperature (`sensors`)
//! - Best-effort GPU utilization/temperature (`nvidia-smi`)
//! - One reachability probe feeding `log_errors`
//!
//! Every source is independently best-effort: a missing vendor tool or a
//! failed probe degrades its field to absent/empty and never aborts the
//! sample.

use serde::Serialize;
use std::process::Command;
use std::time::Duration;
use sysinfo::System;
use tracing::debug;

use crate::config::AgentConfig;

pub(crate) const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Full telemetry payload for one sampling pass. Carries no host identity:
/// the collector assigns it from the connection's source address.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub cpu: CpuSample,
    pub ram: RamSample,
    pub gpu: Vec<GpuSample>,
    pub log_errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuSample {
    pub usage_per_core: Vec<f32>,
    pub usage_total: f32,
    pub temp: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RamSample {
    pub usage_percent: f32,
    pub usage_gb: f64,
}

/// Vendor-reported strings, kept as-is (units vary between driver versions)
#[derive(Debug, Clone, Default, Serialize)]
pub struct GpuSample {
    pub usage: String,
    pub temp: String,
}

impl Snapshot {
    /// Collect one full sampling pass. Returns the snapshot plus the
    /// detailed diagnostics to append to the agent-side error log.
    pub async fn collect(config: &AgentConfig) -> (Self, Vec<String>) {
        debug!("Collecting snapshot...");

        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();
        // the sleep IS the measurement: utilization is averaged over this window
        tokio::time::sleep(Duration::from_millis(config.sample_window_ms)).await;
        sys.refresh_cpu_usage();

        let cpu = CpuSample::collect(&sys);
        let ram = RamSample::collect(&sys);
        let gpu = gpu_usage();

        let mut log_errors = Vec::new();
        let mut diagnostics = Vec::new();
        if let Err(detail) = probe_network(&config.probe_host) {
            log_errors.push("Network issue".to_string());
            diagnostics.push(format!("Network issue: {detail}"));
        }

        (Snapshot { cpu, ram, gpu, log_errors }, diagnostics)
    }
}

impl CpuSample {
    fn collect(sys: &System) -> Self {
        let usage_per_core = sys.cpus().iter().map(|c| c.cpu_usage()).collect();
        let usage_total = sys.global_cpu_info().cpu_usage();

        CpuSample {
            usage_per_core,
            usage_total,
            temp: package_temp(),
        }
    }
}

impl RamSample {
    fn collect(sys: &System) -> Self {
        let total = sys.total_memory();
        let available = sys.available_memory();
        let used = total.saturating_sub(available);

        let usage_percent = if total > 0 {
            (used as f32 / total as f32) * 100.0
        } else {
            0.0
        };

        RamSample {
            usage_percent,
            usage_gb: round2(used as f64 / GIB),
        }
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Package temperature from the `sensors` tool. Absent when the tool is
/// missing, errors, or prints no "Package id 0:" line.
fn package_temp() -> Option<f32> {
    let output = Command::new("sensors").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_package_temp(&String::from_utf8_lossy(&output.stdout))
}

pub(crate) fn parse_package_temp(output: &str) -> Option<f32> {
    let line = output.lines().find(|l| l.contains("Package id 0:"))?;
    let value = line.split(':').nth(1)?;
    let celsius = value.trim().split("°C").next()?.trim();
    celsius.parse().ok()
}

/// GPU utilization/temperature pairs from `nvidia-smi`. Empty when the tool
/// is absent or errors - that is missing hardware, not a fault.
fn gpu_usage() -> Vec<GpuSample> {
    let output = match Command::new("nvidia-smi")
        .args(["--query-gpu=utilization.gpu,temperature.gpu", "--format=csv,noheader"])
        .output()
    {
        Ok(o) if o.status.success() => o,
        _ => return Vec::new(),
    };
    parse_gpu_usage(&String::from_utf8_lossy(&output.stdout))
}

pub(crate) fn parse_gpu_usage(output: &str) -> Vec<GpuSample> {
    output
        .lines()
        .filter_map(|line| {
            let (usage, temp) = line.split_once(',')?;
            Some(GpuSample {
                usage: usage.trim().to_string(),
                temp: temp.trim().to_string(),
            })
        })
        .collect()
}

/// One reachability probe per tick. Success contributes nothing to the
/// snapshot; the failure detail feeds both the snapshot and the local log.
fn probe_network(probe_host: &str) -> Result<(), String> {
    match Command::new("ping").args(["-c", "1", probe_host]).output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => Err(format!("ping {probe_host} exited with {}", output.status)),
        Err(e) => Err(format!("ping {probe_host} failed to run: {e}")),
    }
}
