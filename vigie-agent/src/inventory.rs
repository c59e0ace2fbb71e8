//! One-shot hardware inventory
//!
//! Collected once at startup and persisted to the specs file; the telemetry
//! pipeline never reads it back. GPU discovery goes through `nvidia-smi`
//! and silently yields an empty list when no supported tooling is present.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::process::Command;
use sysinfo::{Disks, System};

use crate::metrics::{round2, GIB};

#[derive(Debug, Serialize)]
pub struct HardwareInventory {
    pub cpu: CpuInventory,
    pub ram: RamInventory,
    pub gpu: Vec<GpuInventory>,
    pub disk: DiskInventory,
}

#[derive(Debug, Serialize)]
pub struct CpuInventory {
    pub model: String,
    pub cores: usize,
    pub threads: usize,
}

#[derive(Debug, Serialize)]
pub struct RamInventory {
    pub total_gb: f64,
}

/// VRAM capacity is kept as the vendor-reported string (e.g. "10240 MiB")
#[derive(Debug, Serialize)]
pub struct GpuInventory {
    pub name: String,
    pub vram: String,
}

#[derive(Debug, Serialize)]
pub struct DiskInventory {
    pub total_gb: f64,
}

impl HardwareInventory {
    /// Collect the static hardware description of this host
    pub fn collect() -> Result<Self> {
        let sys = System::new_all();

        let threads = sys.cpus().len();
        let cores = sys.physical_core_count().unwrap_or(threads);
        let model = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .unwrap_or_default();

        Ok(HardwareInventory {
            cpu: CpuInventory { model, cores, threads },
            ram: RamInventory {
                total_gb: round2(sys.total_memory() as f64 / GIB),
            },
            gpu: gpu_inventory(),
            disk: DiskInventory {
                total_gb: round2(root_disk_bytes() as f64 / GIB),
            },
        })
    }

    /// Persist the inventory, overwriting whatever a previous run wrote
    pub async fn save(&self, path: &str) -> Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("create specs directory")?;
            }
        }
        let content = serde_json::to_string_pretty(self).context("serialize inventory")?;
        tokio::fs::write(path, content).await.context("write specs file")?;
        Ok(())
    }
}

/// Capacity of the root filesystem, first mount when no "/" is listed
fn root_disk_bytes() -> u64 {
    let disks = Disks::new_with_refreshed_list();
    disks
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .or_else(|| disks.iter().next())
        .map(|d| d.total_space())
        .unwrap_or(0)
}

fn gpu_inventory() -> Vec<GpuInventory> {
    let output = match Command::new("nvidia-smi")
        .args(["--query-gpu=name,memory.total", "--format=csv,noheader"])
        .output()
    {
        Ok(o) if o.status.success() => o,
        _ => return Vec::new(),
    };
    parse_gpu_inventory(&String::from_utf8_lossy(&output.stdout))
}

pub(crate) fn parse_gpu_inventory(output: &str) -> Vec<GpuInventory> {
    output
        .lines()
        .filter_map(|line| {
            let (name, vram) = line.split_once(',')?;
            Some(GpuInventory {
                name: name.trim().to_string(),
                vram: vram.trim().to_string(),
            })
        })
        .collect()
}
