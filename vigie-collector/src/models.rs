use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Dernier état connu d'un hôte, indexé par adresse source.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HostRecord {
    pub host_id: String,
    pub last_update: String,
    pub data: Snapshot,
}

// Miroir du payload agent : tous les champs sont optionnels ou défaut,
// un snapshot partiel est stocké tel quel (champ manquant = absent)
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Snapshot {
    #[serde(default)]
    pub cpu: Option<CpuSample>,
    #[serde(default)]
    pub ram: Option<RamSample>,
    #[serde(default)]
    pub gpu: Vec<GpuSample>,
    #[serde(default)]
    pub log_errors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CpuSample {
    #[serde(default)]
    pub usage_per_core: Vec<f32>,
    #[serde(default)]
    pub usage_total: f32,
    #[serde(default)]
    pub temp: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RamSample {
    #[serde(default)]
    pub usage_percent: f32,
    #[serde(default)]
    pub usage_gb: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GpuSample {
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub temp: String,
}

/// Une entrée du journal d'erreurs global, attribuée à l'hôte émetteur.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorLogEntry {
    pub host_id: String,
    pub timestamp: String,
    pub error: String,
}

pub type HostsMap = HashMap<String, HostRecord>;
