/**
 * STORE VIGIE - État central des hôtes + journal d'erreurs global
 *
 * RÔLE :
 * Ce module possède les deux tables partagées du collecteur : la carte
 * host_id → dernier snapshot accepté, et le journal d'erreurs append-only.
 *
 * FONCTIONNEMENT :
 * - Deux verrous exclusifs indépendants, un par table
 * - Persistance JSON intégrale à chaque mutation, verrou tenu pendant
 *   toute la séquence lecture-fusion-écriture
 * - Dernier arrivé gagne : un snapshot remplace data sans fusion de champs
 *
 * UTILITÉ DANS VIGIE :
 * 🎯 Source de vérité unique, injectée dans les handlers HTTP
 * 🎯 Le dashboard ne lit que ce que l'ingestion a réellement persisté
 */

use crate::models::{ErrorLogEntry, HostRecord, HostsMap, Snapshot};
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// Erreurs possibles lors des opérations sur le store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Store {
    hosts: RwLock<HostsMap>,
    errors: RwLock<Vec<ErrorLogEntry>>,
    hosts_path: PathBuf,
    errors_path: PathBuf,
}

impl Store {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            hosts: RwLock::new(HostsMap::new()),
            errors: RwLock::new(Vec::new()),
            hosts_path: data_dir.join("hosts.json"),
            errors_path: data_dir.join("errors.json"),
        }
    }

    /// Recharge les deux tables depuis le disque (fichier absent = table vide)
    pub async fn load(&self) -> Result<(), StoreError> {
        if self.hosts_path.exists() {
            let content = tokio::fs::read_to_string(&self.hosts_path).await?;
            *self.hosts.write().await = serde_json::from_str(&content)?;
        }
        if self.errors_path.exists() {
            let content = tokio::fs::read_to_string(&self.errors_path).await?;
            *self.errors.write().await = serde_json::from_str(&content)?;
        }
        println!(
            "[store] loaded {} hosts, {} error entries",
            self.hosts.read().await.len(),
            self.errors.read().await.len()
        );
        Ok(())
    }

    /// Fusionne un snapshot entrant : création ou remplacement intégral du
    /// HostRecord, puis une entrée de journal par chaîne de log_errors,
    /// toutes estampillées du même instant.
    pub async fn ingest(&self, host_id: &str, snapshot: Snapshot) -> Result<(), StoreError> {
        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();

        let log_errors = snapshot.log_errors.clone();

        {
            // verrou écriture tenu jusqu'à la persistance : deux réécritures
            // intégrales concurrentes ne peuvent pas s'écraser mutuellement
            let mut hosts = self.hosts.write().await;
            hosts.insert(
                host_id.to_string(),
                HostRecord {
                    host_id: host_id.to_string(),
                    last_update: now.clone(),
                    data: snapshot,
                },
            );
            self.persist_hosts(&hosts).await?;
        }

        if !log_errors.is_empty() {
            let mut errors = self.errors.write().await;
            for error in &log_errors {
                errors.push(ErrorLogEntry {
                    host_id: host_id.to_string(),
                    timestamp: now.clone(),
                    error: error.clone(),
                });
            }
            self.persist_errors(&errors).await?;
        }

        Ok(())
    }

    /// Liste tous les hôtes connus
    pub async fn list_hosts(&self) -> Vec<HostRecord> {
        self.hosts.read().await.values().cloned().collect()
    }

    /// Récupère un hôte spécifique
    pub async fn get_host(&self, host_id: &str) -> Option<HostRecord> {
        self.hosts.read().await.get(host_id).cloned()
    }

    /// Journal d'un hôte, du plus ancien au plus récent.
    /// limit = ne garder que les N entrées les plus récentes.
    pub async fn errors_for(&self, host_id: &str, limit: Option<usize>) -> Vec<ErrorLogEntry> {
        let errors = self.errors.read().await;
        let filtered: Vec<ErrorLogEntry> = errors
            .iter()
            .filter(|e| e.host_id == host_id)
            .cloned()
            .collect();
        match limit {
            Some(n) if filtered.len() > n => filtered[filtered.len() - n..].to_vec(),
            _ => filtered,
        }
    }

    async fn persist_hosts(&self, hosts: &HostsMap) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(hosts)?;
        tokio::fs::write(&self.hosts_path, content).await?;
        Ok(())
    }

    async fn persist_errors(&self, errors: &[ErrorLogEntry]) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(errors)?;
        tokio::fs::write(&self.errors_path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CpuSample, RamSample};

    fn snapshot(usage_total: f32, log_errors: Vec<String>) -> Snapshot {
        Snapshot {
            cpu: Some(CpuSample {
                usage_per_core: vec![usage_total],
                usage_total,
                temp: None,
            }),
            ram: Some(RamSample {
                usage_percent: 60.0,
                usage_gb: 4.8,
            }),
            gpu: Vec::new(),
            log_errors,
        }
    }

    #[tokio::test]
    async fn clean_snapshot_does_not_grow_error_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.ingest("10.0.0.5", snapshot(42.0, vec![])).await.unwrap();
        assert!(store.errors_for("10.0.0.5", None).await.is_empty());
    }

    #[tokio::test]
    async fn each_error_string_becomes_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let errors = vec!["Network issue".to_string(), "Network issue".to_string()];
        store.ingest("10.0.0.9", snapshot(10.0, errors)).await.unwrap();

        let logged = store.errors_for("10.0.0.9", None).await;
        assert_eq!(logged.len(), 2);
        assert!(logged.iter().all(|e| e.host_id == "10.0.0.9"));
        // les entrées d'un même ingest partagent le même horodatage
        assert_eq!(logged[0].timestamp, logged[1].timestamp);
    }

    #[tokio::test]
    async fn last_write_wins_per_host() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.ingest("10.0.0.5", snapshot(42.0, vec![])).await.unwrap();
        store.ingest("10.0.0.5", snapshot(77.0, vec![])).await.unwrap();

        assert_eq!(store.list_hosts().await.len(), 1);
        let record = store.get_host("10.0.0.5").await.unwrap();
        assert_eq!(record.data.cpu.unwrap().usage_total, 77.0);
    }

    #[tokio::test]
    async fn distinct_hosts_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.ingest("10.0.0.5", snapshot(42.0, vec![])).await.unwrap();
        store.ingest("10.0.0.6", snapshot(13.0, vec![])).await.unwrap();

        assert_eq!(store.list_hosts().await.len(), 2);
        let a = store.get_host("10.0.0.5").await.unwrap();
        let b = store.get_host("10.0.0.6").await.unwrap();
        assert_eq!(a.data.cpu.unwrap().usage_total, 42.0);
        assert_eq!(b.data.cpu.unwrap().usage_total, 13.0);
    }

    #[tokio::test]
    async fn accepted_snapshot_is_queryable() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store.ingest("10.0.0.5", snapshot(42.0, vec![])).await.unwrap();

        let record = store.get_host("10.0.0.5").await.unwrap();
        assert_eq!(record.data.cpu.unwrap().usage_total, 42.0);
        assert_eq!(record.data.ram.unwrap().usage_percent, 60.0);
        assert!(!record.last_update.is_empty());
        assert!(store.errors_for("10.0.0.5", None).await.is_empty());
    }

    #[tokio::test]
    async fn network_issue_is_attributed_and_record_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store
            .ingest("10.0.0.9", snapshot(5.0, vec!["Network issue".to_string()]))
            .await
            .unwrap();

        let logged = store.errors_for("10.0.0.9", None).await;
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].error, "Network issue");
        assert!(store.get_host("10.0.0.9").await.is_some());
    }

    #[tokio::test]
    async fn state_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = Store::new(dir.path());
            store
                .ingest("10.0.0.5", snapshot(42.0, vec!["Network issue".to_string()]))
                .await
                .unwrap();
        }

        let reloaded = Store::new(dir.path());
        reloaded.load().await.unwrap();
        let record = reloaded.get_host("10.0.0.5").await.unwrap();
        assert_eq!(record.data.cpu.unwrap().usage_total, 42.0);
        assert_eq!(reloaded.errors_for("10.0.0.5", None).await.len(), 1);
    }

    #[tokio::test]
    async fn limit_keeps_the_most_recent_entries() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        store
            .ingest("10.0.0.9", snapshot(1.0, vec!["first".to_string()]))
            .await
            .unwrap();
        store
            .ingest("10.0.0.9", snapshot(2.0, vec!["second".to_string(), "third".to_string()]))
            .await
            .unwrap();

        let recent = store.errors_for("10.0.0.9", Some(2)).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].error, "second");
        assert_eq!(recent[1].error, "third");
    }

    #[tokio::test]
    async fn partial_payload_is_stored_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path());
        let partial: Snapshot = serde_json::from_str("{}").unwrap();
        store.ingest("10.0.0.7", partial).await.unwrap();

        let record = store.get_host("10.0.0.7").await.unwrap();
        assert!(record.data.cpu.is_none());
        assert!(record.data.ram.is_none());
        assert!(record.data.gpu.is_empty());
    }
}
