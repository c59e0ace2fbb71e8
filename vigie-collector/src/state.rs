use parking_lot::Mutex;
use std::sync::Arc;

use crate::config::CollectorConfig;

/// Config partagée entre le bootstrap et les handlers HTTP.
pub type SharedConfig = Arc<Mutex<CollectorConfig>>;

pub fn shared_config(cfg: CollectorConfig) -> SharedConfig {
    Arc::new(Mutex::new(cfg))
}
