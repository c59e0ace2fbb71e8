/**
 * VIGIE COLLECTOR - Point d'entrée du collecteur central
 *
 * RÔLE : Ingestion des snapshots de télémétrie poussés par les agents et
 * service de l'état agrégé (dernier snapshot par hôte + journal d'erreurs).
 *
 * ARCHITECTURE : API REST Axum + store injecté (deux tables verrouillées,
 * persistance JSON intégrale). L'identité d'un hôte vient de l'adresse
 * source TCP de sa connexion, jamais du payload.
 */

mod config;
mod http;
mod models;
mod state;
mod store;

use crate::config::load_config;
use crate::http::AppState;
use crate::state::shared_config;
use crate::store::Store;

use anyhow::Context;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas

    let cfg_loaded = load_config().await;

    std::fs::create_dir_all(&cfg_loaded.data_dir).unwrap_or_else(|e| {
        eprintln!("[collector] warning: failed to create data dir: {}", e);
    });

    // Store injecté dans les handlers, rechargé depuis le disque au démarrage
    let store = Arc::new(Store::new(Path::new(&cfg_loaded.data_dir)));
    if let Err(e) = store.load().await {
        eprintln!("[collector] failed to load persisted state: {}", e);
    }

    let addr: SocketAddr = cfg_loaded
        .listen_addr
        .parse()
        .with_context(|| format!("invalid listen_addr: {}", cfg_loaded.listen_addr))?;

    let cfg = shared_config(cfg_loaded);
    let app = http::build_router(AppState { store, cfg });

    println!("[collector] listening on http://{addr}");
    let listener = TcpListener::bind(addr).await.context("bind listener")?;
    // into_make_service_with_connect_info expose l'adresse source aux handlers
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("serve")?;
    Ok(())
}
