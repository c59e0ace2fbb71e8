/**
 * API REST VIGIE - Serveur HTTP du collecteur
 *
 * RÔLE :
 * Ce module expose le point d'ingestion des agents et l'API de consultation
 * consommée par le dashboard.
 *
 * FONCTIONNEMENT :
 * - POST /agent-data : réception d'un snapshot, hôte identifié par
 *   l'adresse source de la connexion (ConnectInfo), jamais par le payload
 * - GET /hosts, /hosts/{id}, /hosts/{id}/errors : projections en lecture
 *   seule sur le dernier état persisté
 * - Sérialisation JSON automatique des réponses
 * - Gestion erreurs HTTP standardisée (404, 500)
 *
 * UTILITÉ DANS VIGIE :
 * 🎯 Seule porte d'entrée des données : tout snapshot passe par ici
 * 🎯 Dashboard web : liste des hôtes, détail, journal filtré par hôte
 */

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::models::{ErrorLogEntry, HostRecord, Snapshot};
use crate::state::SharedConfig;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub cfg: SharedConfig,
}

#[derive(serde::Serialize)]
struct HostView {
    host_id: String,
    last_update: String,     // format RFC3339 pour l'API
    stale: bool,             // true si plus vieux que stale_after_secs
    stale_for_seconds: i64,  // âge en secondes
    data: Snapshot,
}

fn to_view(h: &HostRecord, stale_after_secs: i64) -> HostView {
    let now = OffsetDateTime::now_utc();
    let age = OffsetDateTime::parse(&h.last_update, &Rfc3339)
        .map(|t| now - t)
        .unwrap_or(Duration::ZERO);
    let secs = age.whole_seconds().max(0);
    HostView {
        host_id: h.host_id.clone(),
        last_update: h.last_update.clone(),
        stale: age > Duration::seconds(stale_after_secs),
        stale_for_seconds: secs,
        data: h.data.clone(),
    }
}

#[derive(Debug, Deserialize)]
struct ErrorsParams {
    limit: Option<usize>,
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/agent-data", post(ingest))
        .route("/hosts", get(get_hosts))
        .route("/hosts/{id}", get(get_host))
        .route("/hosts/{id}/errors", get(get_host_errors))
        .with_state(app_state)
}

// POST /agent-data (ingestion d'un snapshot agent)
async fn ingest(
    State(app): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(snapshot): Json<Snapshot>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let host_id = addr.ip().to_string();
    match app.store.ingest(&host_id, snapshot).await {
        Ok(()) => Ok(Json(serde_json::json!({ "status": "success" }))),
        Err(e) => {
            eprintln!("[collector] ingest from {host_id} failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// GET /hosts (liste)
async fn get_hosts(State(app): State<AppState>) -> Json<Vec<HostView>> {
    let stale_after_secs = app.cfg.lock().stale_after_secs;
    let list: Vec<HostView> = app
        .store
        .list_hosts()
        .await
        .iter()
        .map(|h| to_view(h, stale_after_secs))
        .collect();
    Json(list)
}

// GET /hosts/{id} (détail)
async fn get_host(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HostView>, StatusCode> {
    let stale_after_secs = app.cfg.lock().stale_after_secs;
    let Some(h) = app.store.get_host(&id).await else {
        return Err(StatusCode::NOT_FOUND);
    };
    Ok(Json(to_view(&h, stale_after_secs)))
}

// GET /hosts/{id}/errors?limit=N (journal filtré, N dernières entrées)
async fn get_host_errors(
    State(app): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ErrorsParams>,
) -> Result<Json<Vec<ErrorLogEntry>>, StatusCode> {
    if app.store.get_host(&id).await.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(app.store.errors_for(&id, params.limit).await))
}
