use axum::{
    extract::{rejection::PathRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::constants::VERSION;
use crate::import::{self, ImportError};
use crate::nation::Nation;
use crate::snapshot::{Snapshot, SnapshotStore};
use crate::stagger::{compute_eligibility, StaggerEligibility, StaggerError, StaggerOptions};

pub struct AppState {
    pub config: AppConfig,
    pub store: SnapshotStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let store = SnapshotStore::new(config.snapshot_ttl_secs);
        Arc::new(AppState { config, store })
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("no statistics snapshot loaded yet")]
    NoSnapshot,
    #[error("stagger computation failed: {0}")]
    Stagger(#[from] StaggerError),
    #[error("import failed: {0}")]
    Import(#[from] ImportError),
}

impl From<PathRejection> for ApiError {
    fn from(err: PathRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NoSnapshot => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Stagger(_) | ApiError::Import(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("❌ {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub service: String,
    pub version: String,
    pub snapshot_loaded: bool,
    pub nations: usize,
    pub wars: usize,
    pub active_wars: usize,
    pub snapshot_age_secs: Option<u64>,
    pub stale: bool,
    pub ttl_secs: u64,
    pub timestamp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllianceMember {
    #[serde(flatten)]
    pub nation: Nation,
    pub attacking_wars: u32,
    pub defending_wars: u32,
    pub open_war_slots: u32,
}

async fn require_snapshot(state: &AppState) -> Result<Arc<Snapshot>, ApiError> {
    state.store.current().await.ok_or(ApiError::NoSnapshot)
}

pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    let now = chrono::Utc::now();
    let snapshot = state.store.current().await;
    Json(ServiceStatus {
        service: crate::constants::SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
        snapshot_loaded: snapshot.is_some(),
        nations: snapshot.as_ref().map(|s| s.nations.len()).unwrap_or(0),
        wars: snapshot.as_ref().map(|s| s.wars.len()).unwrap_or(0),
        active_wars: snapshot.as_ref().map(|s| s.active_war_count()).unwrap_or(0),
        snapshot_age_secs: state.store.age_secs(now).await,
        stale: state.store.is_stale(now).await,
        ttl_secs: state.store.ttl_secs(),
        timestamp: now.to_rfc3339(),
    })
}

pub async fn alliance_nations_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Vec<AllianceMember>>, ApiError> {
    let Path(alliance_id) = path?;
    let snapshot = require_snapshot(&state).await?;
    let counts = snapshot.war_counts();

    let mut members: Vec<AllianceMember> = snapshot
        .alliance_nations(alliance_id)
        .into_iter()
        .map(|n| AllianceMember {
            attacking_wars: counts.attacking(n.id),
            defending_wars: counts.defending(n.id),
            open_war_slots: counts.open_slots(n.id),
            nation: n.clone(),
        })
        .collect();
    members.sort_by(|a, b| b.nation.strength.total_cmp(&a.nation.strength));
    Ok(Json(members))
}

pub async fn stagger_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(u64, u64)>, PathRejection>,
    query: Result<Query<StaggerOptions>, QueryRejection>,
) -> Result<Json<Vec<StaggerEligibility>>, ApiError> {
    let Path((attacking, defending)) = path?;
    let Query(options) = query?;

    if attacking == defending {
        return Err(ApiError::BadRequest(
            "attacking and defending alliance must differ".into(),
        ));
    }
    if !options.military_ns.is_finite() {
        return Err(ApiError::BadRequest("militaryNS must be a finite number".into()));
    }

    let snapshot = require_snapshot(&state).await?;
    let results = compute_eligibility(
        attacking,
        defending,
        &snapshot.nations,
        &snapshot.wars,
        &options,
    )?;
    log::info!(
        "stagger {} → {}: {} targets",
        attacking,
        defending,
        results.len()
    );
    Ok(Json(results))
}

pub async fn reload_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = import::load_snapshot(&state.config.sources).await?;
    let nations = snapshot.nations.len();
    let wars = snapshot.wars.len();
    state.store.replace(snapshot).await;
    log::info!("🔄 Snapshot reloaded: {} nations, {} wars", nations, wars);
    Ok(Json(json!({ "nations": nations, "wars": wars })))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/status", get(status_handler))
        .route("/v1/alliances/:id/nations", get(alliance_nations_handler))
        .route("/v1/stagger/:attacking/:defending", get(stagger_handler))
        .route("/v1/snapshot/reload", post(reload_handler))
        .with_state(state)
}
