//! REST API over the room registry and the snapshot pipeline.

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::config::TrackerConfig;
use crate::error::{RegistryError, TrackerError, ValidationError};
use crate::registry::{RoomRecord, RoomRegistry};
use crate::room_handler::{fetch_room_snapshot, RoomSnapshot};
use crate::room_url::validate_room_url;
use crate::tracker_client::TrackerSource;

// ============================================================================
// STATE
// ============================================================================

/// Shared by every handler; nothing in here is mutated per request
#[derive(Clone)]
pub struct AppState {
    pub registry: RoomRegistry,
    pub source: Arc<dyn TrackerSource>,
    pub config: Arc<TrackerConfig>,
}

impl AppState {
    pub fn new(registry: RoomRegistry, source: Arc<dyn TrackerSource>, config: TrackerConfig) -> Self {
        Self {
            registry,
            source,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/archipelago-room", get(list_rooms).post(upsert_room))
        .route("/api/archipelago-room/:room_code", get(get_room).delete(delete_room))
        .route("/health", get(health_check))
        .with_state(state)
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Request body must be a JSON object with a url field.")]
    InvalidBody(#[from] JsonRejection),

    #[error("Room not found.")]
    NotFound,

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Tracker(TrackerError::InvalidTrackerUrl(_)) => StatusCode::BAD_REQUEST,
            ApiError::Tracker(TrackerError::TrackerUnreachable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Tracker(TrackerError::TrackerTimeout) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Registry(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            ApiError::Registry(e) => {
                error!("Registry failure: {}", e);
                "Internal server error.".to_string()
            }
            ApiError::InvalidBody(rejection) => {
                debug!("Rejected request body: {}", rejection.body_text());
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// HANDLERS
// ============================================================================

/// A missing or null `url` is treated like an empty one
#[derive(Debug, Deserialize)]
pub struct RoomRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// POST /api/archipelago-room
pub async fn upsert_room(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<RoomRequest>, JsonRejection>,
) -> ApiResult<Json<RoomRecord>> {
    let Json(request) = body?;
    let raw_url = request.url.unwrap_or_default();
    let tracker_url = validate_room_url(&raw_url, &state.config.submission_allow_list())?;
    let client_ip = client_ip(peer.map(|ConnectInfo(addr)| addr), &headers);

    let record = state
        .registry
        .upsert(raw_url.trim(), tracker_url.room_code(), client_ip.as_deref())
        .await?;

    info!("Registered room {} ({})", record.link, record.url);
    Ok(Json(record))
}

/// GET /api/archipelago-room/:room_code
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
) -> ApiResult<Json<RoomSnapshot>> {
    let record = state
        .registry
        .find(room_code.trim())
        .await?
        .ok_or(ApiError::NotFound)?;

    let deadline = Instant::now() + state.config.deadline;
    let snapshot = fetch_room_snapshot(
        state.source.as_ref(),
        &state.config.stored_allow_list(),
        &record,
        deadline,
    )
    .await?;

    Ok(Json(snapshot))
}

/// GET /api/archipelago-room
pub async fn list_rooms(State(state): State<AppState>) -> ApiResult<Json<Vec<RoomRecord>>> {
    Ok(Json(state.registry.list().await?))
}

/// DELETE /api/archipelago-room/:room_code
pub async fn delete_room(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
) -> ApiResult<StatusCode> {
    if state.registry.remove(room_code.trim()).await? {
        info!("Removed room {}", room_code.trim());
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Peer address first, then the first X-Forwarded-For entry.
fn client_ip(peer: Option<SocketAddr>, headers: &HeaderMap) -> Option<String> {
    if let Some(addr) = peer {
        return Some(addr.ip().to_string());
    }

    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}
