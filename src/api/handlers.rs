use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::alerts::{AlertEvaluator, AlertRegistry, Notifier};
use crate::data::HistoryRange;
use crate::fetch::{CustomSourceRegistry, CustomSourceSpec, JsonPath};
use crate::hub::BroadcastHub;
use crate::scheduler::{Pipeline, Scheduler, SessionInfo, SourcePoller};
use crate::storage::{ReadingStore, StoreStats};

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn ReadingStore>,
    pub hub: Arc<BroadcastHub>,
    pub alerts: Arc<AlertEvaluator>,
    pub custom_sources: Arc<CustomSourceRegistry>,
    pub scheduler: Arc<Scheduler>,
}

impl AppState {
    /// Wire the core together. Every live session runs `pollers`.
    pub fn new(
        store: Arc<dyn ReadingStore>,
        notifier: Arc<dyn Notifier>,
        custom_sources: Arc<CustomSourceRegistry>,
        pollers: Vec<SourcePoller>,
    ) -> Self {
        let hub = Arc::new(BroadcastHub::default());
        let alerts = Arc::new(AlertEvaluator::new(
            Arc::new(AlertRegistry::new()),
            notifier,
            Arc::clone(&hub),
        ));
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&store),
            Arc::clone(&alerts),
            Arc::clone(&hub),
        ));

        let scheduler = pollers
            .into_iter()
            .fold(Scheduler::new(pipeline), |scheduler, poller| {
                scheduler.with_poller(poller.fetcher, poller.interval)
            });

        Self {
            store,
            hub,
            alerts,
            custom_sources,
            scheduler: Arc::new(scheduler),
        }
    }
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Custom Sources
// ============================================================================

/// Every field is optional here so a missing one is reported as 400
#[derive(Debug, Default, Deserialize)]
pub struct RegisterApiRequest {
    pub source: Option<String>,
    pub symbol: Option<String>,
    pub url: Option<String>,
    pub path: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterApiResponse {
    pub success: bool,
}

fn required(name: &str, value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing field '{}'", name)))
}

impl RegisterApiRequest {
    /// Validate into a custom source without touching any state
    pub fn into_spec(self) -> Result<CustomSourceSpec, ApiError> {
        let source = required("source", self.source)?;
        let symbol = required("symbol", self.symbol)?;
        let url = required("url", self.url)?;
        let path = required("path", self.path)?;

        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| ApiError::BadRequest(format!("Invalid url '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::BadRequest(format!(
                "Unsupported url scheme '{}'",
                parsed.scheme()
            )));
        }

        let json_path = JsonPath::parse(&path).map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(CustomSourceSpec::new(source, symbol, url, json_path))
    }
}

/// The body is read as raw bytes so every malformed registration, whatever
/// its content type or field types, is answered with 400
pub async fn register_api(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<RegisterApiResponse>, ApiError> {
    let request: RegisterApiRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid registration body: {}", e)))?;
    let spec = request.into_spec()?;
    state.custom_sources.register(spec);

    Ok(Json(RegisterApiResponse { success: true }))
}

pub async fn list_custom_sources(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<CustomSourceSpec>> {
    Json(state.custom_sources.snapshot())
}

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    pub range: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Path((source, symbol)): Path<(String, String)>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<HistoryPoint>>, ApiError> {
    let range = HistoryRange::parse(params.range.as_deref());

    let readings = state
        .store
        .query(&source, &symbol, range)
        .await
        .map_err(|e| {
            tracing::error!(
                source = %source,
                symbol = %symbol,
                range = %range,
                error = %e,
                "History query failed"
            );
            ApiError::Internal(e.to_string())
        })?;

    let points = readings
        .into_iter()
        .map(|r| HistoryPoint {
            value: r.value,
            timestamp: r.observed_at,
        })
        .collect();

    Ok(Json(points))
}

// ============================================================================
// Stats
// ============================================================================

#[derive(Serialize)]
pub struct StatsResponse {
    pub sessions: usize,
    pub active_sessions: Vec<SessionInfo>,
    pub viewers: usize,
    pub pending_alerts: usize,
    pub custom_sources: usize,
    pub events_published: u64,
    pub store: Option<StoreStats>,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        sessions: state.scheduler.session_count(),
        active_sessions: state.scheduler.active_sessions(),
        viewers: state.hub.subscriber_count(),
        pending_alerts: state.alerts.registry().pending_count(),
        custom_sources: state.custom_sources.len(),
        events_published: state.hub.published_count(),
        store: state.store.stats(),
    })
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
