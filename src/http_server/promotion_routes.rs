//! Promotion HTTP Routes
//!
//! Administrator endpoints for previewing and triggering promotion cycles.
//! Cycles run on the blocking pool; a handler never holds the async runtime
//! while the store is being written.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::lifecycle::{
    CycleError, CyclePreview, CycleReport, CycleResult, PromotionCycleOrchestrator,
    PromotionCycleRequest,
};
use crate::observability::{Logger, MetricsSnapshot};

// ==================
// Shared State
// ==================

/// Promotion state shared across handlers
pub struct PromotionState {
    orchestrator: Arc<PromotionCycleOrchestrator>,
    default_max_ordinal: u32,
}

impl PromotionState {
    pub fn new(orchestrator: Arc<PromotionCycleOrchestrator>, default_max_ordinal: u32) -> Self {
        Self {
            orchestrator,
            default_max_ordinal,
        }
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub max_ordinal: Option<u32>,
}

/// Body of `POST /promotion/cycle`
#[derive(Debug, Deserialize)]
pub struct TriggerCycleRequest {
    #[serde(default)]
    pub max_ordinal: Option<u32>,
    #[serde(default)]
    pub confirm_graduation: bool,
    #[serde(default)]
    pub operator: Option<String>,
}

/// Body of `POST /promotion/cycle/rerun`
#[derive(Debug, Default, Deserialize)]
pub struct RerunCycleRequest {
    #[serde(default)]
    pub confirm_graduation: bool,
    #[serde(default)]
    pub operator: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn status_for(err: &CycleError) -> StatusCode {
    match err {
        CycleError::ConcurrentCycleRejected => StatusCode::CONFLICT,
        CycleError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        CycleError::PlanningFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CycleError::SnapshotFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        CycleError::ForbiddenTransition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn cycle_error(err: CycleError) -> ApiError {
    (
        status_for(&err),
        Json(ErrorResponse {
            error: err.to_string(),
            code: err.code().to_string(),
        }),
    )
}

/// Run store work on the blocking pool.
async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> CycleResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(cycle_error),
        Err(e) => {
            Logger::error("PROMOTION_TASK_FAILED", &[("error", e.to_string().as_str())]);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "promotion task failed".to_string(),
                    code: "INTERNAL".to_string(),
                }),
            ))
        }
    }
}

// ==================
// Promotion Routes
// ==================

/// Create promotion routes
pub fn promotion_routes(state: Arc<PromotionState>) -> Router {
    Router::new()
        .route("/preview", get(preview_handler))
        .route("/cycle", post(trigger_cycle_handler))
        .route("/cycle/rerun", post(rerun_cycle_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn preview_handler(
    State(state): State<Arc<PromotionState>>,
    Query(query): Query<PreviewQuery>,
) -> Result<Json<CyclePreview>, ApiError> {
    let max_ordinal = query.max_ordinal.unwrap_or(state.default_max_ordinal);
    let orchestrator = state.orchestrator.clone();
    let preview = run_blocking(move || orchestrator.preview(max_ordinal)).await?;
    Ok(Json(preview))
}

async fn trigger_cycle_handler(
    State(state): State<Arc<PromotionState>>,
    Json(body): Json<TriggerCycleRequest>,
) -> Result<Json<CycleReport>, ApiError> {
    let mut request = PromotionCycleRequest::new(body.max_ordinal.unwrap_or(state.default_max_ordinal))
        .with_confirmation(body.confirm_graduation);
    if let Some(operator) = body.operator {
        request = request.with_operator(operator);
    }

    let orchestrator = state.orchestrator.clone();
    let report = run_blocking(move || orchestrator.run(&request)).await?;
    Ok(Json(report))
}

async fn rerun_cycle_handler(
    State(state): State<Arc<PromotionState>>,
    Json(body): Json<RerunCycleRequest>,
) -> Result<Json<CycleReport>, ApiError> {
    let orchestrator = state.orchestrator.clone();
    let report = run_blocking(move || {
        orchestrator.rerun_last(body.confirm_graduation, body.operator)
    })
    .await?;
    Ok(Json(report))
}

async fn metrics_handler(State(state): State<Arc<PromotionState>>) -> Json<MetricsSnapshot> {
    Json(state.orchestrator.metrics().snapshot())
}
