use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use quarry_core::{GateStatus, PoolStatus, SchedulerStatus};

use crate::metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Scheduler, gate and worker pool at a glance.
#[derive(Serialize)]
pub struct StatusResponse {
    /// `None` when scheduling is disabled or no source is configured.
    pub scheduler: Option<SchedulerStatus>,
    pub gate: GateStatus,
    pub pool: PoolStatus,
    pub campaigns: i64,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let campaigns = state.campaigns().count().map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    })?;

    let scheduler = match state.scheduler() {
        Some(scheduler) => Some(scheduler.status().await),
        None => None,
    };

    Ok(Json(StatusResponse {
        scheduler,
        gate: state.gate().status().await,
        pool: state.pool().status(),
        campaigns,
    }))
}

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    metrics::collect_dynamic_metrics(&state).await;
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::encode_metrics(),
    )
}
