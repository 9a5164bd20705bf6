//! Status report, health history, on-demand sweep and audit log handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};

use airelay_core::health::sweeper::flush_history;
use airelay_core::service::report::status_report;
use airelay_types::audit::AuditEvent;
use airelay_types::health::HealthCheckResult;
use airelay_types::report::StatusReport;

use crate::http::error::AppError;
use crate::http::extractors::query::{LimitQuery, StatusQuery, parse_use_case};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/status - Dashboard report. Read-only, never probes.
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<StatusReport>>, AppError> {
    let start = Instant::now();
    let use_case = parse_use_case(query.use_case.as_deref())?.unwrap_or_default();

    let report = status_report(state.registry.as_ref(), &state.monitor, use_case);
    Ok(Json(
        ApiResponse::timed(report, start)
            .with_link("self", "/api/v1/status")
            .with_link("history", "/api/v1/health/history"),
    ))
}

/// GET /api/v1/health/history - The newest `limit` results, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Json<ApiResponse<Vec<HealthCheckResult>>> {
    let start = Instant::now();
    Json(ApiResponse::timed(state.monitor.history(query.limit), start))
}

/// POST /api/v1/health/sweep - Probe every enabled provider now.
pub async fn run_sweep(State(state): State<AppState>) -> Json<ApiResponse<Vec<HealthCheckResult>>> {
    let start = Instant::now();

    let providers = state.registry.enabled();
    let results = state
        .monitor
        .run_sweep(state.client.as_ref(), &providers)
        .await;
    flush_history(&state.monitor, state.history.as_ref()).await;

    Json(ApiResponse::timed(results, start))
}

/// GET /api/v1/audit - Recent registry mutations, newest first.
pub async fn get_audit_log(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<AuditEvent>>>, AppError> {
    let start = Instant::now();
    let events = state.audit.recent(query.limit as i64).await?;
    Ok(Json(ApiResponse::timed(events, start)))
}
