//! Provider CRUD, reorder and connection-test handlers.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use airelay_observe::attrs;
use airelay_types::health::{ProbeOutcome, ProviderState};
use airelay_types::provider::{
    CreateProviderRequest, ProviderId, ProviderView, UpdateProviderRequest,
};

use crate::http::error::AppError;
use crate::http::extractors::query::{ProviderListQuery, parse_use_case};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Body of `POST /providers/reorder`.
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<ProviderId>,
}

/// Result of a connection test together with the state it produced.
#[derive(Debug, Serialize)]
pub struct TestResult {
    #[serde(flatten)]
    pub outcome: ProbeOutcome,
    pub state: ProviderState,
}

fn parse_id(raw: &str) -> Result<ProviderId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("invalid provider id: '{raw}'")))
}

/// GET /api/v1/providers - List providers in chain order.
///
/// Without `use_case` every provider is listed, disabled ones included.
pub async fn list_providers(
    State(state): State<AppState>,
    Query(query): Query<ProviderListQuery>,
) -> Result<Json<ApiResponse<Vec<ProviderView>>>, AppError> {
    let start = Instant::now();

    let providers = match parse_use_case(query.use_case.as_deref())? {
        Some(use_case) => state.registry.list(Some(use_case)),
        None => state.registry.list_all(),
    };
    Ok(Json(
        ApiResponse::timed(providers, start).with_link("self", "/api/v1/providers"),
    ))
}

/// POST /api/v1/providers - Register a provider.
pub async fn create_provider(
    State(state): State<AppState>,
    Json(body): Json<CreateProviderRequest>,
) -> Result<Json<ApiResponse<ProviderView>>, AppError> {
    let start = Instant::now();

    let view = state.registry.create(body).await?;
    let self_link = format!("/api/v1/providers/{}", view.id);
    let test_link = format!("{self_link}/test");

    Ok(Json(
        ApiResponse::timed(view, start)
            .with_link("self", &self_link)
            .with_link("test", &test_link),
    ))
}

/// GET /api/v1/providers/{id}
pub async fn get_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProviderView>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;

    let view = state.registry.get(&id)?;
    Ok(Json(
        ApiResponse::timed(view, start).with_link("self", &format!("/api/v1/providers/{id}")),
    ))
}

/// PUT /api/v1/providers/{id} - Merge the supplied fields.
pub async fn update_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateProviderRequest>,
) -> Result<Json<ApiResponse<ProviderView>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;

    let view = state.registry.update(&id, body).await?;
    Ok(Json(ApiResponse::timed(view, start)))
}

/// DELETE /api/v1/providers/{id}
pub async fn delete_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;

    state.registry.delete(&id).await?;
    Ok(Json(ApiResponse::timed(
        serde_json::json!({"deleted": true, "id": id}),
        start,
    )))
}

/// POST /api/v1/providers/reorder - Assign priorities 1..n in the given order.
pub async fn reorder_providers(
    State(state): State<AppState>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<Vec<ProviderView>>>, AppError> {
    let start = Instant::now();

    let providers = state.registry.reorder(&body.ids).await?;
    Ok(Json(ApiResponse::timed(providers, start)))
}

/// POST /api/v1/providers/{id}/test - Probe one provider now.
///
/// A failed probe is still a successful request; the outcome carries the
/// classified error.
pub async fn test_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TestResult>>, AppError> {
    let start = Instant::now();
    let id = parse_id(&id)?;

    let span = tracing::info_span!(
        "probe",
        gen_ai.operation.name = attrs::OP_PROBE,
        gen_ai.provider.name = tracing::field::Empty,
    );
    if let Ok(provider) = state.registry.get(&id) {
        span.record(attrs::GEN_AI_PROVIDER_NAME, provider.name.as_str());
    }

    let outcome = state
        .registry
        .test_connection(&id, state.client.as_ref(), &state.monitor)
        .instrument(span)
        .await?;

    let result = TestResult {
        outcome,
        state: state.monitor.current_status(&id),
    };
    Ok(Json(ApiResponse::timed(result, start)))
}
