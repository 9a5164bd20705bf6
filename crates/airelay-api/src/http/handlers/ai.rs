//! Routed AI requests.
//!
//! `POST /api/v1/ai/{use_case}` always answers 200 with a [`RoutedResponse`];
//! when every provider fails the body is a synthetic answer with
//! `provider_used: "fallback"`.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use tracing::Instrument;

use airelay_observe::attrs;
use airelay_types::llm::AiRequest;
use airelay_types::routing::RoutedResponse;

use crate::http::error::AppError;
use crate::http::extractors::query::parse_use_case;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/ai/{use_case}
pub async fn route_request(
    State(state): State<AppState>,
    Path(use_case): Path<String>,
    Json(body): Json<AiRequest>,
) -> Result<Json<ApiResponse<RoutedResponse>>, AppError> {
    let start = Instant::now();
    let use_case = parse_use_case(Some(&use_case))?.unwrap_or_default();

    if body.last_user_text().trim().is_empty() {
        return Err(AppError::Validation(
            "request must contain a non-empty user message".to_string(),
        ));
    }

    let span = tracing::info_span!(
        "route",
        gen_ai.operation.name = attrs::OP_ROUTE,
        gen_ai.provider.name = tracing::field::Empty,
        gen_ai.response.model = tracing::field::Empty,
        airelay.use_case = %use_case,
        airelay.attempts = tracing::field::Empty,
        airelay.fallback = tracing::field::Empty,
    );

    let response = state
        .router
        .route(use_case, &body)
        .instrument(span.clone())
        .await;

    span.record(attrs::GEN_AI_PROVIDER_NAME, response.provider_used.as_str());
    if let Some(model) = &response.model {
        span.record(attrs::GEN_AI_RESPONSE_MODEL, model.as_str());
    }
    span.record(attrs::AIRELAY_ATTEMPTS, response.attempted_providers.len() as u64);
    span.record(attrs::AIRELAY_FALLBACK, response.is_fallback());

    Ok(Json(ApiResponse::timed(response, start)))
}
