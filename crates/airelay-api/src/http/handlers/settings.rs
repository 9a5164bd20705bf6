//! Chatbot configuration and routing settings handlers.
//!
//! Both documents are replaced whole on PUT.

use std::time::Instant;

use axum::Json;
use axum::extract::State;

use airelay_types::settings::{ChatbotConfig, RoutingSettings};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/settings/chatbot
pub async fn get_chatbot_config(
    State(state): State<AppState>,
) -> Json<ApiResponse<ChatbotConfig>> {
    let start = Instant::now();
    Json(ApiResponse::timed(state.registry.chatbot_config(), start))
}

/// PUT /api/v1/settings/chatbot
pub async fn replace_chatbot_config(
    State(state): State<AppState>,
    Json(body): Json<ChatbotConfig>,
) -> Result<Json<ApiResponse<ChatbotConfig>>, AppError> {
    let start = Instant::now();
    let config = state.registry.replace_chatbot_config(body).await?;
    Ok(Json(ApiResponse::timed(config, start)))
}

/// GET /api/v1/settings/routing
pub async fn get_routing_settings(
    State(state): State<AppState>,
) -> Json<ApiResponse<RoutingSettings>> {
    let start = Instant::now();
    Json(ApiResponse::timed(state.registry.settings(), start))
}

/// PUT /api/v1/settings/routing
pub async fn replace_routing_settings(
    State(state): State<AppState>,
    Json(body): Json<RoutingSettings>,
) -> Result<Json<ApiResponse<RoutingSettings>>, AppError> {
    let start = Instant::now();
    let settings = state.registry.replace_settings(body).await?;
    Ok(Json(ApiResponse::timed(settings, start)))
}
