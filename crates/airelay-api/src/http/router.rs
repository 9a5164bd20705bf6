//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing, gzip compression.

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Provider registry
        .route(
            "/providers",
            get(handlers::providers::list_providers).post(handlers::providers::create_provider),
        )
        .route(
            "/providers/reorder",
            post(handlers::providers::reorder_providers),
        )
        .route(
            "/providers/{id}",
            get(handlers::providers::get_provider)
                .put(handlers::providers::update_provider)
                .delete(handlers::providers::delete_provider),
        )
        .route(
            "/providers/{id}/test",
            post(handlers::providers::test_provider),
        )
        // Runtime settings
        .route(
            "/settings/chatbot",
            get(handlers::settings::get_chatbot_config)
                .put(handlers::settings::replace_chatbot_config),
        )
        .route(
            "/settings/routing",
            get(handlers::settings::get_routing_settings)
                .put(handlers::settings::replace_routing_settings),
        )
        // Health and reporting
        .route("/status", get(handlers::status::get_status))
        .route("/health/history", get(handlers::status::get_history))
        .route("/health/sweep", post(handlers::status::run_sweep))
        .route("/audit", get(handlers::status::get_audit_log))
        // Routed AI requests
        .route("/ai/{use_case}", post(handlers::ai::route_request));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness check for the server process itself.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
