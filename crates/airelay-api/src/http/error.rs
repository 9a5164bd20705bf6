//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use airelay_types::error::{RegistryError, RepositoryError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Registry validation and lookup failures.
    Registry(RegistryError),
    /// Persistence failures on read paths (history, audit).
    Repository(RepositoryError),
    /// Malformed path or query input.
    Validation(String),
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        AppError::Registry(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Repository(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Registry(RegistryError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Registry(RegistryError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "PROVIDER_NOT_FOUND",
                format!("Provider {id} not found"),
            ),
            AppError::Repository(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use airelay_types::provider::ProviderId;

    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation = AppError::from(RegistryError::Validation("name is required".to_string()));
        assert_eq!(validation.parts().0, StatusCode::BAD_REQUEST);

        let missing = AppError::from(RegistryError::NotFound(ProviderId::new()));
        let (status, code, _) = missing.parts();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "PROVIDER_NOT_FOUND");

        let storage = AppError::from(RepositoryError::Query("locked".to_string()));
        assert_eq!(storage.parts().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
