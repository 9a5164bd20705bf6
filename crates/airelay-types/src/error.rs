use thiserror::Error;

use crate::provider::ProviderId;

/// Errors returned to administrative callers of the provider registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("provider not found: {0}")]
    NotFound(ProviderId),
}

/// Internal router signal. Converted into a synthetic response, never surfaced.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("all providers exhausted after {attempted} attempt(s)")]
    AllProvidersExhausted { attempted: usize },
}

/// Errors from repository operations (used by trait definitions in airelay-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("credential encryption error")]
    Encryption,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::Validation("endpoint is required".to_string());
        assert_eq!(err.to_string(), "validation error: endpoint is required");
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_router_error_display() {
        let err = RouterError::AllProvidersExhausted { attempted: 3 };
        assert!(err.to_string().contains("3 attempt"));
    }
}
