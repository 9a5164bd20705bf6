//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use airelay_types::provider::UseCase;

use crate::http::error::AppError;

/// Query parameters for the provider list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct ProviderListQuery {
    /// Only enabled providers tagged with this use case.
    pub use_case: Option<String>,
}

/// Query parameters for the status report.
#[derive(Debug, Deserialize, Default)]
pub struct StatusQuery {
    /// Use case whose failover chain is reported (default: general).
    pub use_case: Option<String>,
}

/// Query parameters for history-style endpoints.
#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for LimitQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    50
}

/// Parse an optional use-case string, mapping errors to a 400.
pub fn parse_use_case(value: Option<&str>) -> Result<Option<UseCase>, AppError> {
    value
        .map(|s| s.parse::<UseCase>().map_err(AppError::Validation))
        .transpose()
}
