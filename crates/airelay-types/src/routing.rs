//! Router output types.

use serde::{Deserialize, Serialize};

use std::fmt;

use crate::provider::ProviderId;

/// `provider_used` value when the answer came from the synthetic generator.
pub const FALLBACK_PROVIDER: &str = "fallback";

/// Keyword category detected in a request that no provider could answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackCategory {
    Pricing,
    Surveillance,
    AccessControl,
    Compliance,
    Timeline,
    Technical,
    GettingStarted,
    General,
}

impl fmt::Display for FallbackCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FallbackCategory::Pricing => "pricing",
            FallbackCategory::Surveillance => "surveillance",
            FallbackCategory::AccessControl => "access-control",
            FallbackCategory::Compliance => "compliance",
            FallbackCategory::Timeline => "timeline",
            FallbackCategory::Technical => "technical",
            FallbackCategory::GettingStarted => "getting-started",
            FallbackCategory::General => "general",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Success,
    Failed,
}

/// One provider tried while serving a request.
///
/// Carries no failure detail: upstream error text stays in the health
/// history and the logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub outcome: AttemptOutcome,
    pub latency_ms: u64,
}

/// Answer to a routed request.
///
/// `provider_used` is the serving provider's name, or [`FALLBACK_PROVIDER`]
/// when every candidate failed. Both cases carry plain text in `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedResponse {
    pub text: String,
    pub provider_used: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub attempted_providers: Vec<AttemptRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_category: Option<FallbackCategory>,
}

impl RoutedResponse {
    pub fn is_fallback(&self) -> bool {
        self.provider_id.is_none()
    }

    pub fn failed_attempts(&self) -> usize {
        self.attempted_providers
            .iter()
            .filter(|a| a.outcome == AttemptOutcome::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_attempts_counts_only_failures() {
        let attempt = |outcome| AttemptRecord {
            provider_id: ProviderId::new(),
            provider_name: "p".to_string(),
            outcome,
            latency_ms: 10,
        };
        let resp = RoutedResponse {
            text: "ok".to_string(),
            provider_used: "p".to_string(),
            provider_id: Some(ProviderId::new()),
            model: None,
            attempted_providers: vec![
                attempt(AttemptOutcome::Failed),
                attempt(AttemptOutcome::Failed),
                attempt(AttemptOutcome::Success),
            ],
            fallback_category: None,
        };
        assert_eq!(resp.failed_attempts(), 2);
        assert!(!resp.is_fallback());
    }

    #[test]
    fn test_category_display_matches_serde() {
        let json = serde_json::to_string(&FallbackCategory::AccessControl).unwrap();
        assert_eq!(json, format!("\"{}\"", FallbackCategory::AccessControl));
    }
}
