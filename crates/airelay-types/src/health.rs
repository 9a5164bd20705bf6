//! Health check results and derived health states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::provider::ProviderId;

/// Classification carried by a single health check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Down => write!(f, "down"),
        }
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "healthy" => Ok(HealthStatus::Healthy),
            "degraded" => Ok(HealthStatus::Degraded),
            "down" => Ok(HealthStatus::Down),
            other => Err(format!("invalid health status: '{other}'")),
        }
    }
}

/// Live state of a provider as derived by the health monitor.
///
/// `Unknown` until the first result is recorded. There is no decay back to
/// `Unknown`; only a new result changes the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderState {
    #[default]
    Unknown,
    Healthy,
    Degraded,
    Down,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderState::Unknown => write!(f, "unknown"),
            ProviderState::Healthy => write!(f, "healthy"),
            ProviderState::Degraded => write!(f, "degraded"),
            ProviderState::Down => write!(f, "down"),
        }
    }
}

/// Aggregate classification over all enabled providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemStatus {
    Healthy,
    Degraded,
    Critical,
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemStatus::Healthy => write!(f, "healthy"),
            SystemStatus::Degraded => write!(f, "degraded"),
            SystemStatus::Critical => write!(f, "critical"),
        }
    }
}

/// Where a health check result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckSource {
    /// A connection test or scheduled sweep.
    Probe,
    /// A real routed request.
    Traffic,
}

impl fmt::Display for CheckSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckSource::Probe => write!(f, "probe"),
            CheckSource::Traffic => write!(f, "traffic"),
        }
    }
}

impl FromStr for CheckSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "probe" => Ok(CheckSource::Probe),
            "traffic" => Ok(CheckSource::Traffic),
            other => Err(format!("invalid check source: '{other}'")),
        }
    }
}

/// Outcome of a single bounded call against a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub success: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn succeeded(latency_ms: u64) -> Self {
        Self {
            success: true,
            latency_ms,
            error: None,
        }
    }

    pub fn failed(latency_ms: u64, error: impl Into<String>) -> Self {
        Self {
            success: false,
            latency_ms,
            error: Some(error.into()),
        }
    }
}

/// One recorded health observation. Immutable once written.
///
/// Carries either `response_time_ms` (success) or `error` (failure), never both.
/// Construct through [`HealthCheckResult::success`] or [`HealthCheckResult::failure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub id: Uuid,
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub source: CheckSource,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheckResult {
    /// A successful observation. `slow` marks it degraded instead of healthy.
    pub fn success(
        provider_id: ProviderId,
        provider_name: impl Into<String>,
        response_time_ms: u64,
        slow: bool,
        source: CheckSource,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            provider_id,
            provider_name: provider_name.into(),
            status: if slow {
                HealthStatus::Degraded
            } else {
                HealthStatus::Healthy
            },
            response_time_ms: Some(response_time_ms),
            error: None,
            source,
            checked_at: Utc::now(),
        }
    }

    pub fn failure(
        provider_id: ProviderId,
        provider_name: impl Into<String>,
        error: impl Into<String>,
        source: CheckSource,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            provider_id,
            provider_name: provider_name.into(),
            status: HealthStatus::Down,
            response_time_ms: None,
            error: Some(error.into()),
            source,
            checked_at: Utc::now(),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status != HealthStatus::Down
    }
}
