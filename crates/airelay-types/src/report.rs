//! Read-only status document consumed by dashboards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::health::{ProviderState, SystemStatus};
use crate::provider::{ProviderFamily, ProviderId, UseCase};

/// Latest known health of one enabled provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStatusEntry {
    pub id: ProviderId,
    pub name: String,
    pub family: ProviderFamily,
    pub model: String,
    pub priority: u32,
    pub use_case: UseCase,
    pub state: ProviderState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Share of successful results for this provider in the retained history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_rate: Option<f64>,
}

/// A position in the failover chain, annotated with live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    pub position: usize,
    pub id: ProviderId,
    pub name: String,
    pub priority: u32,
    pub state: ProviderState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub offline: usize,
    pub unknown: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: SystemStatus,
    pub use_case: UseCase,
    pub providers: Vec<ProviderStatusEntry>,
    /// The order a new request for `use_case` would try providers in right now.
    pub failover_chain: Vec<ChainEntry>,
    pub counts: StatusCounts,
    /// First provider in the chain that is not down.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_provider: Option<String>,
    pub fallbacks_available: usize,
    pub all_down: bool,
    pub generated_at: DateTime<Utc>,
}
