//! Provider health monitor.
//!
//! Keeps a bounded ring of the most recent health check results and the
//! derived state of every provider that has ever been observed. Results
//! arrive from connection tests, scheduled sweeps and live traffic; all of
//! them go through [`HealthMonitor::record`], which updates the ring and
//! the provider's state together under one write lock.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use futures_util::future::join_all;

use airelay_types::config::HealthConfig;
use airelay_types::health::{
    CheckSource, HealthCheckResult, HealthStatus, ProbeOutcome, ProviderState, SystemStatus,
};
use airelay_types::provider::{ProviderConfig, ProviderId};

use crate::llm::client::LlmClient;
use crate::llm::tester;

#[derive(Debug, Clone)]
struct Latest {
    state: ProviderState,
    result: HealthCheckResult,
}

#[derive(Debug, Default)]
struct MonitorState {
    ring: VecDeque<HealthCheckResult>,
    latest: HashMap<ProviderId, Latest>,
    /// Results not yet handed to the history store.
    unpersisted: Vec<HealthCheckResult>,
}

/// Thread-safe health state shared by the registry, router and sweeper.
pub struct HealthMonitor {
    state: RwLock<MonitorState>,
    slow_threshold_ms: u64,
    min_success_rate: f64,
    capacity: usize,
}

impl HealthMonitor {
    pub fn new(config: &HealthConfig) -> Self {
        Self {
            state: RwLock::new(MonitorState::default()),
            slow_threshold_ms: config.slow_threshold_ms,
            min_success_rate: config.min_success_rate,
            capacity: config.history_capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Turn a call outcome into a result, record it, and return it.
    pub fn record_outcome(
        &self,
        provider: &ProviderConfig,
        outcome: &ProbeOutcome,
        source: CheckSource,
    ) -> HealthCheckResult {
        let result = if outcome.success {
            HealthCheckResult::success(
                provider.id,
                &provider.name,
                outcome.latency_ms,
                outcome.latency_ms >= self.slow_threshold_ms,
                source,
            )
        } else {
            HealthCheckResult::failure(
                provider.id,
                &provider.name,
                outcome.error.clone().unwrap_or_else(|| "unknown error".to_string()),
                source,
            )
        };
        self.record(result.clone());
        result
    }

    /// Append a result and update the provider's state.
    pub fn record(&self, result: HealthCheckResult) {
        let mut state = self.state.write().expect("health monitor lock poisoned");
        state.unpersisted.push(result.clone());
        // The store keeps only `capacity` entries, so older pending ones are moot.
        let overflow = state.unpersisted.len().saturating_sub(self.capacity);
        state.unpersisted.drain(..overflow);
        self.apply(&mut state, result);
    }

    /// Replay previously persisted results, oldest first, without queueing
    /// them for persistence again.
    pub fn restore(&self, results: Vec<HealthCheckResult>) {
        let mut state = self.state.write().expect("health monitor lock poisoned");
        for result in results {
            self.apply(&mut state, result);
        }
    }

    fn apply(&self, state: &mut MonitorState, result: HealthCheckResult) {
        while state.ring.len() >= self.capacity {
            state.ring.pop_front();
        }
        state.ring.push_back(result.clone());

        let rate = success_rate(&state.ring, &result.provider_id);
        let provider_state = match result.status {
            HealthStatus::Down => ProviderState::Down,
            HealthStatus::Degraded => ProviderState::Degraded,
            HealthStatus::Healthy if rate.is_some_and(|r| r < self.min_success_rate) => {
                ProviderState::Degraded
            }
            HealthStatus::Healthy => ProviderState::Healthy,
        };

        state.latest.insert(
            result.provider_id,
            Latest {
                state: provider_state,
                result,
            },
        );
    }

    /// Latest derived state; `Unknown` if the provider was never observed.
    pub fn current_status(&self, id: &ProviderId) -> ProviderState {
        let state = self.state.read().expect("health monitor lock poisoned");
        state
            .latest
            .get(id)
            .map(|l| l.state)
            .unwrap_or(ProviderState::Unknown)
    }

    pub fn latest_result(&self, id: &ProviderId) -> Option<HealthCheckResult> {
        let state = self.state.read().expect("health monitor lock poisoned");
        state.latest.get(id).map(|l| l.result.clone())
    }

    /// Share of successful results for `id` among the retained results.
    pub fn success_rate(&self, id: &ProviderId) -> Option<f64> {
        let state = self.state.read().expect("health monitor lock poisoned");
        success_rate(&state.ring, id)
    }

    /// Classify the system from the latest state of each enabled provider.
    ///
    /// `Critical` when none is healthy (including no providers at all),
    /// `Healthy` when all are, `Degraded` otherwise.
    pub fn aggregate_status(&self, enabled: &[ProviderId]) -> SystemStatus {
        let healthy = enabled
            .iter()
            .filter(|id| self.current_status(id) == ProviderState::Healthy)
            .count();

        if healthy == 0 {
            SystemStatus::Critical
        } else if healthy == enabled.len() {
            SystemStatus::Healthy
        } else {
            SystemStatus::Degraded
        }
    }

    /// The newest `limit` retained results, oldest first.
    pub fn history(&self, limit: usize) -> Vec<HealthCheckResult> {
        let state = self.state.read().expect("health monitor lock poisoned");
        let skip = state.ring.len().saturating_sub(limit);
        state.ring.iter().skip(skip).cloned().collect()
    }

    /// Drain results recorded since the last call.
    pub fn take_unpersisted(&self) -> Vec<HealthCheckResult> {
        let mut state = self.state.write().expect("health monitor lock poisoned");
        std::mem::take(&mut state.unpersisted)
    }

    /// Put back results whose persistence failed, ahead of newer ones.
    pub fn requeue_unpersisted(&self, mut results: Vec<HealthCheckResult>) {
        let mut state = self.state.write().expect("health monitor lock poisoned");
        results.append(&mut state.unpersisted);
        let overflow = results.len().saturating_sub(self.capacity);
        results.drain(..overflow);
        state.unpersisted = results;
    }

    /// Probe every given provider concurrently and record each result as
    /// its probe completes.
    ///
    /// Each probe is bounded by its own provider's timeout; the sweep as a
    /// whole has no deadline and finishes with the slowest probe.
    pub async fn run_sweep<C: LlmClient>(
        &self,
        client: &C,
        providers: &[ProviderConfig],
    ) -> Vec<HealthCheckResult> {
        tracing::info!(providers = providers.len(), "Running health sweep");

        let probes = providers.iter().map(|provider| async move {
            let outcome = tester::probe(client, provider).await;
            self.record_outcome(provider, &outcome, CheckSource::Probe)
        });
        let results = join_all(probes).await;

        let down = results.iter().filter(|r| !r.succeeded()).count();
        tracing::info!(checked = results.len(), down, "Health sweep complete");
        results
    }
}

fn success_rate(ring: &VecDeque<HealthCheckResult>, id: &ProviderId) -> Option<f64> {
    let (total, ok) = ring
        .iter()
        .filter(|r| &r.provider_id == id)
        .fold((0usize, 0usize), |(total, ok), r| {
            (total + 1, ok + usize::from(r.succeeded()))
        });
    (total > 0).then(|| ok as f64 / total as f64)
}
