//! Status report assembled from registry and monitor state.
//!
//! A pure projection: building a report never probes a provider or
//! mutates anything.

use chrono::Utc;

use airelay_types::health::ProviderState;
use airelay_types::provider::UseCase;
use airelay_types::report::{ChainEntry, ProviderStatusEntry, StatusCounts, StatusReport};

use crate::health::monitor::HealthMonitor;
use crate::llm::router::order_candidates;
use crate::repository::audit::AuditSink;
use crate::repository::config::ConfigStore;

use super::registry::ProviderRegistry;

/// Build the status document for `use_case`.
///
/// `providers` and `counts` cover every enabled provider; the failover
/// chain covers only the candidates a request for `use_case` would try.
pub fn status_report<S: ConfigStore, A: AuditSink>(
    registry: &ProviderRegistry<S, A>,
    monitor: &HealthMonitor,
    use_case: UseCase,
) -> StatusReport {
    let enabled = registry.enabled();

    let providers: Vec<ProviderStatusEntry> = enabled
        .iter()
        .map(|p| {
            let latest = monitor.latest_result(&p.id);
            ProviderStatusEntry {
                id: p.id,
                name: p.name.clone(),
                family: p.family,
                model: p.model.clone(),
                priority: p.priority,
                use_case: p.use_case,
                state: monitor.current_status(&p.id),
                response_time_ms: latest.as_ref().and_then(|r| r.response_time_ms),
                error: latest.as_ref().and_then(|r| r.error.clone()),
                last_checked_at: latest.map(|r| r.checked_at),
                success_rate: monitor.success_rate(&p.id),
            }
        })
        .collect();

    let mut counts = StatusCounts {
        total: providers.len(),
        ..StatusCounts::default()
    };
    for entry in &providers {
        match entry.state {
            ProviderState::Healthy => counts.healthy += 1,
            ProviderState::Degraded => counts.degraded += 1,
            ProviderState::Down => counts.offline += 1,
            ProviderState::Unknown => counts.unknown += 1,
        }
    }

    let policy = registry.settings().down_provider_policy;
    let failover_chain: Vec<ChainEntry> =
        order_candidates(registry.candidates(use_case), monitor, policy)
            .into_iter()
            .enumerate()
            .map(|(i, p)| ChainEntry {
                position: i + 1,
                id: p.id,
                state: monitor.current_status(&p.id),
                name: p.name,
                priority: p.priority,
            })
            .collect();

    let active = failover_chain
        .iter()
        .position(|e| e.state != ProviderState::Down);
    let fallbacks_available = active.map_or(0, |i| {
        failover_chain[i + 1..]
            .iter()
            .filter(|e| e.state != ProviderState::Down)
            .count()
    });

    let ids: Vec<_> = enabled.iter().map(|p| p.id).collect();

    StatusReport {
        status: monitor.aggregate_status(&ids),
        use_case,
        active_provider: active.map(|i| failover_chain[i].name.clone()),
        all_down: active.is_none(),
        fallbacks_available,
        providers,
        failover_chain,
        counts,
        generated_at: Utc::now(),
    }
}
