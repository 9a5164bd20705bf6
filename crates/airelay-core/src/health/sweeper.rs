//! Background health sweeper and history persistence.
//!
//! The sweeper is a single tokio task that wakes on a short tick, probes
//! every enabled provider whenever the configured interval has elapsed, and
//! flushes newly recorded results (probe and traffic alike) to the history
//! store. The interval is re-read from the registry on every tick, so a
//! settings change takes effect without a restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::llm::client::BoxLlmClient;
use crate::repository::audit::AuditSink;
use crate::repository::config::ConfigStore;
use crate::repository::health::HealthHistoryStore;
use crate::service::registry::ProviderRegistry;

use super::monitor::HealthMonitor;

/// How often the sweeper wakes to flush history and check whether a sweep is due.
pub const TICK: Duration = Duration::from_secs(30);

/// Load the newest persisted results back into the monitor.
pub async fn restore_history<H: HealthHistoryStore>(monitor: &HealthMonitor, store: &H) {
    match store.recent(monitor.capacity()).await {
        Ok(results) => {
            tracing::info!(restored = results.len(), "Health history restored");
            monitor.restore(results);
        }
        Err(e) => tracing::warn!(error = %e, "Failed to load health history, starting empty"),
    }
}

/// Persist results recorded since the last flush, then prune the store to
/// the ring capacity. Returns how many results were written.
///
/// On failure the results go back to the monitor's queue for the next flush.
pub async fn flush_history<H: HealthHistoryStore>(monitor: &HealthMonitor, store: &H) -> usize {
    let pending = monitor.take_unpersisted();
    if pending.is_empty() {
        return 0;
    }

    if let Err(e) = store.append(&pending).await {
        tracing::warn!(error = %e, pending = pending.len(), "Failed to persist health history");
        monitor.requeue_unpersisted(pending);
        return 0;
    }

    match store.prune(monitor.capacity()).await {
        Ok(0) => {}
        Ok(pruned) => tracing::debug!(pruned, "Pruned health history"),
        Err(e) => tracing::warn!(error = %e, "Failed to prune health history"),
    }
    pending.len()
}

/// Spawn the periodic sweeper. It runs until `cancel` fires, then flushes
/// once more and exits.
pub fn spawn_sweeper<S, A, H>(
    registry: Arc<ProviderRegistry<S, A>>,
    monitor: Arc<HealthMonitor>,
    client: Arc<BoxLlmClient>,
    history: Arc<H>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: ConfigStore + 'static,
    A: AuditSink + 'static,
    H: HealthHistoryStore + 'static,
{
    tokio::spawn(async move {
        let mut last_sweep: Option<Instant> = None;

        loop {
            let minutes = registry.settings().health_check_interval_minutes;
            let due = minutes > 0
                && last_sweep.is_none_or(|t| t.elapsed() >= Duration::from_secs(minutes * 60));

            if due {
                let providers = registry.enabled();
                monitor.run_sweep(client.as_ref(), &providers).await;
                last_sweep = Some(Instant::now());
            }

            flush_history(&monitor, history.as_ref()).await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(TICK) => {}
            }
        }

        flush_history(&monitor, history.as_ref()).await;
        tracing::info!("Health sweeper stopped");
    })
}
