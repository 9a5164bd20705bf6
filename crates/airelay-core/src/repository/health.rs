//! Health history persistence trait.

use std::future::Future;

use airelay_types::error::RepositoryError;
use airelay_types::health::HealthCheckResult;

/// Durable copy of the health check ring.
pub trait HealthHistoryStore: Send + Sync {
    /// Append results in the order given.
    fn append(
        &self,
        results: &[HealthCheckResult],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// The newest `limit` results, oldest first.
    fn recent(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HealthCheckResult>, RepositoryError>> + Send;

    /// Delete everything but the newest `keep` results.
    fn prune(&self, keep: usize) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}
