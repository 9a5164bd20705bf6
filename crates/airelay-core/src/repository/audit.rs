//! Audit sink trait.

use std::future::Future;

use airelay_types::audit::AuditEvent;
use airelay_types::error::RepositoryError;

/// Append-only sink for security-relevant events.
///
/// Callers treat failures as non-fatal: they are logged and dropped.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
