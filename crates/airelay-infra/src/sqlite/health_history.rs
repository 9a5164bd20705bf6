//! SQLite health check history.
//!
//! Stores the durable copy of the monitor's result ring so provider states
//! survive restarts. Rows are ordered by an autoincrement sequence, which
//! matches completion order because the monitor flushes in that order.

use airelay_core::repository::health::HealthHistoryStore;
use airelay_types::error::RepositoryError;
use airelay_types::health::{CheckSource, HealthCheckResult, HealthStatus};
use airelay_types::provider::ProviderId;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed [`HealthHistoryStore`].
pub struct SqliteHealthHistory {
    pool: DatabasePool,
}

impl SqliteHealthHistory {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl HealthHistoryStore for SqliteHealthHistory {
    async fn append(&self, results: &[HealthCheckResult]) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for result in results {
            sqlx::query(
                r#"INSERT OR IGNORE INTO health_checks (id, provider_id, provider_name, status, response_time_ms, error, source, checked_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(result.id.to_string())
            .bind(result.provider_id.to_string())
            .bind(&result.provider_name)
            .bind(result.status.to_string())
            .bind(result.response_time_ms.map(|v| v as i64))
            .bind(&result.error)
            .bind(result.source.to_string())
            .bind(format_datetime(&result.checked_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HealthCheckResult>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM (SELECT * FROM health_checks ORDER BY seq DESC LIMIT ?) ORDER BY seq ASC",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                HealthCheckSqlRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_result()
            })
            .collect()
    }

    async fn prune(&self, keep: usize) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM health_checks WHERE seq NOT IN (SELECT seq FROM health_checks ORDER BY seq DESC LIMIT ?)",
        )
        .bind(keep as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

struct HealthCheckSqlRow {
    id: String,
    provider_id: String,
    provider_name: String,
    status: String,
    response_time_ms: Option<i64>,
    error: Option<String>,
    source: String,
    checked_at: String,
}

impl HealthCheckSqlRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            provider_id: row.try_get("provider_id")?,
            provider_name: row.try_get("provider_name")?,
            status: row.try_get("status")?,
            response_time_ms: row.try_get("response_time_ms")?,
            error: row.try_get("error")?,
            source: row.try_get("source")?,
            checked_at: row.try_get("checked_at")?,
        })
    }

    fn into_result(self) -> Result<HealthCheckResult, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid health check id: {e}")))?;
        let provider_id: ProviderId = self
            .provider_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid provider_id: {e}")))?;
        let status: HealthStatus = self.status.parse().map_err(RepositoryError::Query)?;
        let source: CheckSource = self.source.parse().map_err(RepositoryError::Query)?;

        Ok(HealthCheckResult {
            id,
            provider_id,
            provider_name: self.provider_name,
            status,
            response_time_ms: self.response_time_ms.map(|v| v as u64),
            error: self.error,
            source,
            checked_at: parse_datetime(&self.checked_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;

    fn ok(pid: ProviderId, ms: u64) -> HealthCheckResult {
        HealthCheckResult::success(pid, "openai", ms, false, CheckSource::Probe)
    }

    #[tokio::test]
    async fn test_append_and_recent_keep_order() {
        let store = SqliteHealthHistory::new(test_pool().await);
        let pid = ProviderId::new();
        let results = vec![
            ok(pid, 10),
            HealthCheckResult::failure(pid, "openai", "HTTP 503: overloaded", CheckSource::Traffic),
            ok(pid, 30),
        ];
        store.append(&results).await.unwrap();

        let loaded = store.recent(10).await.unwrap();
        assert_eq!(loaded, results);

        let newest_two = store.recent(2).await.unwrap();
        assert_eq!(newest_two, results[1..].to_vec());
    }

    #[tokio::test]
    async fn test_prune_keeps_newest() {
        let store = SqliteHealthHistory::new(test_pool().await);
        let pid = ProviderId::new();
        let results: Vec<_> = (0..5).map(|i| ok(pid, i)).collect();
        store.append(&results).await.unwrap();

        let pruned = store.prune(2).await.unwrap();
        assert_eq!(pruned, 3);

        let loaded = store.recent(10).await.unwrap();
        let latencies: Vec<_> = loaded.iter().map(|r| r.response_time_ms).collect();
        assert_eq!(latencies, vec![Some(3), Some(4)]);
    }

    #[tokio::test]
    async fn test_append_is_idempotent_per_result() {
        let store = SqliteHealthHistory::new(test_pool().await);
        let result = ok(ProviderId::new(), 5);
        store.append(std::slice::from_ref(&result)).await.unwrap();
        store.append(std::slice::from_ref(&result)).await.unwrap();
        assert_eq!(store.recent(10).await.unwrap().len(), 1);
    }
}
