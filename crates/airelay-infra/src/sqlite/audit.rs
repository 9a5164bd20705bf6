//! SQLite audit log.
//!
//! Append-only record of registry mutations and successful connection tests.

use airelay_core::repository::audit::AuditSink;
use airelay_types::audit::{AuditAction, AuditEvent};
use airelay_types::error::RepositoryError;
use airelay_types::provider::ProviderId;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed [`AuditSink`].
pub struct SqliteAuditLog {
    pool: DatabasePool,
}

impl SqliteAuditLog {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Most recent entries first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<AuditEvent>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM audit_log ORDER BY created_at DESC, id DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                AuditRow::from_row(row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?
                    .into_event()
            })
            .collect()
    }
}

impl AuditSink for SqliteAuditLog {
    async fn record(&self, event: &AuditEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO audit_log (id, action, provider_id, details, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(event.id.to_string())
        .bind(event.action.to_string())
        .bind(event.provider_id.map(|id| id.to_string()))
        .bind(&event.details)
        .bind(format_datetime(&event.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

struct AuditRow {
    id: String,
    action: String,
    provider_id: Option<String>,
    details: Option<String>,
    created_at: String,
}

impl AuditRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            action: row.try_get("action")?,
            provider_id: row.try_get("provider_id")?,
            details: row.try_get("details")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_event(self) -> Result<AuditEvent, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid audit id: {e}")))?;
        let action: AuditAction = self.action.parse().map_err(RepositoryError::Query)?;
        let provider_id = self
            .provider_id
            .as_deref()
            .map(str::parse::<ProviderId>)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid provider_id: {e}")))?;

        Ok(AuditEvent {
            id,
            action,
            provider_id,
            details: self.details,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;

    #[tokio::test]
    async fn test_record_and_read_back() {
        let log = SqliteAuditLog::new(test_pool().await);
        let pid = ProviderId::new();

        log.record(&AuditEvent::new(AuditAction::ProviderCreated, Some(pid), "name=openai"))
            .await
            .unwrap();
        log.record(&AuditEvent::new(AuditAction::SettingsReplaced, None, ""))
            .await
            .unwrap();

        let events = log.recent(10).await.unwrap();
        assert_eq!(events.len(), 2);
        let created = events
            .iter()
            .find(|e| e.action == AuditAction::ProviderCreated)
            .unwrap();
        assert_eq!(created.provider_id, Some(pid));
        assert_eq!(created.details.as_deref(), Some("name=openai"));
        let settings = events
            .iter()
            .find(|e| e.action == AuditAction::SettingsReplaced)
            .unwrap();
        assert_eq!(settings.provider_id, None);
        assert_eq!(settings.details, None);
    }

    #[tokio::test]
    async fn test_recent_respects_limit() {
        let log = SqliteAuditLog::new(test_pool().await);
        for _ in 0..5 {
            log.record(&AuditEvent::new(AuditAction::ConnectionTested, Some(ProviderId::new()), ""))
                .await
                .unwrap();
        }
        assert_eq!(log.recent(3).await.unwrap().len(), 3);
    }
}
