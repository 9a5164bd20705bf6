//! SQLite configuration store.
//!
//! Providers live one per row in `providers`, with the credential encrypted
//! by [`VaultCrypto`] before it touches disk. The chatbot configuration and
//! routing settings are whole JSON documents in `app_settings`.

use std::sync::Arc;

use airelay_core::repository::config::ConfigStore;
use airelay_types::error::RepositoryError;
use airelay_types::provider::{ProviderConfig, ProviderFamily, ProviderId, UseCase};
use airelay_types::settings::{ChatbotConfig, RoutingSettings};
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};
use crate::crypto::vault::VaultCrypto;

const CHATBOT_CONFIG_KEY: &str = "chatbot_config";
const ROUTING_SETTINGS_KEY: &str = "routing_settings";

/// SQLite-backed [`ConfigStore`].
pub struct SqliteConfigStore {
    pool: DatabasePool,
    vault: Arc<VaultCrypto>,
}

impl SqliteConfigStore {
    pub fn new(pool: DatabasePool, vault: Arc<VaultCrypto>) -> Self {
        Self { pool, vault }
    }

    fn encrypt_credential(&self, provider: &ProviderConfig) -> Result<Option<Vec<u8>>, RepositoryError> {
        provider
            .credential
            .as_ref()
            .map(|secret| {
                self.vault
                    .encrypt(secret.expose_secret().as_bytes())
                    .map_err(|_| RepositoryError::Encryption)
            })
            .transpose()
    }

    /// A credential that no longer decrypts (e.g. the vault key changed) is
    /// dropped with a warning, so the provider falls back to its env var.
    fn decrypt_credential(&self, name: &str, data: Option<Vec<u8>>) -> Option<SecretString> {
        let data = data?;
        match self
            .vault
            .decrypt(&data)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(plain) => Some(SecretString::from(plain)),
            None => {
                tracing::warn!(provider = %name, "Stored credential could not be decrypted, ignoring it");
                None
            }
        }
    }

    async fn load_document<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, RepositoryError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM app_settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        value
            .map(|v| {
                serde_json::from_str(&v)
                    .map_err(|e| RepositoryError::Query(format!("invalid {key} document: {e}")))
            })
            .transpose()
    }

    async fn save_document<T: Serialize>(&self, key: &str, value: &T) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(value).map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO app_settings (key, value, updated_at) VALUES (?, ?, ?)
               ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
        )
        .bind(key)
        .bind(json)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}

impl ConfigStore for SqliteConfigStore {
    async fn load_providers(&self) -> Result<Vec<ProviderConfig>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM providers ORDER BY priority, position")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut providers = Vec::with_capacity(rows.len());
        for row in &rows {
            let sql_row = ProviderSqlRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            let credential = self.decrypt_credential(&sql_row.name, sql_row.encrypted_credential.clone());
            providers.push(sql_row.into_provider(credential)?);
        }

        Ok(providers)
    }

    async fn save_provider(&self, provider: &ProviderConfig) -> Result<(), RepositoryError> {
        let encrypted = self.encrypt_credential(provider)?;

        sqlx::query(
            r#"INSERT INTO providers (id, name, family, endpoint, encrypted_credential, model, timeout_seconds, max_tokens, priority, enabled, use_case, description, position, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT (id) DO UPDATE SET
                   name = excluded.name,
                   family = excluded.family,
                   endpoint = excluded.endpoint,
                   encrypted_credential = excluded.encrypted_credential,
                   model = excluded.model,
                   timeout_seconds = excluded.timeout_seconds,
                   max_tokens = excluded.max_tokens,
                   priority = excluded.priority,
                   enabled = excluded.enabled,
                   use_case = excluded.use_case,
                   description = excluded.description,
                   position = excluded.position,
                   updated_at = excluded.updated_at"#,
        )
        .bind(provider.id.to_string())
        .bind(&provider.name)
        .bind(provider.family.to_string())
        .bind(&provider.endpoint)
        .bind(encrypted)
        .bind(&provider.model)
        .bind(provider.timeout_seconds as i64)
        .bind(provider.max_tokens as i64)
        .bind(provider.priority as i64)
        .bind(provider.enabled)
        .bind(provider.use_case.to_string())
        .bind(&provider.description)
        .bind(provider.position as i64)
        .bind(format_datetime(&provider.created_at))
        .bind(format_datetime(&provider.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_provider(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM providers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn load_chatbot_config(&self) -> Result<Option<ChatbotConfig>, RepositoryError> {
        self.load_document(CHATBOT_CONFIG_KEY).await
    }

    async fn save_chatbot_config(&self, config: &ChatbotConfig) -> Result<(), RepositoryError> {
        self.save_document(CHATBOT_CONFIG_KEY, config).await
    }

    async fn load_settings(&self) -> Result<Option<RoutingSettings>, RepositoryError> {
        self.load_document(ROUTING_SETTINGS_KEY).await
    }

    async fn save_settings(&self, settings: &RoutingSettings) -> Result<(), RepositoryError> {
        self.save_document(ROUTING_SETTINGS_KEY, settings).await
    }
}

// ---------------------------------------------------------------------------
// Private Row types
// ---------------------------------------------------------------------------

struct ProviderSqlRow {
    id: String,
    name: String,
    family: String,
    endpoint: String,
    encrypted_credential: Option<Vec<u8>>,
    model: String,
    timeout_seconds: i64,
    max_tokens: i64,
    priority: i64,
    enabled: bool,
    use_case: String,
    description: String,
    position: i64,
    created_at: String,
    updated_at: String,
}

impl ProviderSqlRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            family: row.try_get("family")?,
            endpoint: row.try_get("endpoint")?,
            encrypted_credential: row.try_get("encrypted_credential")?,
            model: row.try_get("model")?,
            timeout_seconds: row.try_get("timeout_seconds")?,
            max_tokens: row.try_get("max_tokens")?,
            priority: row.try_get("priority")?,
            enabled: row.try_get("enabled")?,
            use_case: row.try_get("use_case")?,
            description: row.try_get("description")?,
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_provider(self, credential: Option<SecretString>) -> Result<ProviderConfig, RepositoryError> {
        let id: ProviderId = self
            .id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid provider id: {e}")))?;
        let family: ProviderFamily = self.family.parse().map_err(RepositoryError::Query)?;
        let use_case: UseCase = self.use_case.parse().map_err(RepositoryError::Query)?;

        Ok(ProviderConfig {
            id,
            name: self.name,
            family,
            endpoint: self.endpoint,
            credential,
            model: self.model,
            timeout_seconds: self.timeout_seconds as u64,
            max_tokens: self.max_tokens as u32,
            priority: self.priority as u32,
            enabled: self.enabled,
            use_case,
            description: self.description,
            position: self.position as u64,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;
    use airelay_types::settings::DownProviderPolicy;

    fn vault() -> Arc<VaultCrypto> {
        Arc::new(VaultCrypto::new(&[7u8; 32]))
    }

    fn sample(name: &str, priority: u32, credential: Option<&str>) -> ProviderConfig {
        let now = Utc::now();
        ProviderConfig {
            id: ProviderId::new(),
            name: name.to_string(),
            family: ProviderFamily::OpenAi,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            credential: credential.map(SecretString::from),
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
            max_tokens: 1500,
            priority,
            enabled: true,
            use_case: UseCase::Chatbot,
            description: "primary".to_string(),
            position: priority as u64,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_save_and_load_provider() {
        let store = SqliteConfigStore::new(test_pool().await, vault());
        let provider = sample("openai", 1, Some("sk-test-123"));
        store.save_provider(&provider).await.unwrap();

        let loaded = store.load_providers().await.unwrap();
        assert_eq!(loaded.len(), 1);
        let p = &loaded[0];
        assert_eq!(p.id, provider.id);
        assert_eq!(p.name, "openai");
        assert_eq!(p.family, ProviderFamily::OpenAi);
        assert_eq!(p.use_case, UseCase::Chatbot);
        assert_eq!(p.position, 1);
        assert_eq!(p.credential.as_ref().unwrap().expose_secret(), "sk-test-123");
    }

    #[tokio::test]
    async fn test_credential_is_encrypted_at_rest() {
        let pool = test_pool().await;
        let store = SqliteConfigStore::new(pool.clone(), vault());
        store
            .save_provider(&sample("openai", 1, Some("sk-plaintext-marker")))
            .await
            .unwrap();

        let raw: Vec<u8> = sqlx::query_scalar("SELECT encrypted_credential FROM providers")
            .fetch_one(&pool.reader)
            .await
            .unwrap();
        let haystack = String::from_utf8_lossy(&raw);
        assert!(!haystack.contains("sk-plaintext-marker"));
    }

    #[tokio::test]
    async fn test_wrong_vault_key_drops_credential() {
        let pool = test_pool().await;
        SqliteConfigStore::new(pool.clone(), vault())
            .save_provider(&sample("openai", 1, Some("sk-test")))
            .await
            .unwrap();

        let other = SqliteConfigStore::new(pool, Arc::new(VaultCrypto::new(&[9u8; 32])));
        let loaded = other.load_providers().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded[0].credential.is_none());
    }

    #[tokio::test]
    async fn test_save_upserts_and_delete_removes() {
        let store = SqliteConfigStore::new(test_pool().await, vault());
        let mut provider = sample("openai", 1, None);
        store.save_provider(&provider).await.unwrap();

        provider.priority = 5;
        provider.enabled = false;
        store.save_provider(&provider).await.unwrap();

        let loaded = store.load_providers().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].priority, 5);
        assert!(!loaded[0].enabled);
        assert!(loaded[0].credential.is_none());

        store.delete_provider(&provider.id).await.unwrap();
        assert!(store.load_providers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_documents_roundtrip() {
        let store = SqliteConfigStore::new(test_pool().await, vault());
        assert!(store.load_settings().await.unwrap().is_none());
        assert!(store.load_chatbot_config().await.unwrap().is_none());

        let settings = RoutingSettings {
            auto_failover_enabled: false,
            health_check_interval_minutes: 15,
            down_provider_policy: DownProviderPolicy::Skip,
        };
        store.save_settings(&settings).await.unwrap();
        store.save_settings(&settings).await.unwrap();
        assert_eq!(store.load_settings().await.unwrap(), Some(settings));

        let chatbot = ChatbotConfig {
            max_conversation_length: 12,
            ..ChatbotConfig::default()
        };
        store.save_chatbot_config(&chatbot).await.unwrap();
        assert_eq!(store.load_chatbot_config().await.unwrap(), Some(chatbot));
    }
}
