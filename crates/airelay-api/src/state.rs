//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and REST API.
//! Core services are generic over store/client traits; AppState pins them to
//! the SQLite and reqwest implementations from `airelay-infra`.

use std::path::PathBuf;
use std::sync::Arc;

use airelay_core::health::monitor::HealthMonitor;
use airelay_core::health::sweeper::restore_history;
use airelay_core::llm::client::BoxLlmClient;
use airelay_core::llm::router::FailoverRouter;
use airelay_core::service::registry::ProviderRegistry;
use airelay_infra::config::{data_dir, load_global_config};
use airelay_infra::crypto::vault::VaultCrypto;
use airelay_infra::llm::HttpLlmClient;
use airelay_infra::sqlite::audit::SqliteAuditLog;
use airelay_infra::sqlite::health_history::SqliteHealthHistory;
use airelay_infra::sqlite::pool::{DatabasePool, database_url};
use airelay_infra::sqlite::provider_config::SqliteConfigStore;
use airelay_types::config::GlobalConfig;

/// Concrete type aliases for the service generics pinned to infra implementations.
pub type ConcreteRegistry = ProviderRegistry<SqliteConfigStore, SqliteAuditLog>;

pub type ConcreteRouter = FailoverRouter<SqliteConfigStore, SqliteAuditLog>;

/// Shared application state.
///
/// Used by both CLI commands and REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConcreteRegistry>,
    pub monitor: Arc<HealthMonitor>,
    pub client: Arc<BoxLlmClient>,
    pub router: Arc<ConcreteRouter>,
    pub history: Arc<SqliteHealthHistory>,
    /// Read side of the audit log; the registry owns the writing sink.
    pub audit: Arc<SqliteAuditLog>,
    pub config: GlobalConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize against `AIRELAY_DATA_DIR` (or `~/.airelay`).
    pub async fn init() -> anyhow::Result<Self> {
        Self::open(data_dir()).await
    }

    /// Connect to the database under `data_dir`, load the registry and
    /// restore persisted health history into the monitor.
    pub async fn open(data_dir: PathBuf) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_global_config(&data_dir).await;
        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        let vault = Arc::new(VaultCrypto::load(&data_dir)?);
        let store = SqliteConfigStore::new(db_pool.clone(), vault);
        let registry = Arc::new(
            ProviderRegistry::load(store, SqliteAuditLog::new(db_pool.clone())).await?,
        );

        let monitor = Arc::new(HealthMonitor::new(&config.health));
        let history = Arc::new(SqliteHealthHistory::new(db_pool.clone()));
        restore_history(&monitor, history.as_ref()).await;

        let client = Arc::new(BoxLlmClient::new(HttpLlmClient::new()));
        let router = Arc::new(FailoverRouter::new(
            registry.clone(),
            monitor.clone(),
            client.clone(),
        ));

        Ok(Self {
            registry,
            monitor,
            client,
            router,
            history,
            audit: Arc::new(SqliteAuditLog::new(db_pool)),
            config,
            data_dir,
        })
    }
}
