//! Test doubles shared by the core unit tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use airelay_types::audit::{AuditAction, AuditEvent};
use airelay_types::error::RepositoryError;
use airelay_types::health::HealthCheckResult;
use airelay_types::llm::{AiCompletion, AiRequest, LlmError};
use airelay_types::provider::{
    DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECONDS, ProviderConfig, ProviderFamily, ProviderId,
    UseCase,
};
use airelay_types::settings::{ChatbotConfig, RoutingSettings};

use crate::llm::client::LlmClient;
use crate::repository::audit::AuditSink;
use crate::repository::config::ConfigStore;
use crate::repository::health::HealthHistoryStore;

/// Scripted behaviour for one provider, keyed by provider name.
#[derive(Clone)]
pub enum Script {
    Reply(&'static str),
    /// Reply after sleeping on the tokio clock.
    ReplyAfter(&'static str, Duration),
    Http(u16, &'static str),
    Transport(&'static str),
    /// Never resolve within any sane timeout.
    Hang,
}

/// Client whose answers are scripted per provider name.
/// Unscripted providers reply `"answer from <name>"`.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    scripts: HashMap<String, Script>,
    calls: Arc<Mutex<Vec<(String, AiRequest)>>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, script: Script) -> Self {
        self.scripts.insert(name.to_string(), script);
        self
    }

    /// Provider names and payloads in call order.
    pub fn calls(&self) -> Vec<(String, AiRequest)> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn called_names(&self) -> Vec<String> {
        self.calls().into_iter().map(|(name, _)| name).collect()
    }
}

impl LlmClient for ScriptedClient {
    fn send(
        &self,
        provider: &ProviderConfig,
        request: &AiRequest,
    ) -> impl Future<Output = Result<AiCompletion, LlmError>> + Send {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((provider.name.clone(), request.clone()));
        let script = self.scripts.get(&provider.name).cloned();
        let name = provider.name.clone();
        let model = provider.model.clone();

        async move {
            let completion = |text: String| AiCompletion {
                text,
                model: Some(model.clone()),
            };
            match script {
                None => Ok(completion(format!("answer from {name}"))),
                Some(Script::Reply(text)) => Ok(completion(text.to_string())),
                Some(Script::ReplyAfter(text, delay)) => {
                    tokio::time::sleep(delay).await;
                    Ok(completion(text.to_string()))
                }
                Some(Script::Http(status, body)) => Err(LlmError::http(status, body)),
                Some(Script::Transport(msg)) => Err(LlmError::Transport(msg.to_string())),
                Some(Script::Hang) => {
                    tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                    Ok(completion("too late".to_string()))
                }
            }
        }
    }
}

/// An enabled general-purpose provider with default settings.
pub fn provider(name: &str, priority: u32) -> ProviderConfig {
    let now = Utc::now();
    ProviderConfig {
        id: ProviderId::new(),
        name: name.to_string(),
        family: ProviderFamily::Anthropic,
        endpoint: "https://api.example.test/v1/messages".to_string(),
        credential: None,
        model: format!("{name}-model"),
        timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        max_tokens: DEFAULT_MAX_TOKENS,
        priority,
        enabled: true,
        use_case: UseCase::General,
        description: String::new(),
        position: priority as u64,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Default)]
struct StoredConfig {
    providers: HashMap<ProviderId, ProviderConfig>,
    chatbot: Option<ChatbotConfig>,
    settings: Option<RoutingSettings>,
}

/// Shared in-memory `ConfigStore`. Clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryConfigStore {
    inner: Arc<Mutex<StoredConfig>>,
    fail_writes: bool,
    save_yields: usize,
}

impl MemoryConfigStore {
    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Provider saves yield to the scheduler `yields` times before writing,
    /// so concurrent registry calls can interleave with them.
    pub fn yielding_saves(yields: usize) -> Self {
        Self {
            save_yields: yields,
            ..Self::default()
        }
    }

    pub fn providers(&self) -> Vec<ProviderConfig> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.providers.values().cloned().collect()
    }

    pub fn provider(&self, id: &ProviderId) -> Option<ProviderConfig> {
        let inner = self.inner.lock().expect("store lock poisoned");
        inner.providers.get(id).cloned()
    }

    pub fn chatbot_config(&self) -> Option<ChatbotConfig> {
        self.inner.lock().expect("store lock poisoned").chatbot.clone()
    }

    pub fn settings(&self) -> Option<RoutingSettings> {
        self.inner.lock().expect("store lock poisoned").settings.clone()
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoredConfig) -> T) -> Result<T, RepositoryError> {
        if self.fail_writes {
            return Err(RepositoryError::Connection);
        }
        Ok(f(&mut self.inner.lock().expect("store lock poisoned")))
    }
}

impl ConfigStore for MemoryConfigStore {
    async fn load_providers(&self) -> Result<Vec<ProviderConfig>, RepositoryError> {
        Ok(self.providers())
    }

    async fn save_provider(&self, provider: &ProviderConfig) -> Result<(), RepositoryError> {
        for _ in 0..self.save_yields {
            tokio::task::yield_now().await;
        }
        self.write(|s| {
            s.providers.insert(provider.id, provider.clone());
        })
    }

    async fn delete_provider(&self, id: &ProviderId) -> Result<(), RepositoryError> {
        self.write(|s| {
            s.providers.remove(id);
        })
    }

    async fn load_chatbot_config(&self) -> Result<Option<ChatbotConfig>, RepositoryError> {
        Ok(self.chatbot_config())
    }

    async fn save_chatbot_config(&self, config: &ChatbotConfig) -> Result<(), RepositoryError> {
        self.write(|s| s.chatbot = Some(config.clone()))
    }

    async fn load_settings(&self) -> Result<Option<RoutingSettings>, RepositoryError> {
        Ok(self.settings())
    }

    async fn save_settings(&self, settings: &RoutingSettings) -> Result<(), RepositoryError> {
        self.write(|s| s.settings = Some(settings.clone()))
    }
}

/// Audit sink that keeps events in memory, or fails every write.
#[derive(Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
    fail: bool,
}

impl MemoryAuditSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn actions(&self) -> Vec<AuditAction> {
        let events = self.events.lock().expect("audit lock poisoned");
        events.iter().map(|e| e.action).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Query("audit table missing".to_string()));
        }
        self.events.lock().expect("audit lock poisoned").push(event.clone());
        Ok(())
    }
}

/// History store backed by a vector; `fail` makes appends error.
#[derive(Clone, Default)]
pub struct MemoryHistoryStore {
    results: Arc<Mutex<Vec<HealthCheckResult>>>,
    pub fail: bool,
}

impl MemoryHistoryStore {
    pub fn len(&self) -> usize {
        self.results.lock().expect("history lock poisoned").len()
    }
}

impl HealthHistoryStore for MemoryHistoryStore {
    async fn append(&self, results: &[HealthCheckResult]) -> Result<(), RepositoryError> {
        if self.fail {
            return Err(RepositoryError::Connection);
        }
        self.results
            .lock()
            .expect("history lock poisoned")
            .extend_from_slice(results);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<HealthCheckResult>, RepositoryError> {
        let results = self.results.lock().expect("history lock poisoned");
        let skip = results.len().saturating_sub(limit);
        Ok(results[skip..].to_vec())
    }

    async fn prune(&self, keep: usize) -> Result<u64, RepositoryError> {
        let mut results = self.results.lock().expect("history lock poisoned");
        let excess = results.len().saturating_sub(keep);
        results.drain(..excess);
        Ok(excess as u64)
    }
}
