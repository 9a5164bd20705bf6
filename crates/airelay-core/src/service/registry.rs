//! Provider registry service.
//!
//! Holds the in-memory, priority-sorted provider list together with the
//! chatbot configuration and routing settings. The registry is the only
//! writer of provider records: every mutation updates memory under the
//! lock, releases it, then writes through to the [`ConfigStore`] and emits
//! an audit event. Persistence and audit failures are logged, never returned.
//!
//! Mutations are serialized by an async write gate held from the memory
//! update through the write-through, so the store sees them in the same
//! order as memory. Reads only take the std lock.

use std::collections::HashSet;
use std::sync::RwLock;

use secrecy::SecretString;
use tokio::sync::Mutex;

use airelay_types::audit::{AuditAction, AuditEvent};
use airelay_types::error::{RegistryError, RepositoryError};
use airelay_types::health::{CheckSource, ProbeOutcome};
use airelay_types::provider::{
    CreateProviderRequest, DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECONDS, ProviderConfig,
    ProviderFamily, ProviderId, ProviderView, UpdateProviderRequest, UseCase,
};
use airelay_types::settings::{ChatbotConfig, RoutingSettings};

use crate::health::monitor::HealthMonitor;
use crate::llm::client::LlmClient;
use crate::llm::tester;
use crate::repository::audit::AuditSink;
use crate::repository::config::ConfigStore;

struct RegistryState {
    /// Always sorted by (priority, position).
    providers: Vec<ProviderConfig>,
    chatbot: ChatbotConfig,
    settings: RoutingSettings,
    next_position: u64,
}

impl RegistryState {
    fn new(
        providers: Vec<ProviderConfig>,
        chatbot: ChatbotConfig,
        settings: RoutingSettings,
    ) -> Self {
        let next_position = providers.iter().map(|p| p.position + 1).max().unwrap_or(0);
        let mut state = Self {
            providers,
            chatbot,
            settings,
            next_position,
        };
        state.sort();
        state
    }

    fn sort(&mut self) {
        // Stable, and `position` is unique, so equal priorities keep insertion order.
        self.providers.sort_by_key(|p| p.sort_key());
    }

    fn find_mut(&mut self, id: &ProviderId) -> Option<&mut ProviderConfig> {
        self.providers.iter_mut().find(|p| &p.id == id)
    }
}

/// Provider registry generic over its persistence and audit collaborators.
pub struct ProviderRegistry<S: ConfigStore, A: AuditSink> {
    store: S,
    audit: A,
    state: RwLock<RegistryState>,
    writes: Mutex<()>,
}

impl<S: ConfigStore, A: AuditSink> ProviderRegistry<S, A> {
    /// Build a registry from whatever the store currently holds.
    pub async fn load(store: S, audit: A) -> Result<Self, RepositoryError> {
        let state = read_state(&store).await?;
        tracing::info!(providers = state.providers.len(), "Provider registry loaded");
        Ok(Self {
            store,
            audit,
            state: RwLock::new(state),
            writes: Mutex::new(()),
        })
    }

    /// Replace the in-memory state with the store's current contents.
    pub async fn reload(&self) -> Result<(), RepositoryError> {
        let _writes = self.writes.lock().await;
        let fresh = read_state(&self.store).await?;
        *self.state.write().expect("registry lock poisoned") = fresh;
        Ok(())
    }

    /// Register a new provider.
    ///
    /// Defaults: priority after the current last, enabled, 30s timeout,
    /// 1500 output tokens, `general` use case.
    pub async fn create(&self, request: CreateProviderRequest) -> Result<ProviderView, RegistryError> {
        let family = parse_family(&request.family)?;
        let use_case = parse_use_case(request.use_case.as_deref())?.unwrap_or_default();
        let now = chrono::Utc::now();

        let mut provider = ProviderConfig {
            id: ProviderId::new(),
            name: request.name.trim().to_string(),
            family,
            endpoint: request.endpoint.trim().to_string(),
            credential: to_secret(request.credential),
            model: request.model.trim().to_string(),
            timeout_seconds: request.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            max_tokens: request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            priority: 0,
            enabled: request.enabled.unwrap_or(true),
            use_case,
            description: request.description.unwrap_or_default(),
            position: 0,
            created_at: now,
            updated_at: now,
        };
        validate(&provider)?;

        let _writes = self.writes.lock().await;
        {
            let mut state = self.state.write().expect("registry lock poisoned");
            provider.priority = match request.priority {
                Some(priority) => priority,
                None => state
                    .providers
                    .iter()
                    .map(|p| p.priority)
                    .max()
                    .map_or(1, |last| last.saturating_add(1)),
            };
            provider.position = state.next_position;
            state.next_position += 1;
            state.providers.push(provider.clone());
            state.sort();
        }

        tracing::info!(
            provider = %provider.name,
            provider_id = %provider.id,
            family = %provider.family,
            priority = provider.priority,
            "Provider created"
        );

        self.persist(&provider).await;
        self.emit(AuditEvent::new(
            AuditAction::ProviderCreated,
            Some(provider.id),
            format!("name={} family={} model={}", provider.name, provider.family, provider.model),
        ))
        .await;

        Ok(provider.view())
    }

    /// Merge the supplied fields over an existing provider.
    pub async fn update(
        &self,
        id: &ProviderId,
        request: UpdateProviderRequest,
    ) -> Result<ProviderView, RegistryError> {
        let family = request.family.as_deref().map(parse_family).transpose()?;
        let use_case = parse_use_case(request.use_case.as_deref())?;
        let changed = changed_fields(&request);

        let _writes = self.writes.lock().await;
        let updated = {
            let mut state = self.state.write().expect("registry lock poisoned");
            let current = state
                .providers
                .iter()
                .find(|p| &p.id == id)
                .ok_or(RegistryError::NotFound(*id))?;

            let mut merged = current.clone();
            if let Some(name) = request.name {
                merged.name = name.trim().to_string();
            }
            if let Some(family) = family {
                merged.family = family;
            }
            if let Some(endpoint) = request.endpoint {
                merged.endpoint = endpoint.trim().to_string();
            }
            if let Some(model) = request.model {
                merged.model = model.trim().to_string();
            }
            if let Some(credential) = request.credential {
                merged.credential = to_secret(Some(credential));
            }
            if let Some(priority) = request.priority {
                merged.priority = priority;
            }
            if let Some(enabled) = request.enabled {
                merged.enabled = enabled;
            }
            if let Some(timeout) = request.timeout_seconds {
                merged.timeout_seconds = timeout;
            }
            if let Some(max_tokens) = request.max_tokens {
                merged.max_tokens = max_tokens;
            }
            if let Some(use_case) = use_case {
                merged.use_case = use_case;
            }
            if let Some(description) = request.description {
                merged.description = description;
            }
            merged.updated_at = chrono::Utc::now();
            validate(&merged)?;

            if let Some(slot) = state.find_mut(id) {
                *slot = merged.clone();
            }
            state.sort();
            merged
        };

        tracing::info!(provider = %updated.name, provider_id = %id, "Provider updated");

        self.persist(&updated).await;
        self.emit(AuditEvent::new(
            AuditAction::ProviderUpdated,
            Some(*id),
            format!("fields={}", changed.join(",")),
        ))
        .await;

        Ok(updated.view())
    }

    /// Remove a provider immediately. Its health history is left untouched.
    pub async fn delete(&self, id: &ProviderId) -> Result<(), RegistryError> {
        let _writes = self.writes.lock().await;
        let removed = {
            let mut state = self.state.write().expect("registry lock poisoned");
            let index = state
                .providers
                .iter()
                .position(|p| &p.id == id)
                .ok_or(RegistryError::NotFound(*id))?;
            state.providers.remove(index)
        };

        tracing::info!(provider = %removed.name, provider_id = %id, "Provider deleted");

        if let Err(e) = self.store.delete_provider(id).await {
            tracing::warn!(provider_id = %id, error = %e, "Failed to persist provider deletion");
        }
        self.emit(AuditEvent::new(
            AuditAction::ProviderDeleted,
            Some(*id),
            format!("name={}", removed.name),
        ))
        .await;

        Ok(())
    }

    /// Assign priorities 1..n to the listed providers in the given order.
    /// Providers not listed keep their priority.
    pub async fn reorder(&self, ids: &[ProviderId]) -> Result<Vec<ProviderView>, RegistryError> {
        let mut seen = HashSet::new();
        if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(RegistryError::Validation(format!(
                "provider {dup} listed more than once"
            )));
        }

        let _writes = self.writes.lock().await;
        let changed: Vec<ProviderConfig> = {
            let mut state = self.state.write().expect("registry lock poisoned");
            if let Some(missing) = ids.iter().find(|id| !state.providers.iter().any(|p| &p.id == *id)) {
                return Err(RegistryError::NotFound(*missing));
            }

            let now = chrono::Utc::now();
            let mut changed = Vec::with_capacity(ids.len());
            for (index, id) in ids.iter().enumerate() {
                if let Some(provider) = state.find_mut(id) {
                    provider.priority = index as u32 + 1;
                    provider.updated_at = now;
                    changed.push(provider.clone());
                }
            }
            state.sort();
            changed
        };

        tracing::info!(count = changed.len(), "Providers reordered");

        for provider in &changed {
            self.persist(provider).await;
        }
        let order: Vec<String> = ids.iter().map(ToString::to_string).collect();
        self.emit(AuditEvent::new(
            AuditAction::ProvidersReordered,
            None,
            format!("order={}", order.join(",")),
        ))
        .await;

        Ok(self.list_all())
    }

    /// Enabled providers, redacted and sorted, optionally filtered by use case.
    pub fn list(&self, use_case: Option<UseCase>) -> Vec<ProviderView> {
        let state = self.state.read().expect("registry lock poisoned");
        state
            .providers
            .iter()
            .filter(|p| p.enabled)
            .filter(|p| use_case.is_none_or(|uc| p.use_case == uc))
            .map(ProviderConfig::view)
            .collect()
    }

    /// Every provider including disabled ones, for administration.
    pub fn list_all(&self) -> Vec<ProviderView> {
        let state = self.state.read().expect("registry lock poisoned");
        state.providers.iter().map(ProviderConfig::view).collect()
    }

    pub fn get(&self, id: &ProviderId) -> Result<ProviderView, RegistryError> {
        self.provider(id).map(|p| p.view())
    }

    /// Full record including the credential, for callers inside the process.
    pub fn provider(&self, id: &ProviderId) -> Result<ProviderConfig, RegistryError> {
        let state = self.state.read().expect("registry lock poisoned");
        state
            .providers
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or(RegistryError::NotFound(*id))
    }

    /// Snapshot of the enabled providers eligible for `use_case`, sorted.
    ///
    /// Falls back to providers tagged `general` when none carry the tag.
    pub fn candidates(&self, use_case: UseCase) -> Vec<ProviderConfig> {
        let state = self.state.read().expect("registry lock poisoned");
        let tagged = |uc: UseCase| -> Vec<ProviderConfig> {
            state
                .providers
                .iter()
                .filter(|p| p.enabled && p.use_case == uc)
                .cloned()
                .collect()
        };

        let matched = tagged(use_case);
        if matched.is_empty() && use_case != UseCase::General {
            tagged(UseCase::General)
        } else {
            matched
        }
    }

    /// Every enabled provider, sorted.
    pub fn enabled(&self) -> Vec<ProviderConfig> {
        let state = self.state.read().expect("registry lock poisoned");
        state.providers.iter().filter(|p| p.enabled).cloned().collect()
    }

    pub fn enabled_ids(&self) -> Vec<ProviderId> {
        let state = self.state.read().expect("registry lock poisoned");
        state
            .providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.id)
            .collect()
    }

    /// Probe one provider and record the result in the monitor.
    pub async fn test_connection<C: LlmClient>(
        &self,
        id: &ProviderId,
        client: &C,
        monitor: &HealthMonitor,
    ) -> Result<ProbeOutcome, RegistryError> {
        let provider = self.provider(id)?;
        let outcome = tester::probe(client, &provider).await;
        let result = monitor.record_outcome(&provider, &outcome, CheckSource::Probe);

        tracing::info!(
            provider = %provider.name,
            status = %result.status,
            latency_ms = outcome.latency_ms,
            "Connection test complete"
        );

        if outcome.success {
            self.emit(AuditEvent::new(
                AuditAction::ConnectionTested,
                Some(provider.id),
                format!("latency_ms={}", outcome.latency_ms),
            ))
            .await;
        }

        Ok(outcome)
    }

    pub fn chatbot_config(&self) -> ChatbotConfig {
        self.state.read().expect("registry lock poisoned").chatbot.clone()
    }

    /// Replace the chatbot configuration as a whole.
    pub async fn replace_chatbot_config(
        &self,
        config: ChatbotConfig,
    ) -> Result<ChatbotConfig, RegistryError> {
        if config.max_conversation_length == 0 {
            return Err(RegistryError::Validation(
                "max_conversation_length must be greater than zero".to_string(),
            ));
        }
        if config.response_timeout_seconds == 0 {
            return Err(RegistryError::Validation(
                "response_timeout_seconds must be greater than zero".to_string(),
            ));
        }

        let _writes = self.writes.lock().await;
        self.state.write().expect("registry lock poisoned").chatbot = config.clone();

        if let Err(e) = self.store.save_chatbot_config(&config).await {
            tracing::warn!(error = %e, "Failed to persist chatbot config");
        }
        self.emit(AuditEvent::new(AuditAction::ChatbotConfigReplaced, None, "")).await;
        Ok(config)
    }

    pub fn settings(&self) -> RoutingSettings {
        self.state.read().expect("registry lock poisoned").settings.clone()
    }

    /// Replace the routing settings as a whole.
    pub async fn replace_settings(
        &self,
        settings: RoutingSettings,
    ) -> Result<RoutingSettings, RegistryError> {
        let _writes = self.writes.lock().await;
        self.state.write().expect("registry lock poisoned").settings = settings.clone();

        if let Err(e) = self.store.save_settings(&settings).await {
            tracing::warn!(error = %e, "Failed to persist routing settings");
        }
        self.emit(AuditEvent::new(
            AuditAction::SettingsReplaced,
            None,
            format!(
                "auto_failover={} interval_minutes={} down_policy={}",
                settings.auto_failover_enabled,
                settings.health_check_interval_minutes,
                settings.down_provider_policy
            ),
        ))
        .await;
        Ok(settings)
    }

    async fn persist(&self, provider: &ProviderConfig) {
        if let Err(e) = self.store.save_provider(provider).await {
            tracing::warn!(
                provider = %provider.name,
                provider_id = %provider.id,
                error = %e,
                "Failed to persist provider"
            );
        }
    }

    async fn emit(&self, event: AuditEvent) {
        if let Err(e) = self.audit.record(&event).await {
            tracing::warn!(action = %event.action, error = %e, "Failed to write audit event");
        }
    }
}

async fn read_state<S: ConfigStore>(store: &S) -> Result<RegistryState, RepositoryError> {
    let providers = store.load_providers().await?;
    let chatbot = store.load_chatbot_config().await?.unwrap_or_default();
    let settings = store.load_settings().await?.unwrap_or_default();
    Ok(RegistryState::new(providers, chatbot, settings))
}

fn parse_family(value: &str) -> Result<ProviderFamily, RegistryError> {
    value.parse().map_err(RegistryError::Validation)
}

fn parse_use_case(value: Option<&str>) -> Result<Option<UseCase>, RegistryError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.parse().map_err(RegistryError::Validation))
        .transpose()
}

fn to_secret(value: Option<String>) -> Option<SecretString> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| SecretString::from(v.trim().to_string()))
}

fn validate(provider: &ProviderConfig) -> Result<(), RegistryError> {
    let invalid = |msg: &str| Err(RegistryError::Validation(msg.to_string()));

    if provider.name.is_empty() {
        return invalid("name is required");
    }
    if provider.model.is_empty() {
        return invalid("model is required");
    }
    if provider.endpoint.is_empty() {
        return invalid("endpoint is required");
    }
    let rest = provider
        .endpoint
        .strip_prefix("https://")
        .or_else(|| provider.endpoint.strip_prefix("http://"));
    if rest.is_none_or(|host| host.is_empty() || host.starts_with('/')) {
        return invalid("endpoint must be an absolute http(s) URL");
    }
    if provider.timeout_seconds == 0 {
        return invalid("timeout_seconds must be greater than zero");
    }
    if provider.max_tokens == 0 {
        return invalid("max_tokens must be greater than zero");
    }
    Ok(())
}

fn changed_fields(request: &UpdateProviderRequest) -> Vec<&'static str> {
    [
        ("name", request.name.is_some()),
        ("family", request.family.is_some()),
        ("endpoint", request.endpoint.is_some()),
        ("model", request.model.is_some()),
        ("credential", request.credential.is_some()),
        ("priority", request.priority.is_some()),
        ("enabled", request.enabled.is_some()),
        ("timeout_seconds", request.timeout_seconds.is_some()),
        ("max_tokens", request.max_tokens.is_some()),
        ("use_case", request.use_case.is_some()),
        ("description", request.description.is_some()),
    ]
    .into_iter()
    .filter_map(|(name, present)| present.then_some(name))
    .collect()
}
