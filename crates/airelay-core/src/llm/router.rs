//! Failover router.
//!
//! Routes a request through the providers eligible for its use case, in
//! priority order, one attempt at a time. Every attempt is bounded by the
//! provider's own timeout and feeds its outcome into the health monitor.
//! When the chain is exhausted the router answers with a synthetic response
//! instead of an error, so callers always receive text.

use std::sync::Arc;

use airelay_types::error::RouterError;
use airelay_types::health::{CheckSource, ProbeOutcome, ProviderState};
use airelay_types::llm::AiRequest;
use airelay_types::provider::{ProviderConfig, UseCase};
use airelay_types::routing::{AttemptOutcome, AttemptRecord, FALLBACK_PROVIDER, RoutedResponse};
use airelay_types::settings::DownProviderPolicy;

use crate::health::monitor::HealthMonitor;
use crate::repository::audit::AuditSink;
use crate::repository::config::ConfigStore;
use crate::service::registry::ProviderRegistry;

use super::client::BoxLlmClient;
use super::synthetic::synthetic_response;
use super::tester::call_with_deadline;

/// Order a candidate snapshot using live health.
///
/// Providers whose state is `down` move behind every other candidate
/// (keeping their relative order), are dropped, or stay where they are,
/// depending on `policy`.
pub fn order_candidates(
    candidates: Vec<ProviderConfig>,
    monitor: &HealthMonitor,
    policy: DownProviderPolicy,
) -> Vec<ProviderConfig> {
    let is_down = |p: &ProviderConfig| monitor.current_status(&p.id) == ProviderState::Down;

    match policy {
        DownProviderPolicy::InPlace => candidates,
        DownProviderPolicy::Skip => candidates.into_iter().filter(|p| !is_down(p)).collect(),
        DownProviderPolicy::Deprioritize => {
            let (down, up): (Vec<_>, Vec<_>) = candidates.into_iter().partition(is_down);
            up.into_iter().chain(down).collect()
        }
    }
}

/// Routes requests across providers with per-attempt failover.
///
/// Holds no per-request state; concurrent requests run independently.
pub struct FailoverRouter<S: ConfigStore, A: AuditSink> {
    registry: Arc<ProviderRegistry<S, A>>,
    monitor: Arc<HealthMonitor>,
    client: Arc<BoxLlmClient>,
}

impl<S: ConfigStore, A: AuditSink> FailoverRouter<S, A> {
    pub fn new(
        registry: Arc<ProviderRegistry<S, A>>,
        monitor: Arc<HealthMonitor>,
        client: Arc<BoxLlmClient>,
    ) -> Self {
        Self {
            registry,
            monitor,
            client,
        }
    }

    /// The chain a request for `use_case` would try right now.
    pub fn failover_chain(&self, use_case: UseCase) -> Vec<ProviderConfig> {
        let policy = self.registry.settings().down_provider_policy;
        order_candidates(self.registry.candidates(use_case), &self.monitor, policy)
    }

    /// Serve a request. Never fails: exhaustion yields a synthetic answer.
    pub async fn route(&self, use_case: UseCase, request: &AiRequest) -> RoutedResponse {
        let settings = self.registry.settings();
        let chain = order_candidates(
            self.registry.candidates(use_case),
            &self.monitor,
            settings.down_provider_policy,
        );

        let mut attempted = Vec::with_capacity(chain.len());

        for provider in &chain {
            let (result, latency_ms) = call_with_deadline(self.client.as_ref(), provider, request).await;

            match result {
                Ok(completion) => {
                    self.monitor.record_outcome(
                        provider,
                        &ProbeOutcome::succeeded(latency_ms),
                        CheckSource::Traffic,
                    );
                    attempted.push(AttemptRecord {
                        provider_id: provider.id,
                        provider_name: provider.name.clone(),
                        outcome: AttemptOutcome::Success,
                        latency_ms,
                    });

                    if attempted.len() > 1 {
                        tracing::warn!(
                            provider = %provider.name,
                            failed = attempted.len() - 1,
                            "Failover occurred"
                        );
                    }

                    return RoutedResponse {
                        text: completion.text,
                        provider_used: provider.name.clone(),
                        provider_id: Some(provider.id),
                        model: completion.model.or_else(|| Some(provider.model.clone())),
                        attempted_providers: attempted,
                        fallback_category: None,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        provider = %provider.name,
                        error = %err,
                        latency_ms,
                        "Provider failed, trying next in chain"
                    );
                    self.monitor.record_outcome(
                        provider,
                        &ProbeOutcome::failed(latency_ms, err.to_string()),
                        CheckSource::Traffic,
                    );
                    attempted.push(AttemptRecord {
                        provider_id: provider.id,
                        provider_name: provider.name.clone(),
                        outcome: AttemptOutcome::Failed,
                        latency_ms,
                    });

                    if !settings.auto_failover_enabled {
                        tracing::info!("Automatic failover disabled, not trying further providers");
                        break;
                    }
                }
            }
        }

        let exhausted = RouterError::AllProvidersExhausted {
            attempted: attempted.len(),
        };
        tracing::warn!(use_case = %use_case, reason = %exhausted, "Serving synthetic response");

        let synthetic = synthetic_response(use_case, request.last_user_text());
        RoutedResponse {
            text: synthetic.text,
            provider_used: FALLBACK_PROVIDER.to_string(),
            provider_id: None,
            model: None,
            attempted_providers: attempted,
            fallback_category: Some(synthetic.category),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use airelay_types::config::HealthConfig;
    use airelay_types::provider::CreateProviderRequest;
    use airelay_types::routing::FallbackCategory;
    use airelay_types::settings::RoutingSettings;

    use super::*;
    use crate::testing::{MemoryAuditSink, MemoryConfigStore, Script, ScriptedClient};

    type TestRouter = FailoverRouter<MemoryConfigStore, MemoryAuditSink>;

    struct Fixture {
        registry: Arc<ProviderRegistry<MemoryConfigStore, MemoryAuditSink>>,
        monitor: Arc<HealthMonitor>,
        client: ScriptedClient,
        router: TestRouter,
    }

    async fn fixture(client: ScriptedClient) -> Fixture {
        let registry = Arc::new(
            ProviderRegistry::load(MemoryConfigStore::default(), MemoryAuditSink::default())
                .await
                .unwrap(),
        );
        let monitor = Arc::new(HealthMonitor::new(&HealthConfig::default()));
        let router = FailoverRouter::new(
            registry.clone(),
            monitor.clone(),
            Arc::new(BoxLlmClient::new(client.clone())),
        );
        Fixture {
            registry,
            monitor,
            client,
            router,
        }
    }

    async fn add(registry: &ProviderRegistry<MemoryConfigStore, MemoryAuditSink>, name: &str, priority: u32) -> ProviderConfig {
        let view = registry
            .create(CreateProviderRequest {
                name: name.to_string(),
                family: "openai".to_string(),
                endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
                model: "gpt-4o-mini".to_string(),
                priority: Some(priority),
                timeout_seconds: Some(3),
                ..Default::default()
            })
            .await
            .unwrap();
        registry.provider(&view.id).unwrap()
    }

    #[tokio::test]
    async fn test_primary_succeeds() {
        let f = fixture(ScriptedClient::new()).await;
        add(&f.registry, "a", 1).await;
        add(&f.registry, "b", 2).await;

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        assert_eq!(resp.provider_used, "a");
        assert_eq!(resp.text, "answer from a");
        assert_eq!(resp.attempted_providers.len(), 1);
        assert_eq!(f.client.called_names(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_two_failures_then_success() {
        let client = ScriptedClient::new()
            .with("a", Script::Http(503, "overloaded"))
            .with("b", Script::Transport("connection refused"));
        let f = fixture(client).await;
        let a = add(&f.registry, "a", 1).await;
        let b = add(&f.registry, "b", 2).await;
        add(&f.registry, "c", 3).await;

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;

        assert_eq!(resp.provider_used, "c");
        assert_eq!(resp.text, "answer from c");
        assert_eq!(resp.failed_attempts(), 2);
        let outcomes: Vec<AttemptOutcome> = resp.attempted_providers.iter().map(|a| a.outcome).collect();
        assert_eq!(
            outcomes,
            vec![AttemptOutcome::Failed, AttemptOutcome::Failed, AttemptOutcome::Success]
        );
        assert_eq!(f.monitor.current_status(&a.id), ProviderState::Down);
        assert_eq!(f.monitor.current_status(&b.id), ProviderState::Down);
        let traffic = f.monitor.history(10);
        assert!(traffic.iter().all(|r| r.source == CheckSource::Traffic));
    }

    #[tokio::test]
    async fn test_real_payload_is_sent() {
        let f = fixture(ScriptedClient::new()).await;
        add(&f.registry, "a", 1).await;
        let request = AiRequest::user("design a camera layout").with_system("be brief");

        f.router.route(UseCase::General, &request).await;
        assert_eq!(f.client.calls()[0].1, request);
    }

    #[tokio::test]
    async fn test_zero_candidates_returns_fallback() {
        let f = fixture(ScriptedClient::new()).await;

        let resp = f.router.route(UseCase::Chatbot, &AiRequest::user("what's the budget?")).await;
        assert_eq!(resp.provider_used, FALLBACK_PROVIDER);
        assert!(resp.is_fallback());
        assert!(resp.attempted_providers.is_empty());
        assert_eq!(resp.fallback_category, Some(FallbackCategory::Pricing));
    }

    #[tokio::test]
    async fn test_all_failing_returns_category_fallback() {
        let client = ScriptedClient::new()
            .with("a", Script::Http(500, "x"))
            .with("b", Script::Http(500, "y"));
        let f = fixture(client).await;
        add(&f.registry, "a", 1).await;
        add(&f.registry, "b", 2).await;

        let resp = f.router.route(UseCase::General, &AiRequest::user("which camera?")).await;
        assert_eq!(resp.provider_used, FALLBACK_PROVIDER);
        assert_eq!(resp.fallback_category, Some(FallbackCategory::Surveillance));
        assert_eq!(resp.failed_attempts(), 2);
        assert!(!resp.text.contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_disabled_providers_never_attempted() {
        let f = fixture(ScriptedClient::new()).await;
        let a = add(&f.registry, "a", 1).await;
        add(&f.registry, "b", 2).await;
        f.registry
            .update(&a.id, airelay_types::provider::UpdateProviderRequest {
                enabled: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        assert_eq!(resp.provider_used, "b");
        assert_eq!(f.client.called_names(), vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_then_route_scenario() {
        // A times out on probe, B answers; a later request still tries A
        // (after B under deprioritize) only when B fails.
        let client = ScriptedClient::new()
            .with("a", Script::Hang)
            .with("b", Script::Reply("from b"));
        let f = fixture(client).await;
        let a = add(&f.registry, "a", 1).await;
        let b = add(&f.registry, "b", 2).await;

        f.registry.test_connection(&a.id, &f.client, &f.monitor).await.unwrap();
        f.registry.test_connection(&b.id, &f.client, &f.monitor).await.unwrap();
        assert_eq!(f.monitor.current_status(&a.id), ProviderState::Down);
        assert_eq!(f.monitor.current_status(&b.id), ProviderState::Healthy);
        assert_eq!(
            f.monitor.aggregate_status(&f.registry.enabled_ids()),
            airelay_types::health::SystemStatus::Degraded
        );

        let chain: Vec<String> = f.router.failover_chain(UseCase::General).into_iter().map(|p| p.name).collect();
        assert_eq!(chain, vec!["b", "a"]);

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        assert_eq!(resp.provider_used, "b");
        assert_eq!(resp.text, "from b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_down_provider_still_tried_last() {
        let client = ScriptedClient::new()
            .with("a", Script::Hang)
            .with("b", Script::Http(500, "boom"));
        let f = fixture(client).await;
        let a = add(&f.registry, "a", 1).await;
        add(&f.registry, "b", 2).await;
        f.registry.test_connection(&a.id, &f.client, &f.monitor).await.unwrap();

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        let names: Vec<&str> = resp.attempted_providers.iter().map(|a| a.provider_name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(resp.is_fallback());
        let a_latest = f.monitor.latest_result(&a.id).unwrap();
        assert_eq!(a_latest.source, CheckSource::Traffic);
        assert!(a_latest.error.as_deref().unwrap().starts_with("timeout after 3s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_place_policy_tries_down_provider_first() {
        // A timed out on its probe; under in-place ordering a real request
        // still tries A before B.
        let client = ScriptedClient::new()
            .with("a", Script::Hang)
            .with("b", Script::Reply("from b"));
        let f = fixture(client).await;
        let a = add(&f.registry, "a", 1).await;
        let b = add(&f.registry, "b", 2).await;
        f.registry.test_connection(&a.id, &f.client, &f.monitor).await.unwrap();
        f.registry.test_connection(&b.id, &f.client, &f.monitor).await.unwrap();
        f.registry
            .replace_settings(RoutingSettings {
                down_provider_policy: DownProviderPolicy::InPlace,
                ..RoutingSettings::default()
            })
            .await
            .unwrap();

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        assert_eq!(resp.provider_used, "b");
        assert_eq!(resp.text, "from b");
        let attempts: Vec<(&str, AttemptOutcome)> = resp
            .attempted_providers
            .iter()
            .map(|a| (a.provider_name.as_str(), a.outcome))
            .collect();
        assert_eq!(
            attempts,
            vec![("a", AttemptOutcome::Failed), ("b", AttemptOutcome::Success)]
        );
    }

    #[tokio::test]
    async fn test_skip_policy_drops_down_providers() {
        let client = ScriptedClient::new().with("a", Script::Http(500, "boom"));
        let f = fixture(client).await;
        let a = add(&f.registry, "a", 1).await;
        add(&f.registry, "b", 2).await;
        f.registry.test_connection(&a.id, &f.client, &f.monitor).await.unwrap();
        f.registry
            .replace_settings(RoutingSettings {
                down_provider_policy: DownProviderPolicy::Skip,
                ..RoutingSettings::default()
            })
            .await
            .unwrap();

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        assert_eq!(resp.provider_used, "b");
        assert_eq!(resp.attempted_providers.len(), 1);
    }

    #[tokio::test]
    async fn test_auto_failover_disabled_stops_after_first_failure() {
        let client = ScriptedClient::new().with("a", Script::Http(500, "boom"));
        let f = fixture(client).await;
        add(&f.registry, "a", 1).await;
        add(&f.registry, "b", 2).await;
        f.registry
            .replace_settings(RoutingSettings {
                auto_failover_enabled: false,
                ..RoutingSettings::default()
            })
            .await
            .unwrap();

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        assert!(resp.is_fallback());
        assert_eq!(f.client.called_names(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_use_case_candidates_with_general_fallback() {
        let f = fixture(ScriptedClient::new()).await;
        add(&f.registry, "general", 1).await;

        let resp = f.router.route(UseCase::Assessment, &AiRequest::user("hi")).await;
        assert_eq!(resp.provider_used, "general");
    }

    #[tokio::test]
    async fn test_attempts_are_sequential() {
        let client = ScriptedClient::new()
            .with("a", Script::Http(500, "x"))
            .with("b", Script::ReplyAfter("slow b", Duration::from_millis(20)));
        let f = fixture(client).await;
        add(&f.registry, "a", 1).await;
        add(&f.registry, "b", 2).await;
        add(&f.registry, "c", 3).await;

        let resp = f.router.route(UseCase::General, &AiRequest::user("hi")).await;
        assert_eq!(resp.provider_used, "b");
        // c is never started because b answered.
        assert_eq!(f.client.called_names(), vec!["a", "b"]);
    }
}
