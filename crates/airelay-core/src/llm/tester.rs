//! Connection tester.
//!
//! A probe is one bounded call against one provider using that provider's
//! own endpoint, model and credential. The tester holds no state and never
//! retries, so probes for different providers can run concurrently.

use airelay_types::health::ProbeOutcome;
use airelay_types::llm::{AiCompletion, AiRequest, LlmError};
use airelay_types::provider::ProviderConfig;

use super::client::LlmClient;

/// Send `request` to `provider`, bounded by the provider's timeout.
///
/// Shared by probes and routed traffic so both observe identical failure
/// classification. Returns the result together with the elapsed milliseconds.
pub async fn call_with_deadline<C: LlmClient>(
    client: &C,
    provider: &ProviderConfig,
    request: &AiRequest,
) -> (Result<AiCompletion, LlmError>, u64) {
    let start = tokio::time::Instant::now();
    let result = match tokio::time::timeout(provider.timeout(), client.send(provider, request)).await
    {
        Ok(inner) => inner,
        Err(_) => Err(LlmError::Timeout {
            seconds: provider.timeout_seconds,
        }),
    };
    (result, start.elapsed().as_millis() as u64)
}

/// Probe a provider with the minimal connection-test request.
pub async fn probe<C: LlmClient>(client: &C, provider: &ProviderConfig) -> ProbeOutcome {
    let (result, latency_ms) = call_with_deadline(client, provider, &AiRequest::probe()).await;

    match result {
        Ok(_) => {
            tracing::debug!(provider = %provider.name, latency_ms, "Probe succeeded");
            ProbeOutcome::succeeded(latency_ms)
        }
        Err(err) => {
            tracing::debug!(provider = %provider.name, error = %err, "Probe failed");
            ProbeOutcome::failed(latency_ms, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedClient, provider};

    #[tokio::test]
    async fn test_probe_success_reports_latency() {
        let client = ScriptedClient::new();
        let outcome = probe(&client, &provider("a", 1)).await;
        assert!(outcome.success);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn test_probe_sends_probe_payload() {
        let client = ScriptedClient::new();
        probe(&client, &provider("a", 1)).await;
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, AiRequest::probe());
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_timeout_is_failure_with_timeout_message() {
        let client = ScriptedClient::new().with("slow", Script::Hang);
        let mut slow = provider("slow", 1);
        slow.timeout_seconds = 2;

        let outcome = probe(&client, &slow).await;
        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.starts_with("timeout after 2s"), "got: {error}");
    }

    #[tokio::test]
    async fn test_probe_http_failure_carries_status_and_body() {
        let client = ScriptedClient::new().with("bad", Script::Http(401, "invalid x-api-key"));
        let outcome = probe(&client, &provider("bad", 1)).await;
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("HTTP 401: invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_probe_never_retries() {
        let client = ScriptedClient::new().with("bad", Script::Http(500, "boom"));
        probe(&client, &provider("bad", 1)).await;
        assert_eq!(client.calls().len(), 1);
    }
}
