//! HTTP implementation of the core [`LlmClient`] trait.
//!
//! One adapter per provider family; [`HttpLlmClient`] picks the adapter from
//! `ProviderConfig::family` and resolves the credential (stored value first,
//! then the family's environment variable). Deadlines are enforced by the
//! caller, so the reqwest client itself carries no timeout.

mod anthropic;
mod google;
mod openai;

use std::future::Future;

use secrecy::SecretString;
use serde::Serialize;
use serde::de::DeserializeOwned;

use airelay_core::llm::client::LlmClient;
use airelay_types::llm::{AiCompletion, AiRequest, LlmError};
use airelay_types::provider::{ProviderConfig, ProviderFamily};

/// Shared reqwest client dispatching on provider family.
#[derive(Clone, Default)]
pub struct HttpLlmClient {
    http: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LlmClient for HttpLlmClient {
    fn send(
        &self,
        provider: &ProviderConfig,
        request: &AiRequest,
    ) -> impl Future<Output = Result<AiCompletion, LlmError>> + Send {
        let http = self.http.clone();
        let provider = provider.clone();
        let request = request.clone();

        async move {
            let credential = resolve_credential(&provider)?;
            tracing::debug!(provider = %provider.name, family = %provider.family, "Sending upstream request");

            match provider.family {
                ProviderFamily::Anthropic => anthropic::send(&http, &provider, &credential, &request).await,
                ProviderFamily::OpenAi | ProviderFamily::Xai => {
                    openai::send(&http, &provider, &credential, &request).await
                }
                ProviderFamily::Google => google::send(&http, &provider, &credential, &request).await,
            }
        }
    }
}

/// The stored credential, else the family's environment variable.
pub fn resolve_credential(provider: &ProviderConfig) -> Result<SecretString, LlmError> {
    if let Some(secret) = &provider.credential {
        return Ok(secret.clone());
    }

    let env_var = provider.family.credential_env_var();
    match std::env::var(env_var) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::from(value)),
        _ => Err(LlmError::MissingCredential {
            env_var: env_var.to_string(),
        }),
    }
}

/// Output cap for a request: the request's override, else the provider's.
fn max_tokens(provider: &ProviderConfig, request: &AiRequest) -> u32 {
    request.max_tokens.unwrap_or(provider.max_tokens)
}

/// POST `body` and decode a successful JSON response.
///
/// Non-2xx statuses become [`LlmError::Http`] with a truncated body.
async fn post_json<B: Serialize, R: DeserializeOwned>(
    builder: reqwest::RequestBuilder,
    body: &B,
) -> Result<R, LlmError> {
    let response = builder
        .json(body)
        .send()
        .await
        .map_err(|e| LlmError::Transport(format!("HTTP request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(LlmError::http(status.as_u16(), &error_body));
    }

    response
        .json()
        .await
        .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))
}

/// Reject blank completions so they count as failures.
fn non_empty(text: String) -> Result<String, LlmError> {
    if text.trim().is_empty() {
        Err(LlmError::EmptyResponse)
    } else {
        Ok(text)
    }
}
