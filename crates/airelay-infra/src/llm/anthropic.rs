//! Anthropic Messages API adapter.
//!
//! `POST {endpoint}` with `x-api-key` and `anthropic-version` headers. The
//! answer is the concatenation of the response's text content blocks.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use airelay_types::llm::{AiCompletion, AiRequest, LlmError, MessageRole};
use airelay_types::provider::ProviderConfig;

use super::{max_tokens, non_empty, post_json};

/// The Anthropic API version header value.
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

fn build_request(provider: &ProviderConfig, request: &AiRequest) -> MessagesRequest {
    MessagesRequest {
        model: provider.model.clone(),
        max_tokens: max_tokens(provider, request),
        messages: request
            .messages
            .iter()
            .map(|m| Message {
                role: match m.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "assistant",
                },
                content: m.content.clone(),
            })
            .collect(),
        system: request.system.clone(),
    }
}

pub(super) async fn send(
    http: &reqwest::Client,
    provider: &ProviderConfig,
    credential: &SecretString,
    request: &AiRequest,
) -> Result<AiCompletion, LlmError> {
    let builder = http
        .post(&provider.endpoint)
        .header("x-api-key", credential.expose_secret())
        .header("anthropic-version", API_VERSION)
        .header("content-type", "application/json");

    let response: MessagesResponse = post_json(builder, &build_request(provider, request)).await?;

    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("");

    Ok(AiCompletion {
        text: non_empty(text)?,
        model: response.model,
    })
}
