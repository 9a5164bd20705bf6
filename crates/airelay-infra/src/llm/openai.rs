//! OpenAI-style chat completions adapter, shared by OpenAI and xAI.
//!
//! `POST {endpoint}` with a bearer token. The system prompt, if any, becomes
//! a leading `system` message. The answer is `choices[0].message.content`.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use airelay_types::llm::{AiCompletion, AiRequest, LlmError, MessageRole};
use airelay_types::provider::ProviderConfig;

use super::{max_tokens, non_empty, post_json};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn build_request(provider: &ProviderConfig, request: &AiRequest) -> ChatRequest {
    let system = request.system.iter().map(|s| ChatMessage {
        role: "system",
        content: s.clone(),
    });
    let turns = request.messages.iter().map(|m| ChatMessage {
        role: match m.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        },
        content: m.content.clone(),
    });

    ChatRequest {
        model: provider.model.clone(),
        max_tokens: max_tokens(provider, request),
        messages: system.chain(turns).collect(),
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
        .bearer_auth(credential.expose_secret());

    let response: ChatResponse = post_json(builder, &build_request(provider, request)).await?;

    let text = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(LlmError::EmptyResponse)?;

    Ok(AiCompletion {
        text: non_empty(text)?,
        model: response.model,
    })
}
