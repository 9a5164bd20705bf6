//! Google Gemini `generateContent` adapter.
//!
//! The credential travels as the `key` query parameter. Assistant turns use
//! the `model` role, and the answer joins `candidates[0].content.parts[].text`.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use airelay_types::llm::{AiCompletion, AiRequest, LlmError, MessageRole};
use airelay_types::provider::ProviderConfig;

use super::{max_tokens, non_empty, post_json};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn text_content(role: Option<&str>, text: &str) -> Content {
    Content {
        role: role.map(str::to_string),
        parts: vec![Part {
            text: Some(text.to_string()),
        }],
    }
}

fn build_request(provider: &ProviderConfig, request: &AiRequest) -> GenerateRequest {
    GenerateRequest {
        contents: request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    MessageRole::User => "user",
                    MessageRole::Assistant => "model",
                };
                text_content(Some(role), &m.content)
            })
            .collect(),
        system_instruction: request.system.as_deref().map(|s| text_content(None, s)),
        generation_config: GenerationConfig {
            max_output_tokens: max_tokens(provider, request),
        },
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
        .query(&[("key", credential.expose_secret())]);

    let response: GenerateResponse = post_json(builder, &build_request(provider, request)).await?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .ok_or(LlmError::EmptyResponse)?;

    Ok(AiCompletion {
        text: non_empty(text)?,
        model: response.model_version,
    })
}
