//! LlmClient trait and its object-safe wrapper.
//!
//! One client serves every configured provider: the provider record carries
//! the family, endpoint, model and credential, and the implementation
//! dispatches to the matching wire adapter. Implementations live in
//! airelay-infra (e.g., `HttpLlmClient`).

use std::future::Future;
use std::pin::Pin;

use airelay_types::llm::{AiCompletion, AiRequest, LlmError};
use airelay_types::provider::ProviderConfig;

/// Sends a request to one provider in its native protocol.
///
/// Uses native async fn in traits (RPITIT). Implementations must not apply
/// their own retries; the caller bounds the call with the provider's timeout.
pub trait LlmClient: Send + Sync {
    fn send(
        &self,
        provider: &ProviderConfig,
        request: &AiRequest,
    ) -> impl Future<Output = Result<AiCompletion, LlmError>> + Send;
}

/// Object-safe version of [`LlmClient`] with boxed futures.
///
/// A blanket implementation is provided for all types implementing `LlmClient`.
pub trait LlmClientDyn: Send + Sync {
    fn send_boxed<'a>(
        &'a self,
        provider: &'a ProviderConfig,
        request: &'a AiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AiCompletion, LlmError>> + Send + 'a>>;
}

impl<T: LlmClient> LlmClientDyn for T {
    fn send_boxed<'a>(
        &'a self,
        provider: &'a ProviderConfig,
        request: &'a AiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<AiCompletion, LlmError>> + Send + 'a>> {
        Box::pin(self.send(provider, request))
    }
}

/// Type-erased client, so application state can hold the HTTP client or a
/// test double behind one concrete type.
pub struct BoxLlmClient {
    inner: Box<dyn LlmClientDyn + Send + Sync>,
}

impl BoxLlmClient {
    pub fn new<T: LlmClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }
}

impl LlmClient for BoxLlmClient {
    fn send(
        &self,
        provider: &ProviderConfig,
        request: &AiRequest,
    ) -> impl Future<Output = Result<AiCompletion, LlmError>> + Send {
        let inner = &self.inner;
        async move { inner.send_boxed(provider, request).await }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedClient, provider};

    #[tokio::test]
    async fn test_boxed_client_delegates_to_inner() {
        let boxed = BoxLlmClient::new(ScriptedClient::new().with("b", Script::Http(503, "busy")));
        let request = AiRequest::user("hi");

        let completion = boxed.send(&provider("a", 1), &request).await.unwrap();
        assert_eq!(completion.text, "answer from a");

        let err = boxed.send(&provider("b", 2), &request).await.unwrap_err();
        assert!(matches!(err, LlmError::Http { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_boxed_client_future_is_send() {
        let boxed = std::sync::Arc::new(BoxLlmClient::new(ScriptedClient::new()));
        let handle = tokio::spawn({
            let boxed = boxed.clone();
            async move {
                let provider = provider("a", 1);
                let request = AiRequest::user("hi");
                boxed.send(&provider, &request).await
            }
        });
        assert_eq!(handle.await.unwrap().unwrap().text, "answer from a");
    }
}
