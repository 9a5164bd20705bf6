//! Configuration persistence trait.

use std::future::Future;

use airelay_types::error::RepositoryError;
use airelay_types::provider::{ProviderConfig, ProviderId};
use airelay_types::settings::{ChatbotConfig, RoutingSettings};

/// Durable store for provider records, the chatbot configuration and
/// routing settings.
///
/// Read once on startup (and on explicit reload), written through on every
/// registry mutation. Implementations are responsible for protecting the
/// credential at rest.
pub trait ConfigStore: Send + Sync {
    /// All providers, in any order. The registry re-sorts them.
    fn load_providers(
        &self,
    ) -> impl Future<Output = Result<Vec<ProviderConfig>, RepositoryError>> + Send;

    /// Insert or replace a provider record.
    fn save_provider(
        &self,
        provider: &ProviderConfig,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn delete_provider(
        &self,
        id: &ProviderId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn load_chatbot_config(
        &self,
    ) -> impl Future<Output = Result<Option<ChatbotConfig>, RepositoryError>> + Send;

    fn save_chatbot_config(
        &self,
        config: &ChatbotConfig,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn load_settings(
        &self,
    ) -> impl Future<Output = Result<Option<RoutingSettings>, RepositoryError>> + Send;

    fn save_settings(
        &self,
        settings: &RoutingSettings,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
