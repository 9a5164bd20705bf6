//! Audit events for security-relevant registry mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::provider::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    ProviderCreated,
    ProviderUpdated,
    ProviderDeleted,
    ProvidersReordered,
    ConnectionTested,
    ChatbotConfigReplaced,
    SettingsReplaced,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditAction::ProviderCreated => "provider_created",
            AuditAction::ProviderUpdated => "provider_updated",
            AuditAction::ProviderDeleted => "provider_deleted",
            AuditAction::ProvidersReordered => "providers_reordered",
            AuditAction::ConnectionTested => "connection_tested",
            AuditAction::ChatbotConfigReplaced => "chatbot_config_replaced",
            AuditAction::SettingsReplaced => "settings_replaced",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "provider_created" => Ok(AuditAction::ProviderCreated),
            "provider_updated" => Ok(AuditAction::ProviderUpdated),
            "provider_deleted" => Ok(AuditAction::ProviderDeleted),
            "providers_reordered" => Ok(AuditAction::ProvidersReordered),
            "connection_tested" => Ok(AuditAction::ConnectionTested),
            "chatbot_config_replaced" => Ok(AuditAction::ChatbotConfigReplaced),
            "settings_replaced" => Ok(AuditAction::SettingsReplaced),
            other => Err(format!("invalid audit action: '{other}'")),
        }
    }
}

/// An append-only audit record. `details` never contains credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, provider_id: Option<ProviderId>, details: impl Into<String>) -> Self {
        let details = details.into();
        Self {
            id: Uuid::now_v7(),
            action,
            provider_id,
            details: (!details.is_empty()).then_some(details),
            created_at: Utc::now(),
        }
    }
}
