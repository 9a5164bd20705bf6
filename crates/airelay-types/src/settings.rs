//! Runtime-mutable configuration records stored alongside providers.
//!
//! Both records are replaced as a whole, never patched field by field.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Configuration scoped to the chatbot use case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatbotConfig {
    pub thread_management_enabled: bool,
    pub auto_initialize: bool,
    pub fallback_enabled: bool,
    pub max_conversation_length: u32,
    pub response_timeout_seconds: u64,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            thread_management_enabled: true,
            auto_initialize: true,
            fallback_enabled: true,
            max_conversation_length: 50,
            response_timeout_seconds: 30,
        }
    }
}

/// What the router does with providers whose latest state is `down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownProviderPolicy {
    /// Keep them in the chain, after every provider that is not down.
    #[default]
    Deprioritize,
    /// Leave them out until a later success brings them back.
    Skip,
    /// Ignore health entirely and try providers in priority order.
    InPlace,
}

impl fmt::Display for DownProviderPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownProviderPolicy::Deprioritize => write!(f, "deprioritize"),
            DownProviderPolicy::Skip => write!(f, "skip"),
            DownProviderPolicy::InPlace => write!(f, "in-place"),
        }
    }
}

impl FromStr for DownProviderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deprioritize" => Ok(DownProviderPolicy::Deprioritize),
            "skip" => Ok(DownProviderPolicy::Skip),
            "in-place" | "in_place" | "inplace" => Ok(DownProviderPolicy::InPlace),
            other => Err(format!("invalid down-provider policy: '{other}'")),
        }
    }
}

/// Router and sweeper behaviour that operators may change at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingSettings {
    /// When false, the router gives up after the first failed attempt.
    #[serde(default = "default_true")]
    pub auto_failover_enabled: bool,
    /// Minutes between scheduled health sweeps. Zero disables the sweeper.
    #[serde(default = "default_interval")]
    pub health_check_interval_minutes: u64,
    #[serde(default)]
    pub down_provider_policy: DownProviderPolicy,
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    5
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            auto_failover_enabled: true,
            health_check_interval_minutes: default_interval(),
            down_provider_policy: DownProviderPolicy::default(),
        }
    }
}
