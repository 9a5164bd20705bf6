//! Provider configuration types.
//!
//! A `ProviderConfig` is one configured upstream AI endpoint. The credential
//! is held as a [`SecretString`] and never leaves the process through a
//! serialized form: callers see a [`ProviderView`] with a `configured` flag.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-request timeout applied when a provider does not specify one.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Default maximum output tokens applied when a provider does not specify one.
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

/// Unique identifier for a provider, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderId(pub Uuid);

impl ProviderId {
    /// Create a new ProviderId using UUID v7.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProviderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Upstream wire protocol family.
///
/// Each family has its own request/response JSON shape and auth scheme.
/// `Xai` speaks the OpenAI chat-completions dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderFamily {
    Anthropic,
    OpenAi,
    Google,
    Xai,
}

impl ProviderFamily {
    pub const ALL: [ProviderFamily; 4] = [
        ProviderFamily::Anthropic,
        ProviderFamily::OpenAi,
        ProviderFamily::Google,
        ProviderFamily::Xai,
    ];

    /// Environment variable consulted when a provider has no stored credential.
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            ProviderFamily::Anthropic => "ANTHROPIC_API_KEY",
            ProviderFamily::OpenAi => "OPENAI_API_KEY",
            ProviderFamily::Google => "GEMINI_API_KEY",
            ProviderFamily::Xai => "XAI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFamily::Anthropic => write!(f, "anthropic"),
            ProviderFamily::OpenAi => write!(f, "openai"),
            ProviderFamily::Google => write!(f, "google"),
            ProviderFamily::Xai => write!(f, "xai"),
        }
    }
}

impl FromStr for ProviderFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" => Ok(ProviderFamily::Anthropic),
            "openai" => Ok(ProviderFamily::OpenAi),
            "google" | "gemini" => Ok(ProviderFamily::Google),
            "xai" | "grok" => Ok(ProviderFamily::Xai),
            other => Err(format!(
                "unsupported provider family: '{other}' (expected anthropic, openai, google or xai)"
            )),
        }
    }
}

/// Purpose of a request, used to pick eligible providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    General,
    Chatbot,
    Assessment,
    Search,
    Analysis,
    CreativeWriting,
    CreativeImage,
    CreativeResearch,
}

impl Default for UseCase {
    fn default() -> Self {
        UseCase::General
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UseCase::General => "general",
            UseCase::Chatbot => "chatbot",
            UseCase::Assessment => "assessment",
            UseCase::Search => "search",
            UseCase::Analysis => "analysis",
            UseCase::CreativeWriting => "creative-writing",
            UseCase::CreativeImage => "creative-image",
            UseCase::CreativeResearch => "creative-research",
        };
        write!(f, "{s}")
    }
}

impl FromStr for UseCase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "general" => Ok(UseCase::General),
            "chatbot" | "chat" => Ok(UseCase::Chatbot),
            "assessment" => Ok(UseCase::Assessment),
            "search" => Ok(UseCase::Search),
            "analysis" => Ok(UseCase::Analysis),
            "creative-writing" => Ok(UseCase::CreativeWriting),
            "creative-image" => Ok(UseCase::CreativeImage),
            "creative-research" => Ok(UseCase::CreativeResearch),
            other => Err(format!("invalid use case: '{other}'")),
        }
    }
}

/// One configured upstream AI endpoint.
///
/// Not serializable: the credential must never be echoed. Use [`ProviderConfig::view`]
/// for anything that leaves the process.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub id: ProviderId,
    pub name: String,
    pub family: ProviderFamily,
    /// Absolute http(s) URL the request is POSTed to.
    pub endpoint: String,
    /// Stored credential. `None` means "resolve from the family's env var".
    pub credential: Option<SecretString>,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
    /// Lower is tried first. Need not be unique.
    pub priority: u32,
    pub enabled: bool,
    pub use_case: UseCase,
    pub description: String,
    /// Insertion sequence, the tie-breaker for equal priorities.
    pub position: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProviderConfig {
    /// Hard deadline for any single call to this provider.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Ordering key for candidate lists: priority, then insertion order.
    pub fn sort_key(&self) -> (u32, u64) {
        (self.priority, self.position)
    }

    /// Redacted, serializable projection.
    pub fn view(&self) -> ProviderView {
        ProviderView {
            id: self.id,
            name: self.name.clone(),
            family: self.family,
            endpoint: self.endpoint.clone(),
            model: self.model.clone(),
            timeout_seconds: self.timeout_seconds,
            max_tokens: self.max_tokens,
            priority: self.priority,
            enabled: self.enabled,
            use_case: self.use_case,
            description: self.description.clone(),
            configured: self.credential.is_some(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// What callers see of a provider. The credential is reduced to `configured`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderView {
    pub id: ProviderId,
    pub name: String,
    pub family: ProviderFamily,
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
    pub priority: u32,
    pub enabled: bool,
    pub use_case: UseCase,
    pub description: String,
    /// True when a credential is stored for this provider.
    pub configured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a provider.
///
/// `family` and `use_case` are taken as strings so that unsupported values
/// surface as validation errors rather than body-parse failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProviderRequest {
    pub name: String,
    pub family: String,
    pub endpoint: String,
    pub model: String,
    #[serde(default)]
    pub credential: Option<String>,
    #[serde(default)]
    pub priority: Option<u32>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub use_case: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial update. Absent fields keep their current value; an empty
/// `credential` string clears the stored credential.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProviderRequest {
    pub name: Option<String>,
    pub family: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub credential: Option<String>,
    pub priority: Option<u32>,
    pub enabled: Option<bool>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<u32>,
    pub use_case: Option<String>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(credential: Option<&str>) -> ProviderConfig {
        let now = Utc::now();
        ProviderConfig {
            id: ProviderId::new(),
            name: "Claude".to_string(),
            family: ProviderFamily::Anthropic,
            endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            credential: credential.map(SecretString::from),
            model: "claude-3-5-sonnet-20241022".to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_tokens: DEFAULT_MAX_TOKENS,
            priority: 1,
            enabled: true,
            use_case: UseCase::General,
            description: String::new(),
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_provider_id_display_fromstr_roundtrip() {
        let id = ProviderId::new();
        let parsed: ProviderId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_family_parse_accepts_aliases() {
        assert_eq!("OpenAI".parse::<ProviderFamily>().unwrap(), ProviderFamily::OpenAi);
        assert_eq!("gemini".parse::<ProviderFamily>().unwrap(), ProviderFamily::Google);
        assert_eq!("grok".parse::<ProviderFamily>().unwrap(), ProviderFamily::Xai);
        assert!("mistral".parse::<ProviderFamily>().is_err());
    }

    #[test]
    fn test_family_serde_uses_lowercase() {
        let json = serde_json::to_string(&ProviderFamily::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
    }

    #[test]
    fn test_use_case_kebab_case() {
        let json = serde_json::to_string(&UseCase::CreativeWriting).unwrap();
        assert_eq!(json, "\"creative-writing\"");
        assert_eq!("creative_writing".parse::<UseCase>().unwrap(), UseCase::CreativeWriting);
        assert_eq!(UseCase::CreativeImage.to_string(), "creative-image");
    }

    #[test]
    fn test_view_redacts_credential() {
        let provider = sample(Some("sk-ant-secret-value"));
        let view = provider.view();
        assert!(view.configured);

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("sk-ant-secret-value"));
        assert!(json.contains("\"configured\":true"));
    }

    #[test]
    fn test_debug_does_not_leak_credential() {
        let provider = sample(Some("sk-ant-secret-value"));
        let debug = format!("{provider:?}");
        assert!(!debug.contains("sk-ant-secret-value"));
    }

    #[test]
    fn test_view_without_credential() {
        let view = sample(None).view();
        assert!(!view.configured);
    }

    #[test]
    fn test_sort_key_orders_priority_then_position() {
        let mut a = sample(None);
        a.priority = 2;
        a.position = 0;
        let mut b = sample(None);
        b.priority = 1;
        b.position = 5;
        let mut c = sample(None);
        c.priority = 1;
        c.position = 3;

        let mut all = vec![a.clone(), b.clone(), c.clone()];
        all.sort_by_key(|p| p.sort_key());
        assert_eq!(all[0].id, c.id);
        assert_eq!(all[1].id, b.id);
        assert_eq!(all[2].id, a.id);
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateProviderRequest = serde_json::from_str(
            r#"{"name":"x","family":"openai","endpoint":"https://e","model":"m"}"#,
        )
        .unwrap();
        assert!(req.priority.is_none());
        assert!(req.enabled.is_none());
        assert!(req.credential.is_none());
    }
}
