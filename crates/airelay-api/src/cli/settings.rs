//! Routing settings and chatbot configuration commands.

use anyhow::Result;
use clap::Subcommand;
use console::style;

use airelay_types::settings::{ChatbotConfig, DownProviderPolicy, RoutingSettings};

use crate::state::AppState;

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show routing settings and the chatbot configuration.
    Show,

    /// Change routing settings. Unspecified fields keep their value.
    Routing {
        /// Try the next provider when one fails.
        #[arg(long)]
        auto_failover: Option<bool>,

        /// Minutes between background sweeps (0 disables them).
        #[arg(long)]
        interval: Option<u64>,

        /// Down-provider policy: deprioritize, skip, in-place.
        #[arg(long)]
        policy: Option<String>,
    },

    /// Change the chatbot configuration. Unspecified fields keep their value.
    Chatbot {
        #[arg(long)]
        thread_management: Option<bool>,

        #[arg(long)]
        auto_initialize: Option<bool>,

        #[arg(long)]
        fallback: Option<bool>,

        #[arg(long)]
        max_conversation_length: Option<u32>,

        #[arg(long)]
        response_timeout: Option<u64>,
    },
}

pub async fn handle_settings_command(
    cmd: SettingsCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            show(&state.registry.settings(), &state.registry.chatbot_config(), json)
        }
        SettingsCommand::Routing {
            auto_failover,
            interval,
            policy,
        } => {
            let mut settings = state.registry.settings();
            if let Some(enabled) = auto_failover {
                settings.auto_failover_enabled = enabled;
            }
            if let Some(minutes) = interval {
                settings.health_check_interval_minutes = minutes;
            }
            if let Some(policy) = policy {
                settings.down_provider_policy = policy
                    .parse::<DownProviderPolicy>()
                    .map_err(|e| anyhow::anyhow!(e))?;
            }

            let settings = state.registry.replace_settings(settings).await?;
            show(&settings, &state.registry.chatbot_config(), json)
        }
        SettingsCommand::Chatbot {
            thread_management,
            auto_initialize,
            fallback,
            max_conversation_length,
            response_timeout,
        } => {
            let current = state.registry.chatbot_config();
            let config = ChatbotConfig {
                thread_management_enabled: thread_management
                    .unwrap_or(current.thread_management_enabled),
                auto_initialize: auto_initialize.unwrap_or(current.auto_initialize),
                fallback_enabled: fallback.unwrap_or(current.fallback_enabled),
                max_conversation_length: max_conversation_length
                    .unwrap_or(current.max_conversation_length),
                response_timeout_seconds: response_timeout
                    .unwrap_or(current.response_timeout_seconds),
            };

            let config = state.registry.replace_chatbot_config(config).await?;
            show(&state.registry.settings(), &config, json)
        }
    }
}

fn show(settings: &RoutingSettings, chatbot: &ChatbotConfig, json: bool) -> Result<()> {
    if json {
        let doc = serde_json::json!({
            "routing": settings,
            "chatbot": chatbot,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!();
    println!("  {}", style("── Routing ──").dim());
    println!("  Auto failover:   {}", settings.auto_failover_enabled);
    println!(
        "  Sweep interval:  {}",
        match settings.health_check_interval_minutes {
            0 => "disabled".to_string(),
            m => format!("{m} min"),
        }
    );
    println!("  Down providers:  {}", settings.down_provider_policy);
    println!();
    println!("  {}", style("── Chatbot ──").dim());
    println!("  Thread management:  {}", chatbot.thread_management_enabled);
    println!("  Auto initialize:    {}", chatbot.auto_initialize);
    println!("  Fallback enabled:   {}", chatbot.fallback_enabled);
    println!("  Max conversation:   {}", chatbot.max_conversation_length);
    println!("  Response timeout:   {}s", chatbot.response_timeout_seconds);
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routing_update_keeps_unspecified_fields() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf()).await.unwrap();

        handle_settings_command(
            SettingsCommand::Routing {
                auto_failover: None,
                interval: None,
                policy: Some("skip".to_string()),
            },
            &state,
            true,
        )
        .await
        .unwrap();

        let settings = state.registry.settings();
        assert_eq!(settings.down_provider_policy, DownProviderPolicy::Skip);
        assert!(settings.auto_failover_enabled);
        assert_eq!(settings.health_check_interval_minutes, 5);

        // Persisted: a fresh state over the same directory sees it.
        let reopened = AppState::open(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(reopened.registry.settings().down_provider_policy, DownProviderPolicy::Skip);
    }

    #[tokio::test]
    async fn test_invalid_chatbot_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf()).await.unwrap();

        let result = handle_settings_command(
            SettingsCommand::Chatbot {
                thread_management: None,
                auto_initialize: None,
                fallback: None,
                max_conversation_length: Some(0),
                response_timeout: None,
            },
            &state,
            true,
        )
        .await;
        assert!(result.is_err());
        assert_eq!(state.registry.chatbot_config(), ChatbotConfig::default());
    }
}
