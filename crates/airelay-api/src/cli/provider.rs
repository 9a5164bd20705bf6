//! Provider management CLI commands: list, add, update, remove, test, reorder.
//!
//! Providers are stored in the SQLite registry with credentials encrypted at
//! rest. A provider can be referenced by id or (case-insensitively) by name.

use anyhow::{Result, bail};
use clap::Subcommand;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Password};

use airelay_infra::llm::resolve_credential;
use airelay_types::health::ProviderState;
use airelay_types::provider::{
    CreateProviderRequest, ProviderFamily, ProviderId, ProviderView, UpdateProviderRequest,
};

use crate::cli::spinner;
use crate::state::AppState;

/// Provider management subcommands.
#[derive(Subcommand)]
pub enum ProviderCommand {
    /// List providers in failover order.
    #[command(alias = "ls")]
    List,

    /// Register a provider.
    Add {
        /// Display name, unique among providers.
        #[arg(long)]
        name: String,

        /// Provider family: anthropic, openai, google, xai.
        #[arg(long)]
        family: String,

        /// Model identifier (e.g. claude-3-5-sonnet-20241022, gpt-4o).
        #[arg(long)]
        model: String,

        /// Endpoint URL (defaults to the family's public API).
        #[arg(long)]
        endpoint: Option<String>,

        /// API key. Omit to use the family's environment variable.
        #[arg(long, conflicts_with = "prompt_credential")]
        credential: Option<String>,

        /// Prompt for the API key with hidden input.
        #[arg(long)]
        prompt_credential: bool,

        /// Priority in the failover chain (lower is tried first).
        #[arg(long)]
        priority: Option<u32>,

        /// Per-call timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Output token cap for routed requests.
        #[arg(long)]
        max_tokens: Option<u32>,

        /// Use case tag (general, chatbot, assessment, ...).
        #[arg(long)]
        use_case: Option<String>,

        /// Free-form description.
        #[arg(long)]
        description: Option<String>,

        /// Register the provider disabled.
        #[arg(long)]
        disabled: bool,

        /// Skip the connection test after adding.
        #[arg(long)]
        skip_test: bool,
    },

    /// Change fields of an existing provider.
    Update {
        /// Provider id or name.
        provider: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        family: Option<String>,

        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        endpoint: Option<String>,

        /// New API key; an empty value clears the stored key.
        #[arg(long)]
        credential: Option<String>,

        #[arg(long)]
        priority: Option<u32>,

        #[arg(long)]
        timeout: Option<u64>,

        #[arg(long)]
        max_tokens: Option<u32>,

        #[arg(long)]
        use_case: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        #[arg(long)]
        disable: bool,
    },

    /// Remove a provider.
    #[command(alias = "rm")]
    Remove {
        /// Provider id or name.
        provider: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Run a connection test against a provider.
    Test {
        /// Provider id or name.
        provider: String,
    },

    /// Set the failover order; priorities become 1..n in the order given.
    Reorder {
        /// Provider ids or names, first is tried first.
        #[arg(required = true)]
        providers: Vec<String>,
    },
}

/// Handle a provider management subcommand.
pub async fn handle_provider_command(
    cmd: ProviderCommand,
    state: &AppState,
    json: bool,
) -> Result<()> {
    match cmd {
        ProviderCommand::List => provider_list(state, json),
        ProviderCommand::Add {
            name,
            family,
            model,
            endpoint,
            credential,
            prompt_credential,
            priority,
            timeout,
            max_tokens,
            use_case,
            description,
            disabled,
            skip_test,
        } => {
            let credential = if prompt_credential {
                Some(
                    Password::new()
                        .with_prompt(format!("API key for {}", style(&name).bold()))
                        .interact()?,
                )
            } else {
                credential
            };
            let endpoint = match endpoint {
                Some(endpoint) => endpoint,
                None => default_endpoint(&family, &model)?,
            };

            let request = CreateProviderRequest {
                name,
                family,
                endpoint,
                model,
                credential,
                priority,
                enabled: Some(!disabled),
                timeout_seconds: timeout,
                max_tokens,
                use_case,
                description,
            };
            provider_add(state, request, skip_test || disabled, json).await
        }
        ProviderCommand::Update {
            provider,
            name,
            family,
            model,
            endpoint,
            credential,
            priority,
            timeout,
            max_tokens,
            use_case,
            description,
            enable,
            disable,
        } => {
            let enabled = match (enable, disable) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            let request = UpdateProviderRequest {
                name,
                family,
                endpoint,
                model,
                credential,
                priority,
                enabled,
                timeout_seconds: timeout,
                max_tokens,
                use_case,
                description,
            };
            provider_update(state, &provider, request, json).await
        }
        ProviderCommand::Remove { provider, force } => {
            provider_remove(state, &provider, force, json).await
        }
        ProviderCommand::Test { provider } => provider_test(state, &provider, json).await,
        ProviderCommand::Reorder { providers } => provider_reorder(state, &providers, json).await,
    }
}

/// Public API endpoint for a family, used when `--endpoint` is omitted.
pub fn default_endpoint(family: &str, model: &str) -> Result<String> {
    let family: ProviderFamily = family.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    Ok(match family {
        ProviderFamily::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
        ProviderFamily::OpenAi => "https://api.openai.com/v1/chat/completions".to_string(),
        ProviderFamily::Google => format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
        ),
        ProviderFamily::Xai => "https://api.x.ai/v1/chat/completions".to_string(),
    })
}

/// Find a provider by id, else by case-insensitive name.
pub fn resolve_provider(state: &AppState, reference: &str) -> Result<ProviderView> {
    if let Ok(id) = reference.parse::<ProviderId>() {
        return Ok(state.registry.get(&id)?);
    }

    let needle = reference.trim().to_lowercase();
    match state
        .registry
        .list_all()
        .into_iter()
        .find(|p| p.name.to_lowercase() == needle)
    {
        Some(view) => Ok(view),
        None => bail!("Provider '{reference}' not found. Run `airelay provider list`."),
    }
}

pub fn state_cell(state: ProviderState) -> Cell {
    match state {
        ProviderState::Healthy => Cell::new("healthy").fg(Color::Green),
        ProviderState::Degraded => Cell::new("degraded").fg(Color::Yellow),
        ProviderState::Down => Cell::new("DOWN").fg(Color::Red),
        ProviderState::Unknown => Cell::new("unknown").fg(Color::DarkGrey),
    }
}

fn provider_list(state: &AppState, json: bool) -> Result<()> {
    let providers = state.registry.list_all();

    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    if providers.is_empty() {
        println!();
        println!(
            "  {} No providers configured. Use {} to add one.",
            style("i").blue().bold(),
            style("airelay provider add").cyan()
        );
        println!();
        return Ok(());
    }

    println!();
    println!("  {}", style("Failover Order").bold());
    println!();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Priority").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Family").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Use case").fg(Color::White),
        Cell::new("Key").fg(Color::White),
        Cell::new("Enabled").fg(Color::White),
        Cell::new("Health").fg(Color::White),
    ]);

    for provider in &providers {
        let enabled_cell = if provider.enabled {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::Red)
        };
        let key_cell = if provider.configured {
            Cell::new("stored").fg(Color::Green)
        } else {
            Cell::new("env").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(provider.priority).fg(Color::Cyan),
            Cell::new(&provider.name).fg(Color::White),
            Cell::new(provider.family.to_string()).fg(Color::DarkGrey),
            Cell::new(&provider.model).fg(Color::DarkGrey),
            Cell::new(provider.use_case.to_string()).fg(Color::DarkGrey),
            key_cell,
            enabled_cell,
            state_cell(state.monitor.current_status(&provider.id)),
        ]);
    }

    println!("{table}");
    println!();
    println!(
        "  {} provider{}",
        style(providers.len()).bold(),
        if providers.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

async fn provider_add(
    state: &AppState,
    request: CreateProviderRequest,
    skip_test: bool,
    json: bool,
) -> Result<()> {
    let duplicate = state
        .registry
        .list_all()
        .into_iter()
        .any(|p| p.name.eq_ignore_ascii_case(request.name.trim()));
    if duplicate {
        bail!(
            "Provider '{}' already exists. Use `airelay provider update` instead.",
            request.name
        );
    }

    let view = state.registry.create(request).await?;

    if !view.configured {
        let full = state.registry.provider(&view.id)?;
        if let Err(e) = resolve_credential(&full) {
            if !json {
                eprintln!("  {} {e}", style("!").yellow().bold());
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "  {} Provider '{}' added (priority {}, model: {}).",
            style("+").green().bold(),
            style(&view.name).cyan(),
            view.priority,
            view.model
        );
    }

    if !skip_test {
        provider_test(state, &view.id.to_string(), json).await?;
    }

    Ok(())
}

async fn provider_update(
    state: &AppState,
    reference: &str,
    request: UpdateProviderRequest,
    json: bool,
) -> Result<()> {
    let existing = resolve_provider(state, reference)?;
    let view = state.registry.update(&existing.id, request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!(
            "  {} Provider '{}' updated.",
            style("~").cyan().bold(),
            style(&view.name).cyan()
        );
    }
    Ok(())
}

async fn provider_remove(state: &AppState, reference: &str, force: bool, json: bool) -> Result<()> {
    let provider = resolve_provider(state, reference)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove provider '{}' from the failover chain?",
                style(&provider.name).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.registry.delete(&provider.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"removed": true, "id": provider.id, "name": provider.name})
        );
    } else {
        println!(
            "  {} Provider '{}' removed.",
            style("x").red().bold(),
            style(&provider.name).cyan()
        );
    }
    Ok(())
}

async fn provider_test(state: &AppState, reference: &str, json: bool) -> Result<()> {
    let provider = resolve_provider(state, reference)?;

    let progress = (!json)
        .then(|| spinner(format!("Testing connection to {}...", provider.name)))
        .transpose()?;

    let outcome = state
        .registry
        .test_connection(&provider.id, state.client.as_ref(), &state.monitor)
        .await?;
    airelay_core::health::sweeper::flush_history(&state.monitor, state.history.as_ref()).await;

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "provider": provider.name,
                "success": outcome.success,
                "latency_ms": outcome.latency_ms,
                "error": outcome.error,
                "state": state.monitor.current_status(&provider.id),
            })
        );
        return Ok(());
    }

    if outcome.success {
        println!(
            "  {} {} connected in {}ms ({})",
            style("✓").green().bold(),
            style(&provider.name).cyan(),
            outcome.latency_ms,
            state.monitor.current_status(&provider.id)
        );
    } else {
        println!(
            "  {} {} failed after {}ms: {}",
            style("✗").red().bold(),
            style(&provider.name).cyan(),
            outcome.latency_ms,
            outcome.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

async fn provider_reorder(state: &AppState, references: &[String], json: bool) -> Result<()> {
    let ids = references
        .iter()
        .map(|r| resolve_provider(state, r).map(|p| p.id))
        .collect::<Result<Vec<_>>>()?;

    let providers = state.registry.reorder(&ids).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
    } else {
        println!("  {} Failover order updated:", style("✓").green().bold());
        for provider in providers.iter().filter(|p| ids.contains(&p.id)) {
            println!("    {}. {}", provider.priority, style(&provider.name).cyan());
        }
    }
    Ok(())
}
