//! One-shot routed request from the command line.

use anyhow::Result;
use console::style;

use airelay_core::health::sweeper::flush_history;
use airelay_types::llm::AiRequest;
use airelay_types::provider::UseCase;
use airelay_types::routing::AttemptOutcome;

use crate::cli::spinner;
use crate::state::AppState;

/// Route `prompt` through the failover chain for `use_case` and print the answer.
pub async fn ask(
    state: &AppState,
    prompt: &str,
    use_case: &str,
    system: Option<String>,
    json: bool,
) -> Result<()> {
    let use_case: UseCase = use_case.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    if prompt.trim().is_empty() {
        anyhow::bail!("Prompt must not be empty.");
    }

    let mut request = AiRequest::user(prompt);
    if let Some(system) = system {
        request = request.with_system(system);
    }

    let progress = (!json).then(|| spinner("Thinking...")).transpose()?;
    let response = state.router.route(use_case, &request).await;
    flush_history(&state.monitor, state.history.as_ref()).await;
    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    println!();
    println!("{}", response.text);
    println!();

    for attempt in &response.attempted_providers {
        match attempt.outcome {
            AttemptOutcome::Success => println!(
                "  {} {} ({}ms)",
                style("✓").green(),
                attempt.provider_name,
                attempt.latency_ms
            ),
            AttemptOutcome::Failed => println!(
                "  {} {} ({}ms) {}",
                style("✗").red(),
                attempt.provider_name,
                attempt.latency_ms,
                style("failed").dim()
            ),
        }
    }
    if response.is_fallback() {
        println!(
            "  {}",
            style("No provider answered; this is a pre-written fallback response.").yellow()
        );
    }
    println!();

    Ok(())
}
