//! Status dashboard and on-demand sweep commands.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use airelay_core::health::sweeper::flush_history;
use airelay_core::service::report::status_report;
use airelay_types::health::{HealthStatus, SystemStatus};
use airelay_types::provider::UseCase;
use airelay_types::report::StatusReport;

use crate::cli::provider::state_cell;
use crate::cli::spinner;
use crate::state::AppState;

/// Display the status report for `use_case`.
///
/// Reads only what the monitor already knows (persisted history plus
/// anything recorded this run); it never probes.
pub fn status(state: &AppState, use_case: &str, json: bool) -> Result<()> {
    let use_case: UseCase = use_case.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let report = status_report(state.registry.as_ref(), &state.monitor, use_case);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    println!("  {}", style(format!("Data dir: {}", state.data_dir.display())).dim());
    println!();
    Ok(())
}

fn print_report(report: &StatusReport) {
    let headline = match report.status {
        SystemStatus::Healthy => style("HEALTHY").green().bold(),
        SystemStatus::Degraded => style("DEGRADED").yellow().bold(),
        SystemStatus::Critical => style("CRITICAL").red().bold(),
    };

    println!();
    println!(
        "  {} airelay v{}  {}",
        style("⚡").bold(),
        env!("CARGO_PKG_VERSION"),
        headline
    );
    println!();

    println!("  {}", style("── Providers ──").dim());
    println!(
        "  Total: {}  Healthy: {}  Degraded: {}  Offline: {}  Unknown: {}",
        style(report.counts.total).bold(),
        style(report.counts.healthy).green(),
        style(report.counts.degraded).yellow(),
        style(report.counts.offline).red(),
        style(report.counts.unknown).dim()
    );
    println!();

    if !report.providers.is_empty() {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("Provider").fg(Color::White),
            Cell::new("Model").fg(Color::White),
            Cell::new("State").fg(Color::White),
            Cell::new("Latency").fg(Color::White),
            Cell::new("Success").fg(Color::White),
            Cell::new("Last error").fg(Color::White),
        ]);

        for entry in &report.providers {
            let latency = entry
                .response_time_ms
                .map(|ms| format!("{ms}ms"))
                .unwrap_or_else(|| "-".to_string());
            let success = entry
                .success_rate
                .map(|r| format!("{:.0}%", r * 100.0))
                .unwrap_or_else(|| "-".to_string());

            table.add_row(vec![
                Cell::new(&entry.name).fg(Color::White),
                Cell::new(&entry.model).fg(Color::DarkGrey),
                state_cell(entry.state),
                Cell::new(latency),
                Cell::new(success),
                Cell::new(truncate(entry.error.as_deref().unwrap_or("-"), 40)).fg(Color::DarkGrey),
            ]);
        }
        println!("{table}");
        println!();
    }

    println!(
        "  {}",
        style(format!("── Failover chain ({}) ──", report.use_case)).dim()
    );
    if report.failover_chain.is_empty() {
        println!("  {}", style("No providers; requests get synthetic answers.").yellow());
    }
    for entry in &report.failover_chain {
        println!("  {}. {} ({})", entry.position, entry.name, entry.state);
    }
    println!();

    match &report.active_provider {
        Some(active) => println!(
            "  Active: {}  ({} fallback{} available)",
            style(active).cyan().bold(),
            report.fallbacks_available,
            if report.fallbacks_available == 1 { "" } else { "s" }
        ),
        None => println!("  {}", style("All providers are down.").red().bold()),
    }
    println!();
}

/// Probe every enabled provider and persist the results.
pub async fn sweep(state: &AppState, json: bool) -> Result<()> {
    let providers = state.registry.enabled();
    if providers.is_empty() {
        if json {
            println!("[]");
        } else {
            println!("  {} No enabled providers to probe.", style("i").blue().bold());
        }
        return Ok(());
    }

    let progress = (!json)
        .then(|| spinner(format!("Probing {} provider(s)...", providers.len())))
        .transpose()?;

    let results = state
        .monitor
        .run_sweep(state.client.as_ref(), &providers)
        .await;
    flush_history(&state.monitor, state.history.as_ref()).await;

    if let Some(progress) = progress {
        progress.finish_and_clear();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for result in &results {
        let mark = match result.status {
            HealthStatus::Healthy => style("✓").green().bold(),
            HealthStatus::Degraded => style("~").yellow().bold(),
            HealthStatus::Down => style("✗").red().bold(),
        };
        let detail = match (&result.error, result.response_time_ms) {
            (Some(error), _) => error.clone(),
            (None, Some(ms)) => format!("{ms}ms"),
            (None, None) => String::new(),
        };
        println!("  {mark} {} {}", style(&result.provider_name).cyan(), style(detail).dim());
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 40), "short");
        let long = "é".repeat(50);
        let cut = truncate(&long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with("..."));
    }

    #[tokio::test]
    async fn test_status_and_sweep_with_no_providers() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::open(dir.path().to_path_buf()).await.unwrap();

        status(&state, "general", true).unwrap();
        sweep(&state, true).await.unwrap();
        assert!(status(&state, "poetry", true).is_err());
    }
}
