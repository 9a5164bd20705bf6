//! airelay CLI and REST API entry point.
//!
//! Binary name: `airelay`
//!
//! Parses CLI arguments, initializes tracing, the database and services,
//! then dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use airelay_infra::config::{data_dir, load_global_config};
use airelay_observe::tracing_setup::{
    TracingOptions, filter_for_verbosity, init_tracing, shutdown_tracing,
};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "airelay", &mut std::io::stdout());
        return Ok(());
    }

    // Telemetry toggles come from config.toml; verbosity from the flags.
    let telemetry = load_global_config(&data_dir()).await.telemetry;
    let default_filter = match cli.command {
        Commands::Serve { .. } if cli.verbose == 0 && !cli.quiet => "info",
        _ => filter_for_verbosity(cli.verbose, cli.quiet),
    };
    init_tracing(&TracingOptions {
        otel: telemetry.otel,
        json: telemetry.json_logs,
        default_filter: default_filter.to_string(),
    })
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;

    match cli.command {
        Commands::Provider { action } => {
            cli::provider::handle_provider_command(action, &state, cli.json).await?;
        }
        Commands::Settings { action } => {
            cli::settings::handle_settings_command(action, &state, cli.json).await?;
        }
        Commands::Status { use_case } => {
            cli::status::status(&state, &use_case, cli.json)?;
        }
        Commands::Sweep => {
            cli::status::sweep(&state, cli.json).await?;
        }
        Commands::Ask {
            prompt,
            use_case,
            system,
        } => {
            cli::ask::ask(&state, &prompt, &use_case, system, cli.json).await?;
        }
        Commands::Serve { port, host } => {
            cli::serve::serve(state, host, port).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
