//! CLI command definitions and dispatch for the `airelay` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a
//! noun-verb pattern for resources (`airelay provider add`) and plain verbs
//! for one-shot actions (`airelay status`, `airelay ask`).

pub mod ask;
pub mod provider;
pub mod serve;
pub mod settings;
pub mod status;

use std::time::Duration;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use indicatif::{ProgressBar, ProgressStyle};

/// Route AI requests across providers with health-aware failover.
#[derive(Parser)]
#[command(name = "airelay", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage providers in the failover chain.
    Provider {
        #[command(subcommand)]
        action: provider::ProviderCommand,
    },

    /// Show or change routing settings and the chatbot configuration.
    Settings {
        #[command(subcommand)]
        action: settings::SettingsCommand,
    },

    /// Provider health dashboard and failover chain.
    Status {
        /// Use case whose failover chain is shown.
        #[arg(long, default_value = "general")]
        use_case: String,
    },

    /// Probe every enabled provider now.
    Sweep,

    /// Send a prompt through the failover chain.
    Ask {
        /// The prompt text.
        prompt: String,

        /// Use case to route for (general, chatbot, assessment, ...).
        #[arg(long, short = 'u', default_value = "general")]
        use_case: String,

        /// Optional system prompt.
        #[arg(long)]
        system: Option<String>,
    },

    /// Start the REST API server and the background health sweeper.
    Serve {
        /// Port to listen on (default from config.toml, else 3000).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (default from config.toml, else 127.0.0.1).
        #[arg(long)]
        host: Option<String>,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// A cyan steady-tick spinner showing `message`.
pub fn spinner(message: impl Into<String>) -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Ok(spinner)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_use_case() {
        let cli = Cli::try_parse_from(["airelay", "ask", "hello", "-u", "chatbot", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Ask { prompt, use_case, system } => {
                assert_eq!(prompt, "hello");
                assert_eq!(use_case, "chatbot");
                assert!(system.is_none());
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["airelay", "-vv", "sweep"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
