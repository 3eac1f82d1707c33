pub mod commands;
pub mod console;

use caredesk_core::config::{AppConfig, LogFormat};
use clap::{ArgGroup, Parser, Subcommand};
use std::process::ExitCode;

use crate::commands::run::{ApprovalMode, RunArgs};

#[derive(Debug, Parser)]
#[command(
    name = "caredesk",
    about = "Caredesk customer-support pipeline CLI",
    long_about = "Run customer inquiries through the support pipeline, list built-in scenarios, and inspect configuration.",
    after_help = "Examples:\n  caredesk run --scenario 1\n  caredesk run --query \"Where is ORD-555?\" --customer-id 11111 --json\n  caredesk scenarios\n  caredesk config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Resolve one customer inquiry end to end",
        group(ArgGroup::new("input").required(true).args(["scenario", "query"])),
        group(ArgGroup::new("decision").args(["approve", "decline"]))
    )]
    Run {
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6), help = "Built-in scenario number (see `caredesk scenarios`)")]
        scenario: Option<u8>,
        #[arg(long, help = "Free-text customer inquiry")]
        query: Option<String>,
        #[arg(long, help = "Customer identifier; overrides the scenario's customer")]
        customer_id: Option<String>,
        #[arg(long, help = "Approve escalated refunds without prompting")]
        approve: bool,
        #[arg(long, help = "Decline escalated refunds without prompting")]
        decline: bool,
        #[arg(long, help = "Emit the case outcome as JSON")]
        json: bool,
    },
    #[command(about = "List the built-in demonstration scenarios")]
    Scenarios,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { scenario, query, customer_id, approve, decline, json } => {
            let approval = match (approve, decline) {
                (true, _) => ApprovalMode::Approve,
                (_, true) => ApprovalMode::Decline,
                _ => ApprovalMode::Prompt,
            };
            commands::run::run(RunArgs { scenario, query, customer_id, approval, json })
        }
        Command::Scenarios => commands::scenarios::run(),
        Command::Config => commands::config::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Logs go to stderr so stdout carries only command output.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when commands run in-process more than once.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
