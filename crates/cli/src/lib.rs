pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "stockcast",
    about = "Stockcast operator CLI",
    long_about = "Inspect configuration, check readiness, and run the simulation offline.",
    after_help = "Examples:\n  stockcast config\n  stockcast simulate --ticks 288 --seed 42\n  \
                  stockcast doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Run the simulation for a fixed number of ticks without the server")]
    Simulate {
        #[arg(long, help = "Number of ticks to run")]
        ticks: u64,
        #[arg(long, help = "Seed for the random stream (overrides config)")]
        seed: Option<u64>,
        #[arg(long, help = "RFC 3339 timestamp of the first tick (defaults to now)")]
        start: Option<String>,
        #[arg(long, help = "Append emitted events to this JSON Lines file")]
        events: Option<PathBuf>,
    },
    #[command(about = "Validate config and event log directory writability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Simulate { ticks, seed, start, events } => {
            commands::simulate::run(commands::simulate::SimulateArgs { ticks, seed, start, events })
        }
        Command::Doctor { json } => {
            let report = commands::doctor::run(json);
            commands::CommandResult {
                exit_code: if report.healthy { 0 } else { 1 },
                output: report.output,
            }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
