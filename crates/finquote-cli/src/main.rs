mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::compare::CompareArgs;
use commands::schedule::ScheduleArgs;
use commands::validate::ValidateArgs;

/// Dealership vehicle financing calculations
#[derive(Parser)]
#[command(
    name = "finquote",
    version,
    about = "Vehicle financing amortization and multi-lender offer comparison",
    long_about = "Prices vehicle financing for dealership staff with decimal precision: \
                  amortization schedules, per-lender negotiated overrides, and ranked \
                  multi-lender comparisons."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an amortization schedule for a single loan
    Schedule(ScheduleArgs),
    /// Compare offers across a lender catalog (ranked by monthly payment)
    Compare(CompareArgs),
    /// Normalize raw field input and report the current validation state
    Validate(ValidateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Validate(args) => commands::validate::run_validate(args),
        Commands::Version => {
            println!("finquote {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
