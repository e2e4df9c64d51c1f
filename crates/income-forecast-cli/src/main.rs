mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::compare::CompareArgs;
use commands::project::ProjectArgs;
use commands::scenarios::ScenarioArgs;

/// Twelve-month projected income statements
#[derive(Parser)]
#[command(
    name = "ifc",
    version,
    about = "Twelve-month projected income statements",
    long_about = "A CLI for projecting a monthly income statement over a calendar year \
                  with decimal precision. Supports seasonality, special events, \
                  optimistic/realistic/pessimistic scenarios and comparison against actuals."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine diagnostics to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Project the monthly income statement for one year
    Project(ProjectArgs),
    /// Run the optimistic/realistic/pessimistic scenarios and sensitivity analysis
    Scenarios(ScenarioArgs),
    /// Compare actual monthly figures from a CSV file against the projection
    Compare(CompareArgs),
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

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::project::run_project(args),
        Commands::Scenarios(args) => commands::scenarios::run_scenarios(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Version => {
            println!("ifc {}", env!("CARGO_PKG_VERSION"));
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
