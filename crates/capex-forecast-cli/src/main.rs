mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::depreciation::AmortizeArgs;
use commands::register::{ExportArgs, RegisterArgs};
use commands::valuation::CashflowArgs;

/// Driver-based CapEx forecasting
#[derive(Parser)]
#[command(
    name = "capex",
    version,
    about = "Driver-based CapEx forecasting, depreciation and project valuation",
    long_about = "Reads a line-item asset register (CSV or JSON) and derives quarterly \
                  CapEx curves, straight-line depreciation schedules and project-level \
                  cashflow, NPV and IRR with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Enriched register rows (total cost, parsed quarters, ordering indices)
    Enrich(RegisterArgs),
    /// Headline KPIs and CapEx by scenario, asset type and program
    Summary(RegisterArgs),
    /// CapEx by order quarter and scenario
    QuarterlyCapex(RegisterArgs),
    /// Per-asset straight-line depreciation schedule
    Depreciation(RegisterArgs),
    /// Annual depreciation rolled up by program and year
    DepreciationByProgram(RegisterArgs),
    /// Depreciation spread by quarter and scenario
    QuarterlyDepreciation(RegisterArgs),
    /// Project cashflow, NPV and IRR
    Cashflows(CashflowArgs),
    /// Rolling amortization and net book value over a series of additions
    Amortize(AmortizeArgs),
    /// Write the filtered register as CSV
    Export(ExportArgs),
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

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Enrich(args) => commands::register::run_enrich(args),
        Commands::Summary(args) => commands::register::run_summary(args),
        Commands::QuarterlyCapex(args) => commands::rollup::run_quarterly_capex(args),
        Commands::Depreciation(args) => commands::depreciation::run_schedule(args),
        Commands::DepreciationByProgram(args) => commands::depreciation::run_by_program(args),
        Commands::QuarterlyDepreciation(args) => commands::depreciation::run_quarterly(args),
        Commands::Cashflows(args) => commands::valuation::run_cashflows(args),
        Commands::Amortize(args) => commands::depreciation::run_amortize(args),
        Commands::Export(args) => commands::register::run_export(args),
        Commands::Version => {
            println!("capex {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(serde_json::Value::Null) => process::exit(0),
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
