mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::bond::{DurationArgs, PriceArgs, YtmArgs};

/// Fixed-income bond analytics
#[derive(Parser)]
#[command(
    name = "bondcalc",
    version,
    about = "Fixed-income bond analytics with decimal precision",
    long_about = "A CLI for standard fixed-income bond analytics: clean price, \
                  yield-to-maturity, Macaulay and modified duration, and convexity. \
                  Each subcommand reads a typed JSON input from --input or stdin. \
                  All rates are decimals (0.05 = 5%), never percentages."
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
    /// Price a bond from annual yield and coupon terms
    Price(PriceArgs),
    /// Solve for the periodic yield-to-maturity from an observed price
    Ytm(YtmArgs),
    /// Macaulay duration, modified duration, and convexity
    Duration(DurationArgs),
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
        Commands::Price(args) => commands::bond::run_price(args),
        Commands::Ytm(args) => commands::bond::run_ytm(args),
        Commands::Duration(args) => commands::bond::run_duration(args),
        Commands::Version => {
            println!("bondcalc {}", env!("CARGO_PKG_VERSION"));
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
