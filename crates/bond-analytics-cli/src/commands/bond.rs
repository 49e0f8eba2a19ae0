use clap::Args;
use serde::de::DeserializeOwned;
use serde_json::Value;

use bond_analytics_core::pricing::{self, BondPriceInput};
use bond_analytics_core::risk::{self, DurationConvexityInput};
use bond_analytics_core::yields::{self, YtmInput};

use crate::input;

/// Read a typed input from --input <file.json> or piped stdin.
fn read_input<T: DeserializeOwned>(
    path: &Option<String>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return input::file::read_json(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err(format!("--input <file.json> or stdin required for {what}").into())
}

/// Arguments for bond pricing
#[derive(Args)]
pub struct PriceArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_price(args: PriceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let price_input: BondPriceInput = read_input(&args.input, "bond pricing")?;
    let result = pricing::price_bond(&price_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the YTM solve
#[derive(Args)]
pub struct YtmArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_ytm(args: YtmArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let ytm_input: YtmInput = read_input(&args.input, "yield to maturity")?;
    let result = yields::calculate_ytm(&ytm_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for duration & convexity
#[derive(Args)]
pub struct DurationArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_duration(args: DurationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let duration_input: DurationConvexityInput = read_input(&args.input, "duration & convexity")?;
    let result = risk::calculate_duration_convexity(&duration_input)?;
    Ok(serde_json::to_value(result)?)
}
