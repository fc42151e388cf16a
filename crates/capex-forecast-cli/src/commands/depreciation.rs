use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Instant;

use capex_forecast_core::depreciation::amortization::{run_amortization, AmortizationInput};
use capex_forecast_core::depreciation::schedule::useful_life_years;
use capex_forecast_core::model::ForecastModel;
use capex_forecast_core::register::AssetFilter;
use capex_forecast_core::with_metadata;

use super::register::RegisterArgs;
use crate::input;

/// Arguments for windowed amortization
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Capital additions per period (comma-separated, e.g. "100,100,100")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub additions: Option<Vec<Decimal>>,

    /// Useful life in periods
    #[arg(long)]
    pub useful_life: Option<u32>,

    /// Inflation rate applied to additions as (1 + r)^t
    #[arg(long, allow_hyphen_values = true)]
    pub inflation_rate: Option<Decimal>,
}

/// Filtered rows the depreciation tables leave out, and why.
fn skipped_warnings(model: &ForecastModel, filter: &AssetFilter) -> Vec<String> {
    let rows = model.filtered(filter);
    let mut warnings = Vec::new();
    let no_ramp = rows
        .iter()
        .filter(|r| r.ramp_start_quarter_year.is_none())
        .count();
    if no_ramp > 0 {
        warnings.push(format!(
            "{} rows without a valid Ramp_Start_Quarter contribute no depreciation",
            no_ramp
        ));
    }
    let no_life = rows
        .iter()
        .filter(|r| useful_life_years(&r.line).is_none())
        .count();
    if no_life > 0 {
        warnings.push(format!(
            "{} rows have no positive Depreciation_Years and contribute no depreciation",
            no_life
        ));
    }
    warnings
}

pub fn run_schedule(args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let model = args.load_model()?;
    let filter = args.filter();
    let schedule = model.filtered_depreciation_schedule(&filter);
    let result = with_metadata(
        "Straight-line depreciation: Total_Cost_USD / Depreciation_Years per year from the ramp-start year",
        &args.assumptions(),
        skipped_warnings(&model, &filter),
        start.elapsed().as_micros() as u64,
        schedule,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_by_program(args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let model = args.load_model()?;
    let filter = args.filter();
    let rollup = model.filtered_dep_by_program(&filter);
    let result = with_metadata(
        "Annual depreciation summed by (Project_Code, Program_Name, Year)",
        &args.assumptions(),
        skipped_warnings(&model, &filter),
        start.elapsed().as_micros() as u64,
        rollup,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_quarterly(args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let model = args.load_model()?;
    let filter = args.filter();
    let rows = model.filtered_quarterly_depreciation(&filter);
    let result = with_metadata(
        "Total_Cost_USD / (4 x Depreciation_Years) per quarter from the ramp-start quarter, by scenario",
        &args.assumptions(),
        skipped_warnings(&model, &filter),
        start.elapsed().as_micros() as u64,
        rows,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amortization_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(additions) = args.additions {
        AmortizationInput {
            additions,
            useful_life: args
                .useful_life
                .ok_or("--useful-life is required (or provide --input)")?,
            inflation_rate: args.inflation_rate,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--additions and --useful-life, --input <file.json> or stdin required".into());
    };

    let result = run_amortization(&amortization_input)?;
    Ok(serde_json::to_value(result)?)
}
