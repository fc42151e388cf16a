use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use capex_forecast_core::model::ForecastModel;
use capex_forecast_core::valuation::CashflowAssumptions;

use crate::input;

/// Arguments for project cashflow, NPV and IRR
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CashflowArgs {
    /// Asset register (.csv or .json); a JSON array is read from stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Project code to value
    #[arg(long)]
    pub project: String,

    /// Discount rate (e.g. 0.10 for 10%)
    #[arg(long)]
    pub discount_rate: Option<Decimal>,

    /// Benefit inflow per unit of annual depreciation (default 1.3)
    #[arg(long)]
    pub benefit_multiple: Option<Decimal>,

    /// Starting guess for the IRR search
    #[arg(long)]
    pub irr_guess: Option<Decimal>,

    /// Assumptions file (.json or .yaml); flags override its values
    #[arg(long)]
    pub config: Option<String>,
}

impl CashflowArgs {
    fn assumptions(&self) -> Result<CashflowAssumptions, Box<dyn std::error::Error>> {
        let mut assumptions: CashflowAssumptions = match self.config {
            Some(ref path) => input::file::read_config(path)?,
            None => CashflowAssumptions::default(),
        };
        if let Some(rate) = self.discount_rate {
            assumptions.discount_rate = rate;
        }
        if let Some(multiple) = self.benefit_multiple {
            assumptions.benefit_multiple = multiple;
        }
        if let Some(guess) = self.irr_guess {
            assumptions.irr_guess = guess;
        }
        Ok(assumptions)
    }
}

pub fn run_cashflows(args: CashflowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let assumptions = args.assumptions()?;
    let lines = input::register::load_register(args.input.as_deref())?;
    let model = ForecastModel::build(&lines);
    let result = model.project_cashflows(&args.project, &assumptions)?;
    Ok(serde_json::to_value(result)?)
}
