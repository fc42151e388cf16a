use clap::Args;
use serde_json::Value;
use std::fs::File;
use std::io;
use std::time::Instant;

use capex_forecast_core::model::ForecastModel;
use capex_forecast_core::register::{export, AssetFilter};
use capex_forecast_core::with_metadata;

use crate::input;

/// Register source and view filters shared by every register command
#[derive(Args)]
pub struct RegisterArgs {
    /// Asset register (.csv or .json); a JSON array is read from stdin when omitted
    #[arg(long)]
    pub input: Option<String>,

    /// Restrict to a scenario (repeatable)
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,

    /// Restrict to a project code (repeatable)
    #[arg(long = "project")]
    pub projects: Vec<String>,
}

impl RegisterArgs {
    pub fn filter(&self) -> AssetFilter {
        AssetFilter::new(self.scenarios.iter().cloned(), self.projects.iter().cloned())
    }

    pub fn load_model(&self) -> Result<ForecastModel, Box<dyn std::error::Error>> {
        let lines = input::register::load_register(self.input.as_deref())?;
        Ok(ForecastModel::build(&lines))
    }

    /// Filter echo recorded as the assumptions of every register command.
    pub fn assumptions(&self) -> Value {
        serde_json::json!({
            "input": self.input.as_deref().unwrap_or("stdin"),
            "scenarios": self.scenarios,
            "projects": self.projects,
        })
    }
}

/// Arguments for CSV export
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub register: RegisterArgs,

    /// Destination file; CSV goes to stdout when omitted
    #[arg(long)]
    pub out: Option<String>,
}

pub fn run_enrich(args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let model = args.load_model()?;
    let filter = args.filter();
    let rows = model.filtered(&filter);
    let result = with_metadata(
        "Enrichment: total cost, parsed fiscal quarters and ordering indices",
        &args.assumptions(),
        model.filtered_report(&filter).warnings(),
        start.elapsed().as_micros() as u64,
        rows,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_summary(args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let model = args.load_model()?;
    let filter = args.filter();
    let summary = model.filtered_summary(&filter);
    let result = with_metadata(
        "Portfolio KPIs and CapEx totals by scenario, asset type and program",
        &args.assumptions(),
        model.filtered_report(&filter).warnings(),
        start.elapsed().as_micros() as u64,
        summary,
    );
    Ok(serde_json::to_value(result)?)
}

pub fn run_export(args: ExportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let model = args.register.load_model()?;
    let rows = model.filtered(&args.register.filter());

    match args.out {
        Some(ref path) => {
            let file =
                File::create(path).map_err(|e| format!("Failed to create '{}': {}", path, e))?;
            export::write_csv(file, rows.iter().copied())?;
            tracing::info!(path = %path, rows = rows.len(), "register exported");
            Ok(serde_json::json!({ "path": path, "rows": rows.len() }))
        }
        None => {
            export::write_csv(io::stdout().lock(), rows.iter().copied())?;
            Ok(Value::Null)
        }
    }
}
