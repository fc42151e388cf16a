use serde_json::Value;
use std::time::Instant;

use capex_forecast_core::register::EnrichmentReport;
use capex_forecast_core::with_metadata;

use super::register::RegisterArgs;

fn rollup_warnings(report: &EnrichmentReport) -> Vec<String> {
    let mut warnings: Vec<String> = Vec::new();
    if report.unparsed_order_quarter > 0 {
        warnings.push(format!(
            "{} rows without a valid Order_Quarter are not in the quarterly rollup",
            report.unparsed_order_quarter
        ));
    }
    warnings
}

pub fn run_quarterly_capex(args: RegisterArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let model = args.load_model()?;
    let filter = args.filter();
    let rows = model.filtered_quarterly_capex(&filter);

    let result = with_metadata(
        "Total_Cost_USD summed by (Order_Period, Scenario)",
        &args.assumptions(),
        rollup_warnings(&model.filtered_report(&filter)),
        start.elapsed().as_micros() as u64,
        rows,
    );
    Ok(serde_json::to_value(result)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capex_forecast_core::model::ForecastModel;
    use capex_forecast_core::register::{AssetFilter, AssetLine};
    use rust_decimal_macros::dec;

    fn line(project: &str, order: &str) -> AssetLine {
        AssetLine {
            project_code: project.into(),
            program_name: String::new(),
            asset_id: format!("{project}-1"),
            asset_name: String::new(),
            asset_type: "Tool".into(),
            process_area: String::new(),
            fab_location: String::new(),
            scenario: "Base".into(),
            quantity: dec!(1),
            unit_cost_usd: dec!(100),
            order_quarter: Some(order.into()),
            need_quarter: None,
            ramp_start_quarter: None,
            depreciation_years: None,
        }
    }

    #[test]
    fn test_rollup_warnings_follow_project_filter() {
        let model = ForecastModel::build(&[line("P1", "2025Q1"), line("P2", "TBD")]);

        let clean = AssetFilter::new(Vec::<String>::new(), ["P1"]);
        assert!(rollup_warnings(&model.filtered_report(&clean)).is_empty());

        let undated = AssetFilter::new(Vec::<String>::new(), ["P2"]);
        let warnings = rollup_warnings(&model.filtered_report(&undated));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("1 rows without a valid Order_Quarter"));
    }
}
