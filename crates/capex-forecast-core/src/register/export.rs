//! CSV export of enriched rows: the register columns followed by
//! `Total_Cost_USD`, comma-delimited UTF-8 with a header row.

use std::io::Write;

use rust_decimal::Decimal;
use serde::Serialize;

use super::asset::EnrichedAssetLine;
use crate::error::CapexError;
use crate::types::Money;
use crate::CapexResult;

/// Header written ahead of the exported rows.
pub const EXPORT_COLUMNS: [&str; 15] = [
    "Project_Code",
    "Program_Name",
    "Scenario",
    "Asset_ID",
    "Asset_Name",
    "Asset_Type",
    "Process_Area",
    "Fab_Location",
    "Order_Quarter",
    "Need_Quarter",
    "Ramp_Start_Quarter",
    "Quantity",
    "Unit_Cost_USD",
    "Total_Cost_USD",
    "Depreciation_Years",
];

#[derive(Serialize)]
struct ExportRow<'a> {
    project_code: &'a str,
    program_name: &'a str,
    scenario: &'a str,
    asset_id: &'a str,
    asset_name: &'a str,
    asset_type: &'a str,
    process_area: &'a str,
    fab_location: &'a str,
    order_quarter: Option<&'a str>,
    need_quarter: Option<&'a str>,
    ramp_start_quarter: Option<&'a str>,
    quantity: Decimal,
    unit_cost_usd: Money,
    total_cost_usd: Money,
    depreciation_years: Option<Decimal>,
}

impl<'a> From<&'a EnrichedAssetLine> for ExportRow<'a> {
    fn from(row: &'a EnrichedAssetLine) -> Self {
        let line = &row.line;
        ExportRow {
            project_code: &line.project_code,
            program_name: &line.program_name,
            scenario: &line.scenario,
            asset_id: &line.asset_id,
            asset_name: &line.asset_name,
            asset_type: &line.asset_type,
            process_area: &line.process_area,
            fab_location: &line.fab_location,
            order_quarter: line.order_quarter.as_deref(),
            need_quarter: line.need_quarter.as_deref(),
            ramp_start_quarter: line.ramp_start_quarter.as_deref(),
            quantity: line.quantity,
            unit_cost_usd: line.unit_cost_usd,
            total_cost_usd: row.total_cost_usd,
            depreciation_years: line.depreciation_years,
        }
    }
}

/// Write rows sorted by (Project_Code, Scenario, Asset_ID).
pub fn write_csv<'a, W, I>(writer: W, rows: I) -> CapexResult<()>
where
    W: Write,
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    let mut sorted: Vec<&EnrichedAssetLine> = rows.into_iter().collect();
    sorted.sort_by(|a, b| {
        (&a.line.project_code, &a.line.scenario, &a.line.asset_id).cmp(&(
            &b.line.project_code,
            &b.line.scenario,
            &b.line.asset_id,
        ))
    });

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS)?;
    for row in sorted {
        wtr.serialize(ExportRow::from(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render rows to an in-memory CSV string.
pub fn to_csv_string<'a, I>(rows: I) -> CapexResult<String>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    let mut buf = Vec::new();
    write_csv(&mut buf, rows)?;
    String::from_utf8(buf).map_err(|e| CapexError::Csv(e.to_string()))
}
