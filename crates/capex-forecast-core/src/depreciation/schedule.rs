//! Per-asset straight-line depreciation.
//!
//! Each asset with a positive useful life and a parsed ramp-start year fans
//! out into one entry per year of life, starting in the ramp year. Assets
//! missing either input are skipped without error.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::FiscalQuarter;
use crate::register::{AssetLine, EnrichedAssetLine};
use crate::types::Money;

const QUARTERS_PER_YEAR: u32 = 4;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One year of depreciation for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationScheduleEntry {
    #[serde(rename = "Project_Code")]
    pub project_code: String,
    #[serde(rename = "Program_Name")]
    pub program_name: String,
    #[serde(rename = "Asset_ID")]
    pub asset_id: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Annual_Depreciation_USD")]
    pub annual_depreciation_usd: Money,
}

/// Depreciation of one program in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramDepreciationRow {
    #[serde(rename = "Project_Code")]
    pub project_code: String,
    #[serde(rename = "Program_Name")]
    pub program_name: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Annual_Depreciation_USD")]
    pub annual_depreciation_usd: Money,
}

/// Depreciation recognised in one quarter under one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyDepreciationRow {
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Period")]
    pub period: FiscalQuarter,
    #[serde(rename = "Depreciation_USD")]
    pub depreciation_usd: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Whole years of useful life, or `None` when absent or not positive.
/// Fractional lives are truncated, so 0.5 years yields `None`.
pub fn useful_life_years(line: &AssetLine) -> Option<u32> {
    let years = line.depreciation_years?;
    if years <= Decimal::ZERO {
        return None;
    }
    years.trunc().to_u32().filter(|&n| n > 0)
}

/// The schedule for a single asset, in year order.
pub fn asset_schedule(
    row: &EnrichedAssetLine,
) -> impl Iterator<Item = DepreciationScheduleEntry> + '_ {
    let plan = useful_life_years(&row.line).zip(row.ramp_start_quarter_year);
    let (life, ramp_year) = plan.unwrap_or((0, 0));
    let annual = if life > 0 {
        row.total_cost_usd / Decimal::from(life)
    } else {
        Decimal::ZERO
    };

    (0..life).map(move |i| DepreciationScheduleEntry {
        project_code: row.line.project_code.clone(),
        program_name: row.line.program_name.clone(),
        asset_id: row.line.asset_id.clone(),
        year: ramp_year + i as i32,
        annual_depreciation_usd: annual,
    })
}

/// Full schedule: assets in input order, each asset's years ascending.
pub fn depreciation_schedule<'a, I>(rows: I) -> Vec<DepreciationScheduleEntry>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    let mut skipped = 0usize;
    let schedule: Vec<DepreciationScheduleEntry> = rows
        .into_iter()
        .inspect(|row| {
            if useful_life_years(&row.line).is_none() || row.ramp_start_quarter_year.is_none() {
                skipped += 1;
            }
        })
        .flat_map(asset_schedule)
        .collect();
    if skipped > 0 {
        tracing::debug!(skipped, "assets without a depreciable life or ramp year");
    }
    schedule
}

/// Sum the schedule by (Project_Code, Program_Name, Year), sorted by that key.
pub fn annual_dep_by_program(
    schedule: &[DepreciationScheduleEntry],
) -> Vec<ProgramDepreciationRow> {
    let mut buckets: BTreeMap<(&str, &str, i32), Money> = BTreeMap::new();
    for entry in schedule {
        *buckets
            .entry((entry.project_code.as_str(), entry.program_name.as_str(), entry.year))
            .or_insert(Decimal::ZERO) += entry.annual_depreciation_usd;
    }

    buckets
        .into_iter()
        .map(
            |((project_code, program_name, year), annual_depreciation_usd)| ProgramDepreciationRow {
                project_code: project_code.to_string(),
                program_name: program_name.to_string(),
                year,
                annual_depreciation_usd,
            },
        )
        .collect()
}

/// Sum the schedule by calendar year.
pub fn annual_dep_by_year(schedule: &[DepreciationScheduleEntry]) -> BTreeMap<i32, Money> {
    let mut totals = BTreeMap::new();
    for entry in schedule {
        *totals.entry(entry.year).or_insert(Decimal::ZERO) += entry.annual_depreciation_usd;
    }
    totals
}

/// Spread each asset's cost evenly over `4 * life` quarters starting at the
/// ramp-start quarter, summed by (Scenario, Period) and sorted by period,
/// then scenario. Needs the full ramp quarter, not just its year.
pub fn quarterly_depreciation<'a, I>(rows: I) -> Vec<QuarterlyDepreciationRow>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    let mut buckets: BTreeMap<(FiscalQuarter, &str), Money> = BTreeMap::new();
    for row in rows {
        let (Some(life), Some(start)) = (useful_life_years(&row.line), row.ramp_quarter()) else {
            continue;
        };
        let quarters = life * QUARTERS_PER_YEAR;
        let per_quarter = row.total_cost_usd / Decimal::from(quarters);
        for q in 0..quarters {
            *buckets
                .entry((start.offset(q), row.line.scenario.as_str()))
                .or_insert(Decimal::ZERO) += per_quarter;
        }
    }

    buckets
        .into_iter()
        .map(|((period, scenario), depreciation_usd)| QuarterlyDepreciationRow {
            scenario: scenario.to_string(),
            period,
            depreciation_usd,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
