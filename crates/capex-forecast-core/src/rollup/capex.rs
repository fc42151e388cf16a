//! CapEx rollups over the enriched register: quarterly spend curves and
//! scenario / asset-type / program summaries.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::period::FiscalQuarter;
use crate::register::EnrichedAssetLine;
use crate::types::Money;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Total CapEx ordered in one quarter under one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlyCapexRow {
    #[serde(rename = "Scenario")]
    pub scenario: String,
    #[serde(rename = "Order_Period")]
    pub order_period: FiscalQuarter,
    #[serde(rename = "Total_Cost_USD")]
    pub total_cost_usd: Money,
}

/// Total CapEx for one program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramCapex {
    #[serde(rename = "Project_Code")]
    pub project_code: String,
    #[serde(rename = "Program_Name")]
    pub program_name: String,
    #[serde(rename = "Total_Cost_USD")]
    pub total_cost_usd: Money,
}

/// Headline figures for a (possibly filtered) register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioKpis {
    pub total_capex: Money,
    /// Distinct project codes
    pub programs: usize,
    /// Distinct asset IDs
    pub assets: usize,
    pub rows: usize,
    /// Rows left out of quarterly rollups because Order_Quarter did not parse
    pub rows_without_order_period: usize,
}

/// Everything the summary view shows in one structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapexSummary {
    pub kpis: PortfolioKpis,
    pub capex_by_scenario: BTreeMap<String, Money>,
    pub capex_by_asset_type: BTreeMap<String, Money>,
    pub capex_by_program: Vec<ProgramCapex>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sum Total_Cost_USD by (Scenario, Order_Period). Rows without a parsed
/// order period are dropped. Sorted by period, then scenario.
pub fn quarterly_capex<'a, I>(rows: I) -> Vec<QuarterlyCapexRow>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    let mut buckets: BTreeMap<(FiscalQuarter, &str), Money> = BTreeMap::new();
    for row in rows {
        if let Some(period) = row.order_period {
            *buckets
                .entry((period, row.line.scenario.as_str()))
                .or_insert(Decimal::ZERO) += row.total_cost_usd;
        }
    }

    buckets
        .into_iter()
        .map(|((order_period, scenario), total_cost_usd)| QuarterlyCapexRow {
            scenario: scenario.to_string(),
            order_period,
            total_cost_usd,
        })
        .collect()
}

/// Total CapEx per scenario over all rows, whether or not their period parsed.
pub fn capex_by_scenario<'a, I>(rows: I) -> BTreeMap<String, Money>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    sum_by(rows, |row| row.line.scenario.clone())
}

pub fn capex_by_asset_type<'a, I>(rows: I) -> BTreeMap<String, Money>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    sum_by(rows, |row| row.line.asset_type.clone())
}

/// Total CapEx per (Project_Code, Program_Name), sorted by that pair.
pub fn capex_by_program<'a, I>(rows: I) -> Vec<ProgramCapex>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    sum_by(rows, |row| {
        (row.line.project_code.clone(), row.line.program_name.clone())
    })
    .into_iter()
    .map(|((project_code, program_name), total_cost_usd)| ProgramCapex {
        project_code,
        program_name,
        total_cost_usd,
    })
    .collect()
}

pub fn portfolio_kpis<'a, I>(rows: I) -> PortfolioKpis
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    let mut total_capex = Decimal::ZERO;
    let mut programs = BTreeSet::new();
    let mut assets = BTreeSet::new();
    let mut count = 0usize;
    let mut without_period = 0usize;

    for row in rows {
        total_capex += row.total_cost_usd;
        programs.insert(row.line.project_code.as_str());
        assets.insert(row.line.asset_id.as_str());
        count += 1;
        if row.order_period.is_none() {
            without_period += 1;
        }
    }

    PortfolioKpis {
        total_capex,
        programs: programs.len(),
        assets: assets.len(),
        rows: count,
        rows_without_order_period: without_period,
    }
}

pub fn summarize<'a, I>(rows: I) -> CapexSummary
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
{
    let rows: Vec<&EnrichedAssetLine> = rows.into_iter().collect();
    CapexSummary {
        kpis: portfolio_kpis(rows.iter().copied()),
        capex_by_scenario: capex_by_scenario(rows.iter().copied()),
        capex_by_asset_type: capex_by_asset_type(rows.iter().copied()),
        capex_by_program: capex_by_program(rows.iter().copied()),
    }
}

/// Distinct scenarios, ascending.
pub fn scenarios(rows: &[EnrichedAssetLine]) -> Vec<String> {
    distinct(rows, |row| row.line.scenario.clone())
}

/// Distinct project codes, ascending.
pub fn project_codes(rows: &[EnrichedAssetLine]) -> Vec<String> {
    distinct(rows, |row| row.line.project_code.clone())
}

/// Distinct (Project_Code, Program_Name) pairs, ascending.
pub fn programs(rows: &[EnrichedAssetLine]) -> Vec<(String, String)> {
    distinct(rows, |row| {
        (row.line.project_code.clone(), row.line.program_name.clone())
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn sum_by<'a, I, K, F>(rows: I, key: F) -> BTreeMap<K, Money>
where
    I: IntoIterator<Item = &'a EnrichedAssetLine>,
    K: Ord,
    F: Fn(&EnrichedAssetLine) -> K,
{
    let mut totals = BTreeMap::new();
    for row in rows {
        *totals.entry(key(row)).or_insert(Decimal::ZERO) += row.total_cost_usd;
    }
    totals
}

fn distinct<K, F>(rows: &[EnrichedAssetLine], key: F) -> Vec<K>
where
    K: Ord,
    F: Fn(&EnrichedAssetLine) -> K,
{
    rows.iter().map(key).collect::<BTreeSet<_>>().into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{enrich, AssetLine};
    use rust_decimal_macros::dec;

    fn line(project: &str, scenario: &str, order: &str, cost: Decimal) -> AssetLine {
        AssetLine {
            project_code: project.into(),
            program_name: format!("{project} program"),
            asset_id: format!("{project}-{scenario}-{order}"),
            asset_name: String::new(),
            asset_type: if cost > dec!(100) { "Tool".into() } else { "Facility".into() },
            process_area: String::new(),
            fab_location: String::new(),
            scenario: scenario.into(),
            quantity: dec!(1),
            unit_cost_usd: cost,
            order_quarter: Some(order.into()),
            need_quarter: None,
            ramp_start_quarter: None,
            depreciation_years: None,
        }
    }

    fn sample() -> Vec<EnrichedAssetLine> {
        enrich(&[
            line("P1", "Upside", "2025Q2", dec!(300)),
            line("P1", "Base", "2025Q2", dec!(100)),
            line("P2", "Base", "2025Q2", dec!(50)),
            line("P2", "Base", "2025Q1", dec!(70)),
            line("P2", "Base", "bad", dec!(999)),
        ])
    }

    #[test]
    fn test_quarterly_capex_groups_and_sorts() {
        let rows = sample();
        let q = quarterly_capex(&rows);
        let flat: Vec<(String, String, Money)> = q
            .iter()
            .map(|r| (r.order_period.to_string(), r.scenario.clone(), r.total_cost_usd))
            .collect();
        assert_eq!(
            flat,
            vec![
                ("2025Q1".to_string(), "Base".to_string(), dec!(70)),
                ("2025Q2".to_string(), "Base".to_string(), dec!(150)),
                ("2025Q2".to_string(), "Upside".to_string(), dec!(300)),
            ]
        );
    }

    #[test]
    fn test_quarterly_capex_conserves_valid_totals() {
        let rows = sample();
        let rolled: Money = quarterly_capex(&rows).iter().map(|r| r.total_cost_usd).sum();
        let valid: Money = rows
            .iter()
            .filter(|r| r.order_period.is_some())
            .map(|r| r.total_cost_usd)
            .sum();
        assert_eq!(rolled, valid);
    }

    #[test]
    fn test_capex_by_scenario_includes_unparsed_rows() {
        let rows = sample();
        let by = capex_by_scenario(&rows);
        assert_eq!(by["Base"], dec!(1219));
        assert_eq!(by["Upside"], dec!(300));
    }

    #[test]
    fn test_summary_kpis() {
        let rows = sample();
        let summary = summarize(&rows);
        assert_eq!(summary.kpis.total_capex, dec!(1519));
        assert_eq!(summary.kpis.programs, 2);
        assert_eq!(summary.kpis.assets, 5);
        assert_eq!(summary.kpis.rows_without_order_period, 1);
        assert_eq!(summary.capex_by_asset_type["Tool"], dec!(1299));
        assert_eq!(summary.capex_by_program.len(), 2);
        assert_eq!(summary.capex_by_program[1].total_cost_usd, dec!(1119));
    }

    #[test]
    fn test_summary_over_borrowed_subset() {
        let rows = sample();
        let summary = summarize(rows.iter().filter(|r| r.line.scenario == "Upside"));
        assert_eq!(summary.kpis.total_capex, dec!(300));
        assert_eq!(summary.kpis.rows, 1);
        assert_eq!(summary.capex_by_scenario.len(), 1);
        assert_eq!(summary.capex_by_program[0].project_code, "P1");
    }

    #[test]
    fn test_distinct_lists() {
        let rows = sample();
        assert_eq!(scenarios(&rows), vec!["Base", "Upside"]);
        assert_eq!(project_codes(&rows), vec!["P1", "P2"]);
        assert_eq!(programs(&rows)[0], ("P1".to_string(), "P1 program".to_string()));
    }

    #[test]
    fn test_empty_input_gives_empty_rollups() {
        let rows: Vec<EnrichedAssetLine> = Vec::new();
        assert!(quarterly_capex(&rows).is_empty());
        assert!(capex_by_scenario(&rows).is_empty());
        assert_eq!(portfolio_kpis(&rows).total_capex, Decimal::ZERO);
    }
}
