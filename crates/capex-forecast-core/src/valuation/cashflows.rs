//! Project-level cashflow, NPV and IRR.
//!
//! The inflow side is a proxy: each year's depreciation scaled by a benefit
//! multiple stands in for the operating value the assets unlock. Years are
//! discounted by their ordinal position in the sorted year list (first year
//! is period 0), not by calendar distance.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::depreciation::{annual_dep_by_year, depreciation_schedule};
use crate::error::CapexError;
use crate::register::EnrichedAssetLine;
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::CapexResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_DISCOUNT_RATE: Rate = dec!(0.10);
pub const DEFAULT_BENEFIT_MULTIPLE: Multiple = dec!(1.3);
const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Valuation assumptions. The benefit multiple and the ordinal discounting
/// basis are modelling simplifications, kept adjustable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashflowAssumptions {
    /// Discount rate per period (0.10 = 10%)
    pub discount_rate: Rate,
    /// Benefit inflow per unit of annual depreciation
    pub benefit_multiple: Multiple,
    /// Starting point for the Newton-Raphson IRR search
    pub irr_guess: Rate,
}

impl Default for CashflowAssumptions {
    fn default() -> Self {
        Self {
            discount_rate: DEFAULT_DISCOUNT_RATE,
            benefit_multiple: DEFAULT_BENEFIT_MULTIPLE,
            irr_guess: DEFAULT_IRR_GUESS,
        }
    }
}

impl CashflowAssumptions {
    pub fn with_discount_rate(discount_rate: Rate) -> Self {
        Self {
            discount_rate,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// One year of the project cashflow, with its discounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearCashflow {
    pub year: i32,
    /// Negative: CapEx ordered in this year
    pub capex_outflow: Money,
    pub benefit_inflow: Money,
    pub net_cashflow: Money,
    /// Ordinal discounting period (0 for the first year)
    pub period: usize,
    pub discount_factor: Rate,
    pub present_value: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCashflowResult {
    pub project_code: String,
    pub discount_rate: Rate,
    pub benefit_multiple: Multiple,
    pub years: Vec<i32>,
    /// Net cashflow per entry of `years`
    pub cashflows: Vec<Money>,
    pub npv: Money,
    /// `None` when the cashflows admit no real IRR
    pub irr: Option<Rate>,
    pub breakdown: Vec<YearCashflow>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Yearly net cashflow, NPV and IRR for one project.
///
/// Fails with [`CapexError::ProjectNotFound`] when no row carries
/// `project_code`. An IRR without a real solution is reported as `None` with
/// a warning, never as an error.
pub fn project_cashflows(
    rows: &[EnrichedAssetLine],
    project_code: &str,
    assumptions: &CashflowAssumptions,
) -> CapexResult<ComputationOutput<ProjectCashflowResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let project_rows: Vec<&EnrichedAssetLine> = rows
        .iter()
        .filter(|r| r.line.project_code == project_code)
        .collect();
    if project_rows.is_empty() {
        return Err(CapexError::ProjectNotFound(project_code.to_string()));
    }

    // --- CapEx outflow by order year ---
    let outflow = capex_outflow_by_year(&project_rows, &mut warnings);

    // --- Benefit inflow from depreciation ---
    let benefit = benefit_by_year(&project_rows, assumptions.benefit_multiple, &mut warnings);

    // --- Net cashflow over the union of years ---
    let years: Vec<i32> = outflow
        .keys()
        .chain(benefit.keys())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let one_plus_r = Decimal::ONE + assumptions.discount_rate;
    let mut breakdown = Vec::with_capacity(years.len());
    for (period, &year) in years.iter().enumerate() {
        let capex_outflow = outflow.get(&year).copied().unwrap_or(Decimal::ZERO);
        let benefit_inflow = benefit.get(&year).copied().unwrap_or(Decimal::ZERO);
        let net_cashflow = capex_outflow + benefit_inflow;
        let discount_factor =
            time_value::discount_factor(one_plus_r, period).unwrap_or(Decimal::ZERO);
        breakdown.push(YearCashflow {
            year,
            capex_outflow,
            benefit_inflow,
            net_cashflow,
            period,
            discount_factor,
            present_value: net_cashflow
                .checked_mul(discount_factor)
                .unwrap_or(Decimal::ZERO),
        });
    }
    let cashflows: Vec<Money> = breakdown.iter().map(|y| y.net_cashflow).collect();

    // --- NPV / IRR ---
    let npv = time_value::npv(assumptions.discount_rate, &cashflows)?;
    let irr = match time_value::solve_irr(&cashflows, assumptions.irr_guess) {
        Ok(r) => Some(r),
        Err(e) => {
            warnings.push(format!("IRR undefined: {e}"));
            None
        }
    };

    tracing::debug!(
        project = project_code,
        years = years.len(),
        %npv,
        irr = ?irr,
        "project cashflows computed"
    );

    let output = ProjectCashflowResult {
        project_code: project_code.to_string(),
        discount_rate: assumptions.discount_rate,
        benefit_multiple: assumptions.benefit_multiple,
        years,
        cashflows,
        npv,
        irr,
        breakdown,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Project cashflow: CapEx outflow by order year + depreciation x benefit multiple; ordinal-period NPV/IRR",
        &serde_json::json!({
            "project_code": project_code,
            "discount_rate": assumptions.discount_rate.to_string(),
            "benefit_multiple": assumptions.benefit_multiple.to_string(),
            "irr_guess": assumptions.irr_guess.to_string(),
            "asset_lines": project_rows.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn capex_outflow_by_year(
    rows: &[&EnrichedAssetLine],
    warnings: &mut Vec<String>,
) -> BTreeMap<i32, Money> {
    let mut outflow = BTreeMap::new();
    let mut undated = 0usize;
    for row in rows {
        match row.order_quarter_year {
            Some(year) => *outflow.entry(year).or_insert(Decimal::ZERO) -= row.total_cost_usd,
            None => undated += 1,
        }
    }
    if undated > 0 {
        warnings.push(format!(
            "{undated} asset line(s) without a parseable Order_Quarter excluded from CapEx outflow"
        ));
    }
    outflow
}

fn benefit_by_year(
    rows: &[&EnrichedAssetLine],
    benefit_multiple: Multiple,
    warnings: &mut Vec<String>,
) -> BTreeMap<i32, Money> {
    let schedule = depreciation_schedule(rows.iter().copied());
    if schedule.is_empty() {
        warnings.push("No depreciable assets in project; benefit inflow is zero".into());
    }

    annual_dep_by_year(&schedule)
        .into_iter()
        .map(|(year, depreciation)| (year, depreciation * benefit_multiple))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
