//! Portfolio-level amortization curves.
//!
//! Works on an ordered series of per-period capital additions rather than on
//! individual assets: additions are optionally inflated, depreciated over a
//! trailing useful-life window, and rolled into a net-book-value ledger.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::CapexError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CapexResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a full amortization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    /// Capital additions per period, nominal (before inflation)
    pub additions: Vec<Money>,
    /// Useful life in periods
    pub useful_life: u32,
    /// Annual inflation applied as (1 + rate)^t; omitted means no adjustment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inflation_rate: Option<Rate>,
}

/// One period of the net-book-value ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NbvRow {
    pub period: usize,
    pub opening_nbv: Money,
    pub addition: Money,
    pub depreciation: Money,
    pub closing_nbv: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationOutput {
    pub adjusted_additions: Vec<Money>,
    pub depreciation: Vec<Money>,
    pub schedule: Vec<NbvRow>,
    pub total_additions: Money,
    pub total_depreciation: Money,
    pub ending_nbv: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Scale addition `t` by `(1 + rate)^t`.
pub fn inflation_adjust(capex: &[Money], rate: Rate) -> CapexResult<Vec<Money>> {
    let one_plus_r = Decimal::ONE + rate;
    capex
        .iter()
        .enumerate()
        .map(|(t, amount)| {
            one_plus_r
                .checked_powi(t as i64)
                .and_then(|factor| amount.checked_mul(factor))
                .ok_or_else(|| CapexError::InvalidInput {
                    field: "inflation_rate".into(),
                    reason: format!("Inflation factor overflows at period {t}"),
                })
        })
        .collect()
}

/// Rolling straight-line depreciation: period `t` carries
/// `sum(additions[t-L+1..=t]) / L`, the window clipped at period 0.
pub fn rolling_depreciation(additions: &[Money], useful_life: u32) -> CapexResult<Vec<Money>> {
    if useful_life == 0 {
        return Err(CapexError::InvalidInput {
            field: "useful_life".into(),
            reason: "Useful life must be at least one period".into(),
        });
    }

    let life = useful_life as usize;
    let divisor = Decimal::from(useful_life);
    let mut window_sum = Decimal::ZERO;

    Ok(additions
        .iter()
        .enumerate()
        .map(|(t, addition)| {
            window_sum += addition;
            if t >= life {
                window_sum -= additions[t - life];
            }
            window_sum / divisor
        })
        .collect())
}

/// NBV[t] = NBV[t-1] + addition[t] - depreciation[t], starting from zero.
pub fn nbv_schedule(additions: &[Money], depreciation: &[Money]) -> CapexResult<Vec<NbvRow>> {
    if additions.len() != depreciation.len() {
        return Err(CapexError::InvalidInput {
            field: "depreciation".into(),
            reason: format!(
                "Expected {} depreciation periods to match additions, got {}",
                additions.len(),
                depreciation.len()
            ),
        });
    }

    let mut opening = Decimal::ZERO;
    Ok(additions
        .iter()
        .zip(depreciation)
        .enumerate()
        .map(|(period, (&addition, &dep))| {
            let closing = opening + addition - dep;
            let row = NbvRow {
                period,
                opening_nbv: opening,
                addition,
                depreciation: dep,
                closing_nbv: closing,
            };
            opening = closing;
            row
        })
        .collect())
}

/// Inflate, depreciate and roll the NBV ledger in one call.
pub fn run_amortization(
    input: &AmortizationInput,
) -> CapexResult<ComputationOutput<AmortizationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let adjusted_additions = match input.inflation_rate {
        Some(rate) => inflation_adjust(&input.additions, rate)?,
        None => input.additions.clone(),
    };
    let depreciation = rolling_depreciation(&adjusted_additions, input.useful_life)?;
    let schedule = nbv_schedule(&adjusted_additions, &depreciation)?;

    if input.additions.len() < input.useful_life as usize {
        warnings.push(format!(
            "Series of {} periods is shorter than the {}-period useful life; no addition is fully depreciated",
            input.additions.len(),
            input.useful_life
        ));
    }

    let total_additions: Money = adjusted_additions.iter().copied().sum();
    let total_depreciation: Money = depreciation.iter().copied().sum();
    let ending_nbv = schedule
        .last()
        .map(|r| r.closing_nbv)
        .unwrap_or(Decimal::ZERO);

    let output = AmortizationOutput {
        adjusted_additions,
        depreciation,
        schedule,
        total_additions,
        total_depreciation,
        ending_nbv,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Rolling straight-line amortization over a trailing useful-life window",
        input,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rolling_window_clips_at_start() {
        let dep = rolling_depreciation(&[dec!(100), dec!(100), dec!(100)], 2).unwrap();
        assert_eq!(dep, vec![dec!(50), dec!(100), dec!(100)]);
    }

    #[test]
    fn test_rolling_window_drops_old_additions() {
        let dep = rolling_depreciation(&[dec!(300), dec!(0), dec!(0), dec!(0)], 3).unwrap();
        assert_eq!(dep, vec![dec!(100), dec!(100), dec!(100), dec!(0)]);
    }

    #[test]
    fn test_zero_useful_life_rejected() {
        assert!(rolling_depreciation(&[dec!(1)], 0).is_err());
    }

    #[test]
    fn test_nbv_ledger() {
        let additions = vec![dec!(100), dec!(100), dec!(100)];
        let dep = rolling_depreciation(&additions, 2).unwrap();
        let nbv = nbv_schedule(&additions, &dep).unwrap();
        let closing: Vec<Money> = nbv.iter().map(|r| r.closing_nbv).collect();
        assert_eq!(closing, vec![dec!(50), dec!(50), dec!(50)]);
        assert_eq!(nbv[1].opening_nbv, dec!(50));
    }

    #[test]
    fn test_nbv_length_mismatch_rejected() {
        assert!(nbv_schedule(&[dec!(1), dec!(2)], &[dec!(1)]).is_err());
    }

    #[test]
    fn test_inflation_adjust_compounds_by_period() {
        let adjusted = inflation_adjust(&[dec!(100), dec!(100), dec!(100)], dec!(0.10)).unwrap();
        assert_eq!(adjusted, vec![dec!(100), dec!(110), dec!(121)]);
    }

    #[test]
    fn test_run_amortization_fully_depreciates_after_life() {
        let input = AmortizationInput {
            additions: vec![dec!(120), dec!(0), dec!(0), dec!(0)],
            useful_life: 3,
            inflation_rate: None,
        };
        let out = run_amortization(&input).unwrap();
        assert_eq!(out.result.total_depreciation, dec!(120));
        assert_eq!(out.result.ending_nbv, dec!(0));
        assert!(out.warnings.is_empty());
    }
}
