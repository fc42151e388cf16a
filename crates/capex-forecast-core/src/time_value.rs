use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::CapexError;
use crate::types::{Money, Rate};
use crate::CapexResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;
const MAX_BISECTION_ITERATIONS: u32 = 200;
const RATE_FLOOR: Decimal = dec!(-0.99);
const RATE_CEILING: Decimal = dec!(100.0);

/// Candidate rates scanned for a sign change when Newton-Raphson fails.
/// IRRs outside the first and last entry are reported as not found.
const BRACKET_GRID: [Decimal; 20] = [
    dec!(-0.95),
    dec!(-0.9),
    dec!(-0.75),
    dec!(-0.5),
    dec!(-0.25),
    dec!(0),
    dec!(0.1),
    dec!(0.25),
    dec!(0.5),
    dec!(1),
    dec!(2),
    dec!(5),
    dec!(10),
    dec!(25),
    dec!(50),
    dec!(100),
    dec!(250),
    dec!(1000),
    dec!(10000),
    dec!(100000),
];

/// Net Present Value of a series of cash flows, discounted by ordinal
/// period: the first flow is period 0 and is not discounted.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> CapexResult<Money> {
    if rate <= dec!(-1) {
        return Err(CapexError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;

    for (t, cf) in cash_flows.iter().enumerate() {
        let factor = discount_factor(one_plus_r, t).ok_or_else(|| CapexError::DivisionByZero {
            context: format!("NPV discount factor at period {t}"),
        })?;
        result = cf
            .checked_mul(factor)
            .and_then(|pv| result.checked_add(pv))
            .ok_or_else(|| CapexError::InvalidInput {
                field: "rate".into(),
                reason: format!("Present value overflows at period {t}"),
            })?;
    }

    Ok(result)
}

/// `1 / (1 + r)^t`. Returns `None` when `(1 + r)^t` underflows to zero;
/// overflow of the compounding term is reported as a zero factor.
pub fn discount_factor(one_plus_r: Decimal, t: usize) -> Option<Decimal> {
    match one_plus_r.checked_powi(t as i64) {
        Some(compound) if compound.is_zero() => None,
        Some(compound) => Decimal::ONE.checked_div(compound),
        None => Some(Decimal::ZERO),
    }
}

/// True when the series holds at least one strictly positive and one
/// strictly negative flow. Without a sign change there is no real IRR.
pub fn has_sign_change(cash_flows: &[Money]) -> bool {
    let any_positive = cash_flows.iter().any(|cf| cf.is_sign_positive() && !cf.is_zero());
    let any_negative = cash_flows.iter().any(|cf| cf.is_sign_negative() && !cf.is_zero());
    any_positive && any_negative
}

/// Internal Rate of Return using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> CapexResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(CapexError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let mut npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;
        let one_plus_r = Decimal::ONE + rate;

        for (t, cf) in cash_flows.iter().enumerate() {
            let t_dec = Decimal::from(t as i64);
            let step = discount_factor(one_plus_r, t).and_then(|factor| {
                let pv = cf.checked_mul(factor)?;
                let slope = t_dec.checked_mul(pv)?.checked_div(one_plus_r)?;
                Some((npv_val.checked_add(pv)?, dnpv.checked_sub(slope)?))
            });
            let Some((next_npv, next_dnpv)) = step else {
                return Err(CapexError::ConvergenceFailure {
                    function: "IRR".into(),
                    iterations: i,
                    last_delta: npv_val,
                });
            };
            npv_val = next_npv;
            dnpv = next_dnpv;
        }

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(CapexError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        let Some(next_rate) = npv_val.checked_div(dnpv).and_then(|d| rate.checked_sub(d)) else {
            return Err(CapexError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        };
        rate = next_rate;

        // Guard against divergence
        if rate < RATE_FLOOR {
            rate = RATE_FLOOR;
        } else if rate > RATE_CEILING {
            rate = RATE_CEILING;
        }
    }

    Err(CapexError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

/// IRR by bisection over the first bracket in [`BRACKET_GRID`] whose
/// endpoints give NPVs of opposite sign.
pub fn irr_bisection(cash_flows: &[Money]) -> CapexResult<Rate> {
    let evaluated: Vec<(Rate, Money)> = BRACKET_GRID
        .iter()
        .filter_map(|&r| npv(r, cash_flows).ok().map(|v| (r, v)))
        .collect();

    if let Some(&(r, _)) = evaluated.iter().find(|(_, v)| v.is_zero()) {
        return Ok(r);
    }

    let (mut lo, mut f_lo, mut hi) = evaluated
        .windows(2)
        .find(|w| w[0].1.is_sign_negative() != w[1].1.is_sign_negative())
        .map(|w| (w[0].0, w[0].1, w[1].0))
        .ok_or_else(|| {
            CapexError::InsufficientData(format!(
                "No NPV sign change found for rates between {} and {}",
                BRACKET_GRID[0],
                BRACKET_GRID[BRACKET_GRID.len() - 1]
            ))
        })?;

    let mut mid = (lo + hi) / dec!(2);
    for _ in 0..MAX_BISECTION_ITERATIONS {
        mid = (lo + hi) / dec!(2);
        let f_mid = npv(mid, cash_flows)?;
        if f_mid.abs() < CONVERGENCE_THRESHOLD || (hi - lo).abs() < CONVERGENCE_THRESHOLD {
            return Ok(mid);
        }
        if f_mid.is_sign_negative() == f_lo.is_sign_negative() {
            lo = mid;
            f_lo = f_mid;
        } else {
            hi = mid;
        }
    }

    Ok(mid)
}

/// IRR with the checks the valuation layer relies on: a sign change is
/// required, Newton-Raphson is tried first and bisection is the fallback.
pub fn solve_irr(cash_flows: &[Money], guess: Rate) -> CapexResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(CapexError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }
    if !has_sign_change(cash_flows) {
        return Err(CapexError::InsufficientData(
            "Cash flows never change sign; IRR has no real solution".into(),
        ));
    }

    match irr(cash_flows, guess) {
        Ok(rate) => Ok(rate),
        Err(newton_err) => {
            tracing::debug!(
                error = %newton_err,
                "Newton-Raphson IRR failed, falling back to bisection"
            );
            irr_bisection(cash_flows)
        }
    }
}
