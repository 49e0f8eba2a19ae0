//! Yield-to-maturity: invert the pricing equation for the periodic rate.
//!
//! Newton-Raphson with an analytic derivative, seeded at 5% per period; if
//! Newton stalls or runs out of iterations, one bisection pass over the
//! admissible rate bracket is attempted before reporting failure. A
//! non-converged solve is always surfaced as `ConvergenceFailure`, never as a
//! partially-converged rate.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::BondAnalyticsError;
use crate::pricing::classify_vs_face;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::BondAnalyticsResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum Newton-Raphson iterations for the YTM solve.
const MAX_NEWTON_ITERATIONS: u32 = 50;

/// Maximum bisection iterations for the bracketing fallback.
const MAX_BISECTION_ITERATIONS: u32 = 200;

/// Absolute pricing-residual tolerance (1e-7).
const YTM_EPSILON: Decimal = dec!(0.0000001);

/// Newton seed: 5% per period.
const YTM_SEED: Decimal = dec!(0.05);

/// Admissible periodic-rate bracket. The floor stays clear of -100%, where
/// discounting is undefined; the ceiling is far beyond any quoted yield.
const RATE_FLOOR: Decimal = dec!(-0.95);
const RATE_CEILING: Decimal = dec!(2.0);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the YTM solve. All rate quantities are **per period**.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtmInput {
    /// Observed market price of the bond
    pub market_price: Money,
    /// Par / face value
    pub face_value: Money,
    /// Coupon rate per period as a decimal
    pub coupon_rate: Rate,
    /// Total number of payment periods remaining
    pub total_periods: u32,
}

/// Output of the YTM solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YtmOutput {
    /// Periodic yield-to-maturity. Multiply by payments-per-year for an
    /// annualized figure; that conversion is a caller concern.
    pub ytm: Rate,
    /// Iterations consumed by the successful solver pass
    pub iterations: u32,
    /// |PV(ytm) - market_price| at the returned rate
    pub pricing_residual: Decimal,
    /// Solver that produced the root: "newton-raphson" or "bisection"
    pub method: String,
    /// "premium", "discount", or "par" relative to face value
    pub discount_or_premium: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve `PV(y) = market_price` for the periodic rate `y`.
pub fn calculate_ytm(input: &YtmInput) -> BondAnalyticsResult<ComputationOutput<YtmOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let (ytm, iterations, pricing_residual, method) = match solve_newton(input) {
        Ok((rate, iters, residual)) => (rate, iters, residual, "newton-raphson"),
        Err(newton_err) => {
            warnings.push(format!(
                "Newton-Raphson did not converge ({newton_err}); falling back to bisection"
            ));
            let (rate, iters, residual) = solve_bisection(input)?;
            (rate, iters, residual, "bisection")
        }
    };

    let output = YtmOutput {
        ytm,
        iterations,
        pricing_residual,
        method: method.to_string(),
        discount_or_premium: classify_vs_face(input.market_price, input.face_value),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "solver": "Newton-Raphson with bisection fallback",
        "seed": "0.05 per period",
        "max_newton_iterations": MAX_NEWTON_ITERATIONS,
        "convergence_eps": "1e-7",
        "rate_bracket": "(-0.95, 2.0) per period",
        "ytm_units": "per period; annualize at the caller"
    });

    Ok(with_metadata(
        "Yield to Maturity — root of the bond pricing equation",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &YtmInput) -> BondAnalyticsResult<()> {
    if input.market_price <= Decimal::ZERO {
        return Err(BondAnalyticsError::InvalidInput {
            field: "market_price".into(),
            reason: "Market price must be positive".into(),
        });
    }
    if input.face_value <= Decimal::ZERO {
        return Err(BondAnalyticsError::InvalidInput {
            field: "face_value".into(),
            reason: "Face value must be positive".into(),
        });
    }
    if input.coupon_rate < Decimal::ZERO {
        return Err(BondAnalyticsError::InvalidInput {
            field: "coupon_rate".into(),
            reason: "Coupon rate cannot be negative".into(),
        });
    }
    if input.total_periods == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "total_periods".into(),
            reason: "Number of periods must be at least 1".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Solvers
// ---------------------------------------------------------------------------

/// Evaluate the pricing equation and the magnitude of its derivative at a
/// periodic rate, with iteratively accumulated discount factors (no `powd()`).
///
/// PV(r)  = sum_{t=1..n} cf_t / (1+r)^t
/// |PV'|  = sum_{t=1..n} t * cf_t / (1+r)^(t+1)
///
/// All arithmetic is checked. `None` means the present value exceeds the
/// decimal range, which only happens at deeply negative rates where the
/// discount factors explode; callers treat it as PV = +infinity. Discount
/// overflow on the growth side is not an error: the terms beyond it round
/// to zero and the accumulated PV stands.
fn price_and_derivative(input: &YtmInput, rate: Rate) -> Option<(Money, Decimal)> {
    let coupon = input.coupon_rate * input.face_value;
    let one_plus_r = Decimal::ONE + rate;

    let mut pv = Decimal::ZERO;
    let mut dpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for t in 1..=input.total_periods {
        discount = match discount.checked_mul(one_plus_r) {
            Some(d) => d,
            None => break,
        };
        if discount.is_zero() {
            return None;
        }
        let cf = if t == input.total_periods {
            coupon + input.face_value
        } else {
            coupon
        };
        pv = pv.checked_add(cf.checked_div(discount)?)?;
        if let Some(next_discount) = discount.checked_mul(one_plus_r) {
            if !next_discount.is_zero() {
                dpv = dpv.checked_add(
                    Decimal::from(t).checked_mul(cf)?.checked_div(next_discount)?,
                )?;
            }
        }
    }

    Some((pv, dpv))
}

/// Newton step: r_{k+1} = r_k - f(r_k)/f'(r_k) with f(r) = P - PV(r), whose
/// derivative is the (positive) |PV'| above. Returns the root, the iteration
/// count, and the final |residual|.
fn solve_newton(input: &YtmInput) -> BondAnalyticsResult<(Rate, u32, Decimal)> {
    let mut r = YTM_SEED;
    let mut last_residual = Decimal::MAX;

    for iteration in 0..MAX_NEWTON_ITERATIONS {
        let Some((pv, dpv)) = price_and_derivative(input, r) else {
            // The iterate landed where PV is beyond the decimal range;
            // hand over to bisection, which can step around such rates.
            return Err(BondAnalyticsError::ConvergenceFailure {
                function: "YTM Newton-Raphson (present value out of range)".into(),
                iterations: iteration,
                last_delta: last_residual,
            });
        };
        let f_r = input.market_price - pv;
        last_residual = f_r;

        if f_r.abs() < YTM_EPSILON {
            return Ok((r, iteration, f_r.abs()));
        }

        if dpv.is_zero() {
            return Err(BondAnalyticsError::ConvergenceFailure {
                function: "YTM Newton-Raphson (derivative stalled)".into(),
                iterations: iteration,
                last_delta: f_r,
            });
        }

        r -= f_r / dpv;

        // Divergence guard: keep the iterate inside the admissible bracket
        if r <= RATE_FLOOR {
            r = RATE_FLOOR;
        } else if r >= RATE_CEILING {
            r = RATE_CEILING;
        }
    }

    Err(BondAnalyticsError::ConvergenceFailure {
        function: "YTM Newton-Raphson".into(),
        iterations: MAX_NEWTON_ITERATIONS,
        last_delta: last_residual,
    })
}

/// Bracketing fallback. PV(r) is strictly decreasing in r, so a root exists
/// in the bracket exactly when PV(ceiling) <= price <= PV(floor). An
/// out-of-range evaluation reads as PV = +infinity: above every
/// representable price, so that endpoint or midpoint always sits on the
/// high-PV side of the root.
fn solve_bisection(input: &YtmInput) -> BondAnalyticsResult<(Rate, u32, Decimal)> {
    let mut lo = RATE_FLOOR;
    let mut hi = RATE_CEILING;

    if let Some((pv_lo, _)) = price_and_derivative(input, lo) {
        if input.market_price > pv_lo {
            return Err(BondAnalyticsError::ConvergenceFailure {
                function: "YTM bisection (price above attainable range)".into(),
                iterations: 0,
                last_delta: input.market_price - pv_lo,
            });
        }
    }
    let Some((pv_hi, _)) = price_and_derivative(input, hi) else {
        return Err(BondAnalyticsError::ConvergenceFailure {
            function: "YTM bisection (present value out of range at bracket ceiling)".into(),
            iterations: 0,
            last_delta: Decimal::MAX,
        });
    };
    if input.market_price < pv_hi {
        return Err(BondAnalyticsError::ConvergenceFailure {
            function: "YTM bisection (price below attainable range)".into(),
            iterations: 0,
            last_delta: pv_hi - input.market_price,
        });
    }

    let mut residual = Decimal::MAX;

    for iteration in 0..MAX_BISECTION_ITERATIONS {
        let mid = (lo + hi) / dec!(2);
        match price_and_derivative(input, mid) {
            Some((pv_mid, _)) => {
                residual = pv_mid - input.market_price;

                if residual.abs() < YTM_EPSILON {
                    return Ok((mid, iteration, residual.abs()));
                }

                if residual > Decimal::ZERO {
                    // PV too high: rate is above mid
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            // PV beyond the decimal range, so certainly above the price
            None => lo = mid,
        }
    }

    Err(BondAnalyticsError::ConvergenceFailure {
        function: "YTM bisection".into(),
        iterations: MAX_BISECTION_ITERATIONS,
        last_delta: residual,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
