//! Cash-flow valuation primitive.
//!
//! A bullet bond's cash flows are `nper` equal coupons with the principal
//! folded into the last entry. Price, Macaulay duration, and convexity are all
//! weighted sums of that same schedule against different coefficient vectors,
//! so this module exposes exactly three building blocks: the schedule, the
//! coefficient vectors, and the dot product.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::BondAnalyticsError;
use crate::types::{Money, Rate};
use crate::BondAnalyticsResult;

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// Build the cash-flow schedule of a bullet bond: `nper` coupons of
/// `coupon_rate * face_value`, with `face_value` added to the final entry
/// (principal repayment).
///
/// `coupon_rate` is the rate **per period**, as a decimal.
pub fn build_schedule(
    coupon_rate: Rate,
    face_value: Money,
    nper: u32,
) -> BondAnalyticsResult<Vec<Money>> {
    if nper == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be at least 1".into(),
        });
    }
    if face_value <= Decimal::ZERO {
        return Err(BondAnalyticsError::InvalidInput {
            field: "face_value".into(),
            reason: "Face value must be positive".into(),
        });
    }
    if coupon_rate < Decimal::ZERO {
        return Err(BondAnalyticsError::InvalidInput {
            field: "coupon_rate".into(),
            reason: "Coupon rate cannot be negative".into(),
        });
    }

    let coupon = coupon_rate * face_value;
    let mut schedule = vec![coupon; nper as usize];
    // Principal repaid with the final coupon
    if let Some(last) = schedule.last_mut() {
        *last += face_value;
    }

    Ok(schedule)
}

// ---------------------------------------------------------------------------
// Discount factors
// ---------------------------------------------------------------------------

/// Present-value factors under a flat periodic rate:
/// `factor[i] = (1 + rate)^-(i+1)` for `i = 0..nper-1`.
///
/// Factors are accumulated by iterative multiplication (never `powd()`) for
/// full decimal precision.
pub fn present_value_factors(
    periodic_rate: Rate,
    nper: u32,
) -> BondAnalyticsResult<Vec<Decimal>> {
    validate_rate(periodic_rate)?;
    if nper == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be at least 1".into(),
        });
    }

    let one_plus_r = Decimal::ONE + periodic_rate;
    let mut factors = Vec::with_capacity(nper as usize);
    let mut compound = Decimal::ONE;

    for t in 1..=nper {
        match compound.checked_mul(one_plus_r) {
            Some(c) => compound = c,
            // Compounding past the 96-bit range only happens for growth
            // rates, where the remaining factors all round to zero anyway.
            None => {
                factors.resize(nper as usize, Decimal::ZERO);
                break;
            }
        }
        if compound.is_zero() {
            return Err(BondAnalyticsError::DivisionByZero {
                context: format!("present value factor at period {t}"),
            });
        }
        factors.push(
            Decimal::ONE
                .checked_div(compound)
                .ok_or_else(|| BondAnalyticsError::Overflow {
                    context: format!("present value factor at period {t}"),
                })?,
        );
    }

    Ok(factors)
}

// ---------------------------------------------------------------------------
// Weighted sum
// ---------------------------------------------------------------------------

/// Dot product of a cash-flow schedule and a coefficient vector of the same
/// length. The single unifying primitive behind price, duration, and
/// convexity.
pub fn weighted_sum(schedule: &[Money], coefficients: &[Decimal]) -> BondAnalyticsResult<Money> {
    if schedule.len() != coefficients.len() {
        return Err(BondAnalyticsError::InvalidInput {
            field: "coefficients".into(),
            reason: format!(
                "Coefficient vector length {} does not match schedule length {}",
                coefficients.len(),
                schedule.len()
            ),
        });
    }

    schedule
        .iter()
        .zip(coefficients.iter())
        .try_fold(Decimal::ZERO, |acc, (cf, w)| {
            cf.checked_mul(*w).and_then(|term| acc.checked_add(term))
        })
        .ok_or_else(|| BondAnalyticsError::Overflow {
            context: "cash-flow weighted sum".into(),
        })
}

// ---------------------------------------------------------------------------
// Present value
// ---------------------------------------------------------------------------

/// Present value of a bullet bond's cash flows under a flat periodic discount
/// rate:
///
/// `PV = sum_{t=1..n} coupon / (1+r)^t + face / (1+r)^n`
///
/// with the final coupon and principal collapsed into one schedule entry.
pub fn present_value(
    periodic_rate: Rate,
    coupon_rate: Rate,
    face_value: Money,
    nper: u32,
) -> BondAnalyticsResult<Money> {
    let schedule = build_schedule(coupon_rate, face_value, nper)?;
    let factors = present_value_factors(periodic_rate, nper)?;
    weighted_sum(&schedule, &factors)
}

/// A discount rate at or below -100% makes `(1 + rate)` non-positive and the
/// compounding undefined.
pub(crate) fn validate_rate(rate: Rate) -> BondAnalyticsResult<()> {
    if rate <= dec!(-1) {
        return Err(BondAnalyticsError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
