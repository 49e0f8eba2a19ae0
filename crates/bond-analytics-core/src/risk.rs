//! Duration and convexity for a fixed-rate bullet bond.
//!
//! A Macaulay or convexity figure is only meaningful against the price
//! computed at the same rate, so this module exposes a single aggregate entry
//! point that prices the bond internally and derives every output from that
//! one price. There is no variant that trusts a caller-supplied price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cashflow;
use crate::error::BondAnalyticsError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::BondAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for duration and convexity. Rate quantities are
/// **per period** (unlike `pricing`, which takes annual terms).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationConvexityInput {
    /// Par / face value of the bond
    pub face_value: Money,
    /// Coupon rate per period as a decimal
    pub coupon_rate: Rate,
    /// Coupon payments per year
    pub coupon_frequency: u32,
    /// Whole years until maturity
    pub years_to_maturity: u32,
    /// Periodic yield as a decimal
    pub periodic_yield: Rate,
}

/// Output of the duration and convexity calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationConvexityOutput {
    /// Present-value-weighted average time of cash flows, in years
    pub macaulay_duration: Decimal,
    /// Macaulay / (1 + periodic yield) — % price sensitivity per unit yield
    pub modified_duration: Decimal,
    /// Second-order price sensitivity
    pub convexity: Decimal,
    /// Present value at the stated periodic yield; the price every other
    /// output is normalized by
    pub price: Money,
    /// Total number of payment periods (frequency x years)
    pub total_periods: u32,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute Macaulay duration, modified duration, and convexity, pricing the
/// bond internally so all three are consistent with one present value.
pub fn calculate_duration_convexity(
    input: &DurationConvexityInput,
) -> BondAnalyticsResult<ComputationOutput<DurationConvexityOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let freq = Decimal::from(input.coupon_frequency);
    let total_periods = input.coupon_frequency * input.years_to_maturity;

    let schedule = cashflow::build_schedule(input.coupon_rate, input.face_value, total_periods)?;
    let pv_factors = cashflow::present_value_factors(input.periodic_yield, total_periods)?;

    let price = cashflow::weighted_sum(&schedule, &pv_factors)?;
    if price.is_zero() {
        return Err(BondAnalyticsError::DivisionByZero {
            context: "duration/convexity: bond price is zero".to_string(),
        });
    }

    let macaulay_duration =
        cashflow::weighted_sum(&schedule, &macaulay_factors(&pv_factors, freq)?)? / price;
    let modified_duration = macaulay_duration / (Decimal::ONE + input.periodic_yield);
    let convexity = cashflow::weighted_sum(
        &schedule,
        &convexity_factors(&pv_factors, input.periodic_yield, freq)?,
    )? / price;

    let output = DurationConvexityOutput {
        macaulay_duration,
        modified_duration,
        convexity,
        price,
        total_periods,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "normalizing_price": "recomputed internally at the stated periodic yield",
        "duration_units": "years",
        "settlement": "on a coupon date (no accrued interest)"
    });

    Ok(with_metadata(
        "Bond Duration & Convexity — PV-weighted cash-flow moments",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Coefficient vectors
// ---------------------------------------------------------------------------

/// Macaulay coefficients: `((t+1)/freq) * (1+y)^-(t+1)` for 0-indexed `t`.
/// Time-weights the present-value factors, in years. Checked: at deeply
/// negative yields the factors sit near the top of the decimal range and the
/// time weighting can push them over it.
fn macaulay_factors(
    pv_factors: &[Decimal],
    freq: Decimal,
) -> BondAnalyticsResult<Vec<Decimal>> {
    pv_factors
        .iter()
        .enumerate()
        .map(|(t, df)| {
            (Decimal::from(t as u32 + 1) / freq)
                .checked_mul(*df)
                .ok_or_else(|| BondAnalyticsError::Overflow {
                    context: format!("Macaulay weight at period {}", t + 1),
                })
        })
        .collect()
}

/// Convexity coefficients: `(t+1)(t+2) / ((1+y)^(t+3) * freq^2)` for
/// 0-indexed `t`, i.e. the second-derivative weights of the pricing equation
/// expressed in years squared.
fn convexity_factors(
    pv_factors: &[Decimal],
    periodic_yield: Rate,
    freq: Decimal,
) -> BondAnalyticsResult<Vec<Decimal>> {
    let one_plus_y_sq = (Decimal::ONE + periodic_yield) * (Decimal::ONE + periodic_yield);
    let freq_sq = freq * freq;

    pv_factors
        .iter()
        .enumerate()
        .map(|(t, df)| {
            let t1 = Decimal::from(t as u32 + 1);
            let t2 = Decimal::from(t as u32 + 2);
            // (1+y)^(t+3) = (1+y)^(t+1) * (1+y)^2, reusing the PV factor
            t1.checked_mul(t2)
                .and_then(|tt| tt.checked_mul(*df))
                .and_then(|num| num.checked_div(one_plus_y_sq * freq_sq))
                .ok_or_else(|| BondAnalyticsError::Overflow {
                    context: format!("convexity weight at period {}", t + 1),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &DurationConvexityInput) -> BondAnalyticsResult<()> {
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
    if input.coupon_frequency == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "coupon_frequency".into(),
            reason: "Coupon frequency must be at least 1 payment per year".into(),
        });
    }
    if input.years_to_maturity == 0 {
        return Err(BondAnalyticsError::InvalidInput {
            field: "years_to_maturity".into(),
            reason: "Years to maturity must be positive".into(),
        });
    }
    cashflow::validate_rate(input.periodic_yield).map_err(|_| {
        BondAnalyticsError::InvalidInput {
            field: "periodic_yield".into(),
            reason: "Periodic yield must be greater than -100%".into(),
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// 10-year, 5% semi-annual coupon bond at a 2.5% periodic yield (par).
    fn par_bond_input() -> DurationConvexityInput {
        DurationConvexityInput {
            face_value: dec!(1000),
            coupon_rate: dec!(0.025),
            coupon_frequency: 2,
            years_to_maturity: 10,
            periodic_yield: dec!(0.025),
        }
    }

    /// 10-period annual zero-coupon bond at 5% per period.
    fn zero_coupon_input() -> DurationConvexityInput {
        DurationConvexityInput {
            face_value: dec!(1000),
            coupon_rate: dec!(0),
            coupon_frequency: 1,
            years_to_maturity: 10,
            periodic_yield: dec!(0.05),
        }
    }

    fn assert_close(actual: Decimal, expected: Decimal, tolerance: Decimal, label: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tolerance,
            "{label}: expected ~{expected}, got {actual} (diff {diff} > tolerance {tolerance})"
        );
    }

    #[test]
    fn test_zero_coupon_macaulay_equals_maturity() {
        let result = calculate_duration_convexity(&zero_coupon_input()).unwrap();
        let out = &result.result;

        assert_close(
            out.macaulay_duration,
            dec!(10),
            dec!(0.000000001),
            "Zero-coupon Macaulay duration should equal maturity",
        );
        // price = 1000 * 1.05^-10 ~= 613.91
        assert_close(out.price, dec!(613.91), dec!(0.01), "Zero-coupon price");
    }

    #[test]
    fn test_coupon_bond_macaulay_below_maturity() {
        let result = calculate_duration_convexity(&par_bond_input()).unwrap();
        let out = &result.result;

        assert!(
            out.macaulay_duration < dec!(10) && out.macaulay_duration > Decimal::ZERO,
            "Coupon-bond Macaulay ({}) should lie in (0, maturity)",
            out.macaulay_duration
        );
    }

    #[test]
    fn test_modified_duration_relationship() {
        let result = calculate_duration_convexity(&par_bond_input()).unwrap();
        let out = &result.result;

        let expected = out.macaulay_duration / (Decimal::ONE + dec!(0.025));
        assert_close(
            out.modified_duration,
            expected,
            dec!(0.000000001),
            "Modified = Macaulay / (1 + periodic yield)",
        );
    }

    #[test]
    fn test_convexity_positive() {
        let result = calculate_duration_convexity(&par_bond_input()).unwrap();
        assert!(
            result.result.convexity > Decimal::ZERO,
            "Option-free bond convexity must be positive, got {}",
            result.result.convexity
        );
    }

    #[test]
    fn test_zero_coupon_convexity_closed_form() {
        // Single cash flow at period n: convexity = n(n+1) / ((1+y)^2 f^2)
        let result = calculate_duration_convexity(&zero_coupon_input()).unwrap();
        let expected = dec!(110) / (dec!(1.05) * dec!(1.05));
        assert_close(
            result.result.convexity,
            expected,
            dec!(0.000000001),
            "Zero-coupon convexity n(n+1)/(1+y)^2",
        );
    }

    #[test]
    fn test_par_bond_priced_at_face() {
        let result = calculate_duration_convexity(&par_bond_input()).unwrap();
        assert_close(
            result.result.price,
            dec!(1000),
            dec!(0.000001),
            "Par bond internal price",
        );
    }

    #[test]
    fn test_higher_coupon_lower_duration() {
        let low = par_bond_input();
        let mut high = par_bond_input();
        high.coupon_rate = dec!(0.04);

        let low_out = calculate_duration_convexity(&low).unwrap();
        let high_out = calculate_duration_convexity(&high).unwrap();

        assert!(
            high_out.result.macaulay_duration < low_out.result.macaulay_duration,
            "Higher coupon should shorten duration ({} vs {})",
            high_out.result.macaulay_duration,
            low_out.result.macaulay_duration
        );
    }

    #[test]
    fn test_deeply_negative_yield_long_maturity_errors_cleanly() {
        // At -90% per period the late discount factors reach ~1e28 and the
        // time-weighted coefficients leave the decimal range; this must be
        // a clean error rather than an arithmetic panic.
        let input = DurationConvexityInput {
            face_value: dec!(100),
            coupon_rate: dec!(0.05),
            coupon_frequency: 1,
            years_to_maturity: 28,
            periodic_yield: dec!(-0.9),
        };
        let err = calculate_duration_convexity(&input).unwrap_err();
        assert!(
            matches!(
                err,
                BondAnalyticsError::Overflow { .. } | BondAnalyticsError::DivisionByZero { .. }
            ),
            "Expected a range error, got {err:?}"
        );
    }

    #[test]
    fn test_yield_floor_rejected() {
        let mut input = par_bond_input();
        input.periodic_yield = dec!(-1);
        let err = calculate_duration_convexity(&input).unwrap_err();
        match err {
            BondAnalyticsError::InvalidInput { field, .. } => {
                assert_eq!(field, "periodic_yield");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let mut input = par_bond_input();
        input.coupon_frequency = 0;
        let err = calculate_duration_convexity(&input).unwrap_err();
        match err {
            BondAnalyticsError::InvalidInput { field, .. } => {
                assert_eq!(field, "coupon_frequency");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }
}
