//! Bond pricing from annual terms.
//!
//! Converts an APR and annual coupon rate to per-period figures and discounts
//! the cash-flow schedule. Settlement is assumed on a coupon date; there is no
//! accrued interest and no day count convention (single flat periodic rate).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::cashflow;
use crate::error::BondAnalyticsError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::BondAnalyticsResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input parameters for bond pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondPriceInput {
    /// Par / face value (e.g. 100 or 1000)
    pub face_value: Money,
    /// Annual discount rate (APR) as a decimal (0.06 = 6%)
    pub annual_yield: Rate,
    /// Annual coupon rate as a decimal (0.06 = 6%)
    pub annual_coupon_rate: Rate,
    /// Coupon payments per year
    pub coupon_frequency: u32,
    /// Whole years until maturity
    pub years_to_maturity: u32,
}

/// Output of the bond pricing computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondPriceOutput {
    /// Present value of all cash flows at the periodic yield
    pub clean_price: Money,
    /// Annual yield divided by coupon frequency
    pub periodic_yield: Rate,
    /// Coupon payment per period
    pub coupon_amount: Money,
    /// Total number of payment periods (frequency x years)
    pub total_periods: u32,
    /// "premium", "discount", or "par" relative to face value
    pub discount_or_premium: String,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Price a bullet bond: PV of `frequency * years` coupon payments plus
/// principal, discounted at the periodic yield `annual_yield / frequency`.
pub fn price_bond(
    input: &BondPriceInput,
) -> BondAnalyticsResult<ComputationOutput<BondPriceOutput>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    let freq = Decimal::from(input.coupon_frequency);
    let periodic_yield = input.annual_yield / freq;
    let periodic_coupon_rate = input.annual_coupon_rate / freq;
    let total_periods = input.coupon_frequency * input.years_to_maturity;

    let clean_price = cashflow::present_value(
        periodic_yield,
        periodic_coupon_rate,
        input.face_value,
        total_periods,
    )?;

    let discount_or_premium = classify_vs_face(clean_price, input.face_value);

    let output = BondPriceOutput {
        clean_price,
        periodic_yield,
        coupon_amount: periodic_coupon_rate * input.face_value,
        total_periods,
        discount_or_premium,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "settlement": "on a coupon date (no accrued interest)",
        "discounting": "flat periodic rate, iterative discount factors",
        "rate_inputs": "decimals, not percentages"
    });

    Ok(with_metadata(
        "Bond Pricing — PV of level coupon schedule at flat periodic yield",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

/// Classify a price against face value.
pub(crate) fn classify_vs_face(price: Money, face_value: Money) -> String {
    if price > face_value {
        "premium".to_string()
    } else if price < face_value {
        "discount".to_string()
    } else {
        "par".to_string()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &BondPriceInput) -> BondAnalyticsResult<()> {
    if input.face_value <= Decimal::ZERO {
        return Err(BondAnalyticsError::InvalidInput {
            field: "face_value".into(),
            reason: "Face value must be positive".into(),
        });
    }
    if input.annual_coupon_rate < Decimal::ZERO {
        return Err(BondAnalyticsError::InvalidInput {
            field: "annual_coupon_rate".into(),
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
    if input.annual_yield / Decimal::from(input.coupon_frequency) <= dec!(-1) {
        return Err(BondAnalyticsError::InvalidInput {
            field: "annual_yield".into(),
            reason: "Periodic yield must be greater than -100%".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// 10-year, 6% semi-annual bond at a 6% APR (par scenario).
    fn par_bond_input() -> BondPriceInput {
        BondPriceInput {
            face_value: dec!(100),
            annual_yield: dec!(0.06),
            annual_coupon_rate: dec!(0.06),
            coupon_frequency: 2,
            years_to_maturity: 10,
        }
    }

    #[test]
    fn test_par_bond_prices_at_face() {
        let result = price_bond(&par_bond_input()).unwrap();
        let out = &result.result;

        assert!(
            (out.clean_price - dec!(100)).abs() < dec!(0.000001),
            "Par bond (coupon == APR) should price at ~100, got {}",
            out.clean_price
        );
        assert_eq!(out.total_periods, 20);
        assert_eq!(out.coupon_amount, dec!(3));
        assert_eq!(out.discount_or_premium, "par");
    }

    #[test]
    fn test_premium_bond() {
        let mut input = par_bond_input();
        input.annual_yield = dec!(0.04);
        let result = price_bond(&input).unwrap();

        assert!(result.result.clean_price > dec!(100));
        assert_eq!(result.result.discount_or_premium, "premium");
    }

    #[test]
    fn test_discount_bond() {
        let mut input = par_bond_input();
        input.annual_yield = dec!(0.08);
        let result = price_bond(&input).unwrap();

        assert!(result.result.clean_price < dec!(100));
        assert_eq!(result.result.discount_or_premium, "discount");
    }

    #[test]
    fn test_zero_rate_zero_coupon_exact() {
        // Degenerate but valid: zero APR, zero coupon => price == face exactly
        let input = BondPriceInput {
            face_value: dec!(100),
            annual_yield: dec!(0),
            annual_coupon_rate: dec!(0),
            coupon_frequency: 1,
            years_to_maturity: 5,
        };
        let result = price_bond(&input).unwrap();
        assert_eq!(result.result.clean_price, dec!(100));
    }

    #[test]
    fn test_extreme_yield_long_maturity_prices_cleanly() {
        // (1+30)^t leaves the decimal range near t = 20; the tail factors
        // round to zero and pricing still completes instead of panicking.
        let input = BondPriceInput {
            face_value: dec!(100),
            annual_yield: dec!(30),
            annual_coupon_rate: dec!(0.05),
            coupon_frequency: 1,
            years_to_maturity: 70,
        };
        let result = price_bond(&input).unwrap();
        let price = result.result.clean_price;

        // Essentially the coupon perpetuity value: 5/30 ~= 0.1667
        assert!(
            price > Decimal::ZERO && price < dec!(1),
            "Deeply discounted price out of range: {price}"
        );
        assert_eq!(result.result.discount_or_premium, "discount");
    }

    #[test]
    fn test_zero_frequency_rejected() {
        let mut input = par_bond_input();
        input.coupon_frequency = 0;
        let err = price_bond(&input).unwrap_err();
        match err {
            BondAnalyticsError::InvalidInput { field, .. } => {
                assert_eq!(field, "coupon_frequency");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_maturity_rejected() {
        let mut input = par_bond_input();
        input.years_to_maturity = 0;
        let err = price_bond(&input).unwrap_err();
        match err {
            BondAnalyticsError::InvalidInput { field, .. } => {
                assert_eq!(field, "years_to_maturity");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_periodic_yield_floor_rejected() {
        let mut input = par_bond_input();
        input.annual_yield = dec!(-2.5); // -125% per period at freq 2
        let err = price_bond(&input).unwrap_err();
        match err {
            BondAnalyticsError::InvalidInput { field, .. } => {
                assert_eq!(field, "annual_yield");
            }
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_metadata_populated() {
        let result = price_bond(&par_bond_input()).unwrap();
        assert!(result.methodology.contains("Bond Pricing"));
        assert_eq!(result.metadata.precision, "rust_decimal_128bit");
        assert!(!result.metadata.version.is_empty());
    }
}
