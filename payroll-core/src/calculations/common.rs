//! Shared helpers for the payroll calculators: rounding, input checks,
//! the stepped-bracket evaluator and pay-period conversions.

use rust_decimal::{Decimal, RoundingStrategy};

use super::CalculationError;
use crate::models::{BracketRow, PayFrequency};

const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero. The calculators never
/// call this; it is provided for the presentation layer.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use payroll_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(95.625)), dec!(95.63));
/// assert_eq!(round_half_up(dec!(-95.625)), dec!(-95.63));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Truncates toward negative infinity at cent precision.
///
/// Used for payroll elections, which must never exceed the computed limit.
pub fn round_down_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToNegativeInfinity)
}

/// Returns the maximum of two decimal values.
pub fn max(a: Decimal, b: Decimal) -> Decimal {
    if a > b { a } else { b }
}

/// Returns the minimum of two decimal values.
pub fn min(a: Decimal, b: Decimal) -> Decimal {
    if a < b { a } else { b }
}

/// Converts a per-pay amount to a monthly amount: `amount × periods / 12`.
pub fn per_pay_to_monthly(amount: Decimal, frequency: PayFrequency) -> Decimal {
    amount * frequency.periods() / MONTHS_PER_YEAR
}

/// Converts a per-pay amount to an annual amount: `amount × periods`.
pub fn per_pay_to_annual(amount: Decimal, frequency: PayFrequency) -> Decimal {
    amount * frequency.periods()
}

/// Converts a monthly amount to an annual amount: `amount × 12`.
pub fn per_month_to_annual(amount: Decimal) -> Decimal {
    amount * MONTHS_PER_YEAR
}

/// Evaluates a stepped bracket table at `amount`.
///
/// Finds the last row whose `over` is at or below `amount` and returns
/// `base_tax + rate × (amount − over)`. Amounts below the first row, and
/// empty tables, yield zero.
pub fn bracket_tax<R: BracketRow>(amount: Decimal, rows: &[R]) -> Decimal {
    match rows.iter().rev().find(|row| row.over() <= amount) {
        Some(row) => row.base_tax() + row.rate() * (amount - row.over()),
        None => Decimal::ZERO,
    }
}

pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), CalculationError> {
    if value < Decimal::ZERO {
        return Err(CalculationError::invalid(
            field,
            format!("must not be negative, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_rate(field: &'static str, value: Decimal) -> Result<(), CalculationError> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(CalculationError::invalid(
            field,
            format!("must be in [0, 1), got {value}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::WithholdingBracketRow;

    // =========================================================================
    // rounding
    // =========================================================================

    #[test]
    fn round_half_up_rounds_midpoint_away_from_zero() {
        assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
        assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
        assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
    }

    #[test]
    fn round_down_to_cents_never_rounds_up() {
        assert_eq!(round_down_to_cents(dec!(412.999)), dec!(412.99));
        assert_eq!(round_down_to_cents(dec!(412.5)), dec!(412.50));
        assert_eq!(round_down_to_cents(dec!(0.009)), dec!(0));
    }

    // =========================================================================
    // period conversion
    // =========================================================================

    #[test]
    fn monthly_conversion_uses_periods_over_twelve() {
        assert_eq!(per_pay_to_monthly(dec!(100), PayFrequency::Weekly), dec!(5200) / dec!(12));
        assert_eq!(per_pay_to_monthly(dec!(100), PayFrequency::Semimonthly), dec!(200));
        assert_eq!(per_pay_to_monthly(dec!(100), PayFrequency::Monthly), dec!(100));
    }

    #[test]
    fn annual_conversion_multiplies_by_periods() {
        assert_eq!(per_pay_to_annual(dec!(153), PayFrequency::Biweekly), dec!(3978));
    }

    #[test]
    fn monthly_to_annual_agrees_with_per_pay_path() {
        let monthly = per_pay_to_monthly(dec!(412.50), PayFrequency::Biweekly);

        assert_eq!(per_month_to_annual(dec!(75)), dec!(900));
        assert_eq!(
            per_month_to_annual(monthly),
            per_pay_to_annual(dec!(412.50), PayFrequency::Biweekly)
        );
    }

    // =========================================================================
    // bracket_tax
    // =========================================================================

    fn scenario_b_table() -> Vec<WithholdingBracketRow> {
        vec![
            WithholdingBracketRow {
                over: dec!(0),
                base_tax: dec!(0),
                pct: dec!(0.10),
            },
            WithholdingBracketRow {
                over: dec!(500),
                base_tax: dec!(50),
                pct: dec!(0.12),
            },
        ]
    }

    #[test]
    fn bracket_tax_is_zero_below_first_row() {
        let rows = vec![WithholdingBracketRow {
            over: dec!(100),
            base_tax: dec!(0),
            pct: dec!(0.10),
        }];

        assert_eq!(bracket_tax(dec!(99.99), &rows), dec!(0));
    }

    #[test]
    fn bracket_tax_is_zero_for_empty_table() {
        let rows: Vec<WithholdingBracketRow> = Vec::new();

        assert_eq!(bracket_tax(dec!(1000), &rows), dec!(0));
    }

    #[test]
    fn bracket_tax_uses_last_row_at_or_below_amount() {
        let rows = scenario_b_table();

        assert_eq!(bracket_tax(dec!(499.99), &rows), dec!(49.999));
        assert_eq!(bracket_tax(dec!(500), &rows), dec!(50));
        assert_eq!(bracket_tax(dec!(600), &rows), dec!(62));
    }

    // =========================================================================
    // input checks
    // =========================================================================

    #[test]
    fn ensure_rate_rejects_one() {
        assert!(ensure_rate("ss_rate", dec!(0.999)).is_ok());
        assert_eq!(
            ensure_rate("ss_rate", dec!(1)),
            Err(CalculationError::InvalidInput {
                field: "ss_rate",
                reason: "must be in [0, 1), got 1".to_string(),
            })
        );
    }

    #[test]
    fn ensure_non_negative_accepts_zero() {
        assert!(ensure_non_negative("gross_per_pay", dec!(0)).is_ok());
        assert!(ensure_non_negative("gross_per_pay", dec!(-0.01)).is_err());
    }
}
