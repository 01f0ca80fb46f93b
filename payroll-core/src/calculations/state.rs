//! State income-tax withholding.
//!
//! [`calc_sit`] applies a state's method to an already reduced taxable
//! amount and never subtracts a standard deduction. [`StateWithholding`]
//! is the caller-side wrapper that subtracts the per-pay share of the
//! state's standard deduction exactly once before calling it.

use rust_decimal::Decimal;

use super::common::{bracket_tax, max};
use crate::models::{Diagnostic, PayFrequency, StateTaxMethod, StateTaxParams, YearParameters};

/// State withholding on `taxable_per_pay`.
///
/// `None` and unsupported methods withhold nothing.
pub fn calc_sit(taxable_per_pay: Decimal, params: &StateTaxParams) -> Decimal {
    match &params.method {
        StateTaxMethod::None | StateTaxMethod::Unsupported { .. } => Decimal::ZERO,
        StateTaxMethod::Flat { rate } => max(Decimal::ZERO, taxable_per_pay) * *rate,
        StateTaxMethod::Brackets { rows } => bracket_tax(taxable_per_pay, rows),
    }
}

/// A state's parameters bound to a pay frequency.
#[derive(Debug, Clone, Copy)]
pub struct StateWithholding<'a> {
    params: &'a StateTaxParams,
    deduction_per_pay: Decimal,
}

impl<'a> StateWithholding<'a> {
    pub fn new(params: &'a StateTaxParams, pay_frequency: PayFrequency) -> Self {
        Self {
            params,
            deduction_per_pay: params.standard_deduction / pay_frequency.periods(),
        }
    }

    /// Finds the employee's state.
    ///
    /// # Errors
    ///
    /// Returns the diagnostic to report when the state has no parameters or
    /// uses a method the engine does not implement. Either way the caller
    /// withholds nothing.
    pub fn resolve(
        year: &'a YearParameters,
        state: &str,
        pay_frequency: PayFrequency,
    ) -> Result<Self, Diagnostic> {
        let params = year
            .state(state)
            .ok_or_else(|| Diagnostic::MissingStateParams {
                tax_year: year.tax_year(),
                state: state.trim().to_ascii_uppercase(),
            })?;

        if let StateTaxMethod::Unsupported { name } = &params.method {
            return Err(Diagnostic::UnsupportedJurisdiction {
                tax_year: year.tax_year(),
                state: params.state.clone(),
                method: name.clone(),
            });
        }

        Ok(Self::new(params, pay_frequency))
    }

    pub fn deduction_per_pay(&self) -> Decimal {
        self.deduction_per_pay
    }

    /// Withholding on taxable wages before the state standard deduction.
    pub fn withholding(&self, taxable_per_pay: Decimal) -> Decimal {
        calc_sit(
            max(Decimal::ZERO, taxable_per_pay - self.deduction_per_pay),
            self.params,
        )
    }

    /// Taxable-wage levels (before the standard deduction) at which the
    /// marginal state rate changes.
    pub(crate) fn kinks(&self) -> Vec<Decimal> {
        let mut kinks = vec![self.deduction_per_pay];
        if let StateTaxMethod::Brackets { rows } = &self.params.method {
            kinks.extend(rows.iter().map(|row| row.over + self.deduction_per_pay));
        }
        kinks
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::StateBracketRow;

    fn params(method: StateTaxMethod, standard_deduction: Decimal) -> StateTaxParams {
        StateTaxParams {
            tax_year: 2025,
            state: "ZZ".to_string(),
            method,
            standard_deduction,
        }
    }

    fn graduated() -> StateTaxMethod {
        StateTaxMethod::Brackets {
            rows: StateBracketRow::from_thresholds(&[
                (dec!(0), dec!(0.02)),
                (dec!(1000), dec!(0.04)),
                (dec!(5000), dec!(0.06)),
            ]),
        }
    }

    // =========================================================================
    // calc_sit
    // =========================================================================

    #[test]
    fn no_income_tax_state_withholds_nothing() {
        assert_eq!(calc_sit(dec!(4000), &params(StateTaxMethod::None, dec!(0))), dec!(0));
    }

    #[test]
    fn flat_rate_applies_to_whole_amount() {
        let il = params(StateTaxMethod::Flat { rate: dec!(0.0495) }, dec!(0));

        assert_eq!(calc_sit(dec!(2000), &il), dec!(99.0000));
    }

    #[test]
    fn calc_sit_does_not_subtract_standard_deduction() {
        let il = params(StateTaxMethod::Flat { rate: dec!(0.05) }, dec!(12000));

        assert_eq!(calc_sit(dec!(1000), &il), dec!(50));
    }

    #[test]
    fn brackets_use_stepped_algorithm() {
        let p = params(graduated(), dec!(0));

        assert_eq!(calc_sit(dec!(1000), &p), dec!(20));
        assert_eq!(calc_sit(dec!(2000), &p), dec!(60));
        assert_eq!(calc_sit(dec!(6000), &p), dec!(240));
    }

    #[test]
    fn unsupported_method_withholds_nothing() {
        let p = params(
            StateTaxMethod::Unsupported {
                name: "county".to_string(),
            },
            dec!(0),
        );

        assert_eq!(calc_sit(dec!(9000), &p), dec!(0));
    }

    // =========================================================================
    // StateWithholding
    // =========================================================================

    #[test]
    fn wrapper_subtracts_per_pay_standard_deduction_once() {
        let p = params(StateTaxMethod::Flat { rate: dec!(0.05) }, dec!(1200));
        let state = StateWithholding::new(&p, PayFrequency::Monthly);

        assert_eq!(state.deduction_per_pay(), dec!(100));
        assert_eq!(state.withholding(dec!(1100)), dec!(50));
        assert_eq!(state.withholding(dec!(80)), dec!(0));
    }

    #[test]
    fn resolve_reports_missing_and_unsupported_states() {
        let year = YearParameters::new(2025)
            .with_state(params(
                StateTaxMethod::Unsupported {
                    name: "county".to_string(),
                },
                dec!(0),
            ))
            .unwrap();

        assert_eq!(
            StateWithholding::resolve(&year, "tx", PayFrequency::Weekly).err(),
            Some(Diagnostic::MissingStateParams {
                tax_year: 2025,
                state: "TX".to_string(),
            })
        );
        assert_eq!(
            StateWithholding::resolve(&year, "ZZ", PayFrequency::Weekly).err(),
            Some(Diagnostic::UnsupportedJurisdiction {
                tax_year: 2025,
                state: "ZZ".to_string(),
                method: "county".to_string(),
            })
        );
    }
}
