use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ParameterError, TaxYear};

/// Federal payroll parameters for one tax year.
///
/// Rates are the single-party (employee or employer) rates, e.g. 6.2% Social
/// Security and 1.45% Medicare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederalTaxParams {
    pub tax_year: TaxYear,
    pub ss_rate: Decimal,
    pub medicare_rate: Decimal,
    /// Annual Social Security wage base.
    pub ss_wage_base: Decimal,
    /// Annual wages above which the additional Medicare surtax applies.
    pub addl_medicare_threshold: Decimal,
    pub addl_medicare_rate: Decimal,
    /// Annual withholding credit per qualifying dependent (Form W-4 Step 3).
    pub dependent_credit: Decimal,
}

impl FederalTaxParams {
    /// Validates the parameter values.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError`] if:
    /// - any rate is outside `[0, 1)`
    /// - `ss_wage_base` is not positive
    /// - `addl_medicare_threshold` or `dependent_credit` is negative
    pub fn validate(&self) -> Result<(), ParameterError> {
        for (field, value) in [
            ("ss_rate", self.ss_rate),
            ("medicare_rate", self.medicare_rate),
            ("addl_medicare_rate", self.addl_medicare_rate),
        ] {
            if value < Decimal::ZERO || value >= Decimal::ONE {
                return Err(ParameterError::InvalidRate { field, value });
            }
        }
        if self.ss_wage_base <= Decimal::ZERO {
            return Err(ParameterError::InvalidWageBase(self.ss_wage_base));
        }
        for (field, value) in [
            ("addl_medicare_threshold", self.addl_medicare_threshold),
            ("dependent_credit", self.dependent_credit),
        ] {
            if value < Decimal::ZERO {
                return Err(ParameterError::NegativeAmount { field, value });
            }
        }
        Ok(())
    }
}
