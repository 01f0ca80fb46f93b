//! Social Security and Medicare (FICA) withholding.
//!
//! [`calc_fica`] is the flat per-call form: taxable base times rate with no
//! year-to-date awareness. [`FicaCalculator`] reads the year's
//! [`FederalTaxParams`] and, given year-to-date wages, applies the Social
//! Security wage base and the employee-only additional Medicare surtax.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use payroll_core::calculations::calc_fica;
//!
//! let breakdown = calc_fica(dec!(2000), dec!(0), dec!(0.062), dec!(0.0145)).unwrap();
//!
//! assert_eq!(breakdown.fica, dec!(153.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::common::{ensure_non_negative, ensure_rate, max, min};
use crate::models::FederalTaxParams;

/// FICA amounts for one pay period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FicaBreakdown {
    pub social_security: Decimal,
    pub medicare: Decimal,
    /// Employee-only surtax above the annual threshold.
    pub additional_medicare: Decimal,
    /// Employee total: Social Security, Medicare and any surtax.
    pub fica: Decimal,
}

impl FicaBreakdown {
    /// The employer's matching share. The surtax is not matched.
    pub fn employer_fica(&self) -> Decimal {
        self.social_security + self.medicare
    }
}

/// Computes FICA on `gross_per_pay` net of FICA-reducing deductions.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidInput`] if gross or the deduction is
/// negative, or either rate is outside `[0, 1)`.
pub fn calc_fica(
    gross_per_pay: Decimal,
    pre_fica_deduction_per_pay: Decimal,
    ss_rate: Decimal,
    med_rate: Decimal,
) -> Result<FicaBreakdown, CalculationError> {
    ensure_non_negative("gross_per_pay", gross_per_pay)?;
    ensure_non_negative("pre_fica_deduction", pre_fica_deduction_per_pay)?;
    ensure_rate("ss_rate", ss_rate)?;
    ensure_rate("medicare_rate", med_rate)?;

    let base = max(Decimal::ZERO, gross_per_pay - pre_fica_deduction_per_pay);
    let social_security = base * ss_rate;
    let medicare = base * med_rate;

    Ok(FicaBreakdown {
        social_security,
        medicare,
        additional_medicare: Decimal::ZERO,
        fica: social_security + medicare,
    })
}

/// Input for [`FicaCalculator::calculate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FicaInput {
    pub gross_per_pay: Decimal,
    pub pre_fica_deduction: Decimal,
    /// FICA wages already paid this calendar year, before this pay.
    pub ytd_wages: Decimal,
}

/// Year-aware FICA calculator.
#[derive(Debug, Clone, Copy)]
pub struct FicaCalculator<'a> {
    params: &'a FederalTaxParams,
}

impl<'a> FicaCalculator<'a> {
    pub fn new(params: &'a FederalTaxParams) -> Self {
        Self { params }
    }

    /// Computes FICA for one pay.
    ///
    /// With `ytd_wages` of zero only this pay's wages count toward the wage
    /// base and the surtax threshold.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for negative amounts.
    pub fn calculate(&self, input: &FicaInput) -> Result<FicaBreakdown, CalculationError> {
        ensure_non_negative("gross_per_pay", input.gross_per_pay)?;
        ensure_non_negative("pre_fica_deduction", input.pre_fica_deduction)?;
        ensure_non_negative("ytd_wages", input.ytd_wages)?;

        let base = max(Decimal::ZERO, input.gross_per_pay - input.pre_fica_deduction);
        Ok(self.on_base(base, input.ytd_wages))
    }

    /// FICA on an already reduced taxable base. Inputs are assumed valid.
    pub(crate) fn on_base(&self, base: Decimal, ytd_wages: Decimal) -> FicaBreakdown {
        let p = self.params;

        let ss_room = max(Decimal::ZERO, p.ss_wage_base - ytd_wages);
        let social_security = min(base, ss_room) * p.ss_rate;
        let medicare = base * p.medicare_rate;

        let surtax_start = max(ytd_wages, p.addl_medicare_threshold);
        let over_threshold = max(Decimal::ZERO, ytd_wages + base - surtax_start);
        let additional_medicare = over_threshold * p.addl_medicare_rate;

        FicaBreakdown {
            social_security,
            medicare,
            additional_medicare,
            fica: social_security + medicare + additional_medicare,
        }
    }

    /// FICA-wage levels at which the marginal rate changes.
    pub(crate) fn kinks(&self) -> [Decimal; 2] {
        [self.params.ss_wage_base, self.params.addl_medicare_threshold]
    }
}
