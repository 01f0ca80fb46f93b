//! Section 125 safe-harbor deduction sizing.
//!
//! The safe deduction is the smaller of two limits:
//!
//! - **Ideal**: the tax-table headroom, i.e. federal taxable wages above the
//!   point where withholding starts (after the filing-status allowance built
//!   into the table and the dependent credit).
//! - **Ceiling**: the largest deduction that keeps net pay at or above
//!   `gross × (1 − cap / 100)`, where net pay is gross less existing
//!   deductions, the benefit deduction, the employee fee on it, and the
//!   employee's federal, state and FICA taxes at that deduction.
//!
//! The deduction changes the taxes it is measured against. The total
//! reduction `h(D) = existing + D + T(D) + fee × D` is piecewise linear in
//! `D` with breakpoints where a bracket edge is crossed, so the ceiling is
//! found exactly by locating the segment that contains the target and
//! interpolating inside it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::common::{ensure_rate, max, min, round_down_to_cents};
use super::payroll_taxes::{PayInput, PayrollTaxProfile};
use crate::models::{
    Diagnostic, FilingStatus, PayFrequency, PreTaxDeduction, TaxParameterSet, TaxYear,
};

const ONE_CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeDeductionRequest {
    /// Tax year whose tables apply.
    pub tier: TaxYear,
    pub filing_status: FilingStatus,
    pub dependents: u32,
    pub gross_per_pay: Decimal,
    pub pay_frequency: PayFrequency,
    /// Percentage of gross, 0 to 100.
    pub safety_cap_percent: Decimal,
    pub state: String,
    #[serde(default)]
    pub existing_deductions: Vec<PreTaxDeduction>,
}

impl SafeDeductionRequest {
    fn pay_input(&self) -> PayInput<'_> {
        PayInput {
            gross_per_pay: self.gross_per_pay,
            pay_frequency: self.pay_frequency,
            filing_status: self.filing_status,
            dependents: self.dependents,
            state: &self.state,
            pre_tax_deductions: &self.existing_deductions,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeDeduction {
    /// The election: `min(ideal, ceiling)` rounded down to cents.
    pub per_pay_amount: Decimal,
    pub ideal_amount: Decimal,
    pub ceiling_amount: Decimal,
    /// The ceiling, not the ideal, decided the amount.
    pub is_capped: bool,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy)]
pub struct Section125Calculator<'a> {
    params: &'a TaxParameterSet,
    employee_fee_rate: Decimal,
}

impl<'a> Section125Calculator<'a> {
    /// `employee_fee_rate` is the billing model's employee rate, charged on
    /// the deduction and therefore part of the net-pay test.
    pub fn new(params: &'a TaxParameterSet, employee_fee_rate: Decimal) -> Self {
        Self {
            params,
            employee_fee_rate,
        }
    }

    /// Sizes the per-pay deduction.
    ///
    /// Gross pay at or below zero yields a zero result.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] if the cap is outside
    /// `[0, 100]`, the fee rate is outside `[0, 1)`, or an existing
    /// deduction is negative.
    pub fn calculate_safe_deduction(
        &self,
        request: &SafeDeductionRequest,
    ) -> Result<SafeDeduction, CalculationError> {
        ensure_safety_cap(request.safety_cap_percent)?;
        ensure_rate("employee_fee_rate", self.employee_fee_rate)?;

        if request.gross_per_pay <= Decimal::ZERO {
            return Ok(SafeDeduction::default());
        }

        let profile = PayrollTaxProfile::resolve(self.params, request.tier, &request.pay_input())?;
        Ok(size_deduction(
            &profile,
            request.safety_cap_percent,
            self.employee_fee_rate,
        ))
    }
}

pub(crate) fn ensure_safety_cap(cap: Decimal) -> Result<(), CalculationError> {
    if cap < Decimal::ZERO || cap > Decimal::ONE_HUNDRED {
        return Err(CalculationError::invalid(
            "safety_cap_percent",
            format!("must be between 0 and 100, got {cap}"),
        ));
    }
    Ok(())
}

/// Sizes the deduction against a resolved profile. Inputs are assumed valid.
pub(crate) fn size_deduction(
    profile: &PayrollTaxProfile<'_>,
    safety_cap_percent: Decimal,
    employee_fee_rate: Decimal,
) -> SafeDeduction {
    let diagnostics = profile.diagnostics().to_vec();
    if profile.gross_per_pay() <= Decimal::ZERO {
        return SafeDeduction {
            diagnostics,
            ..SafeDeduction::default()
        };
    }

    let target = profile.gross_per_pay() * safety_cap_percent / Decimal::ONE_HUNDRED;
    let ideal = ideal_deduction(profile);
    let ceiling = ceiling_deduction(profile, target, employee_fee_rate);

    let mut election = round_down_to_cents(min(ideal, ceiling));
    // Bracket bases are published to the cent, so an interpolated ceiling
    // can sit a fraction of a cent past the target.
    while election > Decimal::ZERO
        && reduction(profile, election, employee_fee_rate) > target
    {
        election = max(Decimal::ZERO, election - ONE_CENT);
    }

    SafeDeduction {
        per_pay_amount: election,
        ideal_amount: ideal,
        ceiling_amount: ceiling,
        is_capped: ideal > ceiling,
        diagnostics,
    }
}

fn ideal_deduction(profile: &PayrollTaxProfile<'_>) -> Decimal {
    match profile.federal().and_then(|w| w.zero_tax_point()) {
        Some(point) => min(
            profile.max_deduction(),
            max(Decimal::ZERO, profile.fit_base() - point),
        ),
        None => Decimal::ZERO,
    }
}

fn reduction(profile: &PayrollTaxProfile<'_>, deduction: Decimal, fee_rate: Decimal) -> Decimal {
    profile.gross_per_pay() - profile.net_pay(deduction, fee_rate)
}

fn ceiling_deduction(profile: &PayrollTaxProfile<'_>, target: Decimal, fee_rate: Decimal) -> Decimal {
    let points = profile.breakpoints();
    let Some((&first, rest)) = points.split_first() else {
        return Decimal::ZERO;
    };

    let mut lower = (first, reduction(profile, first, fee_rate));
    if lower.1 > target {
        return Decimal::ZERO;
    }

    for &upper in rest {
        let upper_h = reduction(profile, upper, fee_rate);
        if upper_h > target {
            let (lower_d, lower_h) = lower;
            return lower_d + (target - lower_h) * (upper - lower_d) / (upper_h - lower_h);
        }
        lower = (upper, upper_h);
    }

    lower.0
}
