//! Per-employee tax profile shared by the Section 125 sizing and the
//! proposal aggregator.
//!
//! A profile resolves the employee's tables once and can then be evaluated
//! at any benefit deduction. A benefit deduction reduces federal, state and
//! FICA wages alike.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::common::{ensure_non_negative, max};
use super::federal::FederalWithholding;
use super::fica::{FicaBreakdown, FicaCalculator};
use super::state::StateWithholding;
use super::CalculationError;
use crate::models::{
    Diagnostic, FilingStatus, PayFrequency, PreTaxDeduction, TaxParameterSet, TaxYear,
};

/// Employee attributes that determine per-pay taxes.
#[derive(Debug, Clone, Copy)]
pub struct PayInput<'a> {
    pub gross_per_pay: Decimal,
    pub pay_frequency: PayFrequency,
    pub filing_status: FilingStatus,
    pub dependents: u32,
    pub state: &'a str,
    /// Deductions already taken every pay, applied on both sides of any
    /// before/after comparison.
    pub pre_tax_deductions: &'a [PreTaxDeduction],
}

/// Employee-side taxes for one pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollTaxes {
    pub federal_income_tax: Decimal,
    pub state_income_tax: Decimal,
    pub fica: FicaBreakdown,
}

impl PayrollTaxes {
    pub fn employee_total(&self) -> Decimal {
        self.federal_income_tax + self.state_income_tax + self.fica.fica
    }

    pub fn employer_fica(&self) -> Decimal {
        self.fica.employer_fica()
    }
}

#[derive(Debug, Clone)]
pub struct PayrollTaxProfile<'a> {
    gross_per_pay: Decimal,
    existing_deductions: Decimal,
    fit_base: Decimal,
    fica_base: Decimal,
    fica: Option<FicaCalculator<'a>>,
    federal: Option<FederalWithholding<'a>>,
    state: Option<StateWithholding<'a>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> PayrollTaxProfile<'a> {
    /// Resolves the tables for `tax_year`. Missing data becomes a
    /// diagnostic and the affected tax is zero.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for negative gross pay or a
    /// negative existing deduction.
    pub fn resolve(
        params: &'a TaxParameterSet,
        tax_year: TaxYear,
        input: &PayInput<'_>,
    ) -> Result<Self, CalculationError> {
        ensure_non_negative("gross_per_pay", input.gross_per_pay)?;

        let mut existing_deductions = Decimal::ZERO;
        let mut fit_exempt = Decimal::ZERO;
        let mut fica_exempt = Decimal::ZERO;
        for deduction in input.pre_tax_deductions {
            ensure_non_negative("pre_tax_deduction", deduction.amount_per_pay)?;
            existing_deductions += deduction.amount_per_pay;
            if deduction.reduces_fit {
                fit_exempt += deduction.amount_per_pay;
            }
            if deduction.reduces_fica {
                fica_exempt += deduction.amount_per_pay;
            }
        }

        let mut profile = Self {
            gross_per_pay: input.gross_per_pay,
            existing_deductions,
            fit_base: max(Decimal::ZERO, input.gross_per_pay - fit_exempt),
            fica_base: max(Decimal::ZERO, input.gross_per_pay - fica_exempt),
            fica: None,
            federal: None,
            state: None,
            diagnostics: Vec::new(),
        };

        let Some(year) = params.year(tax_year) else {
            profile
                .diagnostics
                .push(Diagnostic::MissingTaxYear { tax_year });
            return Ok(profile);
        };

        match year.federal() {
            Some(federal) => profile.fica = Some(FicaCalculator::new(federal)),
            None => profile
                .diagnostics
                .push(Diagnostic::MissingFederalParams { tax_year }),
        }
        match FederalWithholding::resolve(
            year,
            input.filing_status,
            input.pay_frequency,
            input.dependents,
        ) {
            Ok(withholding) => profile.federal = Some(withholding),
            Err(diagnostic) => profile.diagnostics.push(diagnostic),
        }
        match StateWithholding::resolve(year, input.state, input.pay_frequency) {
            Ok(state) => profile.state = Some(state),
            Err(diagnostic) => profile.diagnostics.push(diagnostic),
        }

        Ok(profile)
    }

    pub fn gross_per_pay(&self) -> Decimal {
        self.gross_per_pay
    }

    /// Federal taxable wages before any benefit deduction.
    pub fn fit_base(&self) -> Decimal {
        self.fit_base
    }

    pub fn federal(&self) -> Option<&FederalWithholding<'a>> {
        self.federal.as_ref()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Largest benefit deduction the pay can fund after existing deductions.
    pub fn max_deduction(&self) -> Decimal {
        max(Decimal::ZERO, self.gross_per_pay - self.existing_deductions)
    }

    /// Employee taxes with `benefit` deducted pre-tax.
    pub fn taxes_at(&self, benefit: Decimal) -> PayrollTaxes {
        let fit_taxable = max(Decimal::ZERO, self.fit_base - benefit);
        let fica_taxable = max(Decimal::ZERO, self.fica_base - benefit);

        PayrollTaxes {
            federal_income_tax: self
                .federal
                .map(|w| w.withholding(fit_taxable))
                .unwrap_or(Decimal::ZERO),
            state_income_tax: self
                .state
                .map(|s| s.withholding(fit_taxable))
                .unwrap_or(Decimal::ZERO),
            fica: self
                .fica
                .map(|c| c.on_base(fica_taxable, Decimal::ZERO))
                .unwrap_or_default(),
        }
    }

    /// Take-home pay with `benefit` deducted and the employee fee charged
    /// on it.
    pub fn net_pay(&self, benefit: Decimal, employee_fee_rate: Decimal) -> Decimal {
        self.gross_per_pay
            - self.existing_deductions
            - benefit
            - self.taxes_at(benefit).employee_total()
            - employee_fee_rate * benefit
    }

    /// Benefit amounts in `[0, max_deduction]` at which the combined
    /// marginal rate changes, sorted ascending. Taxes are linear between
    /// consecutive points.
    pub(crate) fn breakpoints(&self) -> Vec<Decimal> {
        let upper = self.max_deduction();

        let mut fit_levels = Vec::new();
        if let Some(federal) = &self.federal {
            fit_levels.extend(federal.rows().iter().map(|row| row.over));
            fit_levels.extend(federal.zero_tax_point());
        }
        if let Some(state) = &self.state {
            fit_levels.extend(state.kinks());
        }
        let fica_levels = self.fica.map(|c| c.kinks()).unwrap_or_default();

        let mut points = vec![Decimal::ZERO, upper, self.fit_base, self.fica_base];
        points.extend(fit_levels.iter().map(|level| self.fit_base - level));
        points.extend(fica_levels.iter().map(|level| self.fica_base - level));

        points.retain(|p| *p >= Decimal::ZERO && *p <= upper);
        points.sort();
        points.dedup();
        points
    }
}
