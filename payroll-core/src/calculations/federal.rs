//! Federal income-tax withholding by the IRS percentage method.

use rust_decimal::Decimal;

use super::common::{bracket_tax, max};
use crate::models::{
    Diagnostic, FilingStatus, PayFrequency, WithholdingBracketRow, WithholdingTable,
    YearParameters,
};

/// Applies a percentage-method table to taxable pay.
///
/// Uses the last row whose `over` is at or below `taxable_per_pay`. Pay
/// below the first row, and an empty table, withhold nothing. At a row
/// boundary the result is exactly that row's `base_tax`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use payroll_core::WithholdingBracketRow;
/// use payroll_core::calculations::calc_fit_from_table;
///
/// let rows = [
///     WithholdingBracketRow { over: dec!(0), base_tax: dec!(0), pct: dec!(0.10) },
///     WithholdingBracketRow { over: dec!(500), base_tax: dec!(50), pct: dec!(0.12) },
/// ];
///
/// assert_eq!(calc_fit_from_table(dec!(600), &rows), dec!(62.00));
/// ```
pub fn calc_fit_from_table(taxable_per_pay: Decimal, rows: &[WithholdingBracketRow]) -> Decimal {
    bracket_tax(taxable_per_pay, rows)
}

/// Per-employee federal withholding: the table for the employee's filing
/// status and pay frequency, less the Step 3 dependent credit.
#[derive(Debug, Clone, Copy)]
pub struct FederalWithholding<'a> {
    table: &'a WithholdingTable,
    credit_per_pay: Decimal,
}

impl<'a> FederalWithholding<'a> {
    /// `annual_dependent_credit` is the per-dependent annual amount.
    pub fn new(table: &'a WithholdingTable, annual_dependent_credit: Decimal, dependents: u32) -> Self {
        let credit_per_pay =
            Decimal::from(dependents) * annual_dependent_credit / table.pay_frequency.periods();
        Self {
            table,
            credit_per_pay,
        }
    }

    /// Looks up the table for `filing_status` and `pay_frequency`.
    ///
    /// A missing federal parameter row means no dependent credit; the
    /// caller reports that separately.
    pub fn resolve(
        year: &'a YearParameters,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
        dependents: u32,
    ) -> Result<Self, Diagnostic> {
        let table = year
            .withholding_table(filing_status, pay_frequency)
            .ok_or(Diagnostic::MissingWithholdingTable {
                tax_year: year.tax_year(),
                filing_status,
                pay_frequency,
            })?;
        let credit = year
            .federal()
            .map(|f| f.dependent_credit)
            .unwrap_or(Decimal::ZERO);

        Ok(Self::new(table, credit, dependents))
    }

    pub fn credit_per_pay(&self) -> Decimal {
        self.credit_per_pay
    }

    pub fn rows(&self) -> &'a [WithholdingBracketRow] {
        &self.table.rows
    }

    /// Withholding for one pay; never negative.
    pub fn withholding(&self, taxable_per_pay: Decimal) -> Decimal {
        max(
            Decimal::ZERO,
            calc_fit_from_table(taxable_per_pay, &self.table.rows) - self.credit_per_pay,
        )
    }

    /// Taxable pay above which withholding becomes positive.
    ///
    /// `None` when no pay level ever withholds (every rate is zero and no
    /// base exceeds the credit).
    pub fn zero_tax_point(&self) -> Option<Decimal> {
        let rows = &self.table.rows;
        for (index, row) in rows.iter().enumerate() {
            if row.base_tax > self.credit_per_pay {
                return Some(row.over);
            }
            if row.pct <= Decimal::ZERO {
                continue;
            }

            let point = row.over + (self.credit_per_pay - row.base_tax) / row.pct;
            match rows.get(index + 1) {
                Some(next) if point >= next.over => continue,
                _ => return Some(point),
            }
        }
        None
    }
}
