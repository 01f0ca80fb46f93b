use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FilingStatus, PayFrequency, TaxYear};

/// Problems found when checking a stepped bracket table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BracketTableError {
    #[error("bracket table has no rows")]
    Empty,

    #[error("row {index}: threshold {over} is negative")]
    NegativeThreshold { index: usize, over: Decimal },

    #[error("row {index}: rate {rate} must be between 0 and 1")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("row {index}: threshold {over} is not above the previous threshold {previous}")]
    Unsorted {
        index: usize,
        over: Decimal,
        previous: Decimal,
    },

    #[error("row {index}: base tax {actual} does not continue the previous row (expected {expected})")]
    Discontinuous {
        index: usize,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("first row starts at {0}, expected 0")]
    DoesNotStartAtZero(Decimal),
}

/// A row of any stepped table: tax = `base_tax + rate × (taxable − over)`.
pub trait BracketRow {
    fn over(&self) -> Decimal;
    fn base_tax(&self) -> Decimal;
    fn rate(&self) -> Decimal;
}

/// Checks ordering, rates and boundary continuity of a stepped table.
///
/// Continuity allows less than a cent of drift: published tables state
/// base amounts in whole cents, and annualised tables carry division residue.
pub fn check_bracket_rows<R: BracketRow>(rows: &[R]) -> Result<(), BracketTableError> {
    if rows.is_empty() {
        return Err(BracketTableError::Empty);
    }

    for (index, row) in rows.iter().enumerate() {
        if row.over() < Decimal::ZERO {
            return Err(BracketTableError::NegativeThreshold {
                index,
                over: row.over(),
            });
        }
        if row.rate() < Decimal::ZERO || row.rate() >= Decimal::ONE {
            return Err(BracketTableError::InvalidRate {
                index,
                rate: row.rate(),
            });
        }
        if index == 0 {
            continue;
        }

        let previous = &rows[index - 1];
        if row.over() <= previous.over() {
            return Err(BracketTableError::Unsorted {
                index,
                over: row.over(),
                previous: previous.over(),
            });
        }

        let expected =
            previous.base_tax() + previous.rate() * (row.over() - previous.over());
        if (expected - row.base_tax()).abs() >= ONE_CENT {
            return Err(BracketTableError::Discontinuous {
                index,
                expected,
                actual: row.base_tax(),
            });
        }
    }

    Ok(())
}

const ONE_CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// One row of an IRS Publication 15-T percentage-method table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingBracketRow {
    /// Wage amount the row starts at.
    pub over: Decimal,
    /// Tax owed at exactly `over`.
    pub base_tax: Decimal,
    /// Marginal rate applied above `over`.
    pub pct: Decimal,
}

impl BracketRow for WithholdingBracketRow {
    fn over(&self) -> Decimal {
        self.over
    }

    fn base_tax(&self) -> Decimal {
        self.base_tax
    }

    fn rate(&self) -> Decimal {
        self.pct
    }
}

/// Percentage-method table for one tax year, filing status and pay frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithholdingTable {
    pub tax_year: TaxYear,
    pub filing_status: FilingStatus,
    pub pay_frequency: PayFrequency,
    pub rows: Vec<WithholdingBracketRow>,
}

impl WithholdingTable {
    /// Derives a per-pay table from an annual table by dividing thresholds
    /// and base amounts by the number of pay periods. Rates are unchanged,
    /// so continuity carries over.
    pub fn from_annual(
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
        annual_rows: &[WithholdingBracketRow],
    ) -> Self {
        let periods = pay_frequency.periods();
        let rows = annual_rows
            .iter()
            .map(|row| WithholdingBracketRow {
                over: row.over / periods,
                base_tax: row.base_tax / periods,
                pct: row.pct,
            })
            .collect();

        Self {
            tax_year,
            filing_status,
            pay_frequency,
            rows,
        }
    }

    /// Checks that rows are sorted ascending and continuous at every boundary.
    pub fn validate(&self) -> Result<(), BracketTableError> {
        check_bracket_rows(&self.rows)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn row(over: Decimal, base_tax: Decimal, pct: Decimal) -> WithholdingBracketRow {
        WithholdingBracketRow { over, base_tax, pct }
    }

    fn single_annual_2025() -> Vec<WithholdingBracketRow> {
        vec![
            row(dec!(0), dec!(0), dec!(0)),
            row(dec!(6400), dec!(0), dec!(0.10)),
            row(dec!(18325), dec!(1192.50), dec!(0.12)),
            row(dec!(54875), dec!(5578.50), dec!(0.22)),
            row(dec!(109750), dec!(17651), dec!(0.24)),
            row(dec!(203700), dec!(40199), dec!(0.32)),
            row(dec!(256925), dec!(57231), dec!(0.35)),
            row(dec!(632750), dec!(188769.75), dec!(0.37)),
        ]
    }

    #[test]
    fn validate_accepts_published_annual_table() {
        let rows = single_annual_2025();

        assert_eq!(check_bracket_rows(&rows), Ok(()));
    }

    #[test]
    fn validate_rejects_empty_table() {
        let rows: Vec<WithholdingBracketRow> = vec![];

        assert_eq!(check_bracket_rows(&rows), Err(BracketTableError::Empty));
    }

    #[test]
    fn validate_rejects_unsorted_rows() {
        let rows = vec![
            row(dec!(0), dec!(0), dec!(0.10)),
            row(dec!(500), dec!(50), dec!(0.12)),
            row(dec!(400), dec!(62), dec!(0.22)),
        ];

        assert_eq!(
            check_bracket_rows(&rows),
            Err(BracketTableError::Unsorted {
                index: 2,
                over: dec!(400),
                previous: dec!(500)
            })
        );
    }

    #[test]
    fn validate_rejects_discontinuous_base_tax() {
        let rows = vec![
            row(dec!(0), dec!(0), dec!(0.10)),
            row(dec!(500), dec!(55), dec!(0.12)),
        ];

        assert_eq!(
            check_bracket_rows(&rows),
            Err(BracketTableError::Discontinuous {
                index: 1,
                expected: dec!(50.00),
                actual: dec!(55)
            })
        );
    }

    #[test]
    fn validate_rejects_rate_of_one() {
        let rows = vec![row(dec!(0), dec!(0), dec!(1))];

        assert_eq!(
            check_bracket_rows(&rows),
            Err(BracketTableError::InvalidRate {
                index: 0,
                rate: dec!(1)
            })
        );
    }

    #[test]
    fn from_annual_divides_thresholds_and_base_by_periods() {
        let table = WithholdingTable::from_annual(
            2025,
            FilingStatus::Single,
            PayFrequency::Monthly,
            &single_annual_2025(),
        );

        assert_eq!(table.rows.len(), 8);
        assert_eq!(table.rows[2].over, dec!(18325) / dec!(12));
        assert_eq!(table.rows[2].base_tax, dec!(99.375));
        assert_eq!(table.rows[2].pct, dec!(0.12));
    }

    #[test]
    fn from_annual_keeps_continuity_for_every_frequency() {
        for frequency in PayFrequency::ALL {
            let table = WithholdingTable::from_annual(
                2025,
                FilingStatus::Single,
                frequency,
                &single_annual_2025(),
            );

            assert_eq!(table.validate(), Ok(()), "frequency {frequency:?}");
        }
    }
}
