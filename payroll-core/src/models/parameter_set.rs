use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use super::{
    BracketTableError, FederalTaxParams, FilingStatus, PayFrequency, StateTaxParams, TaxYear,
    WithholdingTable,
};

/// Errors raised while assembling or publishing tax parameters.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParameterError {
    #[error("{field} must be in [0, 1), got {value}")]
    InvalidRate { field: &'static str, value: Decimal },

    #[error("Social Security wage base must be positive, got {0}")]
    InvalidWageBase(Decimal),

    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("invalid bracket schedule for state {state}: {source}")]
    InvalidStateBrackets {
        state: String,
        source: BracketTableError,
    },

    #[error("invalid withholding table for {tax_year} {filing_status} {pay_frequency}: {source}")]
    InvalidWithholdingTable {
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
        source: BracketTableError,
    },

    #[error("parameters for tax year {actual} cannot be added to tax year {expected}")]
    YearMismatch { expected: TaxYear, actual: TaxYear },

    #[error("tax year {0} is already published")]
    AlreadyPublished(TaxYear),
}

/// Every parameter the engine reads for one tax year.
///
/// Built up with the `with_*` methods, each of which validates its input, then
/// frozen by [`TaxParameterSet::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearParameters {
    tax_year: TaxYear,
    federal: Option<FederalTaxParams>,
    states: BTreeMap<String, StateTaxParams>,
    withholding: BTreeMap<(FilingStatus, PayFrequency), WithholdingTable>,
}

impl YearParameters {
    pub fn new(tax_year: TaxYear) -> Self {
        Self {
            tax_year,
            federal: None,
            states: BTreeMap::new(),
            withholding: BTreeMap::new(),
        }
    }

    pub fn tax_year(&self) -> TaxYear {
        self.tax_year
    }

    pub fn with_federal(mut self, params: FederalTaxParams) -> Result<Self, ParameterError> {
        self.check_year(params.tax_year)?;
        params.validate()?;
        self.federal = Some(params);
        Ok(self)
    }

    pub fn with_state(mut self, mut params: StateTaxParams) -> Result<Self, ParameterError> {
        self.check_year(params.tax_year)?;
        params.state = normalize_state(&params.state);
        params.validate()?;
        self.states.insert(params.state.clone(), params);
        Ok(self)
    }

    pub fn with_withholding_table(
        mut self,
        table: WithholdingTable,
    ) -> Result<Self, ParameterError> {
        self.check_year(table.tax_year)?;
        table
            .validate()
            .map_err(|source| ParameterError::InvalidWithholdingTable {
                tax_year: table.tax_year,
                filing_status: table.filing_status,
                pay_frequency: table.pay_frequency,
                source,
            })?;
        self.withholding
            .insert((table.filing_status, table.pay_frequency), table);
        Ok(self)
    }

    pub fn federal(&self) -> Option<&FederalTaxParams> {
        self.federal.as_ref()
    }

    /// Looks up a state by postal code, case-insensitively.
    pub fn state(&self, code: &str) -> Option<&StateTaxParams> {
        self.states.get(&normalize_state(code))
    }

    pub fn states(&self) -> impl Iterator<Item = &StateTaxParams> {
        self.states.values()
    }

    pub fn withholding_table(
        &self,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    ) -> Option<&WithholdingTable> {
        self.withholding.get(&(filing_status, pay_frequency))
    }

    pub fn withholding_tables(&self) -> impl Iterator<Item = &WithholdingTable> {
        self.withholding.values()
    }

    fn check_year(&self, actual: TaxYear) -> Result<(), ParameterError> {
        if actual == self.tax_year {
            Ok(())
        } else {
            Err(ParameterError::YearMismatch {
                expected: self.tax_year,
                actual,
            })
        }
    }
}

pub(crate) fn normalize_state(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Published, read-only parameters keyed by tax year.
///
/// A year is written once. Calculations hold a shared reference and never
/// observe a partially loaded year.
#[derive(Debug, Clone, Default)]
pub struct TaxParameterSet {
    years: BTreeMap<TaxYear, Arc<YearParameters>>,
}

impl TaxParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a year's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterError::AlreadyPublished`] if the year already exists.
    pub fn publish(&mut self, params: YearParameters) -> Result<(), ParameterError> {
        let year = params.tax_year();
        if self.years.contains_key(&year) {
            return Err(ParameterError::AlreadyPublished(year));
        }
        self.years.insert(year, Arc::new(params));
        Ok(())
    }

    pub fn year(&self, tax_year: TaxYear) -> Option<&YearParameters> {
        self.years.get(&tax_year).map(Arc::as_ref)
    }

    pub fn is_published(&self, tax_year: TaxYear) -> bool {
        self.years.contains_key(&tax_year)
    }

    pub fn tax_years(&self) -> Vec<TaxYear> {
        self.years.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{StateTaxMethod, WithholdingBracketRow};

    fn federal_2025() -> FederalTaxParams {
        FederalTaxParams {
            tax_year: 2025,
            ss_rate: dec!(0.062),
            medicare_rate: dec!(0.0145),
            ss_wage_base: dec!(176100),
            addl_medicare_threshold: dec!(200000),
            addl_medicare_rate: dec!(0.009),
            dependent_credit: dec!(2000),
        }
    }

    #[test]
    fn with_federal_rejects_other_year() {
        let mut params = federal_2025();
        params.tax_year = 2024;

        assert_eq!(
            YearParameters::new(2025).with_federal(params),
            Err(ParameterError::YearMismatch {
                expected: 2025,
                actual: 2024
            })
        );
    }

    #[test]
    fn state_lookup_ignores_case() {
        let year = YearParameters::new(2025)
            .with_state(StateTaxParams {
                tax_year: 2025,
                state: "il".to_string(),
                method: StateTaxMethod::Flat { rate: dec!(0.0495) },
                standard_deduction: dec!(0),
            })
            .unwrap();

        assert_eq!(year.state("IL").map(|s| s.state.as_str()), Some("IL"));
        assert_eq!(year.state(" il ").map(|s| s.state.as_str()), Some("IL"));
        assert!(year.state("TX").is_none());
    }

    #[test]
    fn with_withholding_table_reports_which_table_failed() {
        let table = WithholdingTable {
            tax_year: 2025,
            filing_status: FilingStatus::Head,
            pay_frequency: PayFrequency::Weekly,
            rows: vec![
                WithholdingBracketRow {
                    over: dec!(100),
                    base_tax: dec!(0),
                    pct: dec!(0.1),
                },
                WithholdingBracketRow {
                    over: dec!(50),
                    base_tax: dec!(0),
                    pct: dec!(0.1),
                },
            ],
        };

        let err = YearParameters::new(2025)
            .with_withholding_table(table)
            .unwrap_err();

        assert!(matches!(
            err,
            ParameterError::InvalidWithholdingTable {
                filing_status: FilingStatus::Head,
                pay_frequency: PayFrequency::Weekly,
                source: BracketTableError::Unsorted { index: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn publish_is_write_once() {
        let mut set = TaxParameterSet::new();
        set.publish(YearParameters::new(2025).with_federal(federal_2025()).unwrap())
            .unwrap();

        let again = set.publish(YearParameters::new(2025));

        assert_eq!(again, Err(ParameterError::AlreadyPublished(2025)));
        assert!(set.year(2025).and_then(YearParameters::federal).is_some());
        assert_eq!(set.tax_years(), vec![2025]);
    }
}
