use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FilingStatus, PayFrequency, TaxYear};

/// A recoverable gap in the parameter data. The affected tax component is
/// computed as zero and the diagnostic travels with the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    MissingTaxYear {
        tax_year: TaxYear,
    },
    MissingFederalParams {
        tax_year: TaxYear,
    },
    MissingWithholdingTable {
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    },
    MissingStateParams {
        tax_year: TaxYear,
        state: String,
    },
    UnsupportedJurisdiction {
        tax_year: TaxYear,
        state: String,
        method: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTaxYear { tax_year } => {
                write!(f, "no parameters published for tax year {tax_year}")
            }
            Self::MissingFederalParams { tax_year } => {
                write!(f, "no federal payroll parameters for tax year {tax_year}")
            }
            Self::MissingWithholdingTable {
                tax_year,
                filing_status,
                pay_frequency,
            } => write!(
                f,
                "no withholding table for {tax_year} {filing_status} {pay_frequency}"
            ),
            Self::MissingStateParams { tax_year, state } => {
                write!(f, "no state parameters for {state} in {tax_year}")
            }
            Self::UnsupportedJurisdiction {
                tax_year,
                state,
                method,
            } => write!(
                f,
                "unsupported withholding method '{method}' for {state} in {tax_year}; treated as none"
            ),
        }
    }
}
