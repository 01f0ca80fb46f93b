//! Which employees take part in a billing run or proposal.
//!
//! Every caller decides eligibility through [`EligibilityPolicy`] so that an
//! excluded employee is treated the same everywhere: left out entirely
//! rather than carried through with zero results.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::EmployeeRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityPolicy {
    /// Annualised gross below which an employee is excluded.
    pub minimum_annual_gross: Decimal,
    pub require_enrollment: bool,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            minimum_annual_gross: Decimal::ZERO,
            require_enrollment: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    NotEnrolled,
    BelowMinimumGross {
        annual_gross: Decimal,
        minimum: Decimal,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Excluded(ExclusionReason),
}

impl EligibilityPolicy {
    /// Negative gross pay is never treated as below the minimum; such an
    /// employee stays eligible so the calculation rejects it as invalid input.
    pub fn evaluate(&self, employee: &EmployeeRecord) -> Eligibility {
        if self.require_enrollment && !employee.enrolled {
            return Eligibility::Excluded(ExclusionReason::NotEnrolled);
        }

        let annual_gross = employee.annual_gross();
        if annual_gross >= Decimal::ZERO && annual_gross < self.minimum_annual_gross {
            return Eligibility::Excluded(ExclusionReason::BelowMinimumGross {
                annual_gross,
                minimum: self.minimum_annual_gross,
            });
        }

        Eligibility::Eligible
    }
}
