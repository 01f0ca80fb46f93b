use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{FilingStatus, PayFrequency};

/// An existing pre-tax payroll deduction (health premium, 401(k), ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreTaxDeduction {
    pub label: String,
    pub amount_per_pay: Decimal,
    /// Reduces federal (and conforming state) income-tax wages.
    pub reduces_fit: bool,
    /// Reduces Social Security and Medicare wages.
    pub reduces_fica: bool,
}

/// Snapshot of one employee as supplied by the company record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub employee_id: String,
    pub gross_per_pay: Decimal,
    pub pay_frequency: PayFrequency,
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub dependents: u32,
    pub state: String,
    #[serde(default = "enrolled_by_default")]
    pub enrolled: bool,
    #[serde(default)]
    pub pre_tax_deductions: Vec<PreTaxDeduction>,
}

fn enrolled_by_default() -> bool {
    true
}

impl EmployeeRecord {
    pub fn annual_gross(&self) -> Decimal {
        self.gross_per_pay * self.pay_frequency.periods()
    }
}
