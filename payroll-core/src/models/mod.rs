mod billing_model;
mod diagnostic;
mod employee;
mod federal;
mod filing_status;
mod parameter_set;
mod pay_frequency;
mod profit_share;
mod state;
mod withholding;

pub use billing_model::BillingModel;
pub use diagnostic::Diagnostic;
pub use employee::{EmployeeRecord, PreTaxDeduction};
pub use federal::FederalTaxParams;
pub use filing_status::FilingStatus;
pub use parameter_set::{ParameterError, TaxParameterSet, YearParameters};
pub use pay_frequency::PayFrequency;
pub use profit_share::{ProfitShareConfig, ProfitShareMode};
pub use state::{StateBracketRow, StateTaxMethod, StateTaxParams};
pub use withholding::{
    BracketRow, BracketTableError, WithholdingBracketRow, WithholdingTable, check_bracket_rows,
};

/// Calendar year that selects a parameter snapshot.
pub type TaxYear = i32;
