//! Company-level orchestration over the calculators: a billing run for one
//! model and a side-by-side comparison across models.
//!
//! Unlike the calculators, this layer logs. Per-employee problems are
//! recorded in the report and the run continues; only company
//! configuration errors stop it.

mod comparison;
mod run;

pub use comparison::{ModelComparisonRow, ProposalComparison, compare_models};
pub use run::{
    BillingRunReport, BillingTotals, CompanyBillingConfig, EmployeeOutcome, EmployeeResult,
    run_billing,
};
