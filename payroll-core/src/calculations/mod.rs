//! Payroll tax and pre-tax benefit calculators.
//!
//! Everything here is pure and synchronous: no I/O, no logging and no
//! shared mutable state. Amounts are returned at full precision; rounding
//! to cents is the presentation layer's job, except for the Section 125
//! election which is rounded down to cents.

pub mod common;
pub mod eligibility;
pub mod error;
pub mod federal;
pub mod fees;
pub mod fica;
pub mod payroll_taxes;
pub mod profit_share;
pub mod proposal;
pub mod section125;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use eligibility::{Eligibility, EligibilityPolicy, ExclusionReason};
pub use error::CalculationError;
pub use federal::{FederalWithholding, calc_fit_from_table};
pub use fees::{BillingModelTable, FeeBreakdown};
pub use fica::{FicaBreakdown, FicaCalculator, FicaInput, calc_fica};
pub use payroll_taxes::{PayInput, PayrollTaxProfile, PayrollTaxes};
pub use profit_share::{ProfitShareCredit, compute_profit_share, validate_profit_share};
pub use proposal::{
    CalculationResult, PeriodAmounts, ProposalMetrics, ProposalRequest,
    calculate_proposal_metrics,
};
pub use section125::{SafeDeduction, SafeDeductionRequest, Section125Calculator};
pub use state::{StateWithholding, calc_sit};
