//! Plain-text rendering of a preview. All amounts are rounded to cents here
//! and nowhere else.

use std::fmt::Write;

use payroll_core::billing::{BillingRunReport, EmployeeOutcome, ProposalComparison};
use payroll_core::calculations::ExclusionReason;
use payroll_core::calculations::common::round_half_up;
use rust_decimal::Decimal;

use crate::app::Preview;

pub fn money(value: Decimal) -> String {
    format!("{:.2}", round_half_up(value))
}

pub fn render(preview: &Preview) -> String {
    let mut out = render_comparison(&preview.comparison, preview.detail.tax_year);
    out.push('\n');
    out.push_str(&render_employees(&preview.detail));
    out
}

pub fn render_comparison(comparison: &ProposalComparison, tax_year: i32) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Proposal comparison: {} (tax year {})",
        comparison.company, tax_year
    );
    let _ = writeln!(
        out,
        "{:<6} {:<28} {:>12} {:>12} {:>11} {:>11} {:>12} {:>11} {:>14}",
        "Model",
        "Fees",
        "Pre-tax/mo",
        "ER FICA/mo",
        "ER fee/mo",
        "EE fee/mo",
        "ER net/mo",
        "Credit/mo",
        "ER after cr/mo"
    );

    for row in &comparison.rows {
        let totals = &row.totals;
        let _ = writeln!(
            out,
            "{:<6} {:<28} {:>12} {:>12} {:>11} {:>11} {:>12} {:>11} {:>14}",
            row.model,
            row.fees_label,
            money(totals.pretax_monthly),
            money(totals.employer_fica_savings_monthly),
            money(totals.employer_fees_monthly),
            money(totals.employee_fees_monthly),
            money(totals.employer_net_monthly),
            money(row.profit_share.credit),
            money(row.employer_net_after_credit_monthly),
        );
    }

    if let Some(best) = comparison.best_for_employer() {
        let _ = writeln!(
            out,
            "Best for employer: {} ({}/mo after credit)",
            best.model,
            money(best.employer_net_after_credit_monthly)
        );
    }
    out
}

pub fn render_employees(report: &BillingRunReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Employees under model {} ({})", report.model, report.fees_label);
    let _ = writeln!(
        out,
        "{:<10} {:>12} {:>10} {:>10} {:>11} {:>11} {:<7} Notes",
        "Employee", "Deduct/pay", "Ideal", "Ceiling", "EE net/mo", "ER net/mo", "Capped"
    );

    for result in &report.results {
        let id = result.employee_id.as_str();
        match &result.outcome {
            EmployeeOutcome::Calculated(metrics) => {
                let notes = metrics
                    .diagnostics
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                let _ = writeln!(
                    out,
                    "{:<10} {:>12} {:>10} {:>10} {:>11} {:>11} {:<7} {}",
                    id,
                    money(metrics.detail.deduction.per_pay),
                    money(metrics.detail.ideal_deduction_per_pay),
                    money(metrics.detail.ceiling_deduction_per_pay),
                    money(metrics.employee_net_increase_monthly),
                    money(metrics.employer_net_savings_monthly),
                    if metrics.is_capped { "yes" } else { "no" },
                    notes
                );
            }
            EmployeeOutcome::Excluded(reason) => {
                let _ = writeln!(out, "{:<10} excluded: {}", id, describe_exclusion(reason));
            }
            EmployeeOutcome::Failed(error) => {
                let _ = writeln!(out, "{:<10} failed: {}", id, error);
            }
        }
    }

    let totals = &report.totals;
    let _ = writeln!(
        out,
        "{} calculated, {} excluded, {} failed, {} capped",
        totals.employees_calculated,
        totals.employees_excluded,
        totals.employees_failed,
        totals.employees_capped
    );
    if report.profit_share.credit > Decimal::ZERO {
        let _ = writeln!(
            out,
            "{}: {}/mo",
            report.profit_share.description,
            money(report.profit_share.credit)
        );
    }
    out
}

fn describe_exclusion(reason: &ExclusionReason) -> String {
    match reason {
        ExclusionReason::NotEnrolled => "not enrolled".to_string(),
        ExclusionReason::BelowMinimumGross {
            annual_gross,
            minimum,
        } => format!(
            "annual gross {} below minimum {}",
            money(*annual_gross),
            money(*minimum)
        ),
    }
}
