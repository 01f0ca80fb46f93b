use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::calculations::{
    BillingModelTable, CalculationError, Eligibility, EligibilityPolicy, ExclusionReason,
    ProfitShareCredit, ProposalMetrics, ProposalRequest, calculate_proposal_metrics,
    compute_profit_share, validate_profit_share,
};
use crate::calculations::section125::ensure_safety_cap;
use crate::models::{EmployeeRecord, ProfitShareConfig, TaxParameterSet, TaxYear};

/// A company's billing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyBillingConfig {
    pub company: String,
    pub tax_year: TaxYear,
    pub model: String,
    pub safety_cap_percent: Decimal,
    #[serde(default)]
    pub profit_share: ProfitShareConfig,
    #[serde(default)]
    pub eligibility: EligibilityPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeOutcome {
    Calculated(Box<ProposalMetrics>),
    Excluded(ExclusionReason),
    Failed(CalculationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeResult {
    pub employee_id: String,
    pub outcome: EmployeeOutcome,
}

/// Monthly company totals over calculated employees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingTotals {
    pub employees_calculated: usize,
    pub employees_excluded: usize,
    pub employees_failed: usize,
    pub employees_capped: usize,
    pub pretax_monthly: Decimal,
    pub employee_tax_savings_monthly: Decimal,
    pub employer_fica_savings_monthly: Decimal,
    pub employee_fees_monthly: Decimal,
    pub employer_fees_monthly: Decimal,
    pub employee_net_monthly: Decimal,
    pub employer_net_monthly: Decimal,
}

impl BillingTotals {
    fn add(&mut self, metrics: &ProposalMetrics) {
        self.employees_calculated += 1;
        if metrics.is_capped {
            self.employees_capped += 1;
        }
        self.pretax_monthly += metrics.gross_benefit_allotment;
        self.employee_tax_savings_monthly += metrics.detail.employee_tax_savings.monthly;
        self.employer_fica_savings_monthly += metrics.detail.employer_fica_savings.monthly;
        self.employee_fees_monthly += metrics.fees.employee_fee_monthly;
        self.employer_fees_monthly += metrics.fees.employer_fee_monthly;
        self.employee_net_monthly += metrics.employee_net_increase_monthly;
        self.employer_net_monthly += metrics.employer_net_savings_monthly;
    }

    /// Provider profit on the account: every fee collected.
    pub fn provider_profit_monthly(&self) -> Decimal {
        self.employee_fees_monthly + self.employer_fees_monthly
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingRunReport {
    pub company: String,
    pub tax_year: TaxYear,
    pub model: String,
    pub fees_label: String,
    pub results: Vec<EmployeeResult>,
    pub totals: BillingTotals,
    pub profit_share: ProfitShareCredit,
    /// Employer net savings plus the profit-share credit.
    pub employer_net_after_credit_monthly: Decimal,
}

impl BillingRunReport {
    pub fn calculated(&self) -> impl Iterator<Item = (&str, &ProposalMetrics)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            EmployeeOutcome::Calculated(metrics) => Some((r.employee_id.as_str(), metrics.as_ref())),
            _ => None,
        })
    }
}

/// Runs one company's billing under its configured model.
///
/// Parameters are read from the snapshot passed in; nothing is fetched per
/// employee.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidModel`] for an unknown model and
/// [`CalculationError::InvalidInput`] for an invalid safety cap or
/// profit-share percentage. Employee-level errors are reported as
/// [`EmployeeOutcome::Failed`].
pub fn run_billing(
    config: &CompanyBillingConfig,
    employees: &[EmployeeRecord],
    params: &TaxParameterSet,
    models: &BillingModelTable,
) -> Result<BillingRunReport, CalculationError> {
    let model = models.get(&config.model)?;
    validate_profit_share(&config.profit_share)?;
    ensure_safety_cap(config.safety_cap_percent)?;

    info!(
        company = %config.company,
        tax_year = config.tax_year,
        model = %config.model,
        employees = employees.len(),
        "starting billing run"
    );

    let mut totals = BillingTotals::default();
    let mut results = Vec::with_capacity(employees.len());

    for employee in employees {
        let outcome = match config.eligibility.evaluate(employee) {
            Eligibility::Excluded(reason) => {
                debug!(employee = %employee.employee_id, ?reason, "employee excluded");
                totals.employees_excluded += 1;
                EmployeeOutcome::Excluded(reason)
            }
            Eligibility::Eligible => {
                let request = ProposalRequest::for_employee(
                    employee,
                    config.tax_year,
                    &config.model,
                    config.safety_cap_percent,
                );
                match calculate_proposal_metrics(&request, params, models) {
                    Ok(metrics) => {
                        for diagnostic in &metrics.diagnostics {
                            warn!(employee = %employee.employee_id, %diagnostic, "incomplete tax parameters");
                        }
                        totals.add(&metrics);
                        EmployeeOutcome::Calculated(Box::new(metrics))
                    }
                    Err(error) => {
                        warn!(employee = %employee.employee_id, %error, "employee calculation failed");
                        totals.employees_failed += 1;
                        EmployeeOutcome::Failed(error)
                    }
                }
            }
        };

        results.push(EmployeeResult {
            employee_id: employee.employee_id.clone(),
            outcome,
        });
    }

    let profit_share = compute_profit_share(
        config.profit_share.mode,
        config.profit_share.percent,
        totals.employer_fica_savings_monthly,
        totals.provider_profit_monthly(),
    )?;
    let employer_net_after_credit_monthly = totals.employer_net_monthly + profit_share.credit;

    info!(
        company = %config.company,
        calculated = totals.employees_calculated,
        excluded = totals.employees_excluded,
        failed = totals.employees_failed,
        pretax_monthly = %totals.pretax_monthly,
        "billing run complete"
    );

    Ok(BillingRunReport {
        company: config.company.clone(),
        tax_year: config.tax_year,
        model: config.model.clone(),
        fees_label: model.fees_label(),
        results,
        totals,
        profit_share,
        employer_net_after_credit_monthly,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::testing::parameters_2025;
    use crate::models::{FilingStatus, PayFrequency, ProfitShareMode};

    fn employee(id: &str, gross: Decimal, state: &str) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            gross_per_pay: gross,
            pay_frequency: PayFrequency::Biweekly,
            filing_status: FilingStatus::Single,
            dependents: 0,
            state: state.to_string(),
            enrolled: true,
            pre_tax_deductions: Vec::new(),
        }
    }

    fn config(model: &str) -> CompanyBillingConfig {
        CompanyBillingConfig {
            company: "Acme".to_string(),
            tax_year: 2025,
            model: model.to_string(),
            safety_cap_percent: dec!(30),
            profit_share: ProfitShareConfig {
                mode: ProfitShareMode::PercentErSavings,
                percent: dec!(0.5),
            },
            eligibility: EligibilityPolicy {
                minimum_annual_gross: dec!(15000),
                require_enrollment: true,
            },
        }
    }

    #[test]
    fn unknown_model_aborts_the_run() {
        let params = parameters_2025();

        let result = run_billing(
            &config("9/9"),
            &[employee("E1", dec!(2000), "TX")],
            &params,
            &BillingModelTable::standard(),
        );

        assert_eq!(result, Err(CalculationError::InvalidModel("9/9".to_string())));
    }

    #[test]
    fn negative_gross_is_reported_as_failure() {
        let params = parameters_2025();
        let mut policy_default = config("5/3");
        policy_default.eligibility = EligibilityPolicy::default();

        for config in [config("5/3"), policy_default] {
            let report = run_billing(
                &config,
                &[employee("E1", dec!(-500), "TX"), employee("E2", dec!(2000), "TX")],
                &params,
                &BillingModelTable::standard(),
            )
            .unwrap();

            assert!(matches!(
                report.results[0].outcome,
                EmployeeOutcome::Failed(CalculationError::InvalidInput { .. })
            ));
            assert_eq!(report.totals.employees_failed, 1);
            assert_eq!(report.totals.employees_excluded, 0);
            assert_eq!(report.totals.employees_calculated, 1);
        }
    }

    #[test]
    fn bad_employee_is_reported_and_run_continues() {
        let params = parameters_2025();
        let mut bad = employee("E2", dec!(2000), "TX");
        bad.pre_tax_deductions.push(crate::models::PreTaxDeduction {
            label: "refund".to_string(),
            amount_per_pay: dec!(-10),
            reduces_fit: true,
            reduces_fica: true,
        });
        let mut unenrolled = employee("E3", dec!(2000), "TX");
        unenrolled.enrolled = false;
        let employees = vec![
            employee("E1", dec!(2000), "TX"),
            bad,
            unenrolled,
            employee("E4", dec!(400), "TX"),
        ];

        let report = run_billing(
            &config("5/3"),
            &employees,
            &params,
            &BillingModelTable::standard(),
        )
        .unwrap();

        assert_eq!(report.totals.employees_calculated, 1);
        assert_eq!(report.totals.employees_failed, 1);
        assert_eq!(report.totals.employees_excluded, 2);
        assert!(matches!(
            report.results[1].outcome,
            EmployeeOutcome::Failed(CalculationError::InvalidInput { .. })
        ));
        assert_eq!(
            report.results[2].outcome,
            EmployeeOutcome::Excluded(ExclusionReason::NotEnrolled)
        );
        assert!(matches!(
            report.results[3].outcome,
            EmployeeOutcome::Excluded(ExclusionReason::BelowMinimumGross { .. })
        ));
    }

    #[test]
    fn totals_and_credit_sum_calculated_employees() {
        let params = parameters_2025();
        let models = BillingModelTable::standard();
        let employees = vec![
            employee("E1", dec!(2000), "TX"),
            employee("E2", dec!(3100), "IL"),
            employee("E3", dec!(1450), "VA"),
        ];

        let report = run_billing(&config("5/3"), &employees, &params, &models).unwrap();

        let pretax: Decimal = report.calculated().map(|(_, m)| m.gross_benefit_allotment).sum();
        let er_savings: Decimal = report
            .calculated()
            .map(|(_, m)| m.detail.employer_fica_savings.monthly)
            .sum();
        assert_eq!(report.totals.pretax_monthly, pretax);
        assert_eq!(report.totals.employer_fica_savings_monthly, er_savings);
        assert_eq!(report.profit_share.credit, er_savings * dec!(0.5));
        assert_eq!(
            report.employer_net_after_credit_monthly,
            report.totals.employer_net_monthly + report.profit_share.credit
        );
        assert_eq!(report.fees_label, "Employer 5% / Employee 3%");
    }

    #[test]
    fn provider_profit_mode_uses_all_fees() {
        let params = parameters_2025();
        let mut cfg = config("4/4");
        cfg.profit_share = ProfitShareConfig {
            mode: ProfitShareMode::PercentBbProfit,
            percent: dec!(0.1),
        };

        let report = run_billing(
            &cfg,
            &[employee("E1", dec!(2400), "TX")],
            &params,
            &BillingModelTable::standard(),
        )
        .unwrap();

        assert_eq!(
            report.profit_share.credit,
            (report.totals.employee_fees_monthly + report.totals.employer_fees_monthly) * dec!(0.1)
        );
    }
}
