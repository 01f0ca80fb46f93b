//! Per-employee proposal metrics: the safe deduction, the taxes it saves
//! and the fees it costs, as monthly and annual figures.
//!
//! Steps run in a fixed order because each uses the previous result:
//!
//! 1. resolve the billing model (unknown names fail before any tax work)
//! 2. size the safe deduction against the model's employee fee rate
//! 3. evaluate taxes without and with the deduction
//! 4. take the per-pay savings and convert them to monthly and annual
//! 5. charge fees on the monthly pre-tax volume and net them off

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::common::{per_month_to_annual, per_pay_to_annual, per_pay_to_monthly};
use super::fees::{BillingModelTable, FeeBreakdown};
use super::payroll_taxes::{PayInput, PayrollTaxProfile, PayrollTaxes};
use super::section125::{ensure_safety_cap, size_deduction};
use crate::models::{
    Diagnostic, EmployeeRecord, FilingStatus, PayFrequency, PreTaxDeduction, TaxParameterSet,
    TaxYear,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRequest {
    pub tax_year: TaxYear,
    pub gross_per_pay: Decimal,
    pub pay_frequency: PayFrequency,
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub dependents: u32,
    pub state: String,
    pub model: String,
    pub safety_cap_percent: Decimal,
    /// Existing pre-tax deductions, applied both before and after.
    #[serde(default)]
    pub pre_tax_deductions: Vec<PreTaxDeduction>,
}

impl ProposalRequest {
    pub fn for_employee(
        employee: &EmployeeRecord,
        tax_year: TaxYear,
        model: &str,
        safety_cap_percent: Decimal,
    ) -> Self {
        Self {
            tax_year,
            gross_per_pay: employee.gross_per_pay,
            pay_frequency: employee.pay_frequency,
            filing_status: employee.filing_status,
            dependents: employee.dependents,
            state: employee.state.clone(),
            model: model.to_string(),
            safety_cap_percent,
            pre_tax_deductions: employee.pre_tax_deductions.clone(),
        }
    }
}

/// One amount at three horizons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAmounts {
    pub per_pay: Decimal,
    pub monthly: Decimal,
    pub annual: Decimal,
}

impl PeriodAmounts {
    pub fn from_per_pay(per_pay: Decimal, frequency: PayFrequency) -> Self {
        Self {
            per_pay,
            monthly: per_pay_to_monthly(per_pay, frequency),
            annual: per_pay_to_annual(per_pay, frequency),
        }
    }
}

/// Full-precision detail behind a [`ProposalMetrics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub deduction: PeriodAmounts,
    pub ideal_deduction_per_pay: Decimal,
    pub ceiling_deduction_per_pay: Decimal,
    pub taxes_before: PayrollTaxes,
    pub taxes_after: PayrollTaxes,
    /// Employee federal, state and FICA taxes.
    pub tax_before: PeriodAmounts,
    pub tax_after: PeriodAmounts,
    pub employee_tax_savings: PeriodAmounts,
    pub employer_fica_savings: PeriodAmounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMetrics {
    /// Monthly pre-tax benefit volume.
    pub gross_benefit_allotment: Decimal,
    pub employee_net_increase_monthly: Decimal,
    pub employee_net_increase_annual: Decimal,
    pub employer_net_savings_monthly: Decimal,
    pub employer_net_savings_annual: Decimal,
    pub is_capped: bool,
    pub detail: CalculationResult,
    pub fees: FeeBreakdown,
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes proposal metrics for one employee.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidModel`] for an unknown model and
/// [`CalculationError::InvalidInput`] for negative gross pay or deductions
/// or a cap outside `[0, 100]`. Missing tax parameters are reported in
/// `diagnostics`.
pub fn calculate_proposal_metrics(
    request: &ProposalRequest,
    params: &TaxParameterSet,
    models: &BillingModelTable,
) -> Result<ProposalMetrics, CalculationError> {
    let model = models.get(&request.model)?;
    ensure_safety_cap(request.safety_cap_percent)?;

    let frequency = request.pay_frequency;
    let input = PayInput {
        gross_per_pay: request.gross_per_pay,
        pay_frequency: frequency,
        filing_status: request.filing_status,
        dependents: request.dependents,
        state: &request.state,
        pre_tax_deductions: &request.pre_tax_deductions,
    };
    let profile = PayrollTaxProfile::resolve(params, request.tax_year, &input)?;

    let safe = size_deduction(&profile, request.safety_cap_percent, model.employee_rate);

    let taxes_before = profile.taxes_at(Decimal::ZERO);
    let taxes_after = profile.taxes_at(safe.per_pay_amount);

    let tax_before = PeriodAmounts::from_per_pay(taxes_before.employee_total(), frequency);
    let tax_after = PeriodAmounts::from_per_pay(taxes_after.employee_total(), frequency);
    let employee_tax_savings = PeriodAmounts::from_per_pay(
        taxes_before.employee_total() - taxes_after.employee_total(),
        frequency,
    );
    let employer_fica_savings = PeriodAmounts::from_per_pay(
        taxes_before.employer_fica() - taxes_after.employer_fica(),
        frequency,
    );
    let deduction = PeriodAmounts::from_per_pay(safe.per_pay_amount, frequency);

    let fees = models.compute_fees_for_pretax_monthly(deduction.monthly, &request.model)?;

    Ok(ProposalMetrics {
        gross_benefit_allotment: deduction.monthly,
        employee_net_increase_monthly: employee_tax_savings.monthly - fees.employee_fee_monthly,
        employee_net_increase_annual: employee_tax_savings.annual
            - per_month_to_annual(fees.employee_fee_monthly),
        employer_net_savings_monthly: employer_fica_savings.monthly - fees.employer_fee_monthly,
        employer_net_savings_annual: employer_fica_savings.annual
            - per_month_to_annual(fees.employer_fee_monthly),
        is_capped: safe.is_capped,
        detail: CalculationResult {
            deduction,
            ideal_deduction_per_pay: safe.ideal_amount,
            ceiling_deduction_per_pay: safe.ceiling_amount,
            taxes_before,
            taxes_after,
            tax_before,
            tax_after,
            employee_tax_savings,
            employer_fica_savings,
        },
        fees,
        diagnostics: safe.diagnostics,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::section125::{SafeDeductionRequest, Section125Calculator};
    use crate::calculations::testing::parameters_2025;

    fn request(model: &str) -> ProposalRequest {
        ProposalRequest {
            tax_year: 2025,
            gross_per_pay: dec!(2000),
            pay_frequency: PayFrequency::Biweekly,
            filing_status: FilingStatus::Single,
            dependents: 0,
            state: "IL".to_string(),
            model: model.to_string(),
            safety_cap_percent: dec!(30),
            pre_tax_deductions: Vec::new(),
        }
    }

    #[test]
    fn unknown_model_fails_before_any_calculation() {
        let params = parameters_2025();
        let mut req = request("9/9");
        req.gross_per_pay = dec!(-1);

        assert_eq!(
            calculate_proposal_metrics(&req, &params, &BillingModelTable::standard()),
            Err(CalculationError::InvalidModel("9/9".to_string()))
        );
    }

    #[test]
    fn deduction_matches_standalone_section125() {
        let params = parameters_2025();
        let models = BillingModelTable::standard();
        let req = request("5/3");

        let metrics = calculate_proposal_metrics(&req, &params, &models).unwrap();
        let standalone = Section125Calculator::new(&params, models.get("5/3").unwrap().employee_rate)
            .calculate_safe_deduction(&SafeDeductionRequest {
                tier: 2025,
                filing_status: FilingStatus::Single,
                dependents: 0,
                gross_per_pay: dec!(2000),
                pay_frequency: PayFrequency::Biweekly,
                safety_cap_percent: dec!(30),
                state: "IL".to_string(),
                existing_deductions: Vec::new(),
            })
            .unwrap();

        assert_eq!(metrics.detail.deduction.per_pay, standalone.per_pay_amount);
        assert_eq!(metrics.is_capped, standalone.is_capped);
    }

    #[test]
    fn savings_and_fees_compose_in_order() {
        let params = parameters_2025();
        let models = BillingModelTable::standard();

        let metrics = calculate_proposal_metrics(&request("5/3"), &params, &models).unwrap();
        let d = metrics.detail.deduction.per_pay;

        assert_eq!(metrics.gross_benefit_allotment, d * dec!(26) / dec!(12));
        assert_eq!(
            metrics.detail.employer_fica_savings.per_pay,
            metrics.detail.taxes_before.employer_fica() - metrics.detail.taxes_after.employer_fica()
        );
        assert_eq!(
            metrics.employer_net_savings_monthly,
            metrics.detail.employer_fica_savings.monthly - metrics.gross_benefit_allotment * dec!(0.05)
        );
        assert_eq!(
            metrics.employee_net_increase_monthly,
            metrics.detail.employee_tax_savings.monthly - metrics.gross_benefit_allotment * dec!(0.03)
        );
        assert!(metrics.detail.employee_tax_savings.per_pay > dec!(0));
        assert!(metrics.diagnostics.is_empty());
    }

    #[test]
    fn existing_deductions_apply_to_both_sides() {
        let params = parameters_2025();
        let models = BillingModelTable::standard();
        let mut req = request("4/4");
        req.state = "TX".to_string();
        req.pre_tax_deductions.push(PreTaxDeduction {
            label: "medical".to_string(),
            amount_per_pay: dec!(150),
            reduces_fit: true,
            reduces_fica: true,
        });

        let metrics = calculate_proposal_metrics(&req, &params, &models).unwrap();

        assert_eq!(metrics.detail.taxes_before.fica.fica, dec!(1850) * dec!(0.0765));
    }

    #[test]
    fn missing_state_is_a_diagnostic_not_an_error() {
        let params = parameters_2025();
        let mut req = request("4/4");
        req.state = "WA".to_string();

        let metrics =
            calculate_proposal_metrics(&req, &params, &BillingModelTable::standard()).unwrap();

        assert_eq!(
            metrics.diagnostics,
            vec![Diagnostic::MissingStateParams {
                tax_year: 2025,
                state: "WA".to_string(),
            }]
        );
        assert_eq!(metrics.detail.taxes_before.state_income_tax, dec!(0));
    }

    #[test]
    fn parallel_calculation_matches_sequential() {
        let params = parameters_2025();
        let models = BillingModelTable::standard();
        let requests: Vec<ProposalRequest> = (0..16)
            .map(|i| {
                let mut req = request(if i % 2 == 0 { "5/3" } else { "4/4" });
                req.gross_per_pay = dec!(800) + Decimal::from(i) * dec!(275.5);
                req
            })
            .collect();

        let sequential: Vec<_> = requests
            .iter()
            .map(|r| calculate_proposal_metrics(r, &params, &models).unwrap())
            .collect();
        let (shared_params, shared_models) = (&params, &models);
        let parallel: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = requests
                .iter()
                .map(|r| {
                    scope.spawn(move || {
                        calculate_proposal_metrics(r, shared_params, shared_models).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(sequential, parallel);
    }
}
