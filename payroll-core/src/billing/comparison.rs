use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::run::{BillingTotals, CompanyBillingConfig, run_billing};
use crate::calculations::{BillingModelTable, CalculationError, ProfitShareCredit};
use crate::models::{EmployeeRecord, TaxParameterSet};

/// One model's company totals in a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelComparisonRow {
    pub model: String,
    pub fees_label: String,
    pub totals: BillingTotals,
    pub profit_share: ProfitShareCredit,
    pub employer_net_after_credit_monthly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalComparison {
    pub company: String,
    pub rows: Vec<ModelComparisonRow>,
}

impl ProposalComparison {
    /// The row leaving the employer the most after fees and credit.
    pub fn best_for_employer(&self) -> Option<&ModelComparisonRow> {
        self.rows
            .iter()
            .max_by(|a, b| {
                a.employer_net_after_credit_monthly
                    .cmp(&b.employer_net_after_credit_monthly)
            })
    }
}

/// Runs the same census under each model, in the order given.
///
/// # Errors
///
/// Fails as a whole if any model is unknown, with no partial table.
pub fn compare_models<S: AsRef<str>>(
    config: &CompanyBillingConfig,
    employees: &[EmployeeRecord],
    params: &TaxParameterSet,
    models: &BillingModelTable,
    candidates: &[S],
) -> Result<ProposalComparison, CalculationError> {
    for name in candidates {
        models.get(name.as_ref())?;
    }

    let mut rows = Vec::with_capacity(candidates.len());
    for name in candidates {
        let scenario = CompanyBillingConfig {
            model: name.as_ref().to_string(),
            ..config.clone()
        };
        let report = run_billing(&scenario, employees, params, models)?;
        rows.push(ModelComparisonRow {
            model: report.model,
            fees_label: report.fees_label,
            totals: report.totals,
            profit_share: report.profit_share,
            employer_net_after_credit_monthly: report.employer_net_after_credit_monthly,
        });
    }

    info!(company = %config.company, models = rows.len(), "model comparison complete");

    Ok(ProposalComparison {
        company: config.company.clone(),
        rows,
    })
}
