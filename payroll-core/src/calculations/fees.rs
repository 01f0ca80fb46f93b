//! Billing fees on monthly pre-tax volume.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::common::{ensure_non_negative, ensure_rate};
use crate::models::BillingModel;

/// Fees for one model at one volume, at full precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub model: String,
    pub employee_fee_monthly: Decimal,
    pub employer_fee_monthly: Decimal,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
    pub fees_label: String,
}

impl FeeBreakdown {
    pub fn total_monthly(&self) -> Decimal {
        self.employee_fee_monthly + self.employer_fee_monthly
    }
}

/// The enumerated billing models, keyed by name.
///
/// Immutable once built; pass it by reference into every calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingModelTable {
    models: BTreeMap<String, BillingModel>,
}

impl BillingModelTable {
    /// Builds a table, checking every rate.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for a rate outside `[0, 1)`.
    pub fn new(models: impl IntoIterator<Item = BillingModel>) -> Result<Self, CalculationError> {
        let mut table = BTreeMap::new();
        for model in models {
            ensure_rate("employee_rate", model.employee_rate)?;
            ensure_rate("employer_rate", model.employer_rate)?;
            table.insert(model.name.clone(), model);
        }
        Ok(Self { models: table })
    }

    /// The models the product sells. Names read "employer%/employee%".
    pub fn standard() -> Self {
        let pct = |n: i64| Decimal::new(n, 2);
        let models = [
            ("3/3", 3, 3),
            ("4/3", 4, 3),
            ("4/4", 4, 4),
            ("5/0", 5, 0),
            ("5/1", 5, 1),
            ("5/3", 5, 3),
            ("6/0", 6, 0),
        ]
        .into_iter()
        .map(|(name, employer, employee)| {
            (
                name.to_string(),
                BillingModel::new(name, pct(employee), pct(employer)),
            )
        })
        .collect();

        Self { models }
    }

    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidModel`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<&BillingModel, CalculationError> {
        self.models
            .get(name)
            .ok_or_else(|| CalculationError::InvalidModel(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Fees on `pretax_monthly` under `model`. No rounding is applied.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidModel`] for an unknown model and
    /// [`CalculationError::InvalidInput`] for negative volume.
    pub fn compute_fees_for_pretax_monthly(
        &self,
        pretax_monthly: Decimal,
        model: &str,
    ) -> Result<FeeBreakdown, CalculationError> {
        let billing = self.get(model)?;
        ensure_non_negative("pretax_monthly", pretax_monthly)?;

        Ok(FeeBreakdown {
            model: billing.name.clone(),
            employee_fee_monthly: pretax_monthly * billing.employee_rate,
            employer_fee_monthly: pretax_monthly * billing.employer_rate,
            employee_rate: billing.employee_rate,
            employer_rate: billing.employer_rate,
            fees_label: billing.fees_label(),
        })
    }

    /// Fees for several models at the same volume, in the order given.
    ///
    /// # Errors
    ///
    /// Fails as a whole if any model is unknown.
    pub fn compute_all_models<S: AsRef<str>>(
        &self,
        pretax_monthly: Decimal,
        models: &[S],
    ) -> Result<Vec<FeeBreakdown>, CalculationError> {
        models
            .iter()
            .map(|model| self.compute_fees_for_pretax_monthly(pretax_monthly, model.as_ref()))
            .collect()
    }
}

impl Default for BillingModelTable {
    fn default() -> Self {
        Self::standard()
    }
}
