//! Batch loading of parameters ahead of a calculation run.

use tracing::{debug, info};

use super::repository::{ParameterRepository, RepositoryError};
use crate::calculations::BillingModelTable;
use crate::models::{TaxParameterSet, TaxYear, YearParameters};

/// Fetches everything the calculators need for `years` in one pass.
///
/// A year with no federal row, states or tables is still published (empty)
/// so calculations against it report diagnostics instead of failing.
///
/// # Errors
///
/// Returns store errors other than [`RepositoryError::NotFound`], and
/// [`RepositoryError::InvalidParameters`] if stored data fails validation.
pub async fn load_parameter_snapshot(
    repo: &dyn ParameterRepository,
    years: &[TaxYear],
) -> Result<TaxParameterSet, RepositoryError> {
    let mut set = TaxParameterSet::new();

    for &year in years {
        if set.is_published(year) {
            continue;
        }

        let mut params = YearParameters::new(year);
        match repo.get_federal_params(year).await {
            Ok(federal) => params = params.with_federal(federal)?,
            Err(RepositoryError::NotFound) => {
                debug!(tax_year = year, "no federal parameters stored");
            }
            Err(e) => return Err(e),
        }

        let states = repo.list_state_params(year).await?;
        let state_count = states.len();
        for state in states {
            params = params.with_state(state)?;
        }

        let tables = repo.list_withholding_tables(year).await?;
        let table_count = tables.len();
        for table in tables {
            params = params.with_withholding_table(table)?;
        }

        info!(
            tax_year = year,
            states = state_count,
            withholding_tables = table_count,
            "loaded tax parameters"
        );
        set.publish(params)?;
    }

    Ok(set)
}

/// Builds the billing model table from the store.
///
/// # Errors
///
/// Returns [`RepositoryError::InvalidData`] if a stored rate is out of range.
pub async fn load_billing_models(
    repo: &dyn ParameterRepository,
) -> Result<BillingModelTable, RepositoryError> {
    let models = repo.list_billing_models().await?;
    BillingModelTable::new(models).map_err(|e| RepositoryError::InvalidData(e.to_string()))
}
