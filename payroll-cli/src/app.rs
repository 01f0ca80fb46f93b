use anyhow::{Context, Result, bail};
use payroll_core::ParameterRepository;
use payroll_core::billing::{
    BillingRunReport, CompanyBillingConfig, ProposalComparison, compare_models, run_billing,
};
use payroll_core::calculations::BillingModelTable;
use payroll_core::db::{RepositoryRegistry, load_billing_models, load_parameter_snapshot};
use payroll_db_sqlite::SqliteRepositoryFactory;
use tracing::{debug, info, warn};

use crate::config::PreviewConfig;

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Comparison across models plus the per-employee breakdown for the first.
#[derive(Debug, Clone)]
pub struct Preview {
    pub comparison: ProposalComparison,
    pub detail: BillingRunReport,
}

/// Loads parameters once and runs the census under each model.
pub async fn preview(
    repo: &dyn ParameterRepository,
    config: &PreviewConfig,
    models: &[String],
) -> Result<Preview> {
    let Some(first) = models.first() else {
        bail!("no billing models selected");
    };

    let tax_year = config.company.tax_year;
    let params = load_parameter_snapshot(repo, &[tax_year])
        .await
        .with_context(|| format!("Failed to load tax parameters for {}", tax_year))?;
    debug!(tax_year, "parameter snapshot ready");

    let mut table = load_billing_models(repo)
        .await
        .context("Failed to load billing models")?;
    if table.is_empty() {
        warn!("store has no billing models, using the standard set");
        table = BillingModelTable::standard();
    }

    let comparison = compare_models(&config.company, &config.employees, &params, &table, models)
        .context("Failed to compare billing models")?;

    let scenario = CompanyBillingConfig {
        model: first.clone(),
        ..config.company.clone()
    };
    let detail = run_billing(&scenario, &config.employees, &params, &table)
        .with_context(|| format!("Failed to run billing under model {}", first))?;

    info!(
        company = %config.company.company,
        models = models.len(),
        employees = config.employees.len(),
        "preview complete"
    );
    Ok(Preview { comparison, detail })
}
