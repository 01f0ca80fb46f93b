use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    BillingModel, FederalTaxParams, FilingStatus, ParameterError, PayFrequency, StateTaxParams,
    TaxYear, WithholdingBracketRow, WithholdingTable,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Tax year {0} is published and can no longer be changed")]
    TaxYearPublished(TaxYear),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    InvalidParameters(#[from] ParameterError),
}

/// Read/write access to the tax parameter store.
///
/// Lookups of a single key return [`RepositoryError::NotFound`] when the key
/// is absent; list methods return an empty list instead.
#[async_trait]
pub trait ParameterRepository: Send + Sync {
    // Tax years
    async fn list_tax_years(&self) -> Result<Vec<TaxYear>, RepositoryError>;
    async fn publish_tax_year(&self, tax_year: TaxYear) -> Result<(), RepositoryError>;
    async fn is_tax_year_published(&self, tax_year: TaxYear) -> Result<bool, RepositoryError>;

    // Federal parameters
    async fn get_federal_params(
        &self,
        tax_year: TaxYear,
    ) -> Result<FederalTaxParams, RepositoryError>;
    async fn upsert_federal_params(&self, params: &FederalTaxParams)
    -> Result<(), RepositoryError>;

    // State parameters
    async fn get_state_params(
        &self,
        tax_year: TaxYear,
        state: &str,
    ) -> Result<StateTaxParams, RepositoryError>;
    async fn list_state_params(
        &self,
        tax_year: TaxYear,
    ) -> Result<Vec<StateTaxParams>, RepositoryError>;
    async fn upsert_state_params(&self, params: &StateTaxParams) -> Result<(), RepositoryError>;

    // Withholding tables
    async fn get_withholding_table(
        &self,
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    ) -> Result<WithholdingTable, RepositoryError>;
    async fn list_withholding_tables(
        &self,
        tax_year: TaxYear,
    ) -> Result<Vec<WithholdingTable>, RepositoryError>;
    async fn insert_withholding_row(
        &self,
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
        row: &WithholdingBracketRow,
    ) -> Result<(), RepositoryError>;
    async fn delete_withholding_rows(
        &self,
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    ) -> Result<(), RepositoryError>;

    // Billing models
    async fn list_billing_models(&self) -> Result<Vec<BillingModel>, RepositoryError>;
}
