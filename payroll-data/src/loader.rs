use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use payroll_core::{
    BracketTableError, FilingStatus, ParameterRepository, PayFrequency, RepositoryError, TaxYear,
    WithholdingBracketRow, WithholdingTable,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Pay-frequency code that expands to every per-pay frequency.
const ANNUAL: &str = "annual";

/// Errors that can occur when loading withholding tables.
#[derive(Debug, Error)]
pub enum WithholdingLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Unknown filing status '{0}' (expected single, married or head)")]
    InvalidFilingStatus(String),

    #[error("Unknown pay frequency '{0}' (expected weekly, biweekly, semimonthly, monthly or annual)")]
    InvalidPayFrequency(String),

    #[error("Table {tax_year} {filing_status} {pay_frequency} appears both as annual and per-pay rows")]
    DuplicateTable {
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    },

    #[error("Invalid table {tax_year} {filing_status} {pay_frequency}: {source}")]
    InvalidTable {
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
        source: BracketTableError,
    },

    #[error("Tax year {0} is published; its tables can no longer be replaced")]
    TaxYearPublished(TaxYear),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for WithholdingLoaderError {
    fn from(err: csv::Error) -> Self {
        WithholdingLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the withholding CSV file.
///
/// Columns: `tax_year,filing_status,pay_frequency,over,base_tax,pct`.
/// `pay_frequency` may be `annual`, in which case `over` and `base_tax` are
/// annual amounts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct WithholdingRecord {
    pub tax_year: TaxYear,
    pub filing_status: String,
    pub pay_frequency: String,
    pub over: Decimal,
    pub base_tax: Decimal,
    pub pct: Decimal,
}

impl WithholdingRecord {
    fn row(&self) -> WithholdingBracketRow {
        WithholdingBracketRow {
            over: self.over,
            base_tax: self.base_tax,
            pct: self.pct,
        }
    }
}

/// Counts reported by [`WithholdingTableLoader::load`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub tables: usize,
    pub rows: usize,
}

/// Loader for withholding tables from CSV files.
///
/// Works against any [`ParameterRepository`] backend.
pub struct WithholdingTableLoader;

impl WithholdingTableLoader {
    /// Parse withholding records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<WithholdingRecord>, WithholdingLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: WithholdingRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Groups records into per-pay tables and validates each one.
    ///
    /// Rows keep their CSV order within a table. Annual groups are expanded
    /// to all four pay frequencies.
    pub fn tables(
        records: &[WithholdingRecord],
    ) -> Result<Vec<WithholdingTable>, WithholdingLoaderError> {
        let mut explicit: BTreeMap<(TaxYear, FilingStatus, PayFrequency), Vec<WithholdingBracketRow>> =
            BTreeMap::new();
        let mut annual: BTreeMap<(TaxYear, FilingStatus), Vec<WithholdingBracketRow>> =
            BTreeMap::new();

        for record in records {
            let status = FilingStatus::parse(&record.filing_status.to_ascii_lowercase())
                .ok_or_else(|| {
                    WithholdingLoaderError::InvalidFilingStatus(record.filing_status.clone())
                })?;
            let frequency = record.pay_frequency.to_ascii_lowercase();

            if frequency == ANNUAL {
                annual
                    .entry((record.tax_year, status))
                    .or_default()
                    .push(record.row());
            } else {
                let frequency = PayFrequency::parse(&frequency).ok_or_else(|| {
                    WithholdingLoaderError::InvalidPayFrequency(record.pay_frequency.clone())
                })?;
                explicit
                    .entry((record.tax_year, status, frequency))
                    .or_default()
                    .push(record.row());
            }
        }

        for ((tax_year, filing_status), rows) in &annual {
            for pay_frequency in PayFrequency::ALL {
                let key = (*tax_year, *filing_status, pay_frequency);
                if explicit.contains_key(&key) {
                    return Err(WithholdingLoaderError::DuplicateTable {
                        tax_year: *tax_year,
                        filing_status: *filing_status,
                        pay_frequency,
                    });
                }
                let table =
                    WithholdingTable::from_annual(*tax_year, *filing_status, pay_frequency, rows);
                explicit.insert(key, table.rows);
            }
        }

        explicit
            .into_iter()
            .map(|((tax_year, filing_status, pay_frequency), rows)| {
                let table = WithholdingTable {
                    tax_year,
                    filing_status,
                    pay_frequency,
                    rows,
                };
                table
                    .validate()
                    .map_err(|source| WithholdingLoaderError::InvalidTable {
                        tax_year,
                        filing_status,
                        pay_frequency,
                        source,
                    })?;
                Ok(table)
            })
            .collect()
    }

    /// Load withholding records into the store.
    ///
    /// Every table is validated before anything is written, and a published
    /// tax year aborts the load up front. Each (year, status, frequency)
    /// table is cleared and re-inserted, so loading the same file twice
    /// gives the same result.
    pub async fn load<R: ParameterRepository + ?Sized>(
        repo: &R,
        records: &[WithholdingRecord],
    ) -> Result<LoadSummary, WithholdingLoaderError> {
        let tables = Self::tables(records)?;

        let years: BTreeSet<TaxYear> = tables.iter().map(|t| t.tax_year).collect();
        for &year in &years {
            if repo.is_tax_year_published(year).await? {
                return Err(WithholdingLoaderError::TaxYearPublished(year));
            }
        }

        let mut summary = LoadSummary::default();
        for table in &tables {
            repo.delete_withholding_rows(table.tax_year, table.filing_status, table.pay_frequency)
                .await?;
            for row in &table.rows {
                repo.insert_withholding_row(
                    table.tax_year,
                    table.filing_status,
                    table.pay_frequency,
                    row,
                )
                .await?;
            }

            info!(
                tax_year = table.tax_year,
                filing_status = %table.filing_status,
                pay_frequency = %table.pay_frequency,
                rows = table.rows.len(),
                "loaded withholding table"
            );
            summary.tables += 1;
            summary.rows += table.rows.len();
        }

        Ok(summary)
    }
}
