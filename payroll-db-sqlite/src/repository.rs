use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use payroll_core::{
    BillingModel, FederalTaxParams, FilingStatus, ParameterRepository, PayFrequency,
    RepositoryError, StateBracketRow, StateTaxMethod, StateTaxParams, TaxYear,
    WithholdingBracketRow, WithholdingTable,
};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::decimal::{format_timestamp, parse_decimal, parse_optional_decimal, parse_timestamp};

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens `database_url`, creating the file if it does not exist.
    ///
    /// Accepts bare paths (`payroll.db`), `sqlite:` URLs and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database url: {}", database_url))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(&self, seeds_dir: &Path) -> Result<()> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .with_context(|| format!("Failed to read seeds directory '{}'", seeds_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read seed file '{}'", path.display()))?;

            sqlx::raw_sql(&sql)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to execute seed file '{}'", path.display()))?;
            debug!(file = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// When `tax_year` was published, if it has been.
    pub async fn published_at(
        &self,
        tax_year: TaxYear,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT published_at FROM tax_years WHERE tax_year = ?")
                .bind(tax_year)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(e.to_string()))?;

        match row {
            Some((Some(at),)) => parse_timestamp(&at).map(Some),
            _ => Ok(None),
        }
    }

    async fn check_not_published(&self, tax_year: TaxYear) -> Result<(), RepositoryError> {
        if self.published_at(tax_year).await?.is_some() {
            return Err(RepositoryError::TaxYearPublished(tax_year));
        }
        Ok(())
    }

    /// Registers `tax_year` if needed and fails if it is already published.
    async fn open_for_writes(&self, tax_year: TaxYear) -> Result<(), RepositoryError> {
        sqlx::query("INSERT OR IGNORE INTO tax_years (tax_year) VALUES (?)")
            .bind(tax_year)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        self.check_not_published(tax_year).await
    }

    async fn state_brackets(
        &self,
        tax_year: TaxYear,
    ) -> Result<BTreeMap<String, Vec<StateBracketRow>>, RepositoryError> {
        let rows: Vec<StateBracketDbRow> = sqlx::query_as(
            "SELECT state, over, rate, base_tax
             FROM state_brackets
             WHERE tax_year = ?
             ORDER BY state, seq",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut by_state: BTreeMap<String, Vec<StateBracketRow>> = BTreeMap::new();
        for row in rows {
            let state = row.state.clone();
            by_state.entry(state).or_default().push(row.try_into()?);
        }
        Ok(by_state)
    }
}

#[derive(FromRow)]
struct FederalParamsRow {
    tax_year: i32,
    ss_rate: String,
    medicare_rate: String,
    ss_wage_base: String,
    addl_medicare_threshold: String,
    addl_medicare_rate: String,
    dependent_credit: String,
}

impl TryFrom<FederalParamsRow> for FederalTaxParams {
    type Error = RepositoryError;

    fn try_from(row: FederalParamsRow) -> Result<Self, Self::Error> {
        Ok(FederalTaxParams {
            tax_year: row.tax_year,
            ss_rate: parse_decimal(&row.ss_rate)?,
            medicare_rate: parse_decimal(&row.medicare_rate)?,
            ss_wage_base: parse_decimal(&row.ss_wage_base)?,
            addl_medicare_threshold: parse_decimal(&row.addl_medicare_threshold)?,
            addl_medicare_rate: parse_decimal(&row.addl_medicare_rate)?,
            dependent_credit: parse_decimal(&row.dependent_credit)?,
        })
    }
}

#[derive(FromRow)]
struct StateParamsRow {
    tax_year: i32,
    state: String,
    method: String,
    flat_rate: Option<String>,
    standard_deduction: String,
}

impl StateParamsRow {
    fn into_params(self, brackets: Vec<StateBracketRow>) -> Result<StateTaxParams, RepositoryError> {
        let method = match self.method.as_str() {
            "none" => StateTaxMethod::None,
            "flat" => {
                let rate = parse_optional_decimal(&self.flat_rate)?.ok_or_else(|| {
                    RepositoryError::InvalidData(format!(
                        "Flat-rate state {} has no rate for {}",
                        self.state, self.tax_year
                    ))
                })?;
                StateTaxMethod::Flat { rate }
            }
            "brackets" => StateTaxMethod::Brackets { rows: brackets },
            other => StateTaxMethod::Unsupported {
                name: other.to_string(),
            },
        };

        Ok(StateTaxParams {
            tax_year: self.tax_year,
            state: self.state,
            method,
            standard_deduction: parse_decimal(&self.standard_deduction)?,
        })
    }
}

#[derive(FromRow)]
struct StateBracketDbRow {
    state: String,
    over: String,
    rate: String,
    base_tax: String,
}

impl TryFrom<StateBracketDbRow> for StateBracketRow {
    type Error = RepositoryError;

    fn try_from(row: StateBracketDbRow) -> Result<Self, Self::Error> {
        Ok(StateBracketRow {
            over: parse_decimal(&row.over)?,
            rate: parse_decimal(&row.rate)?,
            base_tax: parse_decimal(&row.base_tax)?,
        })
    }
}

#[derive(FromRow)]
struct WithholdingDbRow {
    filing_status: String,
    pay_frequency: String,
    over: String,
    base_tax: String,
    pct: String,
}

impl WithholdingDbRow {
    fn key(&self) -> Result<(FilingStatus, PayFrequency), RepositoryError> {
        let status = FilingStatus::parse(&self.filing_status).ok_or_else(|| {
            RepositoryError::InvalidData(format!("Invalid filing status: {}", self.filing_status))
        })?;
        let frequency = PayFrequency::parse(&self.pay_frequency).ok_or_else(|| {
            RepositoryError::InvalidData(format!("Invalid pay frequency: {}", self.pay_frequency))
        })?;
        Ok((status, frequency))
    }
}

impl TryFrom<WithholdingDbRow> for WithholdingBracketRow {
    type Error = RepositoryError;

    fn try_from(row: WithholdingDbRow) -> Result<Self, Self::Error> {
        Ok(WithholdingBracketRow {
            over: parse_decimal(&row.over)?,
            base_tax: parse_decimal(&row.base_tax)?,
            pct: parse_decimal(&row.pct)?,
        })
    }
}

#[derive(FromRow)]
struct BillingModelRow {
    name: String,
    employee_rate: String,
    employer_rate: String,
}

impl TryFrom<BillingModelRow> for BillingModel {
    type Error = RepositoryError;

    fn try_from(row: BillingModelRow) -> Result<Self, Self::Error> {
        Ok(BillingModel::new(
            row.name,
            parse_decimal(&row.employee_rate)?,
            parse_decimal(&row.employer_rate)?,
        ))
    }
}

fn state_method_parts(method: &StateTaxMethod) -> (&str, Option<String>, &[StateBracketRow]) {
    match method {
        StateTaxMethod::Flat { rate } => ("flat", Some(rate.to_string()), &[]),
        StateTaxMethod::Brackets { rows } => ("brackets", None, rows.as_slice()),
        other => (other.name(), None, &[]),
    }
}

#[async_trait]
impl ParameterRepository for SqliteRepository {
    async fn list_tax_years(&self) -> Result<Vec<TaxYear>, RepositoryError> {
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT tax_year FROM tax_years ORDER BY tax_year")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(|(year,)| year).collect())
    }

    async fn publish_tax_year(&self, tax_year: TaxYear) -> Result<(), RepositoryError> {
        let now = format_timestamp(Utc::now());

        let result = sqlx::query(
            "UPDATE tax_years SET published_at = ?
             WHERE tax_year = ? AND published_at IS NULL",
        )
        .bind(&now)
        .bind(tax_year)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return match self.published_at(tax_year).await? {
                Some(_) => Err(RepositoryError::TaxYearPublished(tax_year)),
                None => Err(RepositoryError::NotFound),
            };
        }

        info!(tax_year, published_at = %now, "published tax year");
        Ok(())
    }

    async fn is_tax_year_published(&self, tax_year: TaxYear) -> Result<bool, RepositoryError> {
        Ok(self.published_at(tax_year).await?.is_some())
    }

    async fn get_federal_params(
        &self,
        tax_year: TaxYear,
    ) -> Result<FederalTaxParams, RepositoryError> {
        let row: FederalParamsRow = sqlx::query_as(
            "SELECT tax_year, ss_rate, medicare_rate, ss_wage_base,
                    addl_medicare_threshold, addl_medicare_rate, dependent_credit
             FROM federal_params WHERE tax_year = ?",
        )
        .bind(tax_year)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn upsert_federal_params(
        &self,
        params: &FederalTaxParams,
    ) -> Result<(), RepositoryError> {
        params.validate()?;
        self.open_for_writes(params.tax_year).await?;

        sqlx::query(
            "INSERT INTO federal_params (
                tax_year, ss_rate, medicare_rate, ss_wage_base,
                addl_medicare_threshold, addl_medicare_rate, dependent_credit
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (tax_year) DO UPDATE SET
                ss_rate = excluded.ss_rate,
                medicare_rate = excluded.medicare_rate,
                ss_wage_base = excluded.ss_wage_base,
                addl_medicare_threshold = excluded.addl_medicare_threshold,
                addl_medicare_rate = excluded.addl_medicare_rate,
                dependent_credit = excluded.dependent_credit",
        )
        .bind(params.tax_year)
        .bind(params.ss_rate.to_string())
        .bind(params.medicare_rate.to_string())
        .bind(params.ss_wage_base.to_string())
        .bind(params.addl_medicare_threshold.to_string())
        .bind(params.addl_medicare_rate.to_string())
        .bind(params.dependent_credit.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(tax_year = params.tax_year, "stored federal parameters");
        Ok(())
    }

    async fn get_state_params(
        &self,
        tax_year: TaxYear,
        state: &str,
    ) -> Result<StateTaxParams, RepositoryError> {
        let code = state.trim().to_ascii_uppercase();
        let row: StateParamsRow = sqlx::query_as(
            "SELECT tax_year, state, method, flat_rate, standard_deduction
             FROM state_params WHERE tax_year = ? AND state = ?",
        )
        .bind(tax_year)
        .bind(&code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?
        .ok_or(RepositoryError::NotFound)?;

        let brackets = self
            .state_brackets(tax_year)
            .await?
            .remove(&code)
            .unwrap_or_default();
        row.into_params(brackets)
    }

    async fn list_state_params(
        &self,
        tax_year: TaxYear,
    ) -> Result<Vec<StateTaxParams>, RepositoryError> {
        let rows: Vec<StateParamsRow> = sqlx::query_as(
            "SELECT tax_year, state, method, flat_rate, standard_deduction
             FROM state_params WHERE tax_year = ?
             ORDER BY state",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut brackets = self.state_brackets(tax_year).await?;
        rows.into_iter()
            .map(|row| {
                let rows = brackets.remove(&row.state).unwrap_or_default();
                row.into_params(rows)
            })
            .collect()
    }

    async fn upsert_state_params(&self, params: &StateTaxParams) -> Result<(), RepositoryError> {
        let code = params.state.trim().to_ascii_uppercase();
        params.validate()?;
        self.open_for_writes(params.tax_year).await?;

        let (method, flat_rate, brackets) = state_method_parts(&params.method);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM state_brackets WHERE tax_year = ? AND state = ?")
            .bind(params.tax_year)
            .bind(&code)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        sqlx::query(
            "INSERT INTO state_params (tax_year, state, method, flat_rate, standard_deduction)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (tax_year, state) DO UPDATE SET
                method = excluded.method,
                flat_rate = excluded.flat_rate,
                standard_deduction = excluded.standard_deduction",
        )
        .bind(params.tax_year)
        .bind(&code)
        .bind(method)
        .bind(flat_rate)
        .bind(params.standard_deduction.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        for (seq, row) in brackets.iter().enumerate() {
            sqlx::query(
                "INSERT INTO state_brackets (tax_year, state, over, rate, base_tax, seq)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(params.tax_year)
            .bind(&code)
            .bind(row.over.to_string())
            .bind(row.rate.to_string())
            .bind(row.base_tax.to_string())
            .bind(seq as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(
            tax_year = params.tax_year,
            state = %code,
            method,
            brackets = brackets.len(),
            "stored state parameters"
        );
        Ok(())
    }

    async fn get_withholding_table(
        &self,
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    ) -> Result<WithholdingTable, RepositoryError> {
        let rows: Vec<WithholdingDbRow> = sqlx::query_as(
            "SELECT filing_status, pay_frequency, over, base_tax, pct
             FROM withholding_brackets
             WHERE tax_year = ? AND filing_status = ? AND pay_frequency = ?
             ORDER BY seq",
        )
        .bind(tax_year)
        .bind(filing_status.as_str())
        .bind(pay_frequency.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        if rows.is_empty() {
            return Err(RepositoryError::NotFound);
        }

        Ok(WithholdingTable {
            tax_year,
            filing_status,
            pay_frequency,
            rows: rows
                .into_iter()
                .map(|r| r.try_into())
                .collect::<Result<_, _>>()?,
        })
    }

    async fn list_withholding_tables(
        &self,
        tax_year: TaxYear,
    ) -> Result<Vec<WithholdingTable>, RepositoryError> {
        let rows: Vec<WithholdingDbRow> = sqlx::query_as(
            "SELECT filing_status, pay_frequency, over, base_tax, pct
             FROM withholding_brackets
             WHERE tax_year = ?
             ORDER BY filing_status, pay_frequency, seq",
        )
        .bind(tax_year)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut tables: BTreeMap<(FilingStatus, PayFrequency), Vec<WithholdingBracketRow>> =
            BTreeMap::new();
        for row in rows {
            let key = row.key()?;
            tables.entry(key).or_default().push(row.try_into()?);
        }

        Ok(tables
            .into_iter()
            .map(|((filing_status, pay_frequency), rows)| WithholdingTable {
                tax_year,
                filing_status,
                pay_frequency,
                rows,
            })
            .collect())
    }

    async fn insert_withholding_row(
        &self,
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
        row: &WithholdingBracketRow,
    ) -> Result<(), RepositoryError> {
        self.open_for_writes(tax_year).await?;

        sqlx::query(
            "INSERT INTO withholding_brackets (
                tax_year, filing_status, pay_frequency, over, base_tax, pct, seq
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, COALESCE(MAX(seq) + 1, 0)
            FROM withholding_brackets
            WHERE tax_year = ?1 AND filing_status = ?2 AND pay_frequency = ?3",
        )
        .bind(tax_year)
        .bind(filing_status.as_str())
        .bind(pay_frequency.as_str())
        .bind(row.over.to_string())
        .bind(row.base_tax.to_string())
        .bind(row.pct.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_withholding_rows(
        &self,
        tax_year: TaxYear,
        filing_status: FilingStatus,
        pay_frequency: PayFrequency,
    ) -> Result<(), RepositoryError> {
        self.check_not_published(tax_year).await?;

        let result = sqlx::query(
            "DELETE FROM withholding_brackets
             WHERE tax_year = ? AND filing_status = ? AND pay_frequency = ?",
        )
        .bind(tax_year)
        .bind(filing_status.as_str())
        .bind(pay_frequency.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        debug!(
            tax_year,
            %filing_status,
            %pay_frequency,
            deleted = result.rows_affected(),
            "cleared withholding rows"
        );
        Ok(())
    }

    async fn list_billing_models(&self) -> Result<Vec<BillingModel>, RepositoryError> {
        let rows: Vec<BillingModelRow> = sqlx::query_as(
            "SELECT name, employee_rate, employer_rate FROM billing_models ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }
}
