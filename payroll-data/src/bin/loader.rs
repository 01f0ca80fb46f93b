use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use payroll_core::ParameterRepository;
use payroll_data::WithholdingTableLoader;
use payroll_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load percentage-method withholding tables from a CSV file into the
/// parameter store.
///
/// The CSV file should have the following columns:
/// - tax_year: The tax year (e.g., 2025)
/// - filing_status: single, married or head
/// - pay_frequency: weekly, biweekly, semimonthly, monthly, or annual to
///   derive all four from an annual table
/// - over: Wage amount the row starts at
/// - base_tax: Tax owed at exactly `over`
/// - pct: The marginal rate as a decimal (e.g., 0.12)
#[derive(Parser, Debug)]
#[command(name = "payroll-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing withholding rows
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// SQLite database URL or path (created if missing)
    #[arg(short, long, default_value = "payroll.db")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,

    /// Mark this tax year as published once loading succeeds
    #[arg(short, long)]
    publish: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.file.is_none() && args.publish.is_none() && !args.migrate && args.seeds.is_none() {
        bail!("nothing to do: pass --file, --publish, --migrate or --seeds");
    }

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    if let Some(path) = &args.file {
        println!("Loading withholding tables from: {}", path.display());

        let file =
            File::open(path).with_context(|| format!("Failed to open: {}", path.display()))?;

        let records = WithholdingTableLoader::parse(file)
            .with_context(|| format!("Failed to parse CSV: {}", path.display()))?;

        println!("Parsed {} records from CSV", records.len());

        let summary = WithholdingTableLoader::load(&repo, &records)
            .await
            .context("Failed to load withholding tables into database")?;

        println!(
            "Successfully loaded {} tables ({} rows) into the database.",
            summary.tables, summary.rows
        );
    }

    if let Some(year) = args.publish {
        repo.publish_tax_year(year)
            .await
            .with_context(|| format!("Failed to publish tax year {}", year))?;
        let at = repo
            .published_at(year)
            .await
            .with_context(|| format!("Failed to read publication time for {}", year))?;
        match at {
            Some(at) => println!("Tax year {} published at {}.", year, at),
            None => println!("Tax year {} published.", year),
        }
    }

    Ok(())
}
