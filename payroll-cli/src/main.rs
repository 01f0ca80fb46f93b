use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use payroll_cli::config::PreviewConfig;
use payroll_cli::{app, logging, report};
use payroll_core::db::DbConfig;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Section 125 proposal preview.
///
/// Reads a company scenario from TOML, loads tax parameters for its tax year
/// from the configured store, and prints a model comparison plus a
/// per-employee breakdown.
#[derive(Debug, Parser)]
#[command(name = "payroll-preview", version)]
struct Cli {
    /// Scenario file (company settings and employees).
    #[arg(long)]
    config: PathBuf,

    /// Parameter store backend to use.
    #[arg(long, default_value = "sqlite")]
    backend: String,

    /// Parameter store connection string.
    /// For SQLite this is a file path (e.g. `payroll.db`) or `:memory:`.
    #[arg(long, default_value = "payroll.db")]
    db: String,

    /// Billing model to compare. Repeat to compare several; overrides the
    /// scenario's list.
    #[arg(long = "model")]
    models: Vec<String>,

    /// Log filter, e.g. `debug` or `payroll_core=debug`. Defaults to
    /// `RUST_LOG`, then `info`.
    #[arg(long)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_logging();
    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let config = PreviewConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load scenario: {}", cli.config.display()))?;
    let models = config.candidate_models(&cli.models);

    let db_config = DbConfig {
        backend: cli.backend,
        connection_string: cli.db,
    };

    debug!("connecting to {} backend", db_config.backend);
    let registry = app::build_registry();
    let repo = registry
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open {} store", db_config.backend))?;

    let preview = app::preview(repo.as_ref(), &config, &models).await?;
    print!("{}", report::render(&preview));

    Ok(())
}
