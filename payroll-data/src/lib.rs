//! CSV ingest for percentage-method withholding tables.

mod loader;

pub use loader::{LoadSummary, WithholdingLoaderError, WithholdingRecord, WithholdingTableLoader};
