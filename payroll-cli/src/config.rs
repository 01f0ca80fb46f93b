//! TOML scenario for a proposal preview.
//!
//! ```toml
//! models = ["5/3", "4/4"]
//!
//! [company]
//! company = "Acme Fabrication"
//! tax_year = 2025
//! model = "5/3"
//! safety_cap_percent = "30"
//!
//! [company.profit_share]
//! mode = "percent_er_savings"
//! percent = "0.5"
//!
//! [[employees]]
//! employee_id = "E-001"
//! gross_per_pay = "2000"
//! pay_frequency = "biweekly"
//! filing_status = "single"
//! state = "IL"
//! ```

use std::collections::HashSet;
use std::path::Path;

use payroll_core::EmployeeRecord;
use payroll_core::billing::CompanyBillingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub company: CompanyBillingConfig,
    /// Models to compare. Empty means the company's own model only.
    #[serde(default)]
    pub models: Vec<String>,
    pub employees: Vec<EmployeeRecord>,
}

impl PreviewConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Models to run, in order. `overrides` wins when non-empty.
    pub fn candidate_models(&self, overrides: &[String]) -> Vec<String> {
        if !overrides.is_empty() {
            overrides.to_vec()
        } else if !self.models.is_empty() {
            self.models.clone()
        } else {
            vec![self.company.model.clone()]
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.employees.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[employees]] entry is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for employee in &self.employees {
            if !seen.insert(employee.employee_id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate employee_id '{}'",
                    employee.employee_id
                )));
            }
        }
        Ok(())
    }
}
