use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::common::max;
use crate::models::{ProfitShareConfig, ProfitShareMode};

/// A profit-share credit. `credit` is a positive magnitude; invoicing
/// presents it as a negative line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitShareCredit {
    pub credit: Decimal,
    pub description: String,
}

/// Checks that a profit-share percentage is a fraction in `[0, 1]`.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidInput`] otherwise.
pub fn validate_profit_share(config: &ProfitShareConfig) -> Result<(), CalculationError> {
    if config.percent < Decimal::ZERO || config.percent > Decimal::ONE {
        return Err(CalculationError::invalid(
            "profit_share_percent",
            format!("must be a fraction between 0 and 1, got {}", config.percent),
        ));
    }
    Ok(())
}

/// Converts employer FICA savings or provider profit into a credit.
///
/// A zero percentage or a base at or below zero gives a zero credit.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidInput`] for a percentage outside
/// `[0, 1]`.
pub fn compute_profit_share(
    mode: ProfitShareMode,
    percent: Decimal,
    employer_fica_savings_monthly: Decimal,
    bb_profit_monthly: Decimal,
) -> Result<ProfitShareCredit, CalculationError> {
    validate_profit_share(&ProfitShareConfig { mode, percent })?;

    let shown = (percent * Decimal::ONE_HUNDRED).normalize();
    let (base, description) = match mode {
        ProfitShareMode::None => (Decimal::ZERO, "No profit share".to_string()),
        ProfitShareMode::PercentErSavings => (
            employer_fica_savings_monthly,
            format!("Profit share: {shown}% of employer FICA savings"),
        ),
        ProfitShareMode::PercentBbProfit => (
            bb_profit_monthly,
            format!("Profit share: {shown}% of provider profit"),
        ),
    };

    Ok(ProfitShareCredit {
        credit: percent * max(Decimal::ZERO, base),
        description,
    })
}
