use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which base amount a company's profit-share percentage applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitShareMode {
    #[default]
    None,
    /// Share of the employer's monthly FICA savings.
    PercentErSavings,
    /// Share of the provider's monthly profit on the account.
    PercentBbProfit,
}

impl ProfitShareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PercentErSavings => "percent_er_savings",
            Self::PercentBbProfit => "percent_bb_profit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "percent_er_savings" => Some(Self::PercentErSavings),
            "percent_bb_profit" => Some(Self::PercentBbProfit),
            _ => None,
        }
    }
}

/// Per-company profit-share setting. `percent` is a fraction (0.5 = 50%).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitShareConfig {
    pub mode: ProfitShareMode,
    pub percent: Decimal,
}
