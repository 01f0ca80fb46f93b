use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::withholding::{BracketRow, BracketTableError, check_bracket_rows};
use super::{ParameterError, TaxYear};

/// One row of a state bracket schedule, normalised to the percentage-method
/// shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateBracketRow {
    pub over: Decimal,
    pub rate: Decimal,
    pub base_tax: Decimal,
}

impl BracketRow for StateBracketRow {
    fn over(&self) -> Decimal {
        self.over
    }

    fn base_tax(&self) -> Decimal {
        self.base_tax
    }

    fn rate(&self) -> Decimal {
        self.rate
    }
}

impl StateBracketRow {
    /// Builds rows from `{over, rate}` pairs, accumulating the base tax.
    ///
    /// Pairs must already be sorted ascending by threshold.
    pub fn from_thresholds(pairs: &[(Decimal, Decimal)]) -> Vec<Self> {
        let mut rows: Vec<Self> = Vec::with_capacity(pairs.len());
        for &(over, rate) in pairs {
            let base_tax = rows
                .last()
                .map(|prev| prev.base_tax + prev.rate * (over - prev.over))
                .unwrap_or(Decimal::ZERO);
            rows.push(Self {
                over,
                rate,
                base_tax,
            });
        }
        rows
    }

    /// Builds rows from `{max, rate, base}` triples where each row ends at
    /// `max` (`None` for the open-ended top row) and starts where the
    /// previous row ended.
    pub fn from_upper_bounds(triples: &[(Option<Decimal>, Decimal, Decimal)]) -> Vec<Self> {
        let mut over = Decimal::ZERO;
        let mut rows = Vec::with_capacity(triples.len());
        for &(max, rate, base_tax) in triples {
            rows.push(Self {
                over,
                rate,
                base_tax,
            });
            if let Some(max) = max {
                over = max;
            }
        }
        rows
    }
}

/// How a state withholds income tax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum StateTaxMethod {
    None,
    Flat { rate: Decimal },
    Brackets { rows: Vec<StateBracketRow> },
    /// A method name the engine does not recognise. Withholds nothing.
    Unsupported { name: String },
}

impl StateTaxMethod {
    pub fn name(&self) -> &str {
        match self {
            Self::None => "none",
            Self::Flat { .. } => "flat",
            Self::Brackets { .. } => "brackets",
            Self::Unsupported { name } => name,
        }
    }
}

/// State withholding parameters for one state and tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTaxParams {
    pub tax_year: TaxYear,
    /// Two-letter postal code, upper case.
    pub state: String,
    pub method: StateTaxMethod,
    /// Annual standard deduction. Subtracted by the caller before the
    /// schedule is applied.
    pub standard_deduction: Decimal,
}

impl StateTaxParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.standard_deduction < Decimal::ZERO {
            return Err(ParameterError::NegativeAmount {
                field: "standard_deduction",
                value: self.standard_deduction,
            });
        }

        match &self.method {
            StateTaxMethod::Flat { rate } if *rate < Decimal::ZERO || *rate >= Decimal::ONE => {
                Err(ParameterError::InvalidRate {
                    field: "flat_rate",
                    value: *rate,
                })
            }
            StateTaxMethod::Brackets { rows } => {
                check_bracket_rows(rows).map_err(|source| ParameterError::InvalidStateBrackets {
                    state: self.state.clone(),
                    source,
                })?;
                match rows.first() {
                    Some(first) if first.over != Decimal::ZERO => {
                        Err(ParameterError::InvalidStateBrackets {
                            state: self.state.clone(),
                            source: BracketTableError::DoesNotStartAtZero(first.over),
                        })
                    }
                    _ => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}
