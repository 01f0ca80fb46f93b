use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named employee/employer fee-rate pair applied to monthly pre-tax volume.
///
/// The name is an opaque key ("5/3", "4/4", ...). It is never parsed for
/// its rates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingModel {
    pub name: String,
    pub employee_rate: Decimal,
    pub employer_rate: Decimal,
}

impl BillingModel {
    pub fn new(name: impl Into<String>, employee_rate: Decimal, employer_rate: Decimal) -> Self {
        Self {
            name: name.into(),
            employee_rate,
            employer_rate,
        }
    }

    /// Human-readable rate description, e.g. `"Employer 5% / Employee 3%"`.
    pub fn fees_label(&self) -> String {
        format!(
            "Employer {}% / Employee {}%",
            as_percent(self.employer_rate),
            as_percent(self.employee_rate)
        )
    }
}

fn as_percent(rate: Decimal) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).normalize()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn fees_label_prints_whole_percentages() {
        let model = BillingModel::new("5/3", dec!(0.03), dec!(0.05));

        assert_eq!(model.fees_label(), "Employer 5% / Employee 3%");
    }

    #[test]
    fn fees_label_keeps_fractional_percentages() {
        let model = BillingModel::new("3.5/0", dec!(0), dec!(0.035));

        assert_eq!(model.fees_label(), "Employer 3.5% / Employee 0%");
    }
}
