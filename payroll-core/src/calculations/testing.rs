//! 2025 parameter fixtures shared by the calculator tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::payroll_taxes::PayInput;
use crate::models::{
    FederalTaxParams, FilingStatus, PayFrequency, StateBracketRow, StateTaxMethod,
    StateTaxParams, TaxParameterSet, WithholdingBracketRow, WithholdingTable, YearParameters,
};

pub(crate) fn federal_2025() -> FederalTaxParams {
    FederalTaxParams {
        tax_year: 2025,
        ss_rate: dec!(0.062),
        medicare_rate: dec!(0.0145),
        ss_wage_base: dec!(176100),
        addl_medicare_threshold: dec!(200000),
        addl_medicare_rate: dec!(0.009),
        dependent_credit: dec!(2000),
    }
}

fn rows(raw: &[(Decimal, Decimal, Decimal)]) -> Vec<WithholdingBracketRow> {
    raw.iter()
        .map(|&(over, base_tax, pct)| WithholdingBracketRow { over, base_tax, pct })
        .collect()
}

pub(crate) fn annual_rows(status: FilingStatus) -> Vec<WithholdingBracketRow> {
    match status {
        FilingStatus::Single => rows(&[
            (dec!(0), dec!(0), dec!(0)),
            (dec!(6400), dec!(0), dec!(0.10)),
            (dec!(18325), dec!(1192.50), dec!(0.12)),
            (dec!(54875), dec!(5578.50), dec!(0.22)),
            (dec!(109750), dec!(17651), dec!(0.24)),
            (dec!(203700), dec!(40199), dec!(0.32)),
            (dec!(256925), dec!(57231), dec!(0.35)),
            (dec!(632750), dec!(188769.75), dec!(0.37)),
        ]),
        FilingStatus::Married => rows(&[
            (dec!(0), dec!(0), dec!(0)),
            (dec!(17100), dec!(0), dec!(0.10)),
            (dec!(40950), dec!(2385), dec!(0.12)),
            (dec!(114050), dec!(11157), dec!(0.22)),
            (dec!(223800), dec!(35302), dec!(0.24)),
            (dec!(411700), dec!(80398), dec!(0.32)),
            (dec!(518150), dec!(114462), dec!(0.35)),
            (dec!(768700), dec!(202154.50), dec!(0.37)),
        ]),
        FilingStatus::Head => rows(&[
            (dec!(0), dec!(0), dec!(0)),
            (dec!(13900), dec!(0), dec!(0.10)),
            (dec!(30900), dec!(1700), dec!(0.12)),
            (dec!(78750), dec!(7442), dec!(0.22)),
            (dec!(117250), dec!(15912), dec!(0.24)),
            (dec!(211200), dec!(38460), dec!(0.32)),
            (dec!(264400), dec!(55484), dec!(0.35)),
            (dec!(640250), dec!(187031.50), dec!(0.37)),
        ]),
    }
}

fn state(code: &str, method: StateTaxMethod, standard_deduction: Decimal) -> StateTaxParams {
    StateTaxParams {
        tax_year: 2025,
        state: code.to_string(),
        method,
        standard_deduction,
    }
}

/// Federal parameters, every withholding table, and three states:
/// TX (none), IL (flat) and VA (brackets).
pub(crate) fn year_2025() -> YearParameters {
    let mut year = YearParameters::new(2025)
        .with_federal(federal_2025())
        .unwrap()
        .with_state(state("TX", StateTaxMethod::None, dec!(0)))
        .unwrap()
        .with_state(state(
            "IL",
            StateTaxMethod::Flat { rate: dec!(0.0495) },
            dec!(2850),
        ))
        .unwrap()
        .with_state(state(
            "VA",
            StateTaxMethod::Brackets {
                rows: StateBracketRow::from_thresholds(&[
                    (dec!(0), dec!(0.02)),
                    (dec!(3000), dec!(0.03)),
                    (dec!(5000), dec!(0.05)),
                    (dec!(17000), dec!(0.0575)),
                ]),
            },
            dec!(8500),
        ))
        .unwrap();

    for status in FilingStatus::ALL {
        for frequency in PayFrequency::ALL {
            year = year
                .with_withholding_table(WithholdingTable::from_annual(
                    2025,
                    status,
                    frequency,
                    &annual_rows(status),
                ))
                .unwrap();
        }
    }
    year
}

pub(crate) fn parameters_2025() -> TaxParameterSet {
    let mut set = TaxParameterSet::new();
    set.publish(year_2025()).unwrap();
    set
}

pub(crate) fn pay_input(
    gross_per_pay: Decimal,
    pay_frequency: PayFrequency,
    state: &'static str,
) -> PayInput<'static> {
    PayInput {
        gross_per_pay,
        pay_frequency,
        filing_status: FilingStatus::Single,
        dependents: 0,
        state,
        pre_tax_deductions: &[],
    }
}
