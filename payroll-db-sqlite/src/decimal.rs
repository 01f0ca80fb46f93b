use chrono::{DateTime, Utc};
use payroll_core::RepositoryError;
use rust_decimal::Decimal;

/// Parses a decimal stored as TEXT.
pub(crate) fn parse_decimal(s: &str) -> Result<Decimal, RepositoryError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| RepositoryError::InvalidData(format!("Failed to parse decimal '{}': {}", s, e)))
}

pub(crate) fn parse_optional_decimal(s: &Option<String>) -> Result<Option<Decimal>, RepositoryError> {
    s.as_ref().map(|s| parse_decimal(s)).transpose()
}

/// Formats a timestamp the way the store writes them.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Parses a stored timestamp. SQLite hands back several textual forms.
pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| RepositoryError::InvalidData(format!("Failed to parse datetime '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn parse_decimal_keeps_full_precision() {
        assert_eq!(parse_decimal("0.0145"), Ok(dec!(0.0145)));
        assert_eq!(parse_decimal("176100"), Ok(dec!(176100)));
        assert_eq!(parse_decimal(" 123.0769230769 "), Ok(dec!(123.0769230769)));
    }

    #[test]
    fn parse_decimal_rejects_garbage() {
        let result = parse_decimal("six percent");

        assert!(matches!(
            result,
            Err(RepositoryError::InvalidData(msg)) if msg.starts_with("Failed to parse decimal 'six percent'")
        ));
    }

    #[test]
    fn parse_optional_decimal_passes_none_through() {
        assert_eq!(parse_optional_decimal(&None), Ok(None));
        assert_eq!(
            parse_optional_decimal(&Some("0.0495".to_string())),
            Ok(Some(dec!(0.0495)))
        );
    }

    #[test]
    fn timestamps_survive_the_store_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let stored = format_timestamp(at);

        assert_eq!(stored, "2025-01-02 03:04:05");
        assert_eq!(parse_timestamp(&stored), Ok(at));
    }

    #[test]
    fn parse_timestamp_accepts_iso_separator() {
        let at = Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 0).unwrap();

        assert_eq!(parse_timestamp("2025-06-30T23:59:00"), Ok(at));
    }

    #[test]
    fn parse_timestamp_rejects_dates_only() {
        assert!(matches!(
            parse_timestamp("2025-06-30"),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
