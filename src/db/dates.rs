//! Optional date-range parameters turned into SQL-ready literals.
//!
//! A missing bound falls back to an opaque SQL expression (for example
//! `CURRENT_DATE - INTERVAL '6 months'`) plus a concrete date computed
//! locally, so the range can be checked before any query is built.

use chrono::{Datelike, Local, Months, NaiveDate};
use thiserror::Error;

use crate::models::ISO_DATE_REGEX;

pub const START_PARAM: &str = "start_date";
pub const END_PARAM: &str = "end_date";

const ISO_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateRangeError {
    #[error("A {param} '{value}' não está no formato válido 'YYYY-MM-DD'.")]
    InvalidFormat { param: &'static str, value: String },

    #[error("A data de início não pode ser maior que a data de fim.")]
    InvertedRange,

    #[error("Não foi possível calcular o valor padrão de {param}: {reason}")]
    InvalidDefault { param: &'static str, reason: String },
}

/// Fallbacks used when a bound is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateDefaults {
    pub start_sql: &'static str,
    pub end_sql: &'static str,
    pub start_offset_months: u32,
    pub end_offset_months: u32,
    pub start_day: Option<u32>,
    pub end_day: Option<u32>,
}

impl DateDefaults {
    /// Start `start_offset_months` before today, end today.
    pub const fn new(start_sql: &'static str, end_sql: &'static str, start_offset_months: u32) -> Self {
        Self {
            start_sql,
            end_sql,
            start_offset_months,
            end_offset_months: 0,
            start_day: None,
            end_day: None,
        }
    }

    pub const fn start_day(mut self, day: u32) -> Self {
        self.start_day = Some(day);
        self
    }

    pub const fn end_day(mut self, day: u32) -> Self {
        self.end_day = Some(day);
        self
    }

    pub const fn end_offset_months(mut self, months: u32) -> Self {
        self.end_offset_months = months;
        self
    }
}

/// Resolved bounds: literals to splice into SQL and comparable ISO strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDates {
    pub start_sql: String,
    pub end_sql: String,
    pub start_test: String,
    pub end_test: String,
}

/// Resolve optional bounds against today's local date.
pub fn prepare_dates(
    start: Option<&str>,
    end: Option<&str>,
    defaults: &DateDefaults,
) -> Result<PreparedDates, DateRangeError> {
    prepare_dates_on(Local::now().date_naive(), start, end, defaults)
}

/// Resolve optional bounds against an explicit `today`.
pub fn prepare_dates_on(
    today: NaiveDate,
    start: Option<&str>,
    end: Option<&str>,
    defaults: &DateDefaults,
) -> Result<PreparedDates, DateRangeError> {
    let (start_sql, start_test) = resolve_bound(
        START_PARAM,
        start,
        defaults.start_sql,
        today,
        defaults.start_offset_months,
        defaults.start_day,
    )?;
    let (end_sql, end_test) = resolve_bound(
        END_PARAM,
        end,
        defaults.end_sql,
        today,
        defaults.end_offset_months,
        defaults.end_day,
    )?;

    let start_date = parse_iso_date(START_PARAM, &start_test)?;
    let end_date = parse_iso_date(END_PARAM, &end_test)?;
    if start_date > end_date {
        return Err(DateRangeError::InvertedRange);
    }

    Ok(PreparedDates {
        start_sql,
        end_sql,
        start_test,
        end_test,
    })
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_iso_date(param: &'static str, value: &str) -> Result<NaiveDate, DateRangeError> {
    let invalid = || DateRangeError::InvalidFormat {
        param,
        value: value.to_string(),
    };
    if !ISO_DATE_REGEX.is_match(value) {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(value, ISO_FORMAT).map_err(|_| invalid())
}

fn resolve_bound(
    param: &'static str,
    supplied: Option<&str>,
    default_sql: &str,
    today: NaiveDate,
    offset_months: u32,
    day: Option<u32>,
) -> Result<(String, String), DateRangeError> {
    match supplied {
        // Validated before quoting: only digits and dashes reach the SQL text.
        Some(value) => {
            parse_iso_date(param, value)?;
            Ok((format!("'{value}'"), value.to_string()))
        }
        None => {
            let date = default_date(today, offset_months, day).map_err(|reason| {
                DateRangeError::InvalidDefault { param, reason }
            })?;
            Ok((default_sql.to_string(), date.format(ISO_FORMAT).to_string()))
        }
    }
}

/// `today` minus `offset_months` (clamped to month end), then the day override.
fn default_date(today: NaiveDate, offset_months: u32, day: Option<u32>) -> Result<NaiveDate, String> {
    let shifted = today
        .checked_sub_months(Months::new(offset_months))
        .ok_or_else(|| format!("{offset_months} months before {today} is out of range"))?;

    match day {
        Some(day) => shifted
            .with_day(day)
            .ok_or_else(|| format!("day {day} does not exist in {}", shifted.format("%Y-%m"))),
        None => Ok(shifted),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const SIX_MONTHS: DateDefaults = DateDefaults::new(
        "CURRENT_DATE - INTERVAL '6 months'",
        "CURRENT_DATE",
        6,
    );

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, ISO_FORMAT).unwrap()
    }

    #[rstest]
    #[case("2024-01-01", "2024-12-31")]
    #[case("2024-06-15", "2024-06-15")]
    #[case("1999-12-31", "2000-01-01")]
    fn test_supplied_dates_are_quoted_verbatim(#[case] start: &str, #[case] end: &str) {
        let prepared =
            prepare_dates_on(date("2025-03-10"), Some(start), Some(end), &SIX_MONTHS).unwrap();

        assert_eq!(prepared.start_sql, format!("'{start}'"));
        assert_eq!(prepared.end_sql, format!("'{end}'"));
        assert_eq!(prepared.start_test, start);
        assert_eq!(prepared.end_test, end);
        assert!(prepared.start_test <= prepared.end_test);
    }

    #[rstest]
    #[case("2024-12-31", "2024-01-01")]
    #[case("2024-01-02", "2024-01-01")]
    fn test_inverted_range_rejected(#[case] start: &str, #[case] end: &str) {
        let err = prepare_dates_on(date("2025-03-10"), Some(start), Some(end), &SIX_MONTHS)
            .unwrap_err();
        assert_eq!(err, DateRangeError::InvertedRange);
        assert_eq!(
            err.to_string(),
            "A data de início não pode ser maior que a data de fim."
        );
    }

    #[rstest]
    #[case(Some("15-06-2024"), None, START_PARAM)]
    #[case(Some("2024-01-32"), None, START_PARAM)]
    #[case(None, Some("2024/12/31"), END_PARAM)]
    #[case(Some("2024-01-01"), Some("2024-02-30"), END_PARAM)]
    #[case(Some("2024-01-01' OR '1'='1"), None, START_PARAM)]
    fn test_malformed_date_names_parameter(
        #[case] start: Option<&str>,
        #[case] end: Option<&str>,
        #[case] param: &str,
    ) {
        let err = prepare_dates_on(date("2025-03-10"), start, end, &SIX_MONTHS).unwrap_err();
        match &err {
            DateRangeError::InvalidFormat { param: p, .. } => assert_eq!(*p, param),
            other => panic!("expected format error, got {other:?}"),
        }
        assert!(err.to_string().contains(param));
        assert!(err.to_string().contains("'YYYY-MM-DD'"));
    }

    #[test]
    fn test_format_error_message() {
        let err = parse_iso_date(START_PARAM, "15-06-2024").unwrap_err();
        assert_eq!(
            err.to_string(),
            "A start_date '15-06-2024' não está no formato válido 'YYYY-MM-DD'."
        );
    }

    #[test]
    fn test_omitted_bounds_use_default_expressions() {
        let prepared = prepare_dates_on(date("2025-03-10"), None, None, &SIX_MONTHS).unwrap();

        assert_eq!(prepared.start_sql, "CURRENT_DATE - INTERVAL '6 months'");
        assert_eq!(prepared.end_sql, "CURRENT_DATE");
        assert_eq!(prepared.start_test, "2024-09-10");
        assert_eq!(prepared.end_test, "2025-03-10");
    }

    #[test]
    fn test_default_start_day_override() {
        let defaults = SIX_MONTHS.start_day(1);
        let prepared = prepare_dates_on(date("2025-03-10"), None, None, &defaults).unwrap();
        assert_eq!(prepared.start_test, "2024-09-01");
    }

    #[test]
    fn test_zero_offset_still_applies_day_override() {
        let defaults = DateDefaults::new("CURRENT_DATE", "CURRENT_DATE", 0)
            .start_day(1)
            .end_day(5);
        let prepared = prepare_dates_on(date("2025-03-10"), None, None, &defaults).unwrap();
        assert_eq!(prepared.start_test, "2025-03-01");
        assert_eq!(prepared.end_test, "2025-03-05");
    }

    #[test]
    fn test_month_offset_clamps_to_month_end() {
        let prepared = prepare_dates_on(date("2025-08-31"), None, None, &SIX_MONTHS).unwrap();
        assert_eq!(prepared.start_test, "2025-02-28");
    }

    #[test]
    fn test_invalid_default_day() {
        let defaults = SIX_MONTHS.start_day(31);
        // 2025-03-10 minus six months is September, which has 30 days
        let err = prepare_dates_on(date("2025-03-10"), None, None, &defaults).unwrap_err();
        assert!(matches!(
            err,
            DateRangeError::InvalidDefault {
                param: START_PARAM,
                ..
            }
        ));
    }

    #[test]
    fn test_supplied_start_after_default_end_rejected() {
        let err =
            prepare_dates_on(date("2025-03-10"), Some("2025-04-01"), None, &SIX_MONTHS).unwrap_err();
        assert_eq!(err, DateRangeError::InvertedRange);
    }

    #[test]
    fn test_mixed_supplied_and_default() {
        let prepared =
            prepare_dates_on(date("2025-03-10"), Some("2025-01-15"), None, &SIX_MONTHS).unwrap();
        assert_eq!(prepared.start_sql, "'2025-01-15'");
        assert_eq!(prepared.end_sql, "CURRENT_DATE");
        assert_eq!(prepared.end_test, "2025-03-10");
    }
}
