use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use deunicode::deunicode;

use crate::error::{MonetaError, Result};

/// Parse a locale-formatted amount: `,` or `.` decimal separator, optional
/// space or comma thousands separators. `"1 234,56"` and `"1234.56"` are the
/// same value.
pub fn parse_decimal(raw: &str) -> Result<f64> {
    let s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if !s.chars().any(|c| c.is_ascii_digit()) {
        return Err(MonetaError::Parse(format!("no digits in amount '{raw}'")));
    }

    let commas = s.matches(',').count();
    let dots = s.matches('.').count();
    let normalized = match (commas, dots) {
        (0, 0) | (0, 1) => s,
        (0, _) => s.replace('.', ""),
        (1, 0) => s.replace(',', "."),
        (_, 0) => s.replace(',', ""),
        // Both separators present: the one further right is the decimal point.
        _ => match (s.rfind(','), s.rfind('.')) {
            (Some(c), Some(d)) if c > d => s.replace('.', "").replace(',', "."),
            _ => s.replace(',', ""),
        },
    };

    normalized
        .parse::<f64>()
        .map_err(|_| MonetaError::Parse(format!("malformed amount '{raw}'")))
}

/// Fixed date formats used by the bank exports. Each adapter picks its
/// formats explicitly; nothing is auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    DayDotMonthYear,
    DayDotMonthYearTime,
    DaySlashMonthYear,
    DaySlashMonthYearTime,
    IsoDateTime,
}

impl DateFormat {
    fn pattern(self) -> &'static str {
        match self {
            Self::DayDotMonthYear => "%d.%m.%Y",
            Self::DayDotMonthYearTime => "%d.%m.%Y %H:%M",
            Self::DaySlashMonthYear => "%d/%m/%Y",
            Self::DaySlashMonthYearTime => "%d/%m/%Y %H:%M:%S",
            Self::IsoDateTime => "%Y-%m-%d %H:%M:%S",
        }
    }

    fn has_time(self) -> bool {
        matches!(
            self,
            Self::DayDotMonthYearTime | Self::DaySlashMonthYearTime | Self::IsoDateTime
        )
    }
}

pub fn parse_datetime(raw: &str, format: DateFormat) -> Result<NaiveDateTime> {
    let raw = raw.trim();
    let parsed = if format.has_time() {
        NaiveDateTime::parse_from_str(raw, format.pattern())
    } else {
        NaiveDate::parse_from_str(raw, format.pattern()).map(|d| d.and_time(NaiveTime::MIN))
    };
    parsed.map_err(|_| {
        MonetaError::Parse(format!("'{raw}' does not match format '{}'", format.pattern()))
    })
}

/// Lowercase and fold diacritics. Applied to narrative and counterparty
/// fields; callers map over `Option` so absent stays absent.
pub fn normalize(text: &str) -> String {
    deunicode(&text.to_lowercase())
}
