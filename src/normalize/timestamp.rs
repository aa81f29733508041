//! Heterogeneous timestamp parsing.
//!
//! Device feeds and spreadsheet exports encode time in many ways. Every cell is
//! mapped onto epoch milliseconds (UTC) or rejected with `None`; parsing never
//! fails loudly because a bad cell only drops that row.
//!
//! Rules, tried in order:
//! 1. empty -> `None`
//! 2. `HH:MM[:SS]` -> that time of day on 1970-01-01 UTC
//! 3. a date string (ISO 8601 / RFC 3339 / RFC 2822 / common spreadsheet forms
//!    including 12-hour clocks and month names),
//!    retried with the first space replaced by `T`
//! 4. a plain non-negative number:
//!    - `>= 1e13` epoch milliseconds
//!    - `>= 1e9` epoch seconds
//!    - `(0, 1)` fraction of a day after 1970-01-01 (time-only exports)
//!    - `(20000, 60000)` spreadsheet serial days after 1899-12-30
//!
//! The numeric thresholds are compatibility contracts with spreadsheet exports.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::domain::{MS_PER_DAY, RawValue};

/// Values at or above this are already milliseconds.
pub const EPOCH_MS_THRESHOLD: f64 = 1e13;
/// Values at or above this (and below the ms threshold) are seconds.
pub const EPOCH_S_THRESHOLD: f64 = 1e9;
/// Exclusive bounds for spreadsheet date serials.
pub const SERIAL_MIN: f64 = 20_000.0;
pub const SERIAL_MAX: f64 = 60_000.0;
/// 1899-12-30T00:00:00Z in epoch milliseconds.
pub const SPREADSHEET_EPOCH_MS: i64 = -2_209_161_600_000;

/// Largest representable instant magnitude (±100 000 000 days).
const MAX_ABS_MS: f64 = 8.64e15;

static TIME_OF_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?$").expect("static regex"));

static PLAIN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("static regex"));

const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"];

const NAIVE_DATETIME_FORMATS: [&str; 15] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    // 12-hour spreadsheet exports
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y/%m/%d %I:%M:%S %p",
    // month names
    "%b %d, %Y %H:%M:%S",
    "%b %d %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%b %d, %Y %I:%M:%S %p",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse one raw cell into epoch milliseconds.
pub fn parse_timestamp_ms(value: &RawValue) -> Option<i64> {
    match value {
        RawValue::Empty | RawValue::Bool(_) => None,
        RawValue::DateTime(dt) => Some(dt.timestamp_millis()),
        RawValue::Number(n) => numeric_timestamp_ms(*n),
        RawValue::Text(s) => parse_timestamp_str(s),
    }
}

/// Parse a textual cell into epoch milliseconds.
pub fn parse_timestamp_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = TIME_OF_DAY.captures(s) {
        let hh: i64 = caps[1].parse().ok()?;
        let mm: i64 = caps[2].parse().ok()?;
        let ss: i64 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
        return Some(((hh * 60 + mm) * 60 + ss) * 1000);
    }

    if let Some(ms) = parse_date_string(s) {
        return Some(ms);
    }
    if s.contains(' ') {
        if let Some(ms) = parse_date_string(&s.replacen(' ', "T", 1)) {
            return Some(ms);
        }
    }

    if PLAIN_NUMBER.is_match(s) {
        return numeric_timestamp_ms(s.parse().ok()?);
    }

    None
}

/// Interpret a bare number using the epoch / serial thresholds.
pub fn numeric_timestamp_ms(n: f64) -> Option<i64> {
    if !n.is_finite() {
        return None;
    }

    let ms = if n >= EPOCH_MS_THRESHOLD {
        n
    } else if n >= EPOCH_S_THRESHOLD {
        n * 1000.0
    } else if n > 0.0 && n < 1.0 {
        n * MS_PER_DAY
    } else if n > SERIAL_MIN && n < SERIAL_MAX {
        SPREADSHEET_EPOCH_MS as f64 + n * MS_PER_DAY
    } else {
        return None;
    };

    if ms.abs() > MAX_ABS_MS {
        return None;
    }
    Some(ms.trunc() as i64)
}

/// Date-string parse. Strings without an offset are read as UTC.
fn parse_date_string(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.timestamp_millis());
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn empty_cells_are_rejected() {
        assert_eq!(parse_timestamp_ms(&RawValue::Empty), None);
        assert_eq!(parse_timestamp_ms(&text("   ")), None);
        assert_eq!(parse_timestamp_ms(&RawValue::Bool(true)), None);
    }

    #[test]
    fn time_of_day_lands_on_epoch_day() {
        assert_eq!(parse_timestamp_str("00:30"), Some(30 * 60 * 1000));
        assert_eq!(parse_timestamp_str("13:05:09"), Some((13 * 3600 + 5 * 60 + 9) * 1000));
    }

    #[test]
    fn iso_and_space_separated_strings() {
        let iso = parse_timestamp_str("2024-03-01T12:00:00Z").unwrap();
        assert_eq!(iso, 1_709_294_400_000);
        assert_eq!(parse_timestamp_str("2024-03-01 12:00:00"), Some(iso));
        assert_eq!(parse_timestamp_str("2024-03-01T12:00:00+00:00"), Some(iso));
        assert_eq!(parse_timestamp_str("2024-03-01"), Some(1_709_251_200_000));
    }

    #[test]
    fn offsets_are_honoured() {
        let utc = parse_timestamp_str("2024-03-01T12:00:00Z").unwrap();
        let plus_two = parse_timestamp_str("2024-03-01T14:00:00+02:00").unwrap();
        assert_eq!(utc, plus_two);
    }

    const MAR_1_0800: i64 = 1_709_280_000_000;
    const MAR_1_2000: i64 = 1_709_323_200_000;

    #[test]
    fn twelve_hour_clock_exports() {
        assert_eq!(parse_timestamp_str("3/1/2024 8:00:00 AM"), Some(MAR_1_0800));
        assert_eq!(parse_timestamp_str("03/01/2024 08:00 PM"), Some(MAR_1_2000));
        assert_eq!(parse_timestamp_str("3/1/2024 8:00 am"), Some(MAR_1_0800));
        assert_eq!(parse_timestamp_str("2024-03-01 8:00:00 PM"), Some(MAR_1_2000));
        assert_eq!(parse_timestamp_str("2024/03/01 08:00:00 AM"), Some(MAR_1_0800));
        assert_eq!(parse_timestamp_str("3/1/2024 12:00:00 AM"), Some(1_709_251_200_000));
    }

    #[test]
    fn month_name_strings() {
        assert_eq!(parse_timestamp_str("Mar 1, 2024 08:00:00"), Some(MAR_1_0800));
        assert_eq!(parse_timestamp_str("Mar 01 2024 20:00:00"), Some(MAR_1_2000));
        assert_eq!(parse_timestamp_str("1 Mar 2024 08:00"), Some(MAR_1_0800));
        assert_eq!(parse_timestamp_str("01 Mar 2024 20:00:00"), Some(MAR_1_2000));
        assert_eq!(parse_timestamp_str("Mar 1, 2024 8:00:00 PM"), Some(MAR_1_2000));
    }

    #[test]
    fn numeric_epoch_thresholds() {
        // 13 digits but below 1e13: still read as seconds.
        assert_eq!(parse_timestamp_str("1700000000000"), Some(1_700_000_000_000_000));
        assert_eq!(parse_timestamp_str("10000000000000"), Some(10_000_000_000_000));
        assert_eq!(parse_timestamp_str("1700000000"), Some(1_700_000_000_000));
        assert_eq!(numeric_timestamp_ms(1e9), Some(1_000_000_000_000));
        assert_eq!(numeric_timestamp_ms(999_999_999.0), None);
    }

    #[test]
    fn day_fraction_and_serials() {
        assert_eq!(parse_timestamp_str("0.5"), Some(43_200_000));
        assert_eq!(numeric_timestamp_ms(0.0), None);
        assert_eq!(numeric_timestamp_ms(1.0), None);
        // 45000 days after 1899-12-30 is 2023-03-15.
        assert_eq!(
            parse_timestamp_ms(&RawValue::Number(45_000.0)),
            Some(SPREADSHEET_EPOCH_MS + 45_000 * 86_400_000)
        );
        assert_eq!(numeric_timestamp_ms(20_000.0), None);
        assert_eq!(numeric_timestamp_ms(60_000.0), None);
    }

    #[test]
    fn plain_temperatures_are_not_timestamps() {
        for s in ["4.5", "12", "-3", "abc", "1e10"] {
            assert_eq!(parse_timestamp_str(s), None, "{s}");
        }
    }
}
