//! Common utilities shared across programs

use chrono::{DateTime, NaiveDateTime, SubsecRound, Timelike, Utc};

use crate::error::{LoadcellError, Result};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp.
///
/// Accepts naive date-times with `T` or space separators and optional
/// fractional seconds, a bare date (midnight), and RFC 3339 strings with an
/// offset, which are converted to UTC.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let text = text.trim();
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.naive_utc());
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return Ok(ts);
        }
    }
    Err(LoadcellError::Timestamp(text.to_string()))
}

/// Format a timestamp as ISO-8601 at microsecond precision.
///
/// The fraction is always six digits, and is left out entirely when the
/// timestamp falls on a whole second. Sub-microsecond digits are truncated.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    let ts = ts.trunc_subsecs(6);
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Current UTC time truncated to microseconds, as written by the collector
pub fn utc_now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(6)
}

/// Trailing moving average.
///
/// Each output is the mean of up to `window` most recent inputs; the first
/// outputs average over however many values are available so far. A window
/// of 0 or 1 returns the input unchanged.
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    if window <= 1 {
        return values.to_vec();
    }
    let mut out = Vec::with_capacity(values.len());
    let mut sum = 0.0;
    for (i, &v) in values.iter().enumerate() {
        sum += v;
        if i >= window {
            sum -= values[i - window];
        }
        out.push(sum / (i + 1).min(window) as f64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ymd_hms_micro(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    #[test]
    fn test_parse_python_isoformat() {
        assert_eq!(
            parse_timestamp("2024-05-01T12:30:05.123456").unwrap(),
            ymd_hms_micro(12, 30, 5, 123456)
        );
        assert_eq!(
            parse_timestamp("2024-05-01T12:30:05").unwrap(),
            ymd_hms_micro(12, 30, 5, 0)
        );
    }

    #[test]
    fn test_parse_space_separator() {
        assert_eq!(
            parse_timestamp(" 2024-05-01 12:30:05.5 ").unwrap(),
            ymd_hms_micro(12, 30, 5, 500000)
        );
    }

    #[test]
    fn test_parse_offset_converts_to_utc() {
        assert_eq!(
            parse_timestamp("2024-05-01T14:30:05+02:00").unwrap(),
            ymd_hms_micro(12, 30, 5, 0)
        );
    }

    #[test]
    fn test_parse_date_only() {
        assert_eq!(parse_timestamp("2024-05-01").unwrap(), ymd_hms_micro(0, 0, 0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(LoadcellError::Timestamp(_))
        ));
    }

    #[test]
    fn test_format_matches_isoformat() {
        assert_eq!(
            format_timestamp(&ymd_hms_micro(8, 1, 2, 0)),
            "2024-05-01T08:01:02"
        );
        assert_eq!(
            format_timestamp(&ymd_hms_micro(8, 1, 2, 250000)),
            "2024-05-01T08:01:02.250000"
        );
        assert_eq!(
            format_timestamp(&ymd_hms_micro(8, 1, 2, 7)),
            "2024-05-01T08:01:02.000007"
        );
    }

    #[test]
    fn test_format_truncates_nanoseconds() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_nano_opt(8, 1, 2, 691_545_831)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2024-05-01T08:01:02.691545");

        let sub_micro = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_nano_opt(8, 1, 2, 999)
            .unwrap();
        assert_eq!(format_timestamp(&sub_micro), "2024-05-01T08:01:02");
    }

    #[test]
    fn test_utc_now_has_microsecond_precision() {
        assert_eq!(utc_now().nanosecond() % 1_000, 0);
    }

    #[test]
    fn test_moving_average_window() {
        let out = moving_average(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_eq!(out, vec![1.0, 1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn test_moving_average_passthrough() {
        let values = [3.0, -1.0, 4.0];
        assert_eq!(moving_average(&values, 1), values.to_vec());
        assert_eq!(moving_average(&values, 0), values.to_vec());
    }

    #[test]
    fn test_moving_average_window_longer_than_input() {
        let out = moving_average(&[2.0, 4.0, 6.0], 10);
        assert_eq!(out, vec![2.0, 3.0, 4.0]);
    }
}
