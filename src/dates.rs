//! Timestamp parsing and formatting.
//!
//! Catalog timestamps are Unix seconds. Forms and seed files use
//! `YYYY-MM-DD` dates (midnight UTC); seed files also accept RFC 3339.

use anyhow::Result;
use chrono::{DateTime, NaiveDate};

use openalt_core::error::ValidationError;

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp into Unix seconds.
pub fn parse_date(value: &str) -> Result<i64> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .ok_or_else(|| ValidationError::Date(value.to_string()).into());
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.timestamp())
        .map_err(|_| ValidationError::Date(value.to_string()).into())
}

/// Parse an optional form field; blank means `None`.
pub fn parse_optional_date(value: &str) -> Result<Option<i64>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_date(value).map(Some)
    }
}

pub fn format_date(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| ts.to_string())
}

pub fn format_rfc3339(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

/// Format `ts` relative to `now` (e.g. "3 hours ago").
///
/// Falls back to the calendar date for future timestamps and anything
/// older than a year.
pub fn format_relative(ts: i64, now: i64) -> String {
    let delta = now - ts;

    if delta < 0 {
        return format_date(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        plural(delta / 60, "min")
    } else if delta < 86400 {
        plural(delta / 3600, "hour")
    } else if delta < 86400 * 30 {
        plural(delta / 86400, "day")
    } else if delta < 86400 * 365 {
        plural(delta / (86400 * 30), "month")
    } else {
        format_date(ts)
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("1970-01-02").unwrap(), 86400);
        assert_eq!(parse_date("1970-01-01T01:00:00Z").unwrap(), 3600);
        assert!(parse_date("02/01/1970").is_err());
        assert_eq!(parse_optional_date("  ").unwrap(), None);
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(86400), "1970-01-02");
    }

    #[test]
    fn test_format_relative() {
        let now = 10_000_000;
        assert_eq!(format_relative(now - 10, now), "just now");
        assert_eq!(format_relative(now - 60, now), "1 min ago");
        assert_eq!(format_relative(now - 7200, now), "2 hours ago");
        assert_eq!(format_relative(now - 86400 * 3, now), "3 days ago");
        assert_eq!(format_relative(now - 86400 * 65, now), "2 months ago");
        assert_eq!(format_relative(now + 10, now), format_date(now + 10));
    }
}
