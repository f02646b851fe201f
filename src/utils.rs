//! Utility functions for date parsing, string handling and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Lenient calendar date/time parsing shared by coercion and freshness checks
//! - String truncation for logging
//! - File system validation for store and backup directories

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Layouts carrying a numeric UTC offset (`+0200` or `+02:00`).
const OFFSET_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    // `Date.prototype.toString()` once the `(zone name)` suffix is stripped
    "%a %b %d %Y %H:%M:%S GMT%z",
];

/// Naive date-time layouts; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Plain date layouts; mapped to midnight UTC.
const NAIVE_DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Parse a calendar date/time string.
///
/// Accepts RFC 3339, RFC 2822, ISO-like date-times with or without an offset,
/// slash-separated dates, English month-name dates (`October 18, 2026`) and
/// the `Sun Oct 18 2026 04:56:43 GMT+0000 (...)` rendering. Values without an
/// offset are taken as UTC; a plain date maps to midnight UTC.
///
/// # Arguments
///
/// * `raw` - The string read from the page; surrounding whitespace is ignored
///
/// # Returns
///
/// `None` when the string matches none of the accepted layouts.
///
/// # Examples
///
/// ```ignore
/// assert!(parse_date("2025-05-06T14:30:00+0200").is_some());
/// assert!(parse_date("Tue, 6 May 2025 14:30:00 GMT").is_some());
/// assert!(parse_date("May 6, 2025").is_some());
/// assert!(parse_date("yesterday").is_none());
/// ```
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let without_zone_name = match raw.find(" (") {
        Some(idx) if raw.ends_with(')') => &raw[..idx],
        _ => raw,
    };
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(without_zone_name, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (on a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), std::io::Error> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        let result = truncate_for_log("ääää", 3);
        assert!(result.starts_with("ä…"));
    }

    #[test]
    fn test_parse_date_layouts() {
        let expected = Utc.with_ymd_and_hms(2025, 5, 6, 12, 30, 0).unwrap();
        assert_eq!(parse_date("2025-05-06T12:30:00Z"), Some(expected));
        assert_eq!(parse_date("2025-05-06T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_date("Tue, 06 May 2025 12:30:00 GMT"), Some(expected));
        assert_eq!(parse_date("2025-05-06T12:30:00"), Some(expected));
        assert_eq!(parse_date("2025-05-06 12:30:00"), Some(expected));
        assert_eq!(parse_date("  2025-05-06T12:30  "), Some(expected));
        assert_eq!(
            parse_date("2025-05-06"),
            Some(Utc.with_ymd_and_hms(2025, 5, 6, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_date_offset_without_colon() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 18, 4, 56, 43).unwrap();
        assert_eq!(parse_date("2026-10-18T04:56:43+0000"), Some(expected));
        assert_eq!(parse_date("2026-10-18T06:56:43+0200"), Some(expected));
        assert_eq!(parse_date("2026-10-18 06:56:43.000+0200"), Some(expected));
    }

    #[test]
    fn test_parse_date_month_name_and_slash_layouts() {
        let midnight = Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap();
        assert_eq!(parse_date("October 18, 2026"), Some(midnight));
        assert_eq!(parse_date("Oct 18, 2026"), Some(midnight));
        assert_eq!(parse_date("18 October 2026"), Some(midnight));
        assert_eq!(parse_date("2026/10/18"), Some(midnight));
        assert_eq!(
            parse_date("2026/10/18 04:56:43"),
            Some(Utc.with_ymd_and_hms(2026, 10, 18, 4, 56, 43).unwrap())
        );
    }

    #[test]
    fn test_parse_date_js_to_string_rendering() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 18, 4, 56, 43).unwrap();
        assert_eq!(parse_date("Sun Oct 18 2026 04:56:43 GMT+0000"), Some(expected));
        assert_eq!(
            parse_date("Sun Oct 18 2026 06:56:43 GMT+0200 (Central European Summer Time)"),
            Some(expected)
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("vor 3 Stunden"), None);
        assert_eq!(parse_date("2025-13-45"), None);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        ensure_writable_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }
}
