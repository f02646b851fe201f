//! Trailing-window freshness filter.

use crate::models::ArticleRecord;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

/// Default retention window in days.
pub const DEFAULT_RETENTION_DAYS: u32 = 7;

/// Keeps records dated within a trailing window of whole days.
#[derive(Debug, Clone, Copy)]
pub struct FreshnessFilter {
    window_days: u32,
}

impl Default for FreshnessFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION_DAYS)
    }
}

impl FreshnessFilter {
    pub fn new(window_days: u32) -> Self {
        Self { window_days }
    }

    /// Whether `record` is fresh relative to `now`.
    ///
    /// The absolute distance to `now` is rounded up to whole days and compared
    /// against the window, so dates slightly in the future also pass. A date
    /// that cannot be resolved to an instant is never fresh.
    pub fn is_fresh(&self, record: &ArticleRecord, now: DateTime<Utc>) -> bool {
        let Some(date) = record.date.resolve() else {
            debug!(url = %record.url, date = ?record.date, "Dropping record with unparsable date");
            return false;
        };
        // ceil(distance in days) <= window  <=>  distance <= window days
        let distance = if now >= date { now - date } else { date - now };
        distance <= TimeDelta::days(i64::from(self.window_days))
    }

    pub fn retain(&self, records: Vec<ArticleRecord>, now: DateTime<Utc>) -> Vec<ArticleRecord> {
        records
            .into_iter()
            .filter(|record| self.is_fresh(record, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleDate;
    use crate::testing::record;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_boundary_seven_days_kept_eight_dropped() {
        let filter = FreshnessFilter::default();
        let now = now();

        assert!(filter.is_fresh(&record("a", "a", now), now));
        assert!(filter.is_fresh(&record("a", "a", now - Duration::days(7)), now));
        assert!(!filter.is_fresh(&record("a", "a", now - Duration::days(8)), now));
        // 7 days and a bit rounds up to 8
        assert!(!filter.is_fresh(
            &record("a", "a", now - Duration::days(7) - Duration::milliseconds(1)),
            now
        ));
        assert!(!filter.is_fresh(
            &record("a", "a", now - Duration::days(7) - Duration::microseconds(500)),
            now
        ));
        assert!(!filter.is_fresh(
            &record("a", "a", now + Duration::days(7) + Duration::nanoseconds(1)),
            now
        ));
    }

    #[test]
    fn test_future_dates_use_absolute_distance() {
        let filter = FreshnessFilter::default();
        let now = now();
        assert!(filter.is_fresh(&record("a", "a", now + Duration::days(3)), now));
        assert!(!filter.is_fresh(&record("a", "a", now + Duration::days(9)), now));
    }

    #[test]
    fn test_raw_dates_are_parsed_or_dropped() {
        let filter = FreshnessFilter::default();
        let now = now();

        let mut parsable = record("a", "a", now);
        parsable.date = ArticleDate::Raw("2025-05-18".to_string());
        let mut garbage = record("b", "b", now);
        garbage.date = ArticleDate::Raw("vor 2 Tagen".to_string());
        let mut empty = record("c", "c", now);
        empty.date = ArticleDate::default();

        let kept = filter.retain(vec![parsable, garbage, empty], now);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "a");
    }

    #[test]
    fn test_custom_window() {
        let filter = FreshnessFilter::new(1);
        let now = now();
        let kept = filter.retain(
            vec![
                record("a", "a", now - Duration::hours(20)),
                record("b", "b", now - Duration::hours(30)),
            ],
            now,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].url, "a");
    }
}
