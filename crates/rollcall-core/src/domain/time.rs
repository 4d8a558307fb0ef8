//! Timestamps and UTC day boundaries.
//!
//! Stored timestamps are milliseconds since the Unix epoch.

use chrono::{DateTime, Duration, Utc};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

pub const DAY_MS: Timestamp = 24 * 60 * 60 * 1000;

pub fn to_millis(at: DateTime<Utc>) -> Timestamp {
    at.timestamp_millis()
}

/// Start (00:00 UTC) of the day containing `at`.
pub fn start_of_day(at: Timestamp) -> Timestamp {
    at - at.rem_euclid(DAY_MS)
}

/// Start of the day after the one containing `at`.
pub fn start_of_tomorrow(at: Timestamp) -> Timestamp {
    start_of_day(at) + DAY_MS
}

pub fn days(n: i64) -> Timestamp {
    Duration::days(n).num_milliseconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn start_of_day_truncates_to_midnight_utc() {
        let noon = Utc.with_ymd_and_hms(2024, 3, 10, 12, 30, 0).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(start_of_day(to_millis(noon)), to_millis(midnight));
        assert_eq!(start_of_day(to_millis(midnight)), to_millis(midnight));
    }

    #[test]
    fn start_of_tomorrow_is_next_midnight() {
        let late = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let next = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(start_of_tomorrow(to_millis(late)), to_millis(next));
    }

    #[test]
    fn pre_epoch_days_round_down() {
        assert_eq!(start_of_day(-1), -DAY_MS);
        assert_eq!(days(3), 3 * DAY_MS);
    }
}
