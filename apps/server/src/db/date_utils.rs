//! Date utilities for daily reset hour handling and timestamp storage.

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use matchdeck_core::StudyDay;

/// The study day containing `now`.
///
/// A study day begins at `daily_reset_hour` local time, so studying late at
/// night before the reset still counts towards the previous day.
pub fn study_day<Tz: TimeZone>(now: &DateTime<Tz>, daily_reset_hour: u32) -> StudyDay {
    StudyDay::containing(now, daily_reset_hour)
}

/// The current study day in the server's local timezone.
pub fn current_study_day(daily_reset_hour: u32) -> StudyDay {
    study_day(&Local::now(), daily_reset_hour)
}

/// Timestamp as stored in the database.
///
/// Fixed-width UTC so string comparison in SQL orders correctly.
pub fn to_db_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_db_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 10, hour, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_before_reset_hour_is_previous_day() {
        let day = study_day(&at(3), 4);
        assert_eq!(to_db_time(day.start), "2024-03-09T02:00:00Z");
        assert_eq!(to_db_time(day.end), "2024-03-10T02:00:00Z");
    }

    #[test]
    fn test_study_day_bounds_in_utc() {
        let day = study_day(&at(10), 4);
        assert_eq!(to_db_time(day.start), "2024-03-10T02:00:00Z");
        assert_eq!(to_db_time(day.end), "2024-03-11T02:00:00Z");
    }

    #[test]
    fn test_db_time_round_trip() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        let stored = to_db_time(now);
        assert_eq!(stored, "2024-03-10T12:00:00Z");
        assert_eq!(parse_db_time(&stored), Some(now));
        assert_eq!(parse_db_time("not a date"), None);
    }
}
