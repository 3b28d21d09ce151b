//! Time Formatting
//!
//! Pure conversions from a scheduled instant (and "now") into display
//! values. Live relative displays re-invoke these on a fixed interval.

use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Timelike, Utc};
use std::fmt;
use std::time::Duration;

/// How often a live relative display is recomputed
pub const RELATIVE_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3_600;
const SECS_PER_DAY: i64 = 86_400;

/// Format used by `<input type="datetime-local">`
const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Day,
    Hour,
    Minute,
}

impl TimeUnit {
    fn suffix(self) -> &'static str {
        match self {
            TimeUnit::Day => "日",
            TimeUnit::Hour => "時間",
            TimeUnit::Minute => "分",
        }
    }
}

/// Distance between a target and now, truncated to a whole unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeTime {
    Unscheduled,
    Offset {
        magnitude: i64,
        unit: TimeUnit,
        is_past: bool,
    },
}

impl RelativeTime {
    /// Short label, e.g. "3日後", "45分前", "未定"
    pub fn label(&self) -> String {
        match self {
            RelativeTime::Unscheduled => "未定".to_string(),
            RelativeTime::Offset { magnitude, unit, is_past } => {
                let direction = if *is_past { "前" } else { "後" };
                format!("{}{}{}", magnitude, unit.suffix(), direction)
            }
        }
    }
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Relative distance from `now` to `target`.
///
/// Uses whole seconds and truncates: 59 minutes stays "59 minutes".
pub fn format_relative(target: Option<DateTime<Utc>>, now: DateTime<Utc>) -> RelativeTime {
    let Some(target) = target else {
        return RelativeTime::Unscheduled;
    };

    let diff = (target - now).num_seconds();
    let abs_diff = diff.abs();
    let (magnitude, unit) = if abs_diff >= SECS_PER_DAY {
        (abs_diff / SECS_PER_DAY, TimeUnit::Day)
    } else if abs_diff >= SECS_PER_HOUR {
        (abs_diff / SECS_PER_HOUR, TimeUnit::Hour)
    } else {
        (abs_diff / SECS_PER_MINUTE, TimeUnit::Minute)
    };

    RelativeTime::Offset {
        magnitude,
        unit,
        is_past: diff < 0,
    }
}

/// Calendar date and clock time in a display time zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbsoluteTime {
    Unscheduled,
    At { date_part: String, time_part: String },
}

impl AbsoluteTime {
    pub fn date_label(&self) -> &str {
        match self {
            AbsoluteTime::Unscheduled => "未定",
            AbsoluteTime::At { date_part, .. } => date_part,
        }
    }

    pub fn time_label(&self) -> Option<&str> {
        match self {
            AbsoluteTime::Unscheduled => None,
            AbsoluteTime::At { time_part, .. } => Some(time_part),
        }
    }
}

pub fn format_absolute<Tz: TimeZone>(target: Option<DateTime<Utc>>, tz: &Tz) -> AbsoluteTime {
    let Some(target) = target else {
        return AbsoluteTime::Unscheduled;
    };
    let local = target.with_timezone(tz);
    AbsoluteTime::At {
        date_part: format!("{}月{}日", local.month(), local.day()),
        time_part: format!("{:02}:{:02}", local.hour(), local.minute()),
    }
}

/// A completed item is never overdue
pub fn is_overdue(target: Option<DateTime<Utc>>, is_completed: bool, now: DateTime<Utc>) -> bool {
    match target {
        Some(target) => target < now && !is_completed,
        None => false,
    }
}

/// Render for a `datetime-local` input
pub fn format_datetime_local<Tz: TimeZone>(target: DateTime<Utc>, tz: &Tz) -> String {
    target
        .with_timezone(tz)
        .naive_local()
        .format(DATETIME_LOCAL_FORMAT)
        .to_string()
}

/// Parse a `datetime-local` value (minutes or seconds precision) in `tz`
pub fn parse_datetime_local<Tz: TimeZone>(value: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let naive = NaiveDateTime::parse_from_str(value, DATETIME_LOCAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, FixedOffset};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn offset(magnitude: i64, unit: TimeUnit, is_past: bool) -> RelativeTime {
        RelativeTime::Offset { magnitude, unit, is_past }
    }

    #[test]
    fn test_more_than_a_day_reports_whole_days() {
        let target = now() + ChronoDuration::hours(24 * 3 + 23);
        assert_eq!(format_relative(Some(target), now()), offset(3, TimeUnit::Day, false));

        let target = now() + ChronoDuration::seconds(86_400 + 1);
        assert_eq!(format_relative(Some(target), now()), offset(1, TimeUnit::Day, false));
    }

    #[test]
    fn test_fifty_nine_minutes_never_rounds_up() {
        let target = now() + ChronoDuration::minutes(59);
        assert_eq!(format_relative(Some(target), now()), offset(59, TimeUnit::Minute, false));

        let target = now() + ChronoDuration::minutes(59) + ChronoDuration::seconds(59);
        assert_eq!(format_relative(Some(target), now()), offset(59, TimeUnit::Minute, false));
    }

    #[test]
    fn test_hours_and_past() {
        let target = now() - ChronoDuration::minutes(150);
        assert_eq!(format_relative(Some(target), now()), offset(2, TimeUnit::Hour, true));
        assert_eq!(format_relative(Some(target), now()).label(), "2時間前");
    }

    #[test]
    fn test_zero_difference() {
        assert_eq!(format_relative(Some(now()), now()), offset(0, TimeUnit::Minute, false));
    }

    #[test]
    fn test_unscheduled_sentinel_ignores_now() {
        assert_eq!(format_relative(None, now()), RelativeTime::Unscheduled);
        assert_eq!(format_relative(None, Utc::now()), RelativeTime::Unscheduled);
        assert_eq!(RelativeTime::Unscheduled.label(), "未定");
    }

    #[test]
    fn test_absolute_in_time_zone() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let target = Utc.with_ymd_and_hms(2024, 1, 20, 6, 5, 0).unwrap();
        assert_eq!(
            format_absolute(Some(target), &jst),
            AbsoluteTime::At { date_part: "1月20日".into(), time_part: "15:05".into() }
        );
        assert_eq!(format_absolute(None, &jst).date_label(), "未定");
        assert_eq!(format_absolute(None, &jst).time_label(), None);
    }

    #[test]
    fn test_overdue_requires_incomplete_past_target() {
        let past = now() - ChronoDuration::minutes(1);
        assert!(is_overdue(Some(past), false, now()));
        assert!(!is_overdue(Some(past), true, now()));
        assert!(!is_overdue(None, false, now()));
        assert!(!is_overdue(Some(now()), false, now()));
    }

    #[test]
    fn test_datetime_local_round_trip_in_offset() {
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();
        let target = Utc.with_ymd_and_hms(2024, 1, 20, 6, 0, 0).unwrap();
        assert_eq!(format_datetime_local(target, &jst), "2024-01-20T15:00");
        assert_eq!(parse_datetime_local("2024-01-20T15:00", &jst), Some(target));
        assert_eq!(parse_datetime_local("2024-01-20T15:00:00", &jst), Some(target));
        assert_eq!(parse_datetime_local("tomorrow", &jst), None);
    }
}
