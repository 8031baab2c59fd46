//! Wall-clock access and the timestamp formats stamped into transcripts.
//!
//! User turns carry a tag like `[2026-01-19 12:00:00|43200s]`: local time,
//! then seconds elapsed since local midnight. Services take an
//! `Arc<dyn Clock>` so tests can pin the time.

use chrono::{Local, NaiveDateTime, Timelike};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// `YYYY-MM-DD HH:MM:SS`.
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn seconds_of_day(at: NaiveDateTime) -> u32 {
    at.num_seconds_from_midnight()
}

/// `[<timestamp>|<secs>s]`
pub fn time_tag(at: NaiveDateTime) -> String {
    format!("[{}|{}s]", format_timestamp(at), seconds_of_day(at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 9)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_timestamp_is_zero_padded() {
        assert_eq!(format_timestamp(at(7, 5, 3)), "2026-01-09 07:05:03");
    }

    #[test]
    fn test_seconds_of_day() {
        assert_eq!(seconds_of_day(at(0, 0, 0)), 0);
        assert_eq!(seconds_of_day(at(1, 2, 3)), 3723);
        assert_eq!(seconds_of_day(at(23, 59, 59)), 86399);
    }

    #[test]
    fn test_time_tag() {
        assert_eq!(time_tag(at(12, 0, 0)), "[2026-01-09 12:00:00|43200s]");
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(at(8, 30, 0));
        assert_eq!(clock.now(), at(8, 30, 0));
    }
}
