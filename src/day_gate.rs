//! Decides whether a selected day's presentations may be fetched.
//!
//! Presentations are only shown on their own weekday. The current time is
//! read through [`Clock`] so the controller can be driven by a fake in tests.

use super::model::WeekDay;
use chrono::{DateTime, Datelike, Local, TimeZone};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Reads the system's local time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Weekday of `now` in its own time zone.
pub fn weekday_of<Tz: TimeZone>(now: &DateTime<Tz>) -> WeekDay {
    WeekDay::from_number(now.weekday().num_days_from_sunday())
}

/// True iff `day` is the weekday of `now`.
pub fn is_eligible<Tz: TimeZone>(day: WeekDay, now: &DateTime<Tz>) -> bool {
    day.number_from_sunday() == now.weekday().num_days_from_sunday()
}


#[cfg(test)]
mod tests {
    use super::testing::noon;
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn only_the_current_weekday_is_eligible() {
        // 2026-10-16 is a Friday.
        let friday = noon(2026, 10, 16);
        assert!(is_eligible(WeekDay::Friday, &friday));
        for day in WeekDay::ALL.into_iter().filter(|d| *d != WeekDay::Friday) {
            assert!(!is_eligible(day, &friday), "{} should not be eligible on a Friday", day);
        }
        assert_eq!(weekday_of(&friday), WeekDay::Friday);
    }

    #[test]
    fn every_selectable_day_is_blocked_on_sunday() {
        let sunday = noon(2026, 10, 11);
        assert_eq!(weekday_of(&sunday), WeekDay::Sunday);
        assert!(WeekDay::SELECTABLE.iter().all(|day| !is_eligible(*day, &sunday)));
        assert!(is_eligible(WeekDay::Sunday, &sunday));
    }

    #[test]
    fn weekday_is_taken_in_the_instant_own_time_zone() {
        // 23:30 Saturday in Sao Paulo is already Sunday in UTC.
        let sao_paulo = FixedOffset::west_opt(3 * 3600).unwrap();
        let late_saturday = sao_paulo.with_ymd_and_hms(2026, 10, 17, 23, 30, 0).unwrap();
        assert!(is_eligible(WeekDay::Saturday, &late_saturday));
        assert!(is_eligible(WeekDay::Sunday, &late_saturday.with_timezone(&Utc)));
    }
}
