use time::{Duration, OffsetDateTime, Time};

use crate::error::{Error, Result};

/// Time of day an alarm rings, to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTime(Time);

impl AlarmTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        Time::from_hms(hour, minute, 0)
            .map(Self)
            .map_err(|e| Error::InvalidTime(e.to_string()))
    }

    pub fn hour(self) -> u8 {
        self.0.hour()
    }

    pub fn minute(self) -> u8 {
        self.0.minute()
    }

    pub fn as_time(self) -> Time {
        self.0
    }
}

/// Drops seconds and sub-seconds.
impl From<Time> for AlarmTime {
    fn from(time: Time) -> Self {
        let sub_minute = Duration::new(i64::from(time.second()), time.nanosecond() as i32);
        Self(time - sub_minute)
    }
}

impl std::fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// The first instant strictly after `now` whose local time of day is
/// `at`: today if that is still ahead, otherwise tomorrow.
pub fn next_occurrence(now: OffsetDateTime, at: AlarmTime) -> OffsetDateTime {
    let today = now.replace_time(at.as_time());
    if today > now {
        today
    } else {
        today + Duration::DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, time};

    #[test]
    fn later_time_today_stays_today() {
        let now = datetime!(2026-10-17 8:00 UTC);
        let at = AlarmTime::new(8, 30).unwrap();
        assert_eq!(next_occurrence(now, at), datetime!(2026-10-17 8:30 UTC));
    }

    #[test]
    fn earlier_time_rolls_to_tomorrow() {
        let now = datetime!(2026-10-17 8:00 UTC);
        let at = AlarmTime::new(7, 30).unwrap();
        assert_eq!(next_occurrence(now, at), datetime!(2026-10-18 7:30 UTC));
    }

    #[test]
    fn earlier_and_later_times_are_a_day_apart_in_date() {
        let now = datetime!(2026-10-17 12:00 UTC);
        let earlier = next_occurrence(now, AlarmTime::new(11, 0).unwrap());
        let later = next_occurrence(now, AlarmTime::new(13, 0).unwrap());

        assert_eq!(earlier.date(), later.date().next_day().unwrap());
    }

    #[test]
    fn current_minute_rolls_to_tomorrow() {
        // Seconds are zeroed, so "now" at 08:00:30 is already past 08:00.
        let now = datetime!(2026-10-17 8:00:30 UTC);
        let at = AlarmTime::new(8, 0).unwrap();
        assert_eq!(next_occurrence(now, at), datetime!(2026-10-18 8:00 UTC));
    }

    #[test]
    fn exactly_now_rolls_to_tomorrow() {
        let now = datetime!(2026-10-17 8:00 UTC);
        let at = AlarmTime::new(8, 0).unwrap();
        assert!(next_occurrence(now, at) > now);
        assert_eq!(next_occurrence(now, at), datetime!(2026-10-18 8:00 UTC));
    }

    #[test]
    fn rolls_across_month_end() {
        let now = datetime!(2026-10-31 23:59 +02:00);
        let at = AlarmTime::new(6, 15).unwrap();
        assert_eq!(next_occurrence(now, at), datetime!(2026-11-01 6:15 +02:00));
    }

    #[test]
    fn from_time_truncates_seconds() {
        let at = AlarmTime::from(time!(7:45:59.5));
        assert_eq!(at, AlarmTime::new(7, 45).unwrap());
        assert_eq!(at.to_string(), "07:45");
    }

    #[test]
    fn rejects_invalid_components() {
        assert!(matches!(AlarmTime::new(24, 0), Err(Error::InvalidTime(_))));
        assert!(matches!(AlarmTime::new(7, 60), Err(Error::InvalidTime(_))));
    }
}
