//! Calendar-day arithmetic over UTC instants.
//!
//! Collections are delivered as UTC instants but "today" and "tomorrow"
//! are questions about the household's local calendar.  Everything here
//! takes the zone explicitly and returns new values; nothing mutates.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Where a date falls relative to the local calendar day of `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDay {
    Past,
    Today,
    Tomorrow,
    Later,
}

/// An immutable collection instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionDate(DateTime<Utc>);

impl CollectionDate {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// The local calendar day this instant falls on.
    pub fn local_day(&self, tz: Tz) -> NaiveDate {
        self.0.with_timezone(&tz).date_naive()
    }

    /// The same local wall-clock time `days` calendar days later
    /// (or earlier, for negative values).
    pub fn add_days(&self, days: i64) -> Self {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days as u64))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        Self(shifted.unwrap_or(self.0))
    }

    /// Local midnight at the start of this instant's day.
    pub fn start_of_day(&self, tz: Tz) -> Self {
        Self(start_of_day(self.0, tz))
    }

    pub fn is_same_day_as(&self, other: &CollectionDate, tz: Tz) -> bool {
        self.local_day(tz) == other.local_day(tz)
    }

    pub fn relative_to(&self, now: DateTime<Utc>, tz: Tz) -> RelativeDay {
        let day = self.local_day(tz);
        let today = now.with_timezone(&tz).date_naive();
        if day < today {
            RelativeDay::Past
        } else if day == today {
            RelativeDay::Today
        } else if today.succ_opt() == Some(day) {
            RelativeDay::Tomorrow
        } else {
            RelativeDay::Later
        }
    }

    pub fn is_today(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        self.relative_to(now, tz) == RelativeDay::Today
    }

    pub fn is_tomorrow(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        self.relative_to(now, tz) == RelativeDay::Tomorrow
    }
}

impl From<DateTime<Utc>> for CollectionDate {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

/// Local midnight of the day containing `now`, as a UTC instant.
///
/// If midnight does not exist locally (a DST gap), the first valid
/// instant of the day is used.
pub fn start_of_day(now: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let day = now.with_timezone(&tz).date_naive();
    local_midnight(day, tz)
}

fn local_midnight(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = day.and_time(chrono::NaiveTime::MIN);
    (0..=3)
        .find_map(|h| {
            tz.from_local_datetime(&(midnight + chrono::Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn start_of_day_in_summer_time() {
        // 10:00 UTC on 1 July is 11:00 BST; local midnight is 23:00 UTC the day before.
        let sod = start_of_day(utc(2026, 7, 1, 10), chrono_tz::Europe::London);
        assert_eq!(sod, utc(2026, 6, 30, 23));
    }

    #[test]
    fn start_of_day_in_utc() {
        let sod = start_of_day(utc(2026, 1, 15, 17), chrono_tz::UTC);
        assert_eq!(sod, utc(2026, 1, 15, 0));
    }

    #[test]
    fn add_days_returns_new_value() {
        let d = CollectionDate::new(utc(2026, 1, 31, 0));
        let later = d.add_days(1);
        assert_eq!(d.instant(), utc(2026, 1, 31, 0));
        assert_eq!(later.instant(), utc(2026, 2, 1, 0));
        assert_eq!(later.add_days(-1), d);
    }

    #[test]
    fn relative_day_classification() {
        let tz = chrono_tz::Europe::London;
        let now = utc(2026, 1, 15, 9);
        assert_eq!(CollectionDate::new(utc(2026, 1, 14, 0)).relative_to(now, tz), RelativeDay::Past);
        assert_eq!(CollectionDate::new(utc(2026, 1, 15, 0)).relative_to(now, tz), RelativeDay::Today);
        assert_eq!(CollectionDate::new(utc(2026, 1, 16, 0)).relative_to(now, tz), RelativeDay::Tomorrow);
        assert_eq!(CollectionDate::new(utc(2026, 1, 20, 0)).relative_to(now, tz), RelativeDay::Later);
    }

    #[test]
    fn tomorrow_across_month_end() {
        let now = utc(2026, 1, 31, 12);
        let d = CollectionDate::new(utc(2026, 2, 1, 0));
        assert!(d.is_tomorrow(now, chrono_tz::UTC));
        assert!(!d.is_today(now, chrono_tz::UTC));
    }
}
