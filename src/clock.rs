// =============================================================================
// Clock & Calendar (C1) — New-York-local civil time
// =============================================================================
//
// All civil-calendar logic in this engine lives in "America/New_York". Dates
// that cross a persistence boundary (rebalance flag, snapshot rows) are kept
// as zone-naive civil dates, never converted to UTC first — two adjacent
// calendar days must never collapse into the same UTC instant representation
// or split across one depending on daylight saving, per the design note on
// time-zone handling.
// =============================================================================

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Weekday};
use chrono_tz::America::New_York;
use chrono_tz::Tz;

/// New-York civil clock. Stateless — every method is a pure function of
/// `chrono::Utc::now()` (or, for testability, an injected instant).
#[derive(Debug, Clone, Copy, Default)]
pub struct Clock;

impl Clock {
    pub fn new() -> Self {
        Self
    }

    /// Current instant in the America/New_York civil calendar.
    pub fn now(&self) -> DateTime<Tz> {
        chrono::Utc::now().with_timezone(&New_York)
    }

    /// Today's NY-local calendar date.
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Whether the given NY-local instant falls on a weekday.
    pub fn is_weekday(&self, instant: DateTime<Tz>) -> bool {
        is_weekday_date(instant.date_naive())
    }

    /// Count of weekdays in the open-closed interval `(a, b]`. Holidays are
    /// not subtracted here; the broker's clock is consulted separately for
    /// holiday-aware market-open checks (C6/C10).
    pub fn trading_days_between(&self, a: NaiveDate, b: NaiveDate) -> u32 {
        if b <= a {
            return 0;
        }
        let mut count = 0u32;
        let mut d = a.succ_opt().expect("date overflow");
        while d <= b {
            if is_weekday_date(d) {
                count += 1;
            }
            d = match d.succ_opt() {
                Some(next) => next,
                None => break,
            };
        }
        count
    }

    /// Build a NY-local `DateTime` for a given NY-local wall-clock time on
    /// today's date. Used by the scheduler to compute "next 10:00 NY" etc.
    pub fn today_at(&self, hour: u32, minute: u32) -> DateTime<Tz> {
        let today = self.today();
        New_York
            .with_ymd_and_hms(today.year(), today.month(), today.day(), hour, minute, 0)
            .single()
            .expect("valid NY wall-clock time")
    }
}

fn is_weekday_date(d: NaiveDate) -> bool {
    !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn weekday_excludes_weekend() {
        // 2026-07-25 is a Saturday, 2026-07-27 is a Monday.
        assert!(!is_weekday_date(date(2026, 7, 25)));
        assert!(!is_weekday_date(date(2026, 7, 26)));
        assert!(is_weekday_date(date(2026, 7, 27)));
    }

    #[test]
    fn trading_days_between_counts_weekdays_open_closed() {
        let clock = Clock::new();
        // Mon 2026-07-27 through Fri 2026-07-31: 5 weekdays, interval (a, b]
        // where a is the Sunday before.
        let a = date(2026, 7, 26); // Sunday
        let b = date(2026, 7, 31); // Friday
        assert_eq!(clock.trading_days_between(a, b), 5);
    }

    #[test]
    fn trading_days_between_same_or_earlier_is_zero() {
        let clock = Clock::new();
        let a = date(2026, 7, 27);
        assert_eq!(clock.trading_days_between(a, a), 0);
        assert_eq!(clock.trading_days_between(a, date(2026, 7, 20)), 0);
    }

    #[test]
    fn trading_days_between_skips_weekend_in_range() {
        let clock = Clock::new();
        // Fri 2026-07-24 -> Mon 2026-07-27: only the Monday counts.
        let a = date(2026, 7, 24);
        let b = date(2026, 7, 27);
        assert_eq!(clock.trading_days_between(a, b), 1);
    }
}
