//! All "today" computations go through [`KstClock`] so tests can pin the day.
//!
//! Korea Standard Time is a fixed +09:00 offset with no DST, so a
//! `FixedOffset` is sufficient — no tz database needed.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

pub const KST_OFFSET_SECS: i32 = 9 * 3600;

pub fn kst_offset() -> FixedOffset {
    FixedOffset::east_opt(KST_OFFSET_SECS).expect("+09:00 is a valid offset")
}

pub trait KstClock: Send + Sync {
    fn now_kst(&self) -> DateTime<FixedOffset>;

    fn today_kst(&self) -> NaiveDate {
        self.now_kst().date_naive()
    }

    /// `YYYY-MM-DD` string used as the daily-usage row key.
    fn today_key(&self) -> String {
        self.today_kst().format("%Y-%m-%d").to_string()
    }
}

/// Production clock: wall time converted to +09:00.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl KstClock for SystemClock {
    fn now_kst(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&kst_offset())
    }
}

/// Test clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        let dt = kst_offset()
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single()
            .expect("valid fixed test instant");
        Self(dt)
    }
}

impl KstClock for FixedClock {
    fn now_kst(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_pins_the_day() {
        let clock = FixedClock::at(2026, 3, 1, 8, 0);
        assert_eq!(clock.today_key(), "2026-03-01");
        assert_eq!(clock.now_kst().offset().local_minus_utc(), KST_OFFSET_SECS);
    }

    #[test]
    fn system_clock_is_kst() {
        let now = SystemClock.now_kst();
        assert_eq!(now.offset().local_minus_utc(), KST_OFFSET_SECS);
    }
}
