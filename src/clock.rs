//! Wall-clock access for log timestamps, date rotation and flush pacing.
//!
//! All log times are UTC. The agent reads time through [`Clock`] so tests
//! can pin the date and step across midnight.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// `HH:MM:SS`, the per-line timestamp.
pub fn time_str(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// `YYYY-MM-DD`, the file name date.
pub fn date_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn formats_time_and_date() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(time_str(at), "12:00:00");
        assert_eq!(date_str(at.date_naive()), "2024-01-01");
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap());
        clock.advance(chrono::Duration::seconds(2));
        assert_eq!(date_str(clock.now().date_naive()), "2024-01-02");
        assert_eq!(time_str(clock.now()), "00:00:01");
    }
}
