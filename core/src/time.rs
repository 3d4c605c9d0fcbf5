//! Calendar date/time from the RTC's Unix seconds
//!
//! Implements Howard Hinnant's civil_from_days algorithm.
//! Reference: http://howardhinnant.github.io/date_algorithms.html
//!
//! - O(1), no year iteration
//! - Correct leap years for the proleptic Gregorian calendar
//! - UTC only; the probe logs in UTC

use core::fmt;

const SECONDS_PER_DAY: u64 = 86400;

/// Broken-down UTC date and time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DateTime {
    pub year: u16,
    /// 1..=12
    pub month: u8,
    /// 1..=31
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    /// Convert Unix seconds to a civil date and time
    ///
    /// Valid range: 1970-2105 (u16 year limit).
    pub fn from_unix(unix_secs: u64) -> Self {
        let days_since_epoch = (unix_secs / SECONDS_PER_DAY) as i64;
        let secs_today = unix_secs % SECONDS_PER_DAY;

        let (year, month, day) = civil_from_days(days_since_epoch);

        Self {
            year,
            month,
            day,
            hour: (secs_today / 3600) as u8,
            minute: ((secs_today % 3600) / 60) as u8,
            second: (secs_today % 60) as u8,
        }
    }

    /// The (year, month, day) triple, for day-change comparisons
    pub const fn date(&self) -> (u16, u8, u8) {
        (self.year, self.month, self.day)
    }

    /// Seconds since midnight
    pub const fn seconds_of_day(&self) -> u32 {
        self.hour as u32 * 3600 + self.minute as u32 * 60 + self.second as u32
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Days since 1970-01-01 to (year, month, day)
fn civil_from_days(days_since_epoch: i64) -> (u16, u8, u8) {
    // Shift the epoch to 0000-03-01 so the leap day ends the year
    let z = days_since_epoch + 719468;

    // 400-year eras
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // March = 0
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u8;
    let year = if m <= 2 { y + 1 } else { y };

    (year as u16, m, d)
}
