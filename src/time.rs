//! Date/time routines: TLE epochs, split Julian dates and sidereal time.
//!
//! Julian dates are kept as a `(whole, fraction)` pair all the way to the
//! point where minutes since epoch are formed. Subtracting the whole parts
//! first keeps fractional seconds intact over offsets of many years, which a
//! single `f64` Julian date (about 40 microseconds of resolution) would not.

use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: f64 = 1440.0;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Julian date of 1949 December 31 00:00 UT, origin of the SGP4 epoch day count.
pub const JD_1950: f64 = 2_433_281.5;

const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const JD_J2000: f64 = 2_451_545.0;
const TWOPI: f64 = 2.0 * PI;

/// Two-digit TLE years below 57 belong to the 2000s, the rest to the 1900s.
pub fn full_year(two_digit_year: i32) -> i32 {
    if two_digit_year < 57 {
        2000 + two_digit_year
    } else {
        1900 + two_digit_year
    }
}

/// Compute the Julian date as (midnight part, fraction of day).
///
/// The first value is the JD at the midnight starting the calendar day
/// (always ending in `.5`), the second the offset for the time of day.
/// `day = 0` addresses the last day of the previous month, which is how
/// day-of-year counts are anchored.
pub fn jday(year: i32, mon: i32, day: i32, hr: i32, minute: i32, sec: f64) -> (f64, f64) {
    let year_f = year as f64;
    let mon_f = mon as f64;

    let jd = 367.0 * year_f - (7.0 * (year_f + ((mon_f + 9.0) / 12.0).floor()) * 0.25).floor()
        + (275.0 * mon_f / 9.0).floor()
        + day as f64
        + 1_721_013.5;
    let fr = (sec + minute as f64 * 60.0 + hr as f64 * 3600.0) / SECONDS_PER_DAY;

    (jd, fr)
}

/// Greenwich mean sidereal angle in radians for a UT1 Julian date (IAU-82).
pub fn gstime(jdut1: f64) -> f64 {
    let tut1 = (jdut1 - JD_J2000) / 36_525.0;
    let temp = -6.2e-6 * tut1 * tut1 * tut1
        + 0.093_104 * tut1 * tut1
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * tut1
        + 67_310.548_41;
    // seconds of time -> degrees is 1/240
    let theta = (temp * (PI / 180.0) / 240.0) % TWOPI;
    if theta < 0.0 {
        theta + TWOPI
    } else {
        theta
    }
}

/// A Julian date split into a whole part and a fraction in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JulianDate {
    pub whole: f64,
    pub fraction: f64,
}

impl JulianDate {
    /// Builds a normalized pair: whole days carried by `fraction` move into `whole`.
    pub fn new(whole: f64, fraction: f64) -> Self {
        let carry = fraction.floor();
        JulianDate {
            whole: whole + carry,
            fraction: fraction - carry,
        }
    }

    pub fn from_calendar(year: i32, mon: i32, day: i32, hr: i32, minute: i32, sec: f64) -> Self {
        let (jd, fr) = jday(year, mon, day, hr, minute, sec);
        JulianDate::new(jd, fr)
    }

    /// Epoch of a TLE: `day_of_year` is 1.0 at the start of January 1st.
    pub fn from_tle_epoch(year: i32, day_of_year: f64) -> Self {
        let (jan0, _) = jday(year, 1, 0, 0, 0, 0.0);
        let whole_days = day_of_year.floor();
        JulianDate::new(jan0 + whole_days, day_of_year - whole_days)
    }

    pub fn from_datetime(dt: &DateTime<Utc>) -> Self {
        let (jd, _) = jday(dt.year(), dt.month() as i32, dt.day() as i32, 0, 0, 0.0);
        let seconds =
            dt.num_seconds_from_midnight() as f64 + dt.nanosecond() as f64 * 1.0e-9;
        JulianDate::new(jd, seconds / SECONDS_PER_DAY)
    }

    /// Nearest nanosecond UTC instant, `None` outside chrono's range.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.value().is_finite() {
            return None;
        }
        let days = self.whole - JD_UNIX_EPOCH;
        let whole_days = days.floor();
        let rest = (days - whole_days) + self.fraction;
        let nanos = (rest * SECONDS_PER_DAY * 1.0e9).round() as i64;
        let seconds = (whole_days as i64).checked_mul(SECONDS_PER_DAY as i64)?;

        DateTime::from_timestamp(seconds, 0)?.checked_add_signed(Duration::nanoseconds(nanos))
    }

    pub fn value(&self) -> f64 {
        self.whole + self.fraction
    }

    /// Days since 1949 December 31 00:00 UT.
    pub fn days_since_1950(&self) -> f64 {
        (self.whole - JD_1950) + self.fraction
    }

    /// Signed minutes from `epoch` to `self`.
    pub fn minutes_since(&self, epoch: &JulianDate) -> f64 {
        ((self.whole - epoch.whole) + (self.fraction - epoch.fraction)) * MINUTES_PER_DAY
    }

    pub fn add_minutes(&self, minutes: f64) -> Self {
        let days = minutes / MINUTES_PER_DAY;
        let whole_days = days.trunc();
        JulianDate::new(self.whole + whole_days, self.fraction + (days - whole_days))
    }
}
