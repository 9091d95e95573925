use serde::{Deserialize, Serialize};

use crate::time::JulianDate;

/// Mean elements as published in a two-line element set, in TLE units.
///
/// Angles are degrees, mean motion is revolutions per day and its
/// derivatives are the TLE's `ndot/2` (rev/day^2) and `nddot/6` (rev/day^3)
/// fields. `bstar` is in inverse earth radii.
///
/// Values come from the TLE parser or from deserializing a previously
/// serialized set, and are read-only afterwards. Initialization copies what
/// it needs, so a `SatelliteRecord` never depends on the set outliving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitalElementSet {
    pub(crate) name: Option<String>,
    pub(crate) satellite_number: u32,
    pub(crate) classification: char,
    pub(crate) international_designator: String,

    /// Four digit year, after the split-year rule.
    pub(crate) epoch_year: i32,
    /// Day of year with fraction, 1.0 = January 1st 00:00 UTC.
    pub(crate) epoch_day: f64,

    pub(crate) mean_motion_dot: f64,
    pub(crate) mean_motion_ddot: f64,
    pub(crate) bstar: f64,
    pub(crate) ephemeris_type: u8,
    pub(crate) element_set_number: u32,

    pub(crate) inclination: f64,
    pub(crate) right_ascension: f64,
    pub(crate) eccentricity: f64,
    pub(crate) argument_of_perigee: f64,
    pub(crate) mean_anomaly: f64,
    pub(crate) mean_motion: f64,
    pub(crate) revolution_number: u32,
}

impl OrbitalElementSet {
    /// Title line of a three-line block, if there was one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn satellite_number(&self) -> u32 {
        self.satellite_number
    }

    pub fn classification(&self) -> char {
        self.classification
    }

    pub fn international_designator(&self) -> &str {
        &self.international_designator
    }

    pub fn epoch_year(&self) -> i32 {
        self.epoch_year
    }

    pub fn epoch_day(&self) -> f64 {
        self.epoch_day
    }

    pub fn epoch(&self) -> JulianDate {
        JulianDate::from_tle_epoch(self.epoch_year, self.epoch_day)
    }

    /// `ndot/2`, rev/day^2.
    pub fn mean_motion_dot(&self) -> f64 {
        self.mean_motion_dot
    }

    /// `nddot/6`, rev/day^3.
    pub fn mean_motion_ddot(&self) -> f64 {
        self.mean_motion_ddot
    }

    pub fn bstar(&self) -> f64 {
        self.bstar
    }

    pub fn ephemeris_type(&self) -> u8 {
        self.ephemeris_type
    }

    pub fn element_set_number(&self) -> u32 {
        self.element_set_number
    }

    pub fn inclination(&self) -> f64 {
        self.inclination
    }

    pub fn right_ascension(&self) -> f64 {
        self.right_ascension
    }

    pub fn eccentricity(&self) -> f64 {
        self.eccentricity
    }

    pub fn argument_of_perigee(&self) -> f64 {
        self.argument_of_perigee
    }

    pub fn mean_anomaly(&self) -> f64 {
        self.mean_anomaly
    }

    /// Kozai mean motion, rev/day.
    pub fn mean_motion(&self) -> f64 {
        self.mean_motion
    }

    pub fn revolution_number(&self) -> u32 {
        self.revolution_number
    }

    /// Nominal (Kozai) orbital period in minutes.
    pub fn period_minutes(&self) -> f64 {
        1440.0 / self.mean_motion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_tle;

    const ISS1: &str = "1 25544U 98067A   19343.69339541  .00001764  00000-0  38792-4 0  9991";
    const ISS2: &str = "2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482";

    #[test]
    fn accessors_expose_parsed_fields() {
        let el = parse_tle(Some("ISS (ZARYA)"), ISS1, ISS2).unwrap();
        assert_eq!(el.name(), Some("ISS (ZARYA)"));
        assert_eq!(el.satellite_number(), 25544);
        assert_eq!(el.classification(), 'U');
        assert_eq!(el.international_designator(), "98067A");
        assert_eq!(el.epoch_year(), 2019);
        assert_eq!(el.epoch_day(), 343.69339541);
        assert_eq!(el.mean_motion_dot(), 0.00001764);
        assert_eq!(el.mean_motion_ddot(), 0.0);
        assert_eq!(el.ephemeris_type(), 0);
        assert_eq!(el.element_set_number(), 999);
        assert_eq!(el.inclination(), 51.6439);
        assert_eq!(el.right_ascension(), 211.2001);
        assert_eq!(el.argument_of_perigee(), 17.6667);
        assert_eq!(el.mean_anomaly(), 85.6398);
        assert_eq!(el.mean_motion(), 15.50103472);
        assert_eq!(el.revolution_number(), 20248);
        assert!((el.period_minutes() - 1440.0 / 15.50103472).abs() < 1e-12);
    }

    #[test]
    fn serde_keeps_every_field() {
        let el = parse_tle(Some("ISS (ZARYA)"), ISS1, ISS2).unwrap();
        let json = serde_json::to_string(&el).unwrap();
        let back: OrbitalElementSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, el);
    }
}
