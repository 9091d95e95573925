use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::Sgp4Error;

/// The geopotential constant sets SGP4 has historically been run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GravityModel {
    Wgs72Old,
    #[default]
    Wgs72,
    Wgs84,
}

/// Earth gravity model parameters used by SGP4.
///
/// `tumin` is minutes per time unit, `xke` its inverse (sqrt(mu) in earth
/// radii^1.5 per minute), `mu` is in km^3/s^2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarthGravity {
    pub tumin: f64,
    pub mu: f64,
    pub radius_earth_km: f64,
    pub xke: f64,
    pub j2: f64,
    pub j3: f64,
    pub j4: f64,
    pub j3oj2: f64,
}

impl EarthGravity {
    fn from_parts(mu: f64, radius_earth_km: f64, xke: f64, j2: f64, j3: f64, j4: f64) -> Self {
        EarthGravity {
            tumin: 1.0 / xke,
            mu,
            radius_earth_km,
            xke,
            j2,
            j3,
            j4,
            j3oj2: j3 / j2,
        }
    }

    /// Velocity scale: earth radii per minute to km/s.
    pub fn km_per_sec(&self) -> f64 {
        self.radius_earth_km * self.xke / 60.0
    }
}

impl GravityModel {
    pub fn constants(self) -> EarthGravity {
        match self {
            GravityModel::Wgs72Old => EarthGravity::from_parts(
                398_600.799_64,
                6378.135,
                0.074_366_916_1,
                0.001_082_616,
                -0.000_002_538_81,
                -0.000_001_655_97,
            ),
            GravityModel::Wgs72 => {
                let mu = 398_600.8_f64;
                let radius = 6378.135_f64;
                EarthGravity::from_parts(
                    mu,
                    radius,
                    60.0 / (radius * radius * radius / mu).sqrt(),
                    0.001_082_616,
                    -0.000_002_538_81,
                    -0.000_001_655_97,
                )
            }
            GravityModel::Wgs84 => {
                let mu = 398_600.5_f64;
                let radius = 6378.137_f64;
                EarthGravity::from_parts(
                    mu,
                    radius,
                    60.0 / (radius * radius * radius / mu).sqrt(),
                    0.001_082_629_989_05,
                    -0.000_002_532_153_06,
                    -0.000_001_610_987_61,
                )
            }
        }
    }
}

impl FromStr for GravityModel {
    type Err = Sgp4Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgs72old" => Ok(GravityModel::Wgs72Old),
            "wgs72" => Ok(GravityModel::Wgs72),
            "wgs84" => Ok(GravityModel::Wgs84),
            other => Err(Sgp4Error::Config(format!(
                "unknown gravity model '{other}' (use wgs72old, wgs72, wgs84)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "expected {b}, got {a}");
    }

    #[test]
    fn wgs72_derives_xke_from_mu_and_radius() {
        let g = GravityModel::Wgs72.constants();
        approx_eq(g.xke, 0.074_366_916_133_173_42, 1e-15);
        approx_eq(g.tumin * g.xke, 1.0, 1e-15);
        approx_eq(g.j3oj2, -0.000_002_538_81 / 0.001_082_616, 1e-18);
    }

    #[test]
    fn wgs72old_uses_published_xke() {
        let g = GravityModel::Wgs72Old.constants();
        assert_eq!(g.xke, 0.074_366_916_1);
        assert_eq!(g.radius_earth_km, 6378.135);
    }

    #[test]
    fn models_differ_in_radius_and_j2() {
        let g72 = GravityModel::Wgs72.constants();
        let g84 = GravityModel::Wgs84.constants();
        assert!(g84.radius_earth_km > g72.radius_earth_km);
        assert!(g84.j2 > g72.j2);
    }

    #[test]
    fn parses_model_names() {
        assert_eq!("wgs84".parse::<GravityModel>().unwrap(), GravityModel::Wgs84);
        assert_eq!("WGS72".parse::<GravityModel>().unwrap(), GravityModel::Wgs72);
        assert!("egm96".parse::<GravityModel>().is_err());
    }
}
