//! Propagator options: which gravity constants to use and which
//! operation mode the sidereal time and node handling follow.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::earth_gravity::GravityModel;
use crate::errors::Sgp4Error;

/// `Afspc` reproduces the legacy AFSPC behavior (older sidereal time
/// polynomial, node wrapped to positive values in the Lyddane branch),
/// `Improved` uses the modern IAU sidereal time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    Afspc,
    #[default]
    Improved,
}

impl FromStr for OperationMode {
    type Err = Sgp4Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "a" | "afspc" => Ok(OperationMode::Afspc),
            "i" | "improved" => Ok(OperationMode::Improved),
            other => Err(Sgp4Error::Config(format!(
                "unknown operation mode '{other}' (use a or i)"
            ))),
        }
    }
}

/// Everything that parameterizes initialization besides the elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub gravity: GravityModel,
    pub mode: OperationMode,
}

impl Options {
    pub fn new(gravity: GravityModel, mode: OperationMode) -> Self {
        Options { gravity, mode }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_wgs72_improved() {
        let opts = Options::default();
        assert_eq!(opts.gravity, GravityModel::Wgs72);
        assert_eq!(opts.mode, OperationMode::Improved);
    }

    #[test]
    fn options_deserialize_with_partial_fields() {
        let opts: Options = serde_json::from_str(r#"{ "gravity": "wgs84" }"#).unwrap();
        assert_eq!(opts, Options::new(GravityModel::Wgs84, OperationMode::Improved));

        let opts: Options =
            serde_json::from_str(r#"{ "gravity": "wgs72old", "mode": "afspc" }"#).unwrap();
        assert_eq!(opts, Options::new(GravityModel::Wgs72Old, OperationMode::Afspc));
    }

    #[test]
    fn operation_mode_from_str() {
        assert_eq!("a".parse::<OperationMode>().unwrap(), OperationMode::Afspc);
        assert_eq!("improved".parse::<OperationMode>().unwrap(), OperationMode::Improved);
        assert!(matches!("x".parse::<OperationMode>(), Err(Sgp4Error::Config(_))));
    }
}
