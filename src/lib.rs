//! TLE parsing and an SGP4/SDP4 orbit propagator.
//!
//! ```no_run
//! use tle_sgp4::{parse_tle, Options, SatelliteRecord};
//!
//! let line1 = "1 25544U 98067A   19343.69339541  .00001764  00000-0  38792-4 0  9991";
//! let line2 = "2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482";
//!
//! let elements = parse_tle(Some("ISS (ZARYA)"), line1, line2)?;
//! let record = SatelliteRecord::new(&elements, Options::default())?;
//! let state = record.propagate(90.0).into_result()?;
//! println!("r = {:?} km, v = {:?} km/s", state.position, state.velocity);
//! # Ok::<(), tle_sgp4::Sgp4Error>(())
//! ```
//!
//! Positions and velocities are in the TEME frame of the element set.

pub mod alpha5;
pub mod config;
pub mod deep_space;
pub mod earth_gravity;
pub mod elements;
pub mod errors;
pub mod initializer;
pub mod io;
pub mod propagation;
pub mod time;

pub use config::{OperationMode, Options};
pub use deep_space::{Resonance, ResonanceState};
pub use earth_gravity::{EarthGravity, GravityModel};
pub use elements::OrbitalElementSet;
pub use errors::{Result, Sgp4Error};
pub use initializer::{Branch, SatelliteRecord};
pub use io::{format_tle, parse_catalog, parse_lines, parse_tle, CatalogEntry};
pub use propagation::{
    propagate, propagate_at, propagate_jd, propagate_series, propagate_with, DecayCause,
    NumericalFault, PropagationOutcome, StateVector,
};
pub use time::JulianDate;
