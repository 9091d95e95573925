//! The SGP4/SDP4 propagation kernel.
//!
//! Every entry point is a pure function of the record, the time offset and
//! (for resonant deep-space orbits) a caller-owned [`ResonanceState`]. The
//! record itself is never written, so one record can serve any number of
//! threads.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deep_space::{MeanElements, Perturbed, ResonanceState};
use crate::errors::{Result, Sgp4Error};
use crate::initializer::{lcof, SatelliteRecord};
use crate::time::JulianDate;

const TWOPI: f64 = 2.0 * PI;
const X2O3: f64 = 2.0 / 3.0;

/// Convergence tolerance of the Kepler solver, radians.
pub const KEPLER_TOLERANCE: f64 = 1.0e-12;
pub const KEPLER_MAX_ITERATIONS: u32 = 25;

/// Position (km) and velocity (km/s) in the TEME frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateVector {
    /// Minutes since epoch this state belongs to.
    pub tsince: f64,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

impl StateVector {
    pub fn radius(&self) -> f64 {
        norm(&self.position)
    }

    pub fn speed(&self) -> f64 {
        norm(&self.velocity)
    }
}

fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Why a propagation reports the satellite as decayed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DecayCause {
    #[error("mean motion {mean_motion} rad/min is not positive")]
    NonPositiveMeanMotion { mean_motion: f64 },

    #[error("mean perigee radius {radius_km:.3} km is below the earth's surface")]
    PerigeeBelowSurface { radius_km: f64 },

    #[error("radius {radius_km:.3} km is below the earth's surface")]
    RadiusBelowSurface { radius_km: f64 },
}

/// A breakdown of the kernel's numerics.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NumericalFault {
    #[error("Kepler's equation did not converge in {iterations} iterations (last step {last_step:e})")]
    KeplerNotConverged { iterations: u32, last_step: f64 },

    #[error("mean eccentricity {eccentricity} not within range 0.0 <= e < 1.0")]
    MeanEccentricity { eccentricity: f64 },

    #[error("perturbed eccentricity {eccentricity} not within range 0.0 <= e <= 1.0")]
    PerturbedEccentricity { eccentricity: f64 },

    #[error("semi-latus rectum {value} is less than zero")]
    SemiLatusRectum { value: f64 },

    #[error("time offset {tsince} min is not a finite number")]
    NonFiniteTime { tsince: f64 },
}

/// Result of one propagation query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PropagationOutcome {
    Success(StateVector),
    Decayed(DecayCause),
    NumericalError(NumericalFault),
}

impl PropagationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PropagationOutcome::Success(_))
    }

    pub fn state(&self) -> Option<&StateVector> {
        match self {
            PropagationOutcome::Success(sv) => Some(sv),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<StateVector> {
        match self {
            PropagationOutcome::Success(sv) => Ok(sv),
            PropagationOutcome::Decayed(cause) => Err(Sgp4Error::Decayed(cause)),
            PropagationOutcome::NumericalError(fault) => Err(Sgp4Error::Numerical(fault)),
        }
    }
}

/// Propagate to `tsince` minutes from epoch, starting any resonance
/// integration from epoch.
pub fn propagate(record: &SatelliteRecord, tsince: f64) -> PropagationOutcome {
    propagate_with(record, tsince, &mut ResonanceState::default())
}

/// Propagate to `tsince` threading a caller-owned resonance accumulator.
///
/// For a sequence of increasing offsets this saves re-integrating from
/// epoch each time; results are identical to [`propagate`].
pub fn propagate_with(
    record: &SatelliteRecord,
    tsince: f64,
    state: &mut ResonanceState,
) -> PropagationOutcome {
    // the resonance integrator steps towards tsince and would never arrive
    let outcome = if tsince.is_finite() {
        sgp4(record, tsince, state)
    } else {
        PropagationOutcome::NumericalError(NumericalFault::NonFiniteTime { tsince })
    };
    match &outcome {
        PropagationOutcome::Success(_) => {}
        PropagationOutcome::Decayed(cause) => trace!(
            "satellite {} at {tsince} min: decayed, {cause}",
            record.elements().satellite_number
        ),
        PropagationOutcome::NumericalError(fault) => trace!(
            "satellite {} at {tsince} min: {fault}",
            record.elements().satellite_number
        ),
    }
    outcome
}

/// Propagate to each offset in turn with one shared accumulator.
pub fn propagate_series(record: &SatelliteRecord, times: &[f64]) -> Vec<PropagationOutcome> {
    let mut state = ResonanceState::default();
    times
        .iter()
        .map(|&t| propagate_with(record, t, &mut state))
        .collect()
}

/// Propagate to a Julian date.
pub fn propagate_jd(record: &SatelliteRecord, jd: &JulianDate) -> PropagationOutcome {
    propagate(record, jd.minutes_since(&record.epoch()))
}

/// Propagate to a UTC instant.
pub fn propagate_at(record: &SatelliteRecord, instant: &DateTime<Utc>) -> PropagationOutcome {
    propagate_jd(record, &JulianDate::from_datetime(instant))
}

impl SatelliteRecord {
    pub fn propagate(&self, tsince: f64) -> PropagationOutcome {
        propagate(self, tsince)
    }

    pub fn propagate_at(&self, instant: &DateTime<Utc>) -> PropagationOutcome {
        propagate_at(self, instant)
    }
}

/// Solve Kepler's equation for the modified eccentric anomaly `E + ω`
/// given `u` and the Lyddane components `axnl = e cos ω`, `aynl = e sin ω`.
fn solve_kepler(u: f64, axnl: f64, aynl: f64) -> std::result::Result<f64, NumericalFault> {
    let mut eo1 = u;
    for _ in 0..KEPLER_MAX_ITERATIONS {
        let sineo1 = eo1.sin();
        let coseo1 = eo1.cos();
        let mut tem5 = 1.0 - coseo1 * axnl - sineo1 * aynl;
        tem5 = (u - aynl * coseo1 + axnl * sineo1 - eo1) / tem5;
        if tem5.abs() >= 0.95 {
            tem5 = if tem5 > 0.0 { 0.95 } else { -0.95 };
        }
        eo1 += tem5;
        if tem5.abs() < KEPLER_TOLERANCE {
            return Ok(eo1);
        }
    }

    // report the size of one more step to show how far off we are
    let tem5 = (u - aynl * eo1.cos() + axnl * eo1.sin() - eo1)
        / (1.0 - eo1.cos() * axnl - eo1.sin() * aynl);
    Err(NumericalFault::KeplerNotConverged {
        iterations: KEPLER_MAX_ITERATIONS,
        last_step: tem5,
    })
}

fn sgp4(record: &SatelliteRecord, t: f64, state: &mut ResonanceState) -> PropagationOutcome {
    let tm = &record.terms;
    let g = &record.gravity;

    // secular gravity and atmospheric drag
    let xmdf = record.mo + tm.mdot * t;
    let argpdf = record.argpo + tm.argpdot * t;
    let nodedf = record.nodeo + tm.nodedot * t;
    let mut argpm = argpdf;
    let mut mm = xmdf;
    let t2 = t * t;
    let mut nodem = nodedf + tm.nodecf * t2;
    let mut tempa = 1.0 - tm.cc1 * t;
    let mut tempe = record.bstar * tm.cc4 * t;
    let mut templ = tm.t2cof * t2;

    if !tm.isimp {
        let delomg = tm.omgcof * t;
        let delmtemp = 1.0 + tm.eta * xmdf.cos();
        let delm = tm.xmcof * (delmtemp * delmtemp * delmtemp - tm.delmo);
        let temp = delomg + delm;
        mm = xmdf + temp;
        argpm = argpdf - temp;
        let t3 = t2 * t;
        let t4 = t3 * t;
        tempa = tempa - tm.d2 * t2 - tm.d3 * t3 - tm.d4 * t4;
        tempe += record.bstar * tm.cc5 * (mm.sin() - tm.sinmao);
        templ = templ + tm.t3cof * t3 + t4 * (tm.t4cof + t * tm.t5cof);
    }

    let mut nm = record.no_unkozai;
    let mut em = record.ecco;
    let mut inclm = record.inclo;

    if let Some(deep) = &record.deep {
        let mut mean = MeanElements {
            em,
            argpm,
            inclm,
            mm,
            nodem,
            nm,
        };
        deep.secular(t, record.argpo, tm.argpdot, record.no_unkozai, state, &mut mean);
        em = mean.em;
        argpm = mean.argpm;
        inclm = mean.inclm;
        mm = mean.mm;
        nodem = mean.nodem;
        nm = mean.nm;
    }

    if nm <= 0.0 {
        return PropagationOutcome::Decayed(DecayCause::NonPositiveMeanMotion { mean_motion: nm });
    }

    let am = (g.xke / nm).powf(X2O3) * tempa * tempa;
    nm = g.xke / am.powf(1.5);
    em -= tempe;

    if em >= 1.0 || em < -0.001 {
        return PropagationOutcome::NumericalError(NumericalFault::MeanEccentricity {
            eccentricity: em,
        });
    }
    if em < 1.0e-6 {
        em = 1.0e-6;
    }
    if am * (1.0 - em) < 1.0 {
        return PropagationOutcome::Decayed(DecayCause::PerigeeBelowSurface {
            radius_km: am * (1.0 - em) * g.radius_earth_km,
        });
    }

    mm += record.no_unkozai * templ;
    let xlm = (mm + argpm + nodem) % TWOPI;
    nodem %= TWOPI;
    argpm %= TWOPI;
    mm = (xlm - argpm - nodem) % TWOPI;

    let mut p = Perturbed {
        ep: em,
        inclp: inclm,
        nodep: nodem,
        argpp: argpm,
        mp: mm,
    };
    let mut sinip = inclm.sin();
    let mut cosip = inclm.cos();
    let mut aycof = tm.aycof;
    let mut xlcof = tm.xlcof;
    let mut con41 = tm.con41;
    let mut x1mth2 = tm.x1mth2;
    let mut x7thm1 = tm.x7thm1;

    if let Some(deep) = &record.deep {
        deep.periodics(t, record.options().mode, &mut p);
        if p.inclp < 0.0 {
            p.inclp = -p.inclp;
            p.nodep += PI;
            p.argpp -= PI;
        }
        if p.ep < 0.0 || p.ep > 1.0 {
            return PropagationOutcome::NumericalError(NumericalFault::PerturbedEccentricity {
                eccentricity: p.ep,
            });
        }

        // long-period and short-period coefficients follow the perturbed inclination
        sinip = p.inclp.sin();
        cosip = p.inclp.cos();
        aycof = -0.5 * g.j3oj2 * sinip;
        xlcof = lcof(g.j3oj2, sinip, cosip);
        let cosisq = cosip * cosip;
        con41 = 3.0 * cosisq - 1.0;
        x1mth2 = 1.0 - cosisq;
        x7thm1 = 7.0 * cosisq - 1.0;
    }

    // long-period periodics
    let axnl = p.ep * p.argpp.cos();
    let temp = 1.0 / (am * (1.0 - p.ep * p.ep));
    let aynl = p.ep * p.argpp.sin() + temp * aycof;
    let xl = p.mp + p.argpp + p.nodep + temp * xlcof * axnl;

    let u = (xl - p.nodep) % TWOPI;
    let eo1 = match solve_kepler(u, axnl, aynl) {
        Ok(eo1) => eo1,
        Err(fault) => return PropagationOutcome::NumericalError(fault),
    };

    // short-period preliminary quantities
    let sineo1 = eo1.sin();
    let coseo1 = eo1.cos();
    let ecose = axnl * coseo1 + aynl * sineo1;
    let esine = axnl * sineo1 - aynl * coseo1;
    let el2 = axnl * axnl + aynl * aynl;
    let pl = am * (1.0 - el2);
    if pl < 0.0 {
        return PropagationOutcome::NumericalError(NumericalFault::SemiLatusRectum { value: pl });
    }

    let rl = am * (1.0 - ecose);
    let rdotl = am.sqrt() * esine / rl;
    let rvdotl = pl.sqrt() / rl;
    let betal = (1.0 - el2).sqrt();
    let temp = esine / (1.0 + betal);
    let sinu = am / rl * (sineo1 - aynl - axnl * temp);
    let cosu = am / rl * (coseo1 - axnl + aynl * temp);
    let su = sinu.atan2(cosu);
    let sin2u = (cosu + cosu) * sinu;
    let cos2u = 1.0 - 2.0 * sinu * sinu;
    let temp = 1.0 / pl;
    let temp1 = 0.5 * g.j2 * temp;
    let temp2 = temp1 * temp;

    // short-period periodics
    let mrt = rl * (1.0 - 1.5 * temp2 * betal * con41) + 0.5 * temp1 * x1mth2 * cos2u;
    let su = su - 0.25 * temp2 * x7thm1 * sin2u;
    let xnode = p.nodep + 1.5 * temp2 * cosip * sin2u;
    let xinc = p.inclp + 1.5 * temp2 * cosip * sinip * cos2u;
    let mvt = rdotl - nm * temp1 * x1mth2 * sin2u / g.xke;
    let rvdot = rvdotl + nm * temp1 * (x1mth2 * cos2u + 1.5 * con41) / g.xke;

    if mrt < 1.0 {
        return PropagationOutcome::Decayed(DecayCause::RadiusBelowSurface {
            radius_km: mrt * g.radius_earth_km,
        });
    }

    // orientation vectors
    let sinsu = su.sin();
    let cossu = su.cos();
    let snod = xnode.sin();
    let cnod = xnode.cos();
    let sini = xinc.sin();
    let cosi = xinc.cos();
    let xmx = -snod * cosi;
    let xmy = cnod * cosi;
    let ux = xmx * sinsu + cnod * cossu;
    let uy = xmy * sinsu + snod * cossu;
    let uz = sini * sinsu;
    let vx = xmx * cossu - cnod * sinsu;
    let vy = xmy * cossu - snod * sinsu;
    let vz = sini * cossu;

    let mr = mrt * g.radius_earth_km;
    let vkmpersec = g.km_per_sec();
    PropagationOutcome::Success(StateVector {
        tsince: t,
        position: [mr * ux, mr * uy, mr * uz],
        velocity: [
            (mvt * ux + rvdot * vx) * vkmpersec,
            (mvt * uy + rvdot * vy) * vkmpersec,
            (mvt * uz + rvdot * vz) * vkmpersec,
        ],
    })
}
