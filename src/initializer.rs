//! One-time setup of a satellite: recover Brouwer mean motion and the
//! secular/drag coefficients from the TLE mean elements, choose the
//! near-earth or deep-space branch and build the deep-space terms.

use std::f64::consts::PI;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{OperationMode, Options};
use crate::deep_space::{DeepSpaceInput, DeepSpaceTerms, Resonance};
use crate::earth_gravity::EarthGravity;
use crate::elements::OrbitalElementSet;
use crate::errors::{invalid_elements, Result};
use crate::io::parse_tle;
use crate::propagation::{propagate, PropagationOutcome};
use crate::time::{gstime, JulianDate, JD_1950, MINUTES_PER_DAY};

const TWOPI: f64 = 2.0 * PI;
const X2O3: f64 = 2.0 / 3.0;

/// Periods at or above this many minutes take the deep-space branch.
pub const DEEP_SPACE_PERIOD: f64 = 225.0;

/// rev/day -> rad/min
const XPDOTP: f64 = MINUTES_PER_DAY / TWOPI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Branch {
    NearEarth,
    DeepSpace,
}

/// Secular, drag and short-period coefficients used by every record.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct NearEarthTerms {
    /// Simplified drag model, for perigees below 220 km and deep space.
    pub isimp: bool,
    pub aycof: f64,
    pub con41: f64,
    pub cc1: f64,
    pub cc4: f64,
    pub cc5: f64,
    pub d2: f64,
    pub d3: f64,
    pub d4: f64,
    pub delmo: f64,
    pub eta: f64,
    pub argpdot: f64,
    pub omgcof: f64,
    pub sinmao: f64,
    pub t2cof: f64,
    pub t3cof: f64,
    pub t4cof: f64,
    pub t5cof: f64,
    pub x1mth2: f64,
    pub x7thm1: f64,
    pub mdot: f64,
    pub nodedot: f64,
    pub xlcof: f64,
    pub xmcof: f64,
    pub nodecf: f64,
}

/// Initialized propagator state for one element set.
///
/// Built once by [`SatelliteRecord::new`] and never modified afterwards;
/// propagation only reads it, so a record can be shared between threads.
/// To change elements, build a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct SatelliteRecord {
    elements: OrbitalElementSet,
    options: Options,
    epoch: JulianDate,
    pub(crate) gravity: EarthGravity,

    // mean elements at epoch, radians and radians/minute
    pub(crate) bstar: f64,
    pub(crate) ecco: f64,
    pub(crate) inclo: f64,
    pub(crate) nodeo: f64,
    pub(crate) argpo: f64,
    pub(crate) mo: f64,
    pub(crate) no_kozai: f64,
    pub(crate) no_unkozai: f64,
    /// Semi-major axis, earth radii.
    pub(crate) a: f64,
    /// Greenwich sidereal angle at epoch.
    pub(crate) gsto: f64,

    pub(crate) terms: NearEarthTerms,
    pub(crate) deep: Option<Box<DeepSpaceTerms>>,
}

/// Results of the Brouwer mean motion recovery.
struct Initl {
    no_unkozai: f64,
    ao: f64,
    con41: f64,
    con42: f64,
    cosio: f64,
    cosio2: f64,
    omeosq: f64,
    posq: f64,
    rp: f64,
    rteosq: f64,
    sinio: f64,
    gsto: f64,
}

fn initl(gravity: &EarthGravity, ecco: f64, epoch: f64, inclo: f64, no_kozai: f64, mode: OperationMode) -> Initl {
    let eccsq = ecco * ecco;
    let omeosq = 1.0 - eccsq;
    let rteosq = omeosq.sqrt();
    let cosio = inclo.cos();
    let cosio2 = cosio * cosio;

    // un-kozai the mean motion
    let ak = (gravity.xke / no_kozai).powf(X2O3);
    let d1 = 0.75 * gravity.j2 * (3.0 * cosio2 - 1.0) / (rteosq * omeosq);
    let del = d1 / (ak * ak);
    let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
    let del = d1 / (adel * adel);
    let no_unkozai = no_kozai / (1.0 + del);

    let ao = (gravity.xke / no_unkozai).powf(X2O3);
    let po = ao * omeosq;
    let con42 = 1.0 - 5.0 * cosio2;

    let gsto = match mode {
        OperationMode::Afspc => {
            // 1970-based sidereal time polynomial of the AFSPC code
            let ts70 = epoch - 7305.0;
            let ds70 = (ts70 + 1.0e-8).floor();
            let tfrac = ts70 - ds70;
            let c1 = 1.720_279_169_407_036_39e-2;
            let thgr70 = 1.732_134_385_650_937_4;
            let fk5r = 5.075_514_194_322_694_42e-15;
            let c1p2p = c1 + TWOPI;
            let gsto = (thgr70 + c1 * ds70 + c1p2p * tfrac + ts70 * ts70 * fk5r) % TWOPI;
            if gsto < 0.0 {
                gsto + TWOPI
            } else {
                gsto
            }
        }
        OperationMode::Improved => gstime(epoch + JD_1950),
    };

    Initl {
        no_unkozai,
        ao,
        con41: -con42 - cosio2 - cosio2,
        con42,
        cosio,
        cosio2,
        omeosq,
        posq: po * po,
        rp: ao * (1.0 - ecco),
        rteosq,
        sinio: inclo.sin(),
        gsto,
    }
}

fn check_elements(el: &OrbitalElementSet) -> Result<()> {
    let values = [
        ("inclination", el.inclination),
        ("right ascension", el.right_ascension),
        ("eccentricity", el.eccentricity),
        ("argument of perigee", el.argument_of_perigee),
        ("mean anomaly", el.mean_anomaly),
        ("mean motion", el.mean_motion),
        ("drag term", el.bstar),
        ("epoch day", el.epoch_day),
    ];
    if let Some((what, v)) = values.iter().find(|(_, v)| !v.is_finite()) {
        return Err(invalid_elements!("{what} is not a finite number ({v})"));
    }
    if !(0.0..1.0).contains(&el.eccentricity) {
        return Err(invalid_elements!(
            "eccentricity {} is outside [0, 1)",
            el.eccentricity
        ));
    }
    if !(0.0..=180.0).contains(&el.inclination) {
        return Err(invalid_elements!(
            "inclination {} deg is outside [0, 180]",
            el.inclination
        ));
    }
    if el.mean_motion <= 0.0 {
        return Err(invalid_elements!(
            "mean motion {} rev/day is not positive",
            el.mean_motion
        ));
    }
    Ok(())
}

impl SatelliteRecord {
    /// Initialize a record from parsed elements.
    ///
    /// Fails with `InvalidElements` for eccentricities outside [0, 1),
    /// inclinations outside [0, 180] degrees, non-positive mean motion, a
    /// perigee below the earth's surface, or elements whose epoch state
    /// cannot be propagated.
    pub fn new(elements: &OrbitalElementSet, options: Options) -> Result<Self> {
        check_elements(elements)?;

        let gravity = options.gravity.constants();
        let epoch = elements.epoch();
        let epoch_1950 = epoch.days_since_1950();

        let ecco = elements.eccentricity;
        let inclo = elements.inclination.to_radians();
        let nodeo = elements.right_ascension.to_radians();
        let argpo = elements.argument_of_perigee.to_radians();
        let mo = elements.mean_anomaly.to_radians();
        let no_kozai = elements.mean_motion / XPDOTP;
        let bstar = elements.bstar;

        let il = initl(&gravity, ecco, epoch_1950, inclo, no_kozai, options.mode);
        if il.rp < 1.0 {
            return Err(invalid_elements!(
                "perigee radius {:.3} km is below the earth's surface",
                il.rp * gravity.radius_earth_km
            ));
        }

        let radius = gravity.radius_earth_km;
        let ss = 78.0 / radius + 1.0;
        let qzms2t = ((120.0 - 78.0) / radius).powi(4);

        let mut t = NearEarthTerms {
            isimp: il.rp < 220.0 / radius + 1.0,
            con41: il.con41,
            ..NearEarthTerms::default()
        };

        // atmosphere density parameters for low perigees
        let mut sfour = ss;
        let mut qzms24 = qzms2t;
        let perige = (il.rp - 1.0) * radius;
        if perige < 156.0 {
            sfour = if perige < 98.0 { 20.0 } else { perige - 78.0 };
            qzms24 = ((120.0 - sfour) / radius).powi(4);
            sfour = sfour / radius + 1.0;
        }

        let ao = il.ao;
        let no = il.no_unkozai;
        let pinvsq = 1.0 / il.posq;
        let tsi = 1.0 / (ao - sfour);
        t.eta = ao * ecco * tsi;
        let etasq = t.eta * t.eta;
        let eeta = ecco * t.eta;
        let psisq = (1.0 - etasq).abs();
        let coef = qzms24 * tsi.powi(4);
        let coef1 = coef / psisq.powf(3.5);
        let cc2 = coef1
            * no
            * (ao * (1.0 + 1.5 * etasq + eeta * (4.0 + etasq))
                + 0.375 * gravity.j2 * tsi / psisq * t.con41 * (8.0 + 3.0 * etasq * (8.0 + etasq)));
        t.cc1 = bstar * cc2;
        let cc3 = if ecco > 1.0e-4 {
            -2.0 * coef * tsi * gravity.j3oj2 * no * il.sinio / ecco
        } else {
            0.0
        };
        t.x1mth2 = 1.0 - il.cosio2;
        t.cc4 = 2.0
            * no
            * coef1
            * ao
            * il.omeosq
            * (t.eta * (2.0 + 0.5 * etasq) + ecco * (0.5 + 2.0 * etasq)
                - gravity.j2 * tsi / (ao * psisq)
                    * (-3.0 * t.con41 * (1.0 - 2.0 * eeta + etasq * (1.5 - 0.5 * eeta))
                        + 0.75 * t.x1mth2 * (2.0 * etasq - eeta * (1.0 + etasq)) * (2.0 * argpo).cos()));
        t.cc5 = 2.0 * coef1 * ao * il.omeosq * (1.0 + 2.75 * (etasq + eeta) + eeta * etasq);

        let cosio = il.cosio;
        let cosio2 = il.cosio2;
        let cosio4 = cosio2 * cosio2;
        let temp1 = 1.5 * gravity.j2 * pinvsq * no;
        let temp2 = 0.5 * temp1 * gravity.j2 * pinvsq;
        let temp3 = -0.46875 * gravity.j4 * pinvsq * pinvsq * no;
        t.mdot = no
            + 0.5 * temp1 * il.rteosq * t.con41
            + 0.0625 * temp2 * il.rteosq * (13.0 - 78.0 * cosio2 + 137.0 * cosio4);
        t.argpdot = -0.5 * temp1 * il.con42
            + 0.0625 * temp2 * (7.0 - 114.0 * cosio2 + 395.0 * cosio4)
            + temp3 * (3.0 - 36.0 * cosio2 + 49.0 * cosio4);
        let xhdot1 = -temp1 * cosio;
        t.nodedot =
            xhdot1 + (0.5 * temp2 * (4.0 - 19.0 * cosio2) + 2.0 * temp3 * (3.0 - 7.0 * cosio2)) * cosio;
        t.omgcof = bstar * cc3 * argpo.cos();
        t.xmcof = if ecco > 1.0e-4 {
            -X2O3 * coef * bstar / eeta
        } else {
            0.0
        };
        t.nodecf = 3.5 * il.omeosq * xhdot1 * t.cc1;
        t.t2cof = 1.5 * t.cc1;
        t.xlcof = lcof(gravity.j3oj2, il.sinio, cosio);
        t.aycof = -0.5 * gravity.j3oj2 * il.sinio;
        let delmotemp = 1.0 + t.eta * mo.cos();
        t.delmo = delmotemp * delmotemp * delmotemp;
        t.sinmao = mo.sin();
        t.x7thm1 = 7.0 * cosio2 - 1.0;

        let deep = if TWOPI / no >= DEEP_SPACE_PERIOD {
            t.isimp = true;
            Some(Box::new(DeepSpaceTerms::new(&DeepSpaceInput {
                epoch: epoch_1950,
                ecco,
                inclo,
                nodeo,
                argpo,
                mo,
                no_unkozai: no,
                mdot: t.mdot,
                nodedot: t.nodedot,
                argpdot: t.argpdot,
                gsto: il.gsto,
                xke: gravity.xke,
            })))
        } else {
            None
        };

        if !t.isimp {
            let cc1sq = t.cc1 * t.cc1;
            t.d2 = 4.0 * ao * tsi * cc1sq;
            let temp = t.d2 * tsi * t.cc1 / 3.0;
            t.d3 = (17.0 * ao + sfour) * temp;
            t.d4 = 0.5 * temp * ao * tsi * (221.0 * ao + 31.0 * sfour) * t.cc1;
            t.t3cof = t.d2 + 2.0 * cc1sq;
            t.t4cof = 0.25 * (3.0 * t.d3 + t.cc1 * (12.0 * t.d2 + 10.0 * cc1sq));
            t.t5cof = 0.2
                * (3.0 * t.d4 + 12.0 * t.cc1 * t.d3 + 6.0 * t.d2 * t.d2 + 15.0 * cc1sq * (2.0 * t.d2 + cc1sq));
        }

        let record = SatelliteRecord {
            elements: elements.clone(),
            options,
            epoch,
            gravity,
            bstar,
            ecco,
            inclo,
            nodeo,
            argpo,
            mo,
            no_kozai,
            no_unkozai: no,
            a: (no * gravity.tumin).powf(-X2O3),
            gsto: il.gsto,
            terms: t,
            deep,
        };

        match propagate(&record, 0.0) {
            PropagationOutcome::Success(_) => {}
            PropagationOutcome::Decayed(cause) => {
                return Err(invalid_elements!("epoch state is already decayed: {cause}"))
            }
            PropagationOutcome::NumericalError(fault) => {
                return Err(invalid_elements!("epoch state cannot be computed: {fault}"))
            }
        }

        debug!(
            "initialized satellite {}: {:?} branch, period {:.3} min, resonance {:?}, simplified drag {}",
            record.elements.satellite_number,
            record.branch(),
            record.period_minutes(),
            record.resonance(),
            record.terms.isimp,
        );
        Ok(record)
    }

    /// Parse two TLE lines and initialize a record from them.
    pub fn from_tle(line1: &str, line2: &str, options: Options) -> Result<Self> {
        let elements = parse_tle(None, line1, line2)?;
        SatelliteRecord::new(&elements, options)
    }

    /// The element set this record was built from.
    pub fn elements(&self) -> &OrbitalElementSet {
        &self.elements
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn gravity(&self) -> &EarthGravity {
        &self.gravity
    }

    pub fn epoch(&self) -> JulianDate {
        self.epoch
    }

    pub fn branch(&self) -> Branch {
        if self.deep.is_some() {
            Branch::DeepSpace
        } else {
            Branch::NearEarth
        }
    }

    pub fn resonance(&self) -> Resonance {
        self.deep
            .as_ref()
            .map_or(Resonance::NonResonant, |d| d.resonance())
    }

    /// Brouwer mean motion, radians per minute.
    pub fn mean_motion(&self) -> f64 {
        self.no_unkozai
    }

    /// Kozai mean motion as given by the TLE, radians per minute.
    pub fn kozai_mean_motion(&self) -> f64 {
        self.no_kozai
    }

    /// Anomalistic period from the Brouwer mean motion; this is the value
    /// compared against 225 minutes for branch selection.
    pub fn period_minutes(&self) -> f64 {
        TWOPI / self.no_unkozai
    }

    pub fn semi_major_axis_km(&self) -> f64 {
        self.a * self.gravity.radius_earth_km
    }

    pub fn perigee_altitude_km(&self) -> f64 {
        (self.a * (1.0 - self.ecco) - 1.0) * self.gravity.radius_earth_km
    }

    pub fn apogee_altitude_km(&self) -> f64 {
        (self.a * (1.0 + self.ecco) - 1.0) * self.gravity.radius_earth_km
    }
}

/// Long-period mean longitude coefficient, guarded for inclinations near 180 deg.
pub(crate) fn lcof(j3oj2: f64, sinio: f64, cosio: f64) -> f64 {
    const TEMP4: f64 = 1.5e-12;
    let denom = if (cosio + 1.0).abs() > TEMP4 {
        1.0 + cosio
    } else {
        TEMP4
    };
    -0.25 * j3oj2 * sinio * (3.0 + 5.0 * cosio) / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::earth_gravity::GravityModel;
    use crate::errors::Sgp4Error;
    use crate::io::parse_tle;

    const ISS1: &str = "1 25544U 98067A   19343.69339541  .00001764  00000-0  38792-4 0  9991";
    const ISS2: &str = "2 25544  51.6439 211.2001 0007417  17.6667  85.6398 15.50103472202482";

    fn iss() -> OrbitalElementSet {
        parse_tle(Some("ISS (ZARYA)"), ISS1, ISS2).unwrap()
    }

    fn approx(expected: f64, got: f64, eps: f64) {
        let diff = (expected - got).abs();
        assert!(diff <= eps, "expected {expected}, got {got} (|Δ| = {diff})");
    }

    fn assert_invalid(result: Result<SatelliteRecord>) {
        match result {
            Err(Sgp4Error::InvalidElements(_)) => {}
            other => panic!("expected InvalidElements, got {other:?}"),
        }
    }

    #[test]
    fn iss_is_near_earth() {
        let rec = SatelliteRecord::new(&iss(), Options::default()).unwrap();
        assert_eq!(rec.branch(), Branch::NearEarth);
        assert_eq!(rec.resonance(), Resonance::NonResonant);
        assert!(!rec.terms.isimp);

        // ~92.9 minute orbit around 420 km
        approx(92.9, rec.period_minutes(), 0.2);
        assert!(rec.perigee_altitude_km() > 380.0 && rec.perigee_altitude_km() < 440.0);
        assert!(rec.apogee_altitude_km() > rec.perigee_altitude_km());
        approx(
            rec.semi_major_axis_km(),
            0.5 * (rec.perigee_altitude_km() + rec.apogee_altitude_km()) + rec.gravity().radius_earth_km,
            1e-9,
        );
    }

    #[test]
    fn brouwer_mean_motion_is_slightly_below_kozai_for_low_inclination() {
        let rec = SatelliteRecord::new(&iss(), Options::default()).unwrap();
        // 3cos^2(i) - 1 > 0 at 51.6 deg, so the correction lowers n
        assert!(rec.mean_motion() < rec.kozai_mean_motion());
        approx(rec.kozai_mean_motion(), rec.mean_motion(), 1e-5);
    }

    #[test]
    fn geosynchronous_is_deep_space_and_resonant() {
        let mut el = iss();
        el.mean_motion = 1.002_714_6;
        el.eccentricity = 0.0002;
        el.inclination = 0.05;
        el.bstar = 0.0;
        let rec = SatelliteRecord::new(&el, Options::default()).unwrap();
        assert_eq!(rec.branch(), Branch::DeepSpace);
        assert_eq!(rec.resonance(), Resonance::Synchronous);
        assert!(rec.terms.isimp);
        approx(42_164.0, rec.semi_major_axis_km(), 30.0);
    }

    #[test]
    fn molniya_is_half_day_resonant() {
        let mut el = iss();
        el.mean_motion = 2.006_3;
        el.eccentricity = 0.72;
        el.inclination = 63.4;
        el.argument_of_perigee = 270.0;
        el.bstar = 0.0;
        let rec = SatelliteRecord::new(&el, Options::default()).unwrap();
        assert_eq!(rec.branch(), Branch::DeepSpace);
        assert_eq!(rec.resonance(), Resonance::HalfDay);
    }

    #[test]
    fn rejects_unphysical_elements() {
        let mut el = iss();
        el.eccentricity = 1.0;
        assert_invalid(SatelliteRecord::new(&el, Options::default()));

        let mut el = iss();
        el.eccentricity = -0.1;
        assert_invalid(SatelliteRecord::new(&el, Options::default()));

        let mut el = iss();
        el.inclination = 180.5;
        assert_invalid(SatelliteRecord::new(&el, Options::default()));

        let mut el = iss();
        el.mean_motion = 0.0;
        assert_invalid(SatelliteRecord::new(&el, Options::default()));

        let mut el = iss();
        el.mean_anomaly = f64::NAN;
        assert_invalid(SatelliteRecord::new(&el, Options::default()));
    }

    #[test]
    fn rejects_perigee_inside_the_earth() {
        let mut el = iss();
        el.mean_motion = 16.5;
        el.eccentricity = 0.1;
        assert_invalid(SatelliteRecord::new(&el, Options::default()));
    }

    #[test]
    fn initialization_is_deterministic() {
        let el = iss();
        let a = SatelliteRecord::new(&el, Options::default()).unwrap();
        let b = SatelliteRecord::new(&el, Options::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn gravity_model_changes_derived_constants() {
        let el = iss();
        let w72 = SatelliteRecord::new(&el, Options::default()).unwrap();
        let w84 = SatelliteRecord::new(&el, Options::new(GravityModel::Wgs84, OperationMode::Improved)).unwrap();
        assert_ne!(w72.terms.mdot, w84.terms.mdot);
        assert_eq!(w84.options().gravity, GravityModel::Wgs84);
    }

    #[test]
    fn afspc_and_improved_sidereal_times_agree_closely() {
        let el = iss();
        let a = SatelliteRecord::new(&el, Options::new(GravityModel::Wgs72, OperationMode::Afspc)).unwrap();
        let i = SatelliteRecord::new(&el, Options::default()).unwrap();
        approx(a.gsto, i.gsto, 1e-6);
    }

    #[test]
    fn from_tle_parses_then_initializes() {
        let rec = SatelliteRecord::from_tle(ISS1, ISS2, Options::default()).unwrap();
        assert_eq!(rec.elements().satellite_number, 25_544);
        assert!(rec.elements().name.is_none());

        let truncated = &ISS1[..60];
        assert!(matches!(
            SatelliteRecord::from_tle(truncated, ISS2, Options::default()),
            Err(Sgp4Error::MalformedTle(_))
        ));
    }

    #[test]
    fn record_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SatelliteRecord>();
    }
}
