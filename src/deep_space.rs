//! Deep-space (SDP4) terms for orbits with periods of 225 minutes or more:
//! lunar-solar periodics and their secular rates, plus the integrator for
//! one-day (geosynchronous) and half-day (Molniya-type) resonances.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::OperationMode;

const TWOPI: f64 = 2.0 * PI;
const X2O3: f64 = 2.0 / 3.0;

// solar and lunar mean motions (rad/min) and orbit eccentricities
const ZNS: f64 = 1.19459e-5;
const ZES: f64 = 0.01675;
const ZNL: f64 = 1.5835218e-4;
const ZEL: f64 = 0.05490;

/// Earth rotation rate, rad/min.
const RPTIM: f64 = 4.375_269_088_011_299_66e-3;

/// Inclinations this close to 0 or 180 degrees drop the node rate terms.
const INCL_GUARD: f64 = 5.235_987_7e-2;

/// Resonance class selected at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resonance {
    NonResonant,
    /// One-day period, geosynchronous.
    Synchronous,
    /// Half-day period with eccentricity >= 0.5.
    HalfDay,
}

/// Accumulator of the resonance integrator.
///
/// The integrator steps in 720 minute increments from epoch. A state left
/// behind by an earlier call is resumed when the new offset lies further
/// out on the same side of epoch; otherwise integration restarts from
/// epoch, so a fresh (default) state and a resumed one give the same result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResonanceState {
    /// Minutes since epoch the integration has reached.
    pub time: f64,
    /// Integrated resonance mean longitude, radians.
    pub longitude: f64,
    /// Integrated mean motion, radians/minute.
    pub mean_motion: f64,
}

/// Mean elements at the query time, updated in place by the secular pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MeanElements {
    pub em: f64,
    pub argpm: f64,
    pub inclm: f64,
    pub mm: f64,
    pub nodem: f64,
    pub nm: f64,
}

/// Elements after the lunar-solar periodics are applied.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Perturbed {
    pub ep: f64,
    pub inclp: f64,
    pub nodep: f64,
    pub argpp: f64,
    pub mp: f64,
}

/// Intermediate products of one perturbing body (sun or moon).
#[derive(Debug, Clone, Copy, Default)]
struct BodyTerms {
    s1: f64,
    s2: f64,
    s3: f64,
    s4: f64,
    s5: f64,
    s6: f64,
    s7: f64,
    z1: f64,
    z2: f64,
    z3: f64,
    z11: f64,
    z12: f64,
    z13: f64,
    z21: f64,
    z22: f64,
    z23: f64,
    z31: f64,
    z32: f64,
    z33: f64,
}

/// Orientation of a perturbing body's orbit and its coupling constant.
struct BodyOrientation {
    zcosg: f64,
    zsing: f64,
    zcosi: f64,
    zsini: f64,
    zcosh: f64,
    zsinh: f64,
    cc: f64,
}

/// Satellite quantities shared by both bodies.
struct SatelliteGeometry {
    em: f64,
    emsq: f64,
    betasq: f64,
    rtemsq: f64,
    sinim: f64,
    cosim: f64,
    sinomm: f64,
    cosomm: f64,
    xnoi: f64,
}

impl BodyTerms {
    fn new(body: &BodyOrientation, sat: &SatelliteGeometry) -> Self {
        let (zcosg, zsing, zcosi, zsini, zcosh, zsinh) =
            (body.zcosg, body.zsing, body.zcosi, body.zsini, body.zcosh, body.zsinh);
        let (sinim, cosim, sinomm, cosomm) = (sat.sinim, sat.cosim, sat.sinomm, sat.cosomm);
        let emsq = sat.emsq;

        let a1 = zcosg * zcosh + zsing * zcosi * zsinh;
        let a3 = -zsing * zcosh + zcosg * zcosi * zsinh;
        let a7 = -zcosg * zsinh + zsing * zcosi * zcosh;
        let a8 = zsing * zsini;
        let a9 = zsing * zsinh + zcosg * zcosi * zcosh;
        let a10 = zcosg * zsini;
        let a2 = cosim * a7 + sinim * a8;
        let a4 = cosim * a9 + sinim * a10;
        let a5 = -sinim * a7 + cosim * a8;
        let a6 = -sinim * a9 + cosim * a10;

        let x1 = a1 * cosomm + a2 * sinomm;
        let x2 = a3 * cosomm + a4 * sinomm;
        let x3 = -a1 * sinomm + a2 * cosomm;
        let x4 = -a3 * sinomm + a4 * cosomm;
        let x5 = a5 * sinomm;
        let x6 = a6 * sinomm;
        let x7 = a5 * cosomm;
        let x8 = a6 * cosomm;

        let z31 = 12.0 * x1 * x1 - 3.0 * x3 * x3;
        let z32 = 24.0 * x1 * x2 - 6.0 * x3 * x4;
        let z33 = 12.0 * x2 * x2 - 3.0 * x4 * x4;
        let z1 = 3.0 * (a1 * a1 + a2 * a2) + z31 * emsq;
        let z2 = 6.0 * (a1 * a3 + a2 * a4) + z32 * emsq;
        let z3 = 3.0 * (a3 * a3 + a4 * a4) + z33 * emsq;
        let z11 = -6.0 * a1 * a5 + emsq * (-24.0 * x1 * x7 - 6.0 * x3 * x5);
        let z12 = -6.0 * (a1 * a6 + a3 * a5)
            + emsq * (-24.0 * (x2 * x7 + x1 * x8) - 6.0 * (x3 * x6 + x4 * x5));
        let z13 = -6.0 * a3 * a6 + emsq * (-24.0 * x2 * x8 - 6.0 * x4 * x6);
        let z21 = 6.0 * a2 * a5 + emsq * (24.0 * x1 * x5 - 6.0 * x3 * x7);
        let z22 = 6.0 * (a4 * a5 + a2 * a6)
            + emsq * (24.0 * (x2 * x5 + x1 * x6) - 6.0 * (x4 * x7 + x3 * x8));
        let z23 = 6.0 * a4 * a6 + emsq * (24.0 * x2 * x6 - 6.0 * x4 * x8);
        let z1 = z1 + z1 + sat.betasq * z31;
        let z2 = z2 + z2 + sat.betasq * z32;
        let z3 = z3 + z3 + sat.betasq * z33;

        let s3 = body.cc * sat.xnoi;
        let s2 = -0.5 * s3 / sat.rtemsq;
        let s4 = s3 * sat.rtemsq;
        let s1 = -15.0 * sat.em * s4;

        BodyTerms {
            s1,
            s2,
            s3,
            s4,
            s5: x1 * x3 + x2 * x4,
            s6: x2 * x3 + x1 * x4,
            s7: x2 * x4 - x1 * x3,
            z1,
            z2,
            z3,
            z11,
            z12,
            z13,
            z21,
            z22,
            z23,
            z31,
            z32,
            z33,
        }
    }
}

/// Long-period coefficients of one body, for eccentricity, inclination,
/// mean longitude, perigee and node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PeriodicCoefficients {
    e2: f64,
    e3: f64,
    i2: f64,
    i3: f64,
    l2: f64,
    l3: f64,
    l4: f64,
    gh2: f64,
    gh3: f64,
    gh4: f64,
    h2: f64,
    h3: f64,
}

impl PeriodicCoefficients {
    fn new(b: &BodyTerms, emsq: f64, body_ecc: f64) -> Self {
        PeriodicCoefficients {
            e2: 2.0 * b.s1 * b.s6,
            e3: 2.0 * b.s1 * b.s7,
            i2: 2.0 * b.s2 * b.z12,
            i3: 2.0 * b.s2 * (b.z13 - b.z11),
            l2: -2.0 * b.s3 * b.z2,
            l3: -2.0 * b.s3 * (b.z3 - b.z1),
            l4: -2.0 * b.s3 * (-21.0 - 9.0 * emsq) * body_ecc,
            gh2: 2.0 * b.s4 * b.z32,
            gh3: 2.0 * b.s4 * (b.z33 - b.z31),
            gh4: -18.0 * b.s4 * body_ecc,
            h2: -2.0 * b.s2 * b.z22,
            h3: -2.0 * b.s2 * (b.z23 - b.z21),
        }
    }

    /// `[pe, pinc, pl, pgh, ph]` for the body at mean anomaly `zm`.
    fn evaluate(&self, zm: f64, body_ecc: f64) -> [f64; 5] {
        let zf = zm + 2.0 * body_ecc * zm.sin();
        let sinzf = zf.sin();
        let f2 = 0.5 * sinzf * sinzf - 0.25;
        let f3 = -0.5 * sinzf * zf.cos();
        [
            self.e2 * f2 + self.e3 * f3,
            self.i2 * f2 + self.i3 * f3,
            self.l2 * f2 + self.l3 * f3 + self.l4 * sinzf,
            self.gh2 * f2 + self.gh3 * f3 + self.gh4 * sinzf,
            self.h2 * f2 + self.h3 * f3,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ResonanceTerms {
    NonResonant,
    Synchronous {
        del1: f64,
        del2: f64,
        del3: f64,
    },
    HalfDay {
        d2201: f64,
        d2211: f64,
        d3210: f64,
        d3222: f64,
        d4410: f64,
        d4422: f64,
        d5220: f64,
        d5232: f64,
        d5421: f64,
        d5433: f64,
    },
}

/// What the deep-space setup needs from the near-earth initialization.
/// Angles in radians, rates in radians/minute, `epoch` in days since 1950.
pub(crate) struct DeepSpaceInput {
    pub epoch: f64,
    pub ecco: f64,
    pub inclo: f64,
    pub nodeo: f64,
    pub argpo: f64,
    pub mo: f64,
    pub no_unkozai: f64,
    pub mdot: f64,
    pub nodedot: f64,
    pub argpdot: f64,
    pub gsto: f64,
    pub xke: f64,
}

/// Deep-space coefficients, fixed at initialization.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DeepSpaceTerms {
    solar: PeriodicCoefficients,
    lunar: PeriodicCoefficients,
    zmos: f64,
    zmol: f64,

    dedt: f64,
    didt: f64,
    dmdt: f64,
    dnodt: f64,
    domdt: f64,

    resonance: ResonanceTerms,
    xfact: f64,
    xlamo: f64,
    gsto: f64,
}

impl DeepSpaceTerms {
    pub(crate) fn new(input: &DeepSpaceInput) -> Self {
        // lunar-solar geometry at epoch
        let day = input.epoch + 18_261.5;
        let xnodce = (4.523_602_0 - 9.242_202_9e-4 * day) % TWOPI;
        let stem = xnodce.sin();
        let ctem = xnodce.cos();
        let zcosil = 0.913_751_64 - 0.035_680_96 * ctem;
        let zsinil = (1.0 - zcosil * zcosil).sqrt();
        let zsinhl = 0.089_683_511 * stem / zsinil;
        let zcoshl = (1.0 - zsinhl * zsinhl).sqrt();
        let gam = 5.835_151_4 + 0.001_944_368_0 * day;
        let zy = zcoshl * ctem + 0.917_448_67 * zsinhl * stem;
        let zx = (0.397_854_16 * stem / zsinil).atan2(zy);
        let zx = gam + zx - xnodce;

        let snodm = input.nodeo.sin();
        let cnodm = input.nodeo.cos();
        let em = input.ecco;
        let emsq = em * em;
        let betasq = 1.0 - emsq;
        let sat = SatelliteGeometry {
            em,
            emsq,
            betasq,
            rtemsq: betasq.sqrt(),
            sinim: input.inclo.sin(),
            cosim: input.inclo.cos(),
            sinomm: input.argpo.sin(),
            cosomm: input.argpo.cos(),
            xnoi: 1.0 / input.no_unkozai,
        };

        let sun = BodyTerms::new(
            &BodyOrientation {
                zcosg: 0.194_590_5,
                zsing: -0.980_884_58,
                zcosi: 0.917_448_67,
                zsini: 0.397_854_16,
                zcosh: cnodm,
                zsinh: snodm,
                cc: 2.986_479_7e-6,
            },
            &sat,
        );
        let moon = BodyTerms::new(
            &BodyOrientation {
                zcosg: zx.cos(),
                zsing: zx.sin(),
                zcosi: zcosil,
                zsini: zsinil,
                zcosh: zcoshl * cnodm + zsinhl * snodm,
                zsinh: snodm * zcoshl - cnodm * zsinhl,
                cc: 4.796_806_5e-7,
            },
            &sat,
        );

        // secular rates
        let (sinim, cosim) = (sat.sinim, sat.cosim);
        let near_equatorial = input.inclo < INCL_GUARD || input.inclo > PI - INCL_GUARD;

        let ses = sun.s1 * ZNS * sun.s5;
        let sis = sun.s2 * ZNS * (sun.z11 + sun.z13);
        let sls = -ZNS * sun.s3 * (sun.z1 + sun.z3 - 14.0 - 6.0 * emsq);
        let sghs = sun.s4 * ZNS * (sun.z31 + sun.z33 - 6.0);
        let mut shs = -ZNS * sun.s2 * (sun.z21 + sun.z23);
        if near_equatorial {
            shs = 0.0;
        }
        if sinim != 0.0 {
            shs /= sinim;
        }
        let sgs = sghs - cosim * shs;

        let dedt = ses + moon.s1 * ZNL * moon.s5;
        let didt = sis + moon.s2 * ZNL * (moon.z11 + moon.z13);
        let dmdt = sls - ZNL * moon.s3 * (moon.z1 + moon.z3 - 14.0 - 6.0 * emsq);
        let sghl = moon.s4 * ZNL * (moon.z31 + moon.z33 - 6.0);
        let mut shll = -ZNL * moon.s2 * (moon.z21 + moon.z23);
        if near_equatorial {
            shll = 0.0;
        }
        let mut domdt = sgs + sghl;
        let mut dnodt = shs;
        if sinim != 0.0 {
            domdt -= cosim / sinim * shll;
            dnodt += shll / sinim;
        }

        let mut terms = DeepSpaceTerms {
            solar: PeriodicCoefficients::new(&sun, emsq, ZES),
            lunar: PeriodicCoefficients::new(&moon, emsq, ZEL),
            zmos: (6.256_583_7 + 0.017_201_977 * day) % TWOPI,
            zmol: (4.719_967_2 + 0.229_971_50 * day - gam) % TWOPI,
            dedt,
            didt,
            dmdt,
            dnodt,
            domdt,
            resonance: ResonanceTerms::NonResonant,
            xfact: 0.0,
            xlamo: 0.0,
            gsto: input.gsto,
        };
        terms.init_resonance(input, sinim, cosim, emsq);
        terms
    }

    fn init_resonance(&mut self, input: &DeepSpaceInput, sinim: f64, cosim: f64, emsq: f64) {
        const Q22: f64 = 1.789_167_9e-6;
        const Q31: f64 = 2.146_074_8e-6;
        const Q33: f64 = 2.212_301_5e-7;
        const ROOT22: f64 = 1.789_167_9e-6;
        const ROOT44: f64 = 7.363_695_3e-9;
        const ROOT54: f64 = 2.176_580_3e-9;
        const ROOT32: f64 = 3.739_379_2e-7;
        const ROOT52: f64 = 1.142_863_9e-7;

        let nm = input.no_unkozai;
        let em = input.ecco;
        let class = if nm > 0.003_490_658_5 && nm < 0.005_235_987_7 {
            Resonance::Synchronous
        } else if (8.26e-3..=9.24e-3).contains(&nm) && em >= 0.5 {
            Resonance::HalfDay
        } else {
            return;
        };

        let theta = self.gsto % TWOPI;
        let aonv = (nm / input.xke).powf(X2O3);

        match class {
            Resonance::HalfDay => {
                let cosisq = cosim * cosim;
                let eoc = em * emsq;
                let g201 = -0.306 - (em - 0.64) * 0.440;

                let (g211, g310, g322, g410, g422, g520);
                if em <= 0.65 {
                    g211 = 3.616 - 13.2470 * em + 16.2900 * emsq;
                    g310 = -19.302 + 117.3900 * em - 228.4190 * emsq + 156.5910 * eoc;
                    g322 = -18.9068 + 109.7927 * em - 214.6334 * emsq + 146.5816 * eoc;
                    g410 = -41.122 + 242.6940 * em - 471.0940 * emsq + 313.9530 * eoc;
                    g422 = -146.407 + 841.8800 * em - 1629.014 * emsq + 1083.4350 * eoc;
                    g520 = -532.114 + 3017.977 * em - 5740.032 * emsq + 3708.2760 * eoc;
                } else {
                    g211 = -72.099 + 331.819 * em - 508.738 * emsq + 266.724 * eoc;
                    g310 = -346.844 + 1582.851 * em - 2415.925 * emsq + 1246.113 * eoc;
                    g322 = -342.585 + 1554.908 * em - 2366.899 * emsq + 1215.972 * eoc;
                    g410 = -1052.797 + 4758.686 * em - 7193.992 * emsq + 3651.957 * eoc;
                    g422 = -3581.690 + 16178.110 * em - 24462.770 * emsq + 12422.520 * eoc;
                    g520 = if em > 0.715 {
                        -5149.66 + 29936.92 * em - 54087.36 * emsq + 31324.56 * eoc
                    } else {
                        1464.74 - 4664.75 * em + 3763.64 * emsq
                    };
                }

                let (g533, g521, g532);
                if em < 0.7 {
                    g533 = -919.22770 + 4988.61 * em - 9064.77 * emsq + 5542.21 * eoc;
                    g521 = -822.71072 + 4568.6173 * em - 8491.4146 * emsq + 5337.524 * eoc;
                    g532 = -853.66600 + 4690.25 * em - 8624.77 * emsq + 5341.4 * eoc;
                } else {
                    g533 = -37995.78 + 161616.52 * em - 229838.2 * emsq + 109377.94 * eoc;
                    g521 = -51752.104 + 218913.95 * em - 309468.16 * emsq + 146349.42 * eoc;
                    g532 = -40023.88 + 170470.89 * em - 242699.48 * emsq + 115605.82 * eoc;
                }

                let sini2 = sinim * sinim;
                let f220 = 0.75 * (1.0 + 2.0 * cosim + cosisq);
                let f221 = 1.5 * sini2;
                let f321 = 1.875 * sinim * (1.0 - 2.0 * cosim - 3.0 * cosisq);
                let f322 = -1.875 * sinim * (1.0 + 2.0 * cosim - 3.0 * cosisq);
                let f441 = 35.0 * sini2 * f220;
                let f442 = 39.3750 * sini2 * sini2;
                let f522 = 9.84375
                    * sinim
                    * (sini2 * (1.0 - 2.0 * cosim - 5.0 * cosisq)
                        + 0.33333333 * (-2.0 + 4.0 * cosim + 6.0 * cosisq));
                let f523 = sinim
                    * (4.92187512 * sini2 * (-2.0 - 4.0 * cosim + 10.0 * cosisq)
                        + 6.56250012 * (1.0 + 2.0 * cosim - 3.0 * cosisq));
                let f542 = 29.53125
                    * sinim
                    * (2.0 - 8.0 * cosim + cosisq * (-12.0 + 8.0 * cosim + 10.0 * cosisq));
                let f543 = 29.53125
                    * sinim
                    * (-2.0 - 8.0 * cosim + cosisq * (12.0 + 8.0 * cosim - 10.0 * cosisq));

                let xno2 = nm * nm;
                let ainv2 = aonv * aonv;
                let mut temp1 = 3.0 * xno2 * ainv2;
                let mut temp = temp1 * ROOT22;
                let d2201 = temp * f220 * g201;
                let d2211 = temp * f221 * g211;
                temp1 *= aonv;
                temp = temp1 * ROOT32;
                let d3210 = temp * f321 * g310;
                let d3222 = temp * f322 * g322;
                temp1 *= aonv;
                temp = 2.0 * temp1 * ROOT44;
                let d4410 = temp * f441 * g410;
                let d4422 = temp * f442 * g422;
                temp1 *= aonv;
                temp = temp1 * ROOT52;
                let d5220 = temp * f522 * g520;
                let d5232 = temp * f523 * g532;
                temp = 2.0 * temp1 * ROOT54;
                let d5421 = temp * f542 * g521;
                let d5433 = temp * f543 * g533;

                self.resonance = ResonanceTerms::HalfDay {
                    d2201,
                    d2211,
                    d3210,
                    d3222,
                    d4410,
                    d4422,
                    d5220,
                    d5232,
                    d5421,
                    d5433,
                };
                self.xlamo = (input.mo + input.nodeo + input.nodeo - theta - theta) % TWOPI;
                self.xfact = input.mdot + self.dmdt + 2.0 * (input.nodedot + self.dnodt - RPTIM)
                    - input.no_unkozai;
            }
            Resonance::Synchronous => {
                let g200 = 1.0 + emsq * (-2.5 + 0.8125 * emsq);
                let g310 = 1.0 + 2.0 * emsq;
                let g300 = 1.0 + emsq * (-6.0 + 6.60937 * emsq);
                let f220 = 0.75 * (1.0 + cosim) * (1.0 + cosim);
                let f311 = 0.9375 * sinim * sinim * (1.0 + 3.0 * cosim) - 0.75 * (1.0 + cosim);
                let f330 = 1.0 + cosim;
                let f330 = 1.875 * f330 * f330 * f330;
                let del1 = 3.0 * nm * nm * aonv * aonv;
                let del2 = 2.0 * del1 * f220 * g200 * Q22;
                let del3 = 3.0 * del1 * f330 * g300 * Q33 * aonv;
                let del1 = del1 * f311 * g310 * Q31 * aonv;

                self.resonance = ResonanceTerms::Synchronous { del1, del2, del3 };
                self.xlamo = (input.mo + input.nodeo + input.argpo - theta) % TWOPI;
                let xpidot = input.argpdot + input.nodedot;
                self.xfact = input.mdot + xpidot - RPTIM + self.dmdt + self.domdt + self.dnodt
                    - input.no_unkozai;
            }
            Resonance::NonResonant => {}
        }
    }

    pub(crate) fn resonance(&self) -> Resonance {
        match self.resonance {
            ResonanceTerms::NonResonant => Resonance::NonResonant,
            ResonanceTerms::Synchronous { .. } => Resonance::Synchronous,
            ResonanceTerms::HalfDay { .. } => Resonance::HalfDay,
        }
    }

    /// Apply the lunar-solar secular rates and, for resonant orbits,
    /// integrate the resonance terms out to `t` minutes from epoch.
    ///
    /// `argpo`, `argpdot` and `no_unkozai` are the record's epoch argument
    /// of perigee, its secular rate and the Brouwer mean motion.
    pub(crate) fn secular(
        &self,
        t: f64,
        argpo: f64,
        argpdot: f64,
        no_unkozai: f64,
        state: &mut ResonanceState,
        mean: &mut MeanElements,
    ) {
        const FASX2: f64 = 0.131_309_08;
        const FASX4: f64 = 2.884_319_8;
        const FASX6: f64 = 0.374_480_87;
        const G22: f64 = 5.768_639_6;
        const G32: f64 = 0.952_408_98;
        const G44: f64 = 1.801_499_8;
        const G52: f64 = 1.050_833_0;
        const G54: f64 = 4.410_889_8;
        const STEPP: f64 = 720.0;
        const STEPN: f64 = -720.0;
        const STEP2: f64 = 259_200.0;

        let theta = (self.gsto + t * RPTIM) % TWOPI;
        mean.em += self.dedt * t;
        mean.inclm += self.didt * t;
        mean.argpm += self.domdt * t;
        mean.nodem += self.dnodt * t;
        mean.mm += self.dmdt * t;

        if self.resonance == ResonanceTerms::NonResonant {
            return;
        }

        if state.time == 0.0 || t * state.time <= 0.0 || t.abs() < state.time.abs() {
            state.time = 0.0;
            state.mean_motion = no_unkozai;
            state.longitude = self.xlamo;
        }
        let delt = if t > 0.0 { STEPP } else { STEPN };

        // derivatives at the current integration point: (xndt, xldot, xnddt)
        let derivatives = |atime: f64, xli: f64, xni: f64| -> (f64, f64, f64) {
            let xldot = xni + self.xfact;
            match self.resonance {
                ResonanceTerms::Synchronous { del1, del2, del3 } => {
                    let xndt = del1 * (xli - FASX2).sin()
                        + del2 * (2.0 * (xli - FASX4)).sin()
                        + del3 * (3.0 * (xli - FASX6)).sin();
                    let xnddt = del1 * (xli - FASX2).cos()
                        + 2.0 * del2 * (2.0 * (xli - FASX4)).cos()
                        + 3.0 * del3 * (3.0 * (xli - FASX6)).cos();
                    (xndt, xldot, xnddt * xldot)
                }
                ResonanceTerms::HalfDay {
                    d2201,
                    d2211,
                    d3210,
                    d3222,
                    d4410,
                    d4422,
                    d5220,
                    d5232,
                    d5421,
                    d5433,
                } => {
                    let xomi = argpo + argpdot * atime;
                    let x2omi = xomi + xomi;
                    let x2li = xli + xli;
                    let xndt = d2201 * (x2omi + xli - G22).sin()
                        + d2211 * (xli - G22).sin()
                        + d3210 * (xomi + xli - G32).sin()
                        + d3222 * (-xomi + xli - G32).sin()
                        + d4410 * (x2omi + x2li - G44).sin()
                        + d4422 * (x2li - G44).sin()
                        + d5220 * (xomi + xli - G52).sin()
                        + d5232 * (-xomi + xli - G52).sin()
                        + d5421 * (xomi + x2li - G54).sin()
                        + d5433 * (-xomi + x2li - G54).sin();
                    let xnddt = d2201 * (x2omi + xli - G22).cos()
                        + d2211 * (xli - G22).cos()
                        + d3210 * (xomi + xli - G32).cos()
                        + d3222 * (-xomi + xli - G32).cos()
                        + d5220 * (xomi + xli - G52).cos()
                        + d5232 * (-xomi + xli - G52).cos()
                        + 2.0
                            * (d4410 * (x2omi + x2li - G44).cos()
                                + d4422 * (x2li - G44).cos()
                                + d5421 * (xomi + x2li - G54).cos()
                                + d5433 * (-xomi + x2li - G54).cos());
                    (xndt, xldot, xnddt * xldot)
                }
                ResonanceTerms::NonResonant => (0.0, xldot, 0.0),
            }
        };

        let (xndt, xldot, xnddt, ft) = loop {
            let (xndt, xldot, xnddt) = derivatives(state.time, state.longitude, state.mean_motion);
            if (t - state.time).abs() < STEPP {
                break (xndt, xldot, xnddt, t - state.time);
            }
            state.longitude += xldot * delt + xndt * STEP2;
            state.mean_motion += xndt * delt + xnddt * STEP2;
            state.time += delt;
        };

        let nm = state.mean_motion + xndt * ft + xnddt * ft * ft * 0.5;
        let xl = state.longitude + xldot * ft + xndt * ft * ft * 0.5;
        mean.mm = match self.resonance {
            ResonanceTerms::Synchronous { .. } => xl - mean.nodem - mean.argpm + theta,
            _ => xl - 2.0 * mean.nodem + 2.0 * theta,
        };
        let dndt = nm - no_unkozai;
        mean.nm = no_unkozai + dndt;
    }

    /// Add the lunar-solar long-period periodics to the mean elements.
    pub(crate) fn periodics(&self, t: f64, mode: OperationMode, p: &mut Perturbed) {
        let solar = self.solar.evaluate(self.zmos + ZNS * t, ZES);
        let lunar = self.lunar.evaluate(self.zmol + ZNL * t, ZEL);
        let pe = solar[0] + lunar[0];
        let pinc = solar[1] + lunar[1];
        let pl = solar[2] + lunar[2];
        let pgh = solar[3] + lunar[3];
        let ph = solar[4] + lunar[4];

        p.inclp += pinc;
        p.ep += pe;
        let sinip = p.inclp.sin();
        let cosip = p.inclp.cos();

        if p.inclp >= 0.2 {
            let ph = ph / sinip;
            let pgh = pgh - cosip * ph;
            p.argpp += pgh;
            p.nodep += ph;
            p.mp += pl;
            return;
        }

        // Lyddane modification for low inclinations
        let sinop = p.nodep.sin();
        let cosop = p.nodep.cos();
        let alfdp = sinip * sinop + (ph * cosop + pinc * cosip * sinop);
        let betdp = sinip * cosop + (-ph * sinop + pinc * cosip * cosop);

        p.nodep %= TWOPI;
        if p.nodep < 0.0 && mode == OperationMode::Afspc {
            p.nodep += TWOPI;
        }
        let xls = p.mp + p.argpp + pl + pgh + (cosip - pinc * sinip) * p.nodep;
        let xnoh = p.nodep;
        p.nodep = alfdp.atan2(betdp);
        if p.nodep < 0.0 && mode == OperationMode::Afspc {
            p.nodep += TWOPI;
        }
        if (xnoh - p.nodep).abs() > PI {
            if p.nodep < xnoh {
                p.nodep += TWOPI;
            } else {
                p.nodep -= TWOPI;
            }
        }
        p.mp += pl;
        p.argpp = xls - p.mp - cosip * p.nodep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_input() -> DeepSpaceInput {
        // near-geosynchronous: 1.0027 rev/day, low eccentricity
        let no = 1.0027 * TWOPI / 1440.0;
        DeepSpaceInput {
            epoch: 18_000.25,
            ecco: 0.0002,
            inclo: 0.1_f64.to_radians() + 0.05,
            nodeo: 1.2,
            argpo: 0.4,
            mo: 2.0,
            no_unkozai: no,
            mdot: no,
            nodedot: -1.0e-7,
            argpdot: 2.0e-7,
            gsto: 1.7,
            xke: 0.074_366_916_133_173_42,
        }
    }

    fn molniya_input() -> DeepSpaceInput {
        let no = 2.006 * TWOPI / 1440.0;
        DeepSpaceInput {
            ecco: 0.72,
            inclo: 63.4_f64.to_radians(),
            no_unkozai: no,
            mdot: no,
            ..geo_input()
        }
    }

    #[test]
    fn resonance_classes() {
        assert_eq!(DeepSpaceTerms::new(&geo_input()).resonance(), Resonance::Synchronous);
        assert_eq!(DeepSpaceTerms::new(&molniya_input()).resonance(), Resonance::HalfDay);

        // half-day period but nearly circular: not resonant
        let circular = DeepSpaceInput {
            ecco: 0.01,
            ..molniya_input()
        };
        assert_eq!(DeepSpaceTerms::new(&circular).resonance(), Resonance::NonResonant);
    }

    #[test]
    fn secular_pass_is_identity_at_epoch_without_resonance() {
        let input = DeepSpaceInput {
            no_unkozai: 3.0 * TWOPI / 1440.0,
            ..geo_input()
        };
        let terms = DeepSpaceTerms::new(&input);
        assert_eq!(terms.resonance(), Resonance::NonResonant);

        let mut mean = MeanElements {
            em: 0.1,
            argpm: 0.2,
            inclm: 0.3,
            mm: 0.4,
            nodem: 0.5,
            nm: input.no_unkozai,
        };
        let mut state = ResonanceState::default();
        terms.secular(0.0, input.argpo, input.argpdot, input.no_unkozai, &mut state, &mut mean);
        assert_eq!((mean.em, mean.inclm, mean.mm), (0.1, 0.3, 0.4));
        assert_eq!(state, ResonanceState::default());
    }

    #[test]
    fn resumed_integration_matches_restart() {
        for input in [geo_input(), molniya_input()] {
            let terms = DeepSpaceTerms::new(&input);
            let start = MeanElements {
                em: input.ecco,
                argpm: input.argpo,
                inclm: input.inclo,
                mm: input.mo,
                nodem: input.nodeo,
                nm: input.no_unkozai,
            };

            let mut carried = ResonanceState::default();
            for t in [500.0, 1_500.0, 10_000.0, 10_000.5, 40_000.0] {
                let mut resumed = start;
                terms.secular(t, input.argpo, input.argpdot, input.no_unkozai, &mut carried, &mut resumed);

                let mut fresh = start;
                let mut state = ResonanceState::default();
                terms.secular(t, input.argpo, input.argpdot, input.no_unkozai, &mut state, &mut fresh);

                assert_eq!(resumed.nm.to_bits(), fresh.nm.to_bits(), "t = {t}");
                assert_eq!(resumed.mm.to_bits(), fresh.mm.to_bits(), "t = {t}");
                assert_eq!(carried, state);
            }
        }
    }

    #[test]
    fn integration_restarts_when_crossing_epoch() {
        let input = geo_input();
        let terms = DeepSpaceTerms::new(&input);
        let start = MeanElements {
            em: input.ecco,
            argpm: input.argpo,
            inclm: input.inclo,
            mm: input.mo,
            nodem: input.nodeo,
            nm: input.no_unkozai,
        };

        let mut state = ResonanceState::default();
        let mut m = start;
        terms.secular(5_000.0, input.argpo, input.argpdot, input.no_unkozai, &mut state, &mut m);
        assert_eq!(state.time, 4_320.0);

        let mut m = start;
        terms.secular(-2_000.0, input.argpo, input.argpdot, input.no_unkozai, &mut state, &mut m);
        assert_eq!(state.time, -1_440.0);
    }

    #[test]
    fn periodics_keep_low_inclination_node_continuous() {
        let terms = DeepSpaceTerms::new(&geo_input());
        for mode in [OperationMode::Afspc, OperationMode::Improved] {
            let mut p = Perturbed {
                ep: 0.0002,
                inclp: 0.05,
                nodep: 1.2,
                argpp: 0.4,
                mp: 2.0,
            };
            terms.periodics(100.0, mode, &mut p);
            assert!((p.nodep - 1.2).abs() < 0.1, "{mode:?}: node jumped to {}", p.nodep);
            assert!(p.ep.is_finite() && p.mp.is_finite());
        }
    }
}
