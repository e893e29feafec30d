//! Keplerian propagation of GPS and Galileo ephemerides
use nalgebra::{Rotation3, Vector3};

use crate::{
    constants::{Constants, DtrF, Omega, SECONDS_PER_DAY, SECONDS_PER_WEEK},
    navigation::{
        GalileoEphemeris, GpsEphemeris, KeplerianElements, Propagation, SatelliteEphemeris,
        SatelliteState,
    },
    observer::{Event, Observer},
    prelude::{GnssTime, SV},
};

/// Kepler equation solution
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly [rad]
    pub eccentric_anomaly: f64,
    /// |E(n) - E(n-1)| on last iteration [rad]
    pub precision: f64,
    /// Number of iterations performed
    pub iterations: usize,
}

impl KeplerSolution {
    /// True if the solver stopped before the iteration cap
    pub fn converged(&self, tolerance: f64) -> bool {
        self.precision <= tolerance
    }
}

/// Solves E = M + e.sin(E) by fixed point iteration, starting at E = M.
/// Stops when |E(n) - E(n-1)| <= tolerance or after `max_iter` iterations,
/// in which case the last estimate is returned.
pub fn solve_kepler(m: f64, e: f64, tolerance: f64, max_iter: usize) -> KeplerSolution {
    let mut e_prev = m;
    let mut e_k = m + e * e_prev.sin();
    let mut iterations = 0;
    while (e_k - e_prev).abs() > tolerance && iterations < max_iter {
        e_prev = e_k;
        e_k = m + e * e_prev.sin();
        iterations += 1;
    }
    KeplerSolution {
        eccentric_anomaly: e_k,
        precision: (e_k - e_prev).abs(),
        iterations,
    }
}

/// Clock polynomial (a0, a1, a2) evaluated at `dt` seconds from toc
fn clock_polynomial(a0: f64, a1: f64, a2: f64, dt: f64) -> f64 {
    a0 + a1 * dt + a2 * dt.powi(2)
}

/// Propagates Keplerian elements to `t`, `dt` being expressed
/// with respect to the time of clock.
pub(crate) fn propagate(
    sv: SV,
    kepler: &KeplerianElements,
    clock: (f64, f64, f64),
    toc: GnssTime,
    t: GnssTime,
    propagation: &Propagation,
    observer: &dyn Observer,
) -> (SatelliteState, KeplerSolution) {
    let dt = (t.mjd() - toc.mjd()) * SECONDS_PER_DAY;

    let a = kepler.sqrt_a.powi(2);
    let n = (Constants::gm(sv.constellation) / a.powi(3)).sqrt() + kepler.delta_n;
    let m = kepler.m0 + n * dt;

    let solution = solve_kepler(
        m,
        kepler.e,
        propagation.kepler_tolerance,
        propagation.kepler_max_iter,
    );
    if !solution.converged(propagation.kepler_tolerance) {
        observer.notify(Event::KeplerNotConverged {
            sv,
            precision: solution.precision,
        });
    }
    let e_k = solution.eccentric_anomaly;

    let v = 2.0 * (((1.0 + kepler.e) / (1.0 - kepler.e)).sqrt() * (e_k / 2.0).tan()).atan();
    let r = a * (1.0 - kepler.e * e_k.cos());
    let phi = kepler.omega + v;

    let (sin_2phi, cos_2phi) = (2.0 * phi).sin_cos();
    let dr = kepler.crs * sin_2phi + kepler.crc * cos_2phi;
    let dphi = kepler.cus * sin_2phi + kepler.cuc * cos_2phi;
    let di = kepler.cis * sin_2phi + kepler.cic * cos_2phi;

    let orbital_plane = Vector3::new(
        (r + dr) * (phi + dphi).cos(),
        (r + dr) * (phi + dphi).sin(),
        0.0,
    );

    let i = kepler.i0 + kepler.idot * dt + di;
    let omega = kepler.omega0 + kepler.omega_dot * dt;

    // positive angles are counterclockwise rotations
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), i);
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), omega);
    let eci = rz * rx * orbital_plane;

    let mut t_sow = t.sow();
    if t.gps_weeks() > i64::from(kepler.week) {
        t_sow += SECONDS_PER_WEEK;
    }
    let earth_rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), -Omega::GPS * t_sow);
    let ecef = earth_rotation * eci;

    let (a0, a1, a2) = clock;
    let relativistic = DtrF::GPS * kepler.sqrt_a * kepler.e * e_k.sin();

    (
        SatelliteState {
            position: ecef,
            clock_correction: clock_polynomial(a0, a1, a2, dt) + relativistic,
        },
        solution,
    )
}

impl SatelliteEphemeris for GpsEphemeris {
    fn sv(&self) -> SV {
        self.sv
    }
    fn toc(&self) -> GnssTime {
        self.toc
    }
    fn clock_polynomial(&self, t: GnssTime) -> f64 {
        let dt = (t - self.toc).to_seconds();
        clock_polynomial(
            self.clock_bias,
            self.clock_drift,
            self.clock_drift_rate,
            dt,
        )
    }
    fn propagate(
        &self,
        t: GnssTime,
        propagation: &Propagation,
        observer: &dyn Observer,
    ) -> SatelliteState {
        let clock = (self.clock_bias, self.clock_drift, self.clock_drift_rate);
        let (state, _) = propagate(
            self.sv,
            &self.kepler,
            clock,
            self.toc,
            t,
            propagation,
            observer,
        );
        state
    }
}

impl SatelliteEphemeris for GalileoEphemeris {
    fn sv(&self) -> SV {
        self.sv
    }
    fn toc(&self) -> GnssTime {
        self.toc
    }
    fn clock_polynomial(&self, t: GnssTime) -> f64 {
        let dt = (t - self.toc).to_seconds();
        clock_polynomial(
            self.clock_bias,
            self.clock_drift,
            self.clock_drift_rate,
            dt,
        )
    }
    fn propagate(
        &self,
        t: GnssTime,
        propagation: &Propagation,
        observer: &dyn Observer,
    ) -> SatelliteState {
        let clock = (self.clock_bias, self.clock_drift, self.clock_drift_rate);
        let (state, _) = propagate(
            self.sv,
            &self.kepler,
            clock,
            self.toc,
            t,
            propagation,
            observer,
        );
        state
    }
}
