//! Glonass state vector integration (PZ-90)
use nalgebra::{Vector3, Vector6};

use crate::{
    constants::{Constants, Omega, PZ90},
    navigation::{GlonassEphemeris, Propagation, SatelliteEphemeris, SatelliteState},
    observer::{Event, Observer},
    prelude::{GnssTime, SV},
};

/// Integration step [s]
const STEP_SECONDS: f64 = 60.0;

/// State derivative: (velocity, acceleration), `acc` being
/// the luni-solar acceleration, taken constant over the integration.
fn derivative(x: &Vector6<f64>, acc: &Vector3<f64>, gm: f64) -> Vector6<f64> {
    let r2 = x[0].powi(2) + x[1].powi(2) + x[2].powi(2);
    let r3 = r2 * r2.sqrt();
    let omg2 = Omega::GLO.powi(2);

    let a = 1.5 * PZ90::J20 * gm * PZ90::AE.powi(2) / r2 / r3;
    let b = 5.0 * x[2].powi(2) / r2;
    let c = -gm / r3 - a * (1.0 - b);

    Vector6::new(
        x[3],
        x[4],
        x[5],
        (c + omg2) * x[0] + 2.0 * Omega::GLO * x[4] + acc[0],
        (c + omg2) * x[1] - 2.0 * Omega::GLO * x[3] + acc[1],
        (c - 2.0 * a) * x[2] + acc[2],
    )
}

/// Single 4th order Runge-Kutta step
fn rk4_step(x: &Vector6<f64>, acc: &Vector3<f64>, gm: f64, h: f64) -> Vector6<f64> {
    let k1 = derivative(x, acc, gm);
    let k2 = derivative(&(x + k1 * (h / 2.0)), acc, gm);
    let k3 = derivative(&(x + k2 * (h / 2.0)), acc, gm);
    let k4 = derivative(&(x + k3 * h), acc, gm);
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// Integrates state `x` [m, m/s] over `dt` seconds (possibly negative)
pub(crate) fn integrate(x: Vector6<f64>, acc: Vector3<f64>, gm: f64, dt: f64) -> Vector6<f64> {
    let mut x = x;
    let mut remaining = dt;
    let step = if dt < 0.0 {
        -STEP_SECONDS
    } else {
        STEP_SECONDS
    };
    while remaining.abs() > 1.0E-9 {
        let h = if remaining.abs() < STEP_SECONDS {
            remaining
        } else {
            step
        };
        x = rk4_step(&x, &acc, gm, h);
        remaining -= h;
    }
    x
}

impl GlonassEphemeris {
    /// Initial state [m, m/s]
    fn initial_state(&self) -> Vector6<f64> {
        let (x, y, z) = self.position_km;
        let (vx, vy, vz) = self.velocity_km;
        Vector6::new(x, y, z, vx, vy, vz) * 1.0E3
    }

    fn acceleration(&self) -> Vector3<f64> {
        let (ax, ay, az) = self.acceleration_km;
        Vector3::new(ax, ay, az) * 1.0E3
    }
}

impl SatelliteEphemeris for GlonassEphemeris {
    fn sv(&self) -> SV {
        self.sv
    }
    fn toc(&self) -> GnssTime {
        self.toc
    }
    /// -τn + γn.(t - tb)
    fn clock_polynomial(&self, t: GnssTime) -> f64 {
        let dt = (t - self.toc).to_seconds();
        self.clock_bias + self.rel_freq_bias * dt
    }
    fn propagate(
        &self,
        t: GnssTime,
        _: &Propagation,
        observer: &dyn Observer,
    ) -> SatelliteState {
        let dt = (t - self.toc).to_seconds();
        let gm = Constants::gm(self.sv.constellation);
        let x = integrate(self.initial_state(), self.acceleration(), gm, dt);
        observer.notify(Event::Trace(format!(
            "{}({}) - integrated over {:.3}s",
            t, self.sv, dt
        )));
        SatelliteState {
            position: Vector3::new(x[0], x[1], x[2]),
            clock_correction: self.clock_polynomial(t),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{observer::NullObserver, prelude::Constellation};

    fn ephemeris() -> GlonassEphemeris {
        // R01 2018 10 12 00:15:00 UTC
        GlonassEphemeris {
            sv: SV::new(Constellation::Glonass, 1),
            toc: GnssTime::from_ymdhms(2018, 10, 12, 0, 15, 18.0).unwrap(),
            clock_bias: 2.370541915298E-05,
            rel_freq_bias: 0.0,
            message_frame_time: 0.0,
            position_km: (-1.426713574219E+04, -1.938834423828E+03, 2.154806250000E+04),
            velocity_km: (-1.289758682251E+00, -2.880311012268E+00, -1.106586456299E+00),
            acceleration_km: (0.0, -9.313225746155E-10, -1.862645149231E-09),
            health: Some(0.0),
            freq_num: Some(1.0),
            age_op: Some(0.0),
        }
    }

    #[test]
    fn null_propagation() {
        let eph = ephemeris();
        let state = eph.propagate(eph.toc, &Propagation::default(), &NullObserver);
        assert!((state.position[0] + 1.426713574219E+07).abs() < 1.0E-3);
        assert!((state.position[2] - 2.154806250000E+07).abs() < 1.0E-3);
        assert_eq!(state.clock_correction, eph.clock_bias);
    }

    #[test]
    fn forward_backward() {
        let eph = ephemeris();
        let x0 = eph.initial_state();
        let gm = Constants::gm(Constellation::Glonass);
        let x1 = integrate(x0, eph.acceleration(), gm, 900.0);
        let x2 = integrate(x1, eph.acceleration(), gm, -900.0);
        let dx = Vector3::new(x2[0] - x0[0], x2[1] - x0[1], x2[2] - x0[2]);
        assert!(dx.norm() < 1.0E-2);

        // ~3.3 km/s over 15'
        let p0 = Vector3::new(x0[0], x0[1], x0[2]);
        let p1 = Vector3::new(x1[0], x1[1], x1[2]);
        let travel = (p1 - p0).norm();
        assert!(travel > 2500.0E3 && travel < 3500.0E3, "travel={}", travel);

        // bounded radial motion
        assert!((p1.norm() - p0.norm()).abs() < 100.0E3);
    }
}
