//! SP3 precise orbits
use itertools::Itertools;
use nalgebra::Vector3;

use std::{path::Path, str::FromStr};

use crate::{
    error::Error,
    navigation::SatelliteState,
    observer::{LogObserver, Observer},
    prelude::{GnssTime, SV},
};

mod interpolation;
mod parsing;

/// SP3 header content
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sp3Header {
    /// Revision letter ('c', 'd'..)
    pub version: char,
    /// Declared number of epochs
    pub epochs: Option<u32>,
    /// Coordinate system (IGS20, ITRF..)
    pub coord_system: Option<String>,
    /// Orbit type (FIT, HLM..)
    pub orbit_type: Option<String>,
    /// Producing agency
    pub agency: Option<String>,
    /// Declared satellites
    pub satellites: Vec<SV>,
}

/// One tabulated orbit sample.
/// Values are stored as written: scaling happens on use.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PreciseOrbitSample {
    pub epoch: GnssTime,
    pub sv: SV,
    /// Occurrence counter of this satellite, starting at 1
    pub session: u32,
    /// ECEF position [km]
    pub position_km: (f64, f64, f64),
    /// Clock offset [us], None when the producer marked it as unknown
    pub clock_us: Option<f64>,
    /// Velocity [dm/s], when provided
    pub velocity_dm_s: Option<(f64, f64, f64)>,
}

impl PreciseOrbitSample {
    /// ECEF position [m]
    pub fn position(&self) -> Vector3<f64> {
        let (x, y, z) = self.position_km;
        Vector3::new(x, y, z) * 1.0E3
    }
    /// Clock offset [s]
    pub fn clock(&self) -> Option<f64> {
        self.clock_us.map(|clk| clk * 1.0E-6)
    }
}

/// Parsed SP3 file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SP3 {
    pub header: Sp3Header,
    /// Samples, in order of appearance
    pub samples: Vec<PreciseOrbitSample>,
}

impl FromStr for SP3 {
    type Err = Error;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::parse(content, &LogObserver)
    }
}

impl SP3 {
    /// Parses SP3 content. Records lacking epoch context are reported and skipped.
    pub fn parse(content: &str, observer: &dyn Observer) -> Result<Self, Error> {
        let lines: Vec<&str> = content.lines().collect();
        let (header, samples) = parsing::parse(&lines, observer)?;
        Ok(Self { header, samples })
    }

    /// Parses a local SP3 file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Iterates over sampling instants
    pub fn epochs(&self) -> impl Iterator<Item = GnssTime> + '_ {
        self.samples.iter().map(|s| s.epoch).dedup()
    }

    /// Iterates over satellites, in order of first appearance
    pub fn sv(&self) -> impl Iterator<Item = SV> + '_ {
        self.samples.iter().map(|s| s.sv).unique()
    }

    /// Iterates over samples of this satellite
    pub fn sv_samples(&self, sv: SV) -> impl Iterator<Item = &PreciseOrbitSample> + '_ {
        self.samples.iter().filter(move |s| s.sv == sv)
    }

    /// Sample of this satellite nearest to `t`, within `tolerance` seconds, bound included
    pub fn closest(&self, sv: SV, t: GnssTime, tolerance: f64) -> Option<&PreciseOrbitSample> {
        self.sv_samples(sv)
            .map(|s| ((s.epoch - t).to_seconds().abs(), s))
            .filter(|(dt, _)| *dt <= tolerance)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, s)| s)
    }

    /// Interpolates satellite position [m] and clock offset [s] at `t`,
    /// using `order + 1` samples centered on the nearest sample.
    /// Returns None when `t` is not within the series, when the series is too short
    /// or when a clock offset is missing within the window.
    pub fn interpolate(&self, sv: SV, t: GnssTime, order: usize) -> Option<SatelliteState> {
        let series: Vec<&PreciseOrbitSample> = self.sv_samples(sv).collect();
        let (first, last) = (series.first()?, series.last()?);
        if t < first.epoch || t > last.epoch {
            return None;
        }

        let nearest = series
            .iter()
            .map(|s| (s.epoch - t).to_seconds().abs())
            .position_min_by(|a, b| a.total_cmp(b))?;

        let range = interpolation::window(nearest, series.len(), order)?;

        let mut nodes = Vec::<(f64, [f64; 4])>::with_capacity(order + 1);
        for sample in &series[range] {
            let (x, y, z) = sample.position_km;
            nodes.push(((sample.epoch - t).to_seconds(), [x, y, z, sample.clock_us?]));
        }

        let [x, y, z, clk] = interpolation::lagrange(&nodes, 0.0);
        Some(SatelliteState {
            position: Vector3::new(x, y, z) * 1.0E3,
            clock_correction: clk * 1.0E-6,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{observer::NullObserver, prelude::Constellation};

    /// Synthetic table: linear motion, quadratic clock, 15' sampling
    fn table(epochs: usize) -> SP3 {
        let g01 = SV::new(Constellation::GPS, 1);
        let t0 = GnssTime::from_ymdhms(2023, 8, 27, 18, 0, 0.0).unwrap();
        let samples = (0..epochs)
            .map(|i| {
                let dt = i as f64 * 900.0;
                PreciseOrbitSample {
                    epoch: t0.shifted(dt),
                    sv: g01,
                    session: i as u32 + 1,
                    position_km: (20000.0 + dt * 1.0E-3, -10000.0, 15000.0 - dt * 2.0E-3),
                    clock_us: Some(-84.0 + 1.0E-4 * dt + 1.0E-9 * dt * dt),
                    velocity_dm_s: None,
                }
            })
            .collect();
        SP3 {
            header: Sp3Header {
                version: 'd',
                epochs: Some(epochs as u32),
                coord_system: None,
                orbit_type: None,
                agency: None,
                satellites: vec![g01],
            },
            samples,
        }
    }

    #[test]
    fn sample_scaling() {
        let sp3 = table(1);
        let sample = &sp3.samples[0];
        assert_eq!(sample.position(), Vector3::new(20.0E6, -10.0E6, 15.0E6));
        assert!((sample.clock().unwrap() + 84.0E-6).abs() < 1.0E-15);
    }

    #[test]
    fn polynomial_series() {
        let sp3 = table(24);
        let g01 = SV::new(Constellation::GPS, 1);
        let t0 = sp3.samples[0].epoch;
        for dt in [0.0, 100.0, 450.0, 7300.0, 900.0 * 23.0 - 1.0] {
            let state = sp3.interpolate(g01, t0.shifted(dt), 9).unwrap();
            let expected = Vector3::new(20000.0 + dt * 1.0E-3, -10000.0, 15000.0 - dt * 2.0E-3);
            assert!((state.position - expected * 1.0E3).norm() < 1.0E-6);
            let clock = (-84.0 + 1.0E-4 * dt + 1.0E-9 * dt * dt) * 1.0E-6;
            assert!((state.clock_correction - clock).abs() < 1.0E-15);
        }
    }

    #[test]
    fn interpolation_limits() {
        let g01 = SV::new(Constellation::GPS, 1);
        let sp3 = table(24);
        let t0 = sp3.samples[0].epoch;
        // outside of the series
        assert!(sp3.interpolate(g01, t0.shifted(-1.0), 9).is_none());
        assert!(sp3.interpolate(g01, t0.shifted(900.0 * 24.0), 9).is_none());
        // unknown satellite
        assert!(sp3
            .interpolate(SV::new(Constellation::GPS, 2), t0, 9)
            .is_none());
        // too short
        let sp3 = table(5);
        assert!(sp3.interpolate(g01, t0.shifted(100.0), 9).is_none());
        assert!(sp3.interpolate(g01, t0.shifted(100.0), 4).is_some());
    }

    #[test]
    fn closest_sample() {
        let g01 = SV::new(Constellation::GPS, 1);
        let sp3 = table(4);
        let t0 = sp3.samples[0].epoch;
        let s = sp3.closest(g01, t0.shifted(1000.0), 900.0).unwrap();
        assert_eq!(s.session, 2);
        assert!(sp3.closest(g01, t0.shifted(-1000.0), 900.0).is_none());
        let s = sp3.closest(g01, t0.shifted(-900.0), 900.0).unwrap();
        assert_eq!(s.epoch, t0);
    }

    #[test]
    fn from_content() {
        let content = "#dP2023  8 27 18  0  0.00000000       1 ORBIT IGS20 HLM  EMR
+    1   G01  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0  0
*  2023  8 27 18  0  0.00000000
PG01  -7844.634562 -15218.462402  19936.181563    -84.470237
EOF";
        let sp3 = SP3::parse(content, &NullObserver).unwrap();
        assert_eq!(sp3.sv().count(), 1);
        assert_eq!(sp3.epochs().count(), 1);
    }
}
