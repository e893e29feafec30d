//! Broadcast navigation data
use itertools::Itertools;
use nalgebra::Vector3;

use std::{path::Path, str::FromStr};

use crate::{
    cfg::Config,
    error::Error,
    observer::Observer,
    prelude::{Constellation, GnssTime, Header, SV},
};

mod glonass;
mod kepler;
mod parsing;

pub use kepler::{solve_kepler, KeplerSolution};

/// Satellite state at a given instant
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SatelliteState {
    /// ECEF position [m]
    pub position: Vector3<f64>,
    /// Satellite clock correction [s]
    pub clock_correction: f64,
}

/// Propagation parameters
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Propagation {
    /// Kepler solver convergence criteria [rad]
    pub kepler_tolerance: f64,
    /// Kepler solver iteration cap
    pub kepler_max_iter: usize,
}

impl Default for Propagation {
    fn default() -> Self {
        Self {
            kepler_tolerance: 1.0E-9,
            kepler_max_iter: 100,
        }
    }
}

impl From<&Config> for Propagation {
    fn from(cfg: &Config) -> Self {
        Self {
            kepler_tolerance: cfg.kepler_tolerance,
            kepler_max_iter: cfg.kepler_max_iter,
        }
    }
}

/// Minimal interface shared by all broadcast ephemerides
pub trait SatelliteEphemeris {
    /// Satellite identity
    fn sv(&self) -> SV;
    /// Reference epoch (time of clock)
    fn toc(&self) -> GnssTime;
    /// Clock polynomial evaluated at `t` [s], without relativistic correction
    fn clock_polynomial(&self, t: GnssTime) -> f64;
    /// Propagates the orbit to `t`
    fn propagate(
        &self,
        t: GnssTime,
        propagation: &Propagation,
        observer: &dyn Observer,
    ) -> SatelliteState;
    /// ECEF position [m] at `t`, using default [Propagation] parameters
    fn position(&self, t: GnssTime) -> Vector3<f64> {
        self.propagate(t, &Propagation::default(), &crate::observer::NullObserver)
            .position
    }
}

/// Keplerian orbital elements, common to GPS and Galileo
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeplerianElements {
    /// Square root of semi major axis [m^1/2]
    pub sqrt_a: f64,
    /// Eccentricity
    pub e: f64,
    /// Mean anomaly at reference time [rad]
    pub m0: f64,
    /// Argument of perigee [rad]
    pub omega: f64,
    /// Inclination at reference time [rad]
    pub i0: f64,
    /// Rate of inclination [rad/s]
    pub idot: f64,
    /// Longitude of ascending node at weekly epoch [rad]
    pub omega0: f64,
    /// Rate of right ascension [rad/s]
    pub omega_dot: f64,
    /// Mean motion difference [rad/s]
    pub delta_n: f64,
    pub crs: f64,
    pub crc: f64,
    pub cus: f64,
    pub cuc: f64,
    pub cis: f64,
    pub cic: f64,
    /// Time of ephemeris [s of week]
    pub toe: f64,
    /// Reference week counter
    pub week: u32,
}

/// GPS (LNAV) ephemeris
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GpsEphemeris {
    pub sv: SV,
    pub toc: GnssTime,
    /// Clock bias [s]
    pub clock_bias: f64,
    /// Clock drift [s.s⁻¹]
    pub clock_drift: f64,
    /// Clock drift rate [s.s⁻²]
    pub clock_drift_rate: f64,
    pub kepler: KeplerianElements,
    pub iode: Option<f64>,
    pub l2_codes: Option<f64>,
    pub l2p_flag: Option<f64>,
    /// SV accuracy [m]
    pub accuracy: Option<f64>,
    pub health: Option<f64>,
    /// Total group delay [s]
    pub tgd: Option<f64>,
    pub iodc: Option<f64>,
    /// Transmission time of message [s of week]
    pub transmission_time: Option<f64>,
    /// Fit interval [h]
    pub fit_interval: Option<f64>,
}

/// Galileo (I/NAV, F/NAV) ephemeris
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GalileoEphemeris {
    pub sv: SV,
    pub toc: GnssTime,
    pub clock_bias: f64,
    pub clock_drift: f64,
    pub clock_drift_rate: f64,
    pub kepler: KeplerianElements,
    pub iodnav: Option<f64>,
    pub data_sources: Option<f64>,
    /// Signal in space accuracy [m]
    pub sisa: Option<f64>,
    pub health: Option<f64>,
    /// E1-E5a broadcast group delay [s]
    pub bgd_e5a: Option<f64>,
    /// E1-E5b broadcast group delay [s]
    pub bgd_e5b: Option<f64>,
    pub transmission_time: Option<f64>,
}

/// Glonass ephemeris: PZ-90 state vector at reference epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassEphemeris {
    pub sv: SV,
    /// Reference epoch, converted from UTC
    pub toc: GnssTime,
    /// -τn [s]
    pub clock_bias: f64,
    /// +γn
    pub rel_freq_bias: f64,
    /// Message frame time [s of day]
    pub message_frame_time: f64,
    /// Position [km]
    pub position_km: (f64, f64, f64),
    /// Velocity [km/s]
    pub velocity_km: (f64, f64, f64),
    /// Luni-solar acceleration [km/s²]
    pub acceleration_km: (f64, f64, f64),
    pub health: Option<f64>,
    /// Frequency channel number
    pub freq_num: Option<f64>,
    /// Age of operation information [days]
    pub age_op: Option<f64>,
}

/// Broadcast [Ephemeris], one variant per supported constellation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Ephemeris {
    GPS(GpsEphemeris),
    Galileo(GalileoEphemeris),
    Glonass(GlonassEphemeris),
}

impl Ephemeris {
    /// Returns inner [GpsEphemeris], if this is a GPS message
    pub fn as_gps(&self) -> Option<&GpsEphemeris> {
        match self {
            Self::GPS(eph) => Some(eph),
            _ => None,
        }
    }

    /// Returns inner [GalileoEphemeris], if this is a Galileo message
    pub fn as_galileo(&self) -> Option<&GalileoEphemeris> {
        match self {
            Self::Galileo(eph) => Some(eph),
            _ => None,
        }
    }

    /// Returns inner [GlonassEphemeris], if this is a Glonass message
    pub fn as_glonass(&self) -> Option<&GlonassEphemeris> {
        match self {
            Self::Glonass(eph) => Some(eph),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn SatelliteEphemeris {
        match self {
            Self::GPS(eph) => eph,
            Self::Galileo(eph) => eph,
            Self::Glonass(eph) => eph,
        }
    }
}

impl SatelliteEphemeris for Ephemeris {
    fn sv(&self) -> SV {
        self.inner().sv()
    }
    fn toc(&self) -> GnssTime {
        self.inner().toc()
    }
    fn clock_polynomial(&self, t: GnssTime) -> f64 {
        self.inner().clock_polynomial(t)
    }
    fn propagate(
        &self,
        t: GnssTime,
        propagation: &Propagation,
        observer: &dyn Observer,
    ) -> SatelliteState {
        self.inner().propagate(t, propagation, observer)
    }
}

/// One parsed navigation record
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavigationRecord {
    /// Counts consecutive records of the same satellite, starting at 1
    pub session: u32,
    pub ephemeris: Ephemeris,
}

/// Parsed navigation file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavigationData {
    pub header: Header,
    /// Records, in order of appearance
    pub records: Vec<NavigationRecord>,
}

impl FromStr for NavigationData {
    type Err = Error;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::parse(content, &Config::default(), &crate::observer::LogObserver)
    }
}

impl NavigationData {
    /// Parses navigation content. Malformed records are reported
    /// to the [Observer] and skipped.
    pub fn parse(content: &str, cfg: &Config, observer: &dyn Observer) -> Result<Self, Error> {
        let lines: Vec<&str> = content.lines().collect();
        let (header, records) = parsing::parse(&lines, cfg.two_digit_year, observer)?;
        Ok(Self { header, records })
    }

    /// Parses a local navigation file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Iterates over all [Ephemeris]
    pub fn ephemerides(&self) -> impl Iterator<Item = &Ephemeris> + '_ {
        self.records.iter().map(|rec| &rec.ephemeris)
    }

    /// Iterates over [Ephemeris] of this satellite
    pub fn sv_ephemerides(&self, sv: SV) -> impl Iterator<Item = &Ephemeris> + '_ {
        self.ephemerides().filter(move |eph| eph.sv() == sv)
    }

    /// Iterates over the satellites, in order of first appearance
    pub fn sv(&self) -> impl Iterator<Item = SV> + '_ {
        self.ephemerides().map(|eph| eph.sv()).unique()
    }

    /// Iterates over [Ephemeris] of this [Constellation]
    pub fn constellation(
        &self,
        constellation: Constellation,
    ) -> impl Iterator<Item = &Ephemeris> + '_ {
        self.ephemerides()
            .filter(move |eph| eph.sv().constellation == constellation)
    }

    /// Selects the [Ephemeris] of this satellite whose reference epoch is the closest to `t`.
    /// Returns None if no record exists within `tolerance` seconds, bound included.
    pub fn closest(&self, sv: SV, t: GnssTime, tolerance: f64) -> Option<&Ephemeris> {
        self.sv_ephemerides(sv)
            .map(|eph| ((t - eph.toc()).to_seconds().abs(), eph))
            .filter(|(dt, _)| *dt <= tolerance)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, eph)| eph)
    }
}
