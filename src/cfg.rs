//! Processing configuration
use std::fmt::Write;

use crate::{error::Error, prelude::Constellation};

/// How two-digit years (found in older file revisions) are expanded.
/// Years below 80 always map to 2000 + year.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub enum TwoDigitYear {
    /// Years >= 80 are used as written (for example 95 stays 95).
    #[default]
    Preserve,
    /// Years >= 80 map to 1900 + year.
    Fix,
}

impl TwoDigitYear {
    /// Expands `year` according to this policy.
    /// Four digit years are returned unchanged.
    pub fn resolve(&self, year: i32) -> i32 {
        if !(0..100).contains(&year) {
            year
        } else if year < 80 {
            year + 2000
        } else {
            match self {
                Self::Preserve => year,
                Self::Fix => year + 1900,
            }
        }
    }
}

fn default_constellations() -> String {
    "GRE".to_string()
}

fn default_signal() -> String {
    "C1".to_string()
}

fn default_min_pseudo_range() -> f64 {
    15.0E6
}

fn default_kepler_tolerance() -> f64 {
    1.0E-9
}

fn default_kepler_max_iter() -> usize {
    100
}

fn default_lsq_epsilon() -> f64 {
    1.0E-6
}

fn default_lsq_max_iter() -> usize {
    20
}

fn default_sigma() -> f64 {
    1.0
}

fn default_light_time_iter() -> usize {
    1
}

fn default_max_ephemeris_age() -> f64 {
    7200.0
}

fn default_interpolation_order() -> usize {
    9
}

/// [Config] gathers all positioning parameters.
/// With the `serde` feature, every field may be omitted
/// from a serialized description and takes its default value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct Config {
    /// Constellations we navigate with, as one letter per constellation ("GRE")
    #[cfg_attr(feature = "serde", serde(default = "default_constellations"))]
    pub constellations: String,
    /// Pseudo range observable
    #[cfg_attr(feature = "serde", serde(default = "default_signal"))]
    pub signal: String,
    /// Pseudo ranges below this value [m] are considered implausible
    #[cfg_attr(feature = "serde", serde(default = "default_min_pseudo_range"))]
    pub min_pseudo_range: f64,
    /// Kepler solver convergence criteria [rad]
    #[cfg_attr(feature = "serde", serde(default = "default_kepler_tolerance"))]
    pub kepler_tolerance: f64,
    /// Kepler solver iteration cap
    #[cfg_attr(feature = "serde", serde(default = "default_kepler_max_iter"))]
    pub kepler_max_iter: usize,
    /// Convergence criteria on the a posteriori variance
    #[cfg_attr(feature = "serde", serde(default = "default_lsq_epsilon"))]
    pub lsq_epsilon: f64,
    /// Least squares iteration cap
    #[cfg_attr(feature = "serde", serde(default = "default_lsq_max_iter"))]
    pub lsq_max_iter: usize,
    /// Pseudo range standard deviation [m]
    #[cfg_attr(feature = "serde", serde(default = "default_sigma"))]
    pub sigma: f64,
    /// Number of light time correction iterations (at least one is performed)
    #[cfg_attr(feature = "serde", serde(default = "default_light_time_iter"))]
    pub light_time_iter: usize,
    /// Maximal |t - toc| [s] tolerated when selecting an ephemeris
    #[cfg_attr(feature = "serde", serde(default = "default_max_ephemeris_age"))]
    pub max_ephemeris_age: f64,
    /// Lagrange interpolation order, for precise orbits
    #[cfg_attr(feature = "serde", serde(default = "default_interpolation_order"))]
    pub interpolation_order: usize,
    /// Two digit year expansion policy
    #[cfg_attr(feature = "serde", serde(default))]
    pub two_digit_year: TwoDigitYear,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            constellations: default_constellations(),
            signal: default_signal(),
            min_pseudo_range: default_min_pseudo_range(),
            kepler_tolerance: default_kepler_tolerance(),
            kepler_max_iter: default_kepler_max_iter(),
            lsq_epsilon: default_lsq_epsilon(),
            lsq_max_iter: default_lsq_max_iter(),
            sigma: default_sigma(),
            light_time_iter: default_light_time_iter(),
            max_ephemeris_age: default_max_ephemeris_age(),
            interpolation_order: default_interpolation_order(),
            two_digit_year: TwoDigitYear::default(),
        }
    }
}

impl Config {
    /// Returns true if we should navigate with this [Constellation]
    pub fn uses(&self, constellation: Constellation) -> bool {
        let mut letter = String::new();
        if write!(letter, "{:x}", constellation).is_err() {
            return false;
        }
        self.constellations
            .to_uppercase()
            .contains(&letter.to_uppercase())
    }

    /// Copies and returns [Config] with desired constellation subset
    pub fn with_constellations(&self, constellations: &str) -> Self {
        let mut s = self.clone();
        s.constellations = constellations.to_string();
        s
    }

    /// Copies and returns [Config] with desired pseudo range observable
    pub fn with_signal(&self, signal: &str) -> Self {
        let mut s = self.clone();
        s.signal = signal.to_string();
        s
    }

    /// Copies and returns [Config] with desired pseudo range standard deviation [m].
    /// Fails when `sigma` is not strictly positive.
    pub fn with_sigma(&self, sigma: f64) -> Result<Self, Error> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(Error::InvalidSigma(sigma));
        }
        let mut s = self.clone();
        s.sigma = sigma;
        Ok(s)
    }

    /// Copies and returns [Config] with desired [TwoDigitYear] policy
    pub fn with_two_digit_year(&self, policy: TwoDigitYear) -> Self {
        let mut s = self.clone();
        s.two_digit_year = policy;
        s
    }
}
