//! Physical and GNSS constants

use crate::prelude::Constellation;

/// Speed of light in vacuum [m/s]
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Seconds in one day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Seconds in one week
pub const SECONDS_PER_WEEK: f64 = 604_800.0;

/// MJD of the GPS origin (1980-01-06T00:00:00)
pub const MJD_GPS_ORIGIN: f64 = 44_244.0;

/// JD - MJD offset
pub const JD_OFFSET: f64 = 2_400_000.5;

/// JD of 1950-01-01T00:00:00
pub const JD_1950: f64 = 2_433_282.5;

/// Earth gravitational constants [m³.s⁻²]
pub(crate) struct GM;

impl GM {
    pub const GPS: f64 = 3.986005E14;
    pub const GLO: f64 = 3.9860044E14;
    pub const GAL: f64 = 3.986004418E14;
}

/// Earth rotation rates [rad.s⁻¹]
pub(crate) struct Omega;

impl Omega {
    pub const GPS: f64 = 7.2921151467E-5;
    pub const GLO: f64 = 7.292115E-5;
}

/// Relativistic clock correction factor, - 2 * sqrt(gm) / c / c
pub(crate) struct DtrF;

impl DtrF {
    pub const GPS: f64 = -4.442807633E-10;
}

/// PZ-90 Earth model used by Glonass
pub(crate) struct PZ90;

impl PZ90 {
    /// Equatorial radius [m]
    pub const AE: f64 = 6_378_136.0;
    /// Second zonal harmonic
    pub const J20: f64 = 1.0826257E-3;
}

/// Constants used by the propagators
pub(crate) struct Constants;

impl Constants {
    /// Earth gravitation
    pub const fn gm(constellation: Constellation) -> f64 {
        match constellation {
            Constellation::Galileo => GM::GAL,
            Constellation::Glonass => GM::GLO,
            _ => GM::GPS,
        }
    }
}
