//! GNSS time representation
use crate::{
    cfg::TwoDigitYear,
    constants::{JD_1950, JD_OFFSET, MJD_GPS_ORIGIN, SECONDS_PER_DAY, SECONDS_PER_WEEK},
    prelude::{Duration, Epoch, TimeScale},
};

/// [GnssTime] is an instant expressed in GPST, a continuous timescale
/// (no leap seconds), with all GNSS specific quantities derived from it.
/// Ordering and equality are those of the underlying instant.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GnssTime {
    epoch: Epoch,
}

/// 1980-01-06T00:00:00 GPST
fn gps_origin() -> Epoch {
    Epoch::from_gregorian(1980, 1, 6, 0, 0, 0, 0, TimeScale::GPST)
}

impl GnssTime {
    /// Builds [GnssTime] from a calendar tuple.
    /// Year, month and day are mandatory: if any is missing, this returns None.
    /// `second` may be fractional: its fractional part is converted to microseconds
    /// and the largest of that value and `microsecond` is retained.
    /// Returns None on invalid dates as well.
    pub fn from_calendar(
        year: Option<i32>,
        month: Option<u8>,
        day: Option<u8>,
        hour: u8,
        minute: u8,
        second: f64,
        microsecond: u32,
    ) -> Option<Self> {
        Self::from_calendar_in(
            year,
            month,
            day,
            hour,
            minute,
            second,
            microsecond,
            TimeScale::GPST,
        )
    }

    /// Same as [Self::from_calendar], for a calendar expressed in another [TimeScale]
    /// (for example UTC for Glonass), converted to GPST.
    #[allow(clippy::too_many_arguments)]
    pub fn from_calendar_in(
        year: Option<i32>,
        month: Option<u8>,
        day: Option<u8>,
        hour: u8,
        minute: u8,
        second: f64,
        microsecond: u32,
        timescale: TimeScale,
    ) -> Option<Self> {
        let (year, month, day) = (year?, month?, day?);
        if !second.is_finite() || second < 0.0 {
            return None;
        }

        let whole = second.trunc();
        let derived = (((second - whole) * 1.0E6).round() as u32).min(999_999);
        let microsecond = microsecond.max(derived).min(999_999);

        let epoch = Epoch::maybe_from_gregorian(
            year,
            month,
            day,
            hour,
            minute,
            whole as u8,
            microsecond * 1_000,
            timescale,
        )
        .ok()?;

        Some(Self::from_epoch(epoch))
    }

    /// Builds [GnssTime] from a calendar date and time of day.
    pub fn from_ymdhms(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: f64,
    ) -> Option<Self> {
        Self::from_calendar(Some(year), Some(month), Some(day), hour, minute, second, 0)
    }

    /// Builds [GnssTime] from a possibly two-digit year, resolved with
    /// the [TwoDigitYear] policy.
    pub fn from_ymdhms_with_policy(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: f64,
        policy: TwoDigitYear,
    ) -> Option<Self> {
        Self::from_ymdhms(policy.resolve(year), month, day, hour, minute, second)
    }

    /// Builds [GnssTime] from Modified Julian Day
    pub fn from_mjd(mjd: f64) -> Self {
        Self::from_gps_seconds((mjd - MJD_GPS_ORIGIN) * SECONDS_PER_DAY)
    }

    /// Builds [GnssTime] from Julian Day
    pub fn from_jd(jd: f64) -> Self {
        Self::from_mjd(jd - JD_OFFSET)
    }

    /// Builds [GnssTime] from year, day of year (1 = January 1st) and second of day.
    /// Returns None when `doy` does not exist within `year`.
    pub fn from_day_of_year(year: i32, doy: u16, sod: f64) -> Option<Self> {
        if doy == 0 {
            return None;
        }
        let t0 = Epoch::from_day_of_year(year, f64::from(doy), TimeScale::GPST);
        if t0.year() != year {
            return None;
        }
        Some(Self::from_epoch(t0).shifted(sod))
    }

    /// Builds [GnssTime] from elapsed seconds since the GPS origin
    pub fn from_gps_seconds(seconds: f64) -> Self {
        Self {
            epoch: gps_origin() + Duration::from_seconds(seconds),
        }
    }

    /// Builds [GnssTime] from a GPS week counter and second of week
    pub fn from_week_sow(week: u32, sow: f64) -> Self {
        Self::from_gps_seconds(f64::from(week) * SECONDS_PER_WEEK + sow)
    }

    /// Builds [GnssTime] from a [hifitime::Epoch], whatever its timescale.
    pub fn from_epoch(epoch: Epoch) -> Self {
        Self {
            epoch: epoch.to_time_scale(TimeScale::GPST),
        }
    }

    /// Returns underlying [Epoch], expressed in GPST
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Returns a new [GnssTime] shifted by `seconds` (possibly negative)
    pub fn shifted(&self, seconds: f64) -> Self {
        Self {
            epoch: self.epoch + Duration::from_seconds(seconds),
        }
    }

    /// Elapsed seconds since the GPS origin
    pub fn gps_seconds(&self) -> f64 {
        (self.epoch - gps_origin()).to_seconds()
    }

    /// Whole days since the GPS origin (floor division)
    pub fn gps_days(&self) -> i64 {
        (self.gps_seconds() / SECONDS_PER_DAY).floor() as i64
    }

    /// Whole weeks since the GPS origin (floor division)
    pub fn gps_weeks(&self) -> i64 {
        (self.gps_seconds() / SECONDS_PER_WEEK).floor() as i64
    }

    /// Modified Julian Day
    pub fn mjd(&self) -> f64 {
        self.gps_seconds() / SECONDS_PER_DAY + MJD_GPS_ORIGIN
    }

    /// Julian Day
    pub fn jd(&self) -> f64 {
        self.mjd() + JD_OFFSET
    }

    /// Julian Day relative to 1950-01-01T00:00:00
    pub fn jd50(&self) -> f64 {
        self.jd() - JD_1950
    }

    /// Second of GPS week
    pub fn sow(&self) -> f64 {
        self.gps_seconds().rem_euclid(SECONDS_PER_WEEK)
    }

    /// Second of day
    pub fn sod(&self) -> f64 {
        self.gps_seconds().rem_euclid(SECONDS_PER_DAY)
    }

    /// Gregorian decomposition in GPST, to the nearest microsecond
    fn gregorian(&self) -> (i32, u8, u8, u8, u8, u8, u32) {
        self.epoch
            .round(Duration::from_microseconds(1.0))
            .to_gregorian(TimeScale::GPST)
    }

    /// Calendar (year, month, day)
    pub fn date(&self) -> (i32, u8, u8) {
        let (y, m, d, _, _, _, _) = self.gregorian();
        (y, m, d)
    }

    /// Calendar year
    pub fn year(&self) -> i32 {
        self.date().0
    }

    /// Calendar month, 1 being January
    pub fn month(&self) -> u8 {
        self.date().1
    }

    /// Day of month
    pub fn day(&self) -> u8 {
        self.date().2
    }

    /// Time of day (hour, minute, second, microsecond)
    pub fn time(&self) -> (u8, u8, u8, u32) {
        let (_, _, _, hh, mm, ss, ns) = self.gregorian();
        (hh, mm, ss, ns / 1_000)
    }

    /// Day of year, 1 being January 1st
    pub fn doy(&self) -> u16 {
        self.epoch
            .round(Duration::from_microseconds(1.0))
            .day_of_year()
            .floor() as u16
    }

    /// Week of year
    pub fn woy(&self) -> u16 {
        self.doy() / 7
    }
}

impl std::ops::Sub for GnssTime {
    type Output = Duration;
    fn sub(self, rhs: Self) -> Duration {
        self.epoch - rhs.epoch
    }
}

impl std::fmt::Display for GnssTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (y, m, d) = self.date();
        let (hh, mm, ss, us) = self.time();
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:06} GPST",
            y, m, d, hh, mm, ss, us
        )
    }
}
