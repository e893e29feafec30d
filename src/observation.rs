//! Pseudo range observations
use itertools::Itertools;

use std::{collections::HashMap, path::Path, str::FromStr};

use crate::{
    cfg::{Config, TwoDigitYear},
    decoder::{f64_at, i64_at},
    error::{Error, ParsingError},
    observer::{LogObserver, Observer},
    prelude::{GnssTime, Header, RinexType, SV},
};

mod v2;
mod v3;

/// Observations of one satellite at one epoch
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationRecord {
    /// Sampling instant
    pub epoch: GnssTime,
    pub sv: SV,
    /// Occurrence counter of this satellite in the file, starting at 1
    pub session: u32,
    /// Observed values, per signal code ("C1", "L1C"..).
    /// Blank fields are not reported.
    pub observations: HashMap<String, f64>,
}

impl ObservationRecord {
    /// Returns observed value for this signal code
    pub fn value(&self, signal: &str) -> Option<f64> {
        self.observations.get(signal).copied()
    }
}

/// Parsed observation file
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationData {
    pub header: Header,
    /// Records, in order of appearance
    pub records: Vec<ObservationRecord>,
}

impl FromStr for ObservationData {
    type Err = Error;
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        Self::parse(content, &Config::default(), &LogObserver)
    }
}

/// Running per satellite session counter
#[derive(Debug, Default)]
pub(crate) struct Sessions(HashMap<SV, u32>);

impl Sessions {
    pub(crate) fn next(&mut self, sv: SV) -> u32 {
        let session = self.0.entry(sv).or_insert(0);
        *session += 1;
        *session
    }
}

/// Decodes an epoch from six fixed column spans (y, m, d, h, min, s)
pub(crate) fn epoch_at(
    line: &str,
    spans: &[(usize, usize); 6],
    policy: TwoDigitYear,
) -> Option<GnssTime> {
    let int = |i: usize| i64_at(line, spans[i].0, spans[i].1);
    let year = i32::try_from(int(0)?).ok()?;
    GnssTime::from_ymdhms_with_policy(
        year,
        u8::try_from(int(1)?).ok()?,
        u8::try_from(int(2)?).ok()?,
        u8::try_from(int(3)?).ok()?,
        u8::try_from(int(4)?).ok()?,
        f64_at(line, spans[5].0, spans[5].1)?,
        policy,
    )
}

impl ObservationData {
    /// Parses observation content. Both revision families are supported,
    /// selected by the declared format version.
    pub fn parse(content: &str, cfg: &Config, observer: &dyn Observer) -> Result<Self, Error> {
        let lines: Vec<&str> = content.lines().collect();
        let (header, cursor) = Header::parse(&lines, 0)?;
        if header.rinex_type != RinexType::ObservationData {
            return Err(Error::Parsing(ParsingError::TypeParsing));
        }
        let records = if header.version.major < 3 {
            v2::parse(&lines, cursor, &header, cfg.two_digit_year, observer)
        } else {
            v3::parse(&lines, cursor, &header, cfg.two_digit_year, observer)
        };
        Ok(Self { header, records })
    }

    /// Parses a local observation file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Iterates over sampling instants, in order of appearance
    pub fn epochs(&self) -> impl Iterator<Item = GnssTime> + '_ {
        self.records.iter().map(|rec| rec.epoch).dedup()
    }

    /// Iterates over records sampled at `t`
    pub fn epoch_records(&self, t: GnssTime) -> impl Iterator<Item = &ObservationRecord> + '_ {
        self.records.iter().filter(move |rec| rec.epoch == t)
    }

    /// Iterates over records of this satellite
    pub fn sv_records(&self, sv: SV) -> impl Iterator<Item = &ObservationRecord> + '_ {
        self.records.iter().filter(move |rec| rec.sv == sv)
    }

    /// Iterates over the satellites, in order of first appearance
    pub fn sv(&self) -> impl Iterator<Item = SV> + '_ {
        self.records.iter().map(|rec| rec.sv).unique()
    }
}
