//! Input format identification and dispatch
use std::path::Path;

use crate::{
    cfg::Config,
    error::Error,
    header::{Header, RinexType},
    navigation::NavigationData,
    observation::ObservationData,
    observer::{LogObserver, Observer},
    sp3::SP3,
};

/// Supported input [Format]s
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    NavigationV2,
    NavigationV3,
    ObservationV2,
    ObservationV3,
    Sp3,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::NavigationV2 => write!(f, "NAV (V2)"),
            Self::NavigationV3 => write!(f, "NAV (V3)"),
            Self::ObservationV2 => write!(f, "OBS (V2)"),
            Self::ObservationV3 => write!(f, "OBS (V3)"),
            Self::Sp3 => write!(f, "SP3"),
        }
    }
}

impl Format {
    /// Identifies the [Format] from the file content itself
    pub fn from_content(content: &str) -> Option<Self> {
        let first = content.lines().find(|line| !line.trim().is_empty())?;
        if first.starts_with('#') {
            // "#c" or "#d" revision marker
            return match first.chars().nth(1) {
                Some('a'..='d') => Some(Self::Sp3),
                _ => None,
            };
        }

        let lines: Vec<&str> = content.lines().collect();
        let (header, _) = Header::parse(&lines, 0).ok()?;
        match (header.rinex_type, header.version.major < 3) {
            (RinexType::NavigationData, true) => Some(Self::NavigationV2),
            (RinexType::NavigationData, false) => Some(Self::NavigationV3),
            (RinexType::ObservationData, true) => Some(Self::ObservationV2),
            (RinexType::ObservationData, false) => Some(Self::ObservationV3),
        }
    }

    /// Identifies the [Format] from a file name, following the usual
    /// naming conventions: "ssss2880.18n" (V2), "SSSS00FRA_R_20182850000_01D_MN.rnx" (V3)
    /// and ".sp3" precise products.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let path = path.as_ref();
        let extension = path.extension()?.to_str()?.to_lowercase();
        let stem = path.file_stem()?.to_str()?.to_uppercase();

        if extension == "sp3" {
            return Some(Self::Sp3);
        }

        if extension == "rnx" {
            let kind = stem.get(stem.len().checked_sub(2)?..)?;
            return match kind {
                "MN" | "GN" | "EN" | "RN" => Some(Self::NavigationV3),
                "MO" | "GO" | "EO" | "RO" => Some(Self::ObservationV3),
                _ => None,
            };
        }

        // V2 short names: 2 digit year + type letter
        let mut chars = extension.chars();
        match (chars.next(), chars.next(), chars.next(), chars.next()) {
            (Some(y0), Some(y1), Some(kind), None)
                if y0.is_ascii_digit() && y1.is_ascii_digit() =>
            {
                match kind {
                    'n' | 'g' | 'l' => Some(Self::NavigationV2),
                    'o' => Some(Self::ObservationV2),
                    _ => None,
                }
            },
            _ => None,
        }
    }
}

/// Parsed [Product], one variant per supported family
#[derive(Debug, Clone, PartialEq)]
pub enum Product {
    Navigation(NavigationData),
    Observation(ObservationData),
    Sp3(SP3),
}

impl Product {
    /// Parses `content` as the given [Format], using default [Config]
    /// and forwarding events to the logger.
    pub fn parse(format: Format, content: &str) -> Result<Self, Error> {
        Self::parse_with(format, content, &Config::default(), &LogObserver)
    }

    /// Parses `content` as the given [Format]
    pub fn parse_with(
        format: Format,
        content: &str,
        cfg: &Config,
        observer: &dyn Observer,
    ) -> Result<Self, Error> {
        match format {
            Format::NavigationV2 | Format::NavigationV3 => Ok(Self::Navigation(
                NavigationData::parse(content, cfg, observer)?,
            )),
            Format::ObservationV2 | Format::ObservationV3 => Ok(Self::Observation(
                ObservationData::parse(content, cfg, observer)?,
            )),
            Format::Sp3 => Ok(Self::Sp3(SP3::parse(content, observer)?)),
        }
    }

    /// Loads a local file. The [Format] is identified from the content,
    /// then from the file name.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let content = std::fs::read_to_string(&path)?;
        let format = Format::from_content(&content)
            .or_else(|| Format::from_path(&path))
            .ok_or(Error::UnknownFormat)?;
        Self::parse(format, &content)
    }

    /// Returns [NavigationData], if this is a navigation product
    pub fn navigation(&self) -> Option<&NavigationData> {
        match self {
            Self::Navigation(nav) => Some(nav),
            _ => None,
        }
    }

    pub fn observation(&self) -> Option<&ObservationData> {
        match self {
            Self::Observation(obs) => Some(obs),
            _ => None,
        }
    }

    pub fn sp3(&self) -> Option<&SP3> {
        match self {
            Self::Sp3(sp3) => Some(sp3),
            _ => None,
        }
    }
}
