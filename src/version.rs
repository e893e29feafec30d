//! File format revision
use crate::error::ParsingError;

/// [Version] describes the declared format revision, "3.03" being
/// major 3, minor 3.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.major, self.minor)
    }
}

impl std::str::FromStr for Version {
    type Err = ParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (major, minor) = match s.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (s, "0"),
        };
        let minor = if minor.is_empty() { "0" } else { minor };
        Ok(Self {
            major: major
                .parse::<u8>()
                .map_err(|_| ParsingError::VersionParsing)?,
            minor: minor
                .parse::<u8>()
                .map_err(|_| ParsingError::VersionParsing)?,
        })
    }
}
