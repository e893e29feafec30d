//! RINEX header
use std::{collections::HashMap, str::FromStr};

use crate::{
    decoder::{column, i64_at},
    error::ParsingError,
    prelude::{Constellation, Version},
};

/// Header section delimiter, found at byte offset 60
pub const HEADER_END_MARKER: &str = "END OF HEADER";

/// File type, as declared in the header
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RinexType {
    NavigationData,
    ObservationData,
}

/// RINEX [Header] content we care about
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Header {
    /// Declared format revision
    pub version: Version,
    /// Declared file type
    pub rinex_type: RinexType,
    /// File level constellation, [Constellation::Mixed] for multi GNSS files.
    /// None when the header does not specify it.
    pub constellation: Option<Constellation>,
    /// Program that produced this file
    pub program: Option<String>,
    /// Agency or operator
    pub run_by: Option<String>,
    /// Production date, as written
    pub date: Option<String>,
    /// Observables of V2 files, in order of appearance
    pub observables: Vec<String>,
    /// Observables of V3 files, per constellation, in order of appearance
    pub sys_observables: HashMap<Constellation, Vec<String>>,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: Version::new(3, 0),
            rinex_type: RinexType::NavigationData,
            constellation: None,
            program: None,
            run_by: None,
            date: None,
            observables: Vec::new(),
            sys_observables: HashMap::new(),
        }
    }
}

/// Returns the label of a header line (content from byte 60)
pub(crate) fn label(line: &str) -> &str {
    column(line, 60, line.len()).trim()
}

fn text(line: &str, start: usize, end: usize) -> Option<String> {
    let content = column(line, start, end).trim();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

impl Header {
    /// Parses the header section starting at line `cursor`.
    /// Returns the [Header] and the cursor, pointing to the first line after
    /// the end of header marker.
    pub fn parse(lines: &[&str], cursor: usize) -> Result<(Self, usize), ParsingError> {
        let mut header = Self::default();
        let mut version_found = false;
        let mut v2_expected = 0_usize;
        let mut v3_expected = 0_usize;
        let mut v3_system: Option<Constellation> = None;

        let mut cursor = cursor;
        while cursor < lines.len() {
            let line = lines[cursor];
            cursor += 1;

            match label(line) {
                HEADER_END_MARKER => {
                    if !version_found {
                        return Err(ParsingError::VersionParsing);
                    }
                    return Ok((header, cursor));
                },
                "RINEX VERSION / TYPE" => {
                    header.parse_version_type(line)?;
                    version_found = true;
                },
                "PGM / RUN BY / DATE" => {
                    header.program = text(line, 0, 20);
                    header.run_by = text(line, 20, 40);
                    header.date = text(line, 40, 60);
                },
                "# / TYPES OF OBSERV" => {
                    if let Some(count) = i64_at(line, 0, 6) {
                        v2_expected = count.max(0) as usize;
                        header.observables.clear();
                    }
                    for obs in column(line, 6, 60).split_ascii_whitespace() {
                        if header.observables.len() < v2_expected {
                            header.observables.push(obs.to_string());
                        }
                    }
                },
                "SYS / # / OBS TYPES" => {
                    let system = column(line, 0, 1).trim();
                    if !system.is_empty() {
                        let constellation = Constellation::from_str(system)?;
                        v3_expected = i64_at(line, 1, 6).unwrap_or(0).max(0) as usize;
                        v3_system = Some(constellation);
                        header.sys_observables.insert(constellation, Vec::new());
                    }
                    if let Some(constellation) = v3_system {
                        if let Some(list) = header.sys_observables.get_mut(&constellation) {
                            for obs in column(line, 7, 60).split_ascii_whitespace() {
                                if list.len() < v3_expected {
                                    list.push(obs.to_string());
                                }
                            }
                        }
                    }
                },
                _ => {},
            }
        }
        Err(ParsingError::MissingHeaderDelimiter)
    }

    /// Interprates the "RINEX VERSION / TYPE" line
    fn parse_version_type(&mut self, line: &str) -> Result<(), ParsingError> {
        self.version = Version::from_str(column(line, 0, 20))?;

        let type_field = column(line, 20, 40).trim();
        let system_field = column(line, 40, 60).trim();

        match type_field.chars().next() {
            Some('N') => {
                self.rinex_type = RinexType::NavigationData;
            },
            Some('O') => {
                self.rinex_type = RinexType::ObservationData;
            },
            Some('G') if type_field.contains("NAV") => {
                // V2 Glonass navigation
                self.rinex_type = RinexType::NavigationData;
                self.constellation = Some(Constellation::Glonass);
            },
            _ => return Err(ParsingError::TypeParsing),
        }

        if let Some(system) = system_field.get(0..1) {
            if let Ok(constellation) = Constellation::from_str(system) {
                self.constellation = Some(constellation);
            }
        } else if self.constellation.is_none()
            && self.rinex_type == RinexType::NavigationData
            && self.version.major < 3
        {
            // V2 GPS navigation does not specify it
            self.constellation = Some(Constellation::GPS);
        }
        Ok(())
    }

    /// Observables for this [Constellation]. V2 files share a single list.
    pub fn observables(&self, constellation: Constellation) -> Option<&Vec<String>> {
        if self.version.major < 3 {
            Some(&self.observables)
        } else {
            self.sys_observables.get(&constellation)
        }
    }
}
