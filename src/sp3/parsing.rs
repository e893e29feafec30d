//! SP3 content parsing
use regex::Regex;

use std::{collections::HashMap, str::FromStr};

use crate::{
    decoder::{column, f64_at, i64_at, satellite},
    error::ParsingError,
    observer::{Event, Observer},
    prelude::{GnssTime, TimeScale, SV},
    sp3::{PreciseOrbitSample, Sp3Header},
};

lazy_static! {
    /// Blank padded identifiers, like "G 2"
    static ref BLANK_PADDED_SV: Regex = Regex::new(r"^([A-Z])\s(\d)$").unwrap();
}

/// Satellite slots per '+' line
const SATELLITES_PER_LINE: usize = 17;

/// Clock values beyond this are "unknown" markers (999999.999999)
const CLOCK_UNKNOWN: f64 = 999_999.0;

fn header_line(line: &str) -> bool {
    line.starts_with('#') && !line.starts_with("##")
}

fn satellite_line(line: &str) -> bool {
    line.starts_with('+') && !line.starts_with("++")
}

fn file_descriptor(line: &str) -> bool {
    line.starts_with("%c")
}

fn new_epoch(line: &str) -> bool {
    line.starts_with('*')
}

fn end_of_file(line: &str) -> bool {
    line.trim() == "EOF"
}

/// Normalizes blank padded identifiers ("G 2" is "G02") then parses them
pub(crate) fn parse_sv(slot: &str) -> Option<SV> {
    let slot = slot.trim();
    if slot.is_empty() {
        return None;
    }
    let normalized = BLANK_PADDED_SV.replace(slot, "${1}0${2}");
    SV::from_str(&normalized).ok()
}

/// Time system of the file descriptor line
fn timescale(line: &str) -> TimeScale {
    match column(line, 9, 12).trim() {
        "UTC" => TimeScale::UTC,
        "TAI" => TimeScale::TAI,
        "GAL" => TimeScale::GST,
        _ => TimeScale::GPST,
    }
}

fn parse_epoch(line: &str, timescale: TimeScale) -> Option<GnssTime> {
    let int = |start: usize, end: usize| i64_at(line, start, end);
    GnssTime::from_calendar_in(
        Some(i32::try_from(int(3, 7)?).ok()?),
        u8::try_from(int(8, 10)?).ok(),
        u8::try_from(int(11, 13)?).ok(),
        u8::try_from(int(14, 16)?).ok()?,
        u8::try_from(int(17, 19)?).ok()?,
        f64_at(line, 20, 31)?,
        0,
        timescale,
    )
}

/// Decodes the 3D vector and 4th channel of 'P' and 'V' lines
fn vector(line: &str) -> Option<((f64, f64, f64), Option<f64>)> {
    let x = f64_at(line, 4, 18)?;
    let y = f64_at(line, 18, 32)?;
    let z = f64_at(line, 32, 46)?;
    let clock = f64_at(line, 46, 60).filter(|clk| clk.abs() < CLOCK_UNKNOWN);
    Some(((x, y, z), clock))
}

fn text(line: &str, start: usize, end: usize) -> Option<String> {
    let content = column(line, start, end).trim();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

/// Parses SP3 content
pub(crate) fn parse(
    lines: &[&str],
    observer: &dyn Observer,
) -> Result<(Sp3Header, Vec<PreciseOrbitSample>), ParsingError> {
    let mut cursor = lines
        .iter()
        .position(|line| header_line(line))
        .ok_or(ParsingError::MissingHeaderDelimiter)?;

    let line = lines[cursor];
    let mut header = Sp3Header {
        version: line.chars().nth(1).unwrap_or('c'),
        epochs: i64_at(line, 32, 39).and_then(|n| u32::try_from(n).ok()),
        coord_system: text(line, 46, 51),
        orbit_type: text(line, 52, 55),
        agency: text(line, 56, 60),
        satellites: Vec::new(),
    };
    cursor += 1;

    let mut expected = 0_usize;
    let mut ts = TimeScale::GPST;
    let mut epoch = Option::<GnssTime>::None;
    let mut sessions = HashMap::<SV, u32>::new();
    let mut samples = Vec::<PreciseOrbitSample>::new();

    while cursor < lines.len() {
        let line = lines[cursor];

        if end_of_file(line) {
            break;
        }

        if satellite_line(line) {
            if let Some(count) = i64_at(line, 3, 7).and_then(|n| usize::try_from(n).ok()) {
                if header.satellites.is_empty() {
                    expected = count;
                }
            }
            for slot in 0..SATELLITES_PER_LINE {
                if header.satellites.len() >= expected {
                    break;
                }
                let start = 9 + slot * 3;
                if let Some(sv) = parse_sv(column(line, start, start + 3)) {
                    header.satellites.push(sv);
                }
            }
        } else if file_descriptor(line) {
            if ts == TimeScale::GPST {
                ts = timescale(line);
            }
        } else if new_epoch(line) {
            epoch = parse_epoch(line, ts);
            if epoch.is_none() {
                observer.notify(Event::SkippedLine {
                    line: cursor,
                    reason: "invalid epoch",
                });
            }
        } else if line.starts_with('P') || line.starts_with('V') {
            let sv = satellite(column(line, 1, 2), column(line, 2, 4));
            match (epoch, sv, vector(line)) {
                (Some(epoch), Some(sv), Some((xyz, clock))) => {
                    if line.starts_with('P') {
                        let session = sessions.entry(sv).or_insert(0);
                        *session += 1;
                        samples.push(PreciseOrbitSample {
                            epoch,
                            sv,
                            session: *session,
                            position_km: xyz,
                            clock_us: clock,
                            velocity_dm_s: None,
                        });
                    } else {
                        let matching = samples
                            .iter_mut()
                            .rev()
                            .find(|s| s.sv == sv && s.epoch == epoch);
                        match matching {
                            Some(sample) => sample.velocity_dm_s = Some(xyz),
                            None => observer.notify(Event::SkippedLine {
                                line: cursor,
                                reason: "velocity without position",
                            }),
                        }
                    }
                },
                (None, _, _) => {
                    observer.notify(Event::SkippedLine {
                        line: cursor,
                        reason: "missing epoch context",
                    });
                },
                _ => {
                    observer.notify(Event::SkippedLine {
                        line: cursor,
                        reason: "invalid record",
                    });
                },
            }
        }
        cursor += 1;
    }
    Ok((header, samples))
}
