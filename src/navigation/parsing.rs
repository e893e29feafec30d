//! Navigation records parsing
use std::str::FromStr;

use crate::{
    cfg::TwoDigitYear,
    decoder::{column, decode, f64_at},
    error::ParsingError,
    navigation::{
        Ephemeris, GalileoEphemeris, GlonassEphemeris, GpsEphemeris, KeplerianElements,
        NavigationRecord, SatelliteEphemeris,
    },
    observer::{Event, Observer},
    prelude::{Constellation, GnssTime, Header, RinexType, TimeScale, Version, SV},
};

/// Orbit words are 19 byte long
const WORD_SIZE: usize = 19;

/// Parser state
#[derive(Debug, Copy, Clone, PartialEq)]
enum State {
    Header,
    SeekRecord,
    ReadRecordBlock(SV),
}

/// Revision dependent record layout
#[derive(Debug, Copy, Clone)]
struct Layout {
    /// Orbit words start after this many bytes
    indent: usize,
}

impl Layout {
    fn new(version: Version) -> Self {
        match version.major < 3 {
            true => Self { indent: 3 },
            false => Self { indent: 4 },
        }
    }

    /// Returns epoch description, on first line of a record
    fn epoch<'a>(&self, line: &'a str) -> &'a str {
        column(line, 3, self.indent + WORD_SIZE)
    }

    /// Decodes orbit word #index (0..4) of a line
    fn word(&self, line: &str, index: usize) -> Option<f64> {
        let start = self.indent + index * WORD_SIZE;
        f64_at(line, start, start + WORD_SIZE)
    }
}

/// Number of lines in a record, first line included
fn block_size(constellation: Constellation) -> Option<usize> {
    match constellation {
        Constellation::GPS | Constellation::Galileo => Some(8),
        Constellation::Glonass => Some(4),
        _ => None,
    }
}

/// Identifies the satellite of a record, from its first line.
/// When the line starts with a digit or a blank, the record does not
/// specify its constellation and `default` applies.
pub(crate) fn parse_record_identity(line: &str, default: Constellation) -> Option<SV> {
    let first = line.chars().next()?;
    let (constellation, prn) = if first == ' ' || first.is_ascii_digit() {
        (default, decode(column(line, 0, 3))?)
    } else {
        let constellation = Constellation::from_str(column(line, 0, 1)).ok()?;
        (constellation, decode(column(line, 1, 3))?)
    };
    let prn = u8::try_from(prn.as_i64()?).ok()?;
    Some(SV::new(constellation, prn))
}

/// Parses the record epoch: six numerical fields separated by a variable amount of blanks
fn parse_epoch(description: &str, policy: TwoDigitYear, timescale: TimeScale) -> Option<GnssTime> {
    let collapsed = description.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
    let tokens: Vec<&str> = collapsed.split(' ').collect();
    if tokens.len() != 6 {
        return None;
    }
    let year = decode(tokens[0])?.as_i64()?;
    let month = decode(tokens[1])?.as_i64()?;
    let day = decode(tokens[2])?.as_i64()?;
    let hour = decode(tokens[3])?.as_i64()?;
    let minute = decode(tokens[4])?.as_i64()?;
    let second = decode(tokens[5])?.as_f64()?;
    GnssTime::from_calendar_in(
        Some(policy.resolve(i32::try_from(year).ok()?)),
        u8::try_from(month).ok(),
        u8::try_from(day).ok(),
        u8::try_from(hour).ok()?,
        u8::try_from(minute).ok()?,
        second,
        0,
        timescale,
    )
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, ParsingError> {
    value.ok_or(ParsingError::MissingField(field))
}

/// Keplerian elements, found on lines 2 to 5 of GPS and Galileo records
fn keplerian(
    block: &[&str],
    layout: &Layout,
    week: Option<f64>,
) -> Result<KeplerianElements, ParsingError> {
    let week = required(week, "week")?;
    Ok(KeplerianElements {
        crs: required(layout.word(block[1], 1), "crs")?,
        delta_n: required(layout.word(block[1], 2), "delta_n")?,
        m0: required(layout.word(block[1], 3), "m0")?,
        cuc: required(layout.word(block[2], 0), "cuc")?,
        e: required(layout.word(block[2], 1), "e")?,
        cus: required(layout.word(block[2], 2), "cus")?,
        sqrt_a: required(layout.word(block[2], 3), "sqrt_a")?,
        toe: required(layout.word(block[3], 0), "toe")?,
        cic: required(layout.word(block[3], 1), "cic")?,
        omega0: required(layout.word(block[3], 2), "omega0")?,
        cis: required(layout.word(block[3], 3), "cis")?,
        i0: required(layout.word(block[4], 0), "i0")?,
        crc: required(layout.word(block[4], 1), "crc")?,
        omega: required(layout.word(block[4], 2), "omega")?,
        omega_dot: required(layout.word(block[4], 3), "omega_dot")?,
        idot: required(layout.word(block[5], 0), "idot")?,
        week: week as u32,
    })
}

/// (bias, drift, drift rate) on the first line of each record
fn clock(block: &[&str], layout: &Layout) -> Result<(f64, f64, f64), ParsingError> {
    Ok((
        required(layout.word(block[0], 1), "clock_bias")?,
        required(layout.word(block[0], 2), "clock_drift")?,
        required(layout.word(block[0], 3), "clock_drift_rate")?,
    ))
}

fn parse_gps(
    block: &[&str],
    layout: &Layout,
    sv: SV,
    toc: GnssTime,
) -> Result<GpsEphemeris, ParsingError> {
    let (clock_bias, clock_drift, clock_drift_rate) = clock(block, layout)?;
    Ok(GpsEphemeris {
        sv,
        toc,
        clock_bias,
        clock_drift,
        clock_drift_rate,
        kepler: keplerian(block, layout, layout.word(block[5], 2))?,
        iode: layout.word(block[1], 0),
        l2_codes: layout.word(block[5], 1),
        l2p_flag: layout.word(block[5], 3),
        accuracy: layout.word(block[6], 0),
        health: layout.word(block[6], 1),
        tgd: layout.word(block[6], 2),
        iodc: layout.word(block[6], 3),
        transmission_time: layout.word(block[7], 0),
        fit_interval: layout.word(block[7], 1),
    })
}

fn parse_galileo(
    block: &[&str],
    layout: &Layout,
    sv: SV,
    toc: GnssTime,
) -> Result<GalileoEphemeris, ParsingError> {
    let (clock_bias, clock_drift, clock_drift_rate) = clock(block, layout)?;
    Ok(GalileoEphemeris {
        sv,
        toc,
        clock_bias,
        clock_drift,
        clock_drift_rate,
        kepler: keplerian(block, layout, layout.word(block[5], 2))?,
        iodnav: layout.word(block[1], 0),
        data_sources: layout.word(block[5], 1),
        sisa: layout.word(block[6], 0),
        health: layout.word(block[6], 1),
        bgd_e5a: layout.word(block[6], 2),
        bgd_e5b: layout.word(block[6], 3),
        transmission_time: layout.word(block[7], 0),
    })
}

fn parse_glonass(
    block: &[&str],
    layout: &Layout,
    sv: SV,
    toc: GnssTime,
) -> Result<GlonassEphemeris, ParsingError> {
    let (clock_bias, rel_freq_bias, message_frame_time) = clock(block, layout)?;
    let mut state = [(0.0, 0.0, 0.0); 3];
    for (axis, line) in block[1..4].iter().enumerate() {
        let name = ["x", "y", "z"][axis];
        state[axis] = (
            required(layout.word(line, 0), name)?,
            required(layout.word(line, 1), name)?,
            required(layout.word(line, 2), name)?,
        );
    }
    Ok(GlonassEphemeris {
        sv,
        toc,
        clock_bias,
        rel_freq_bias,
        message_frame_time,
        position_km: (state[0].0, state[1].0, state[2].0),
        velocity_km: (state[0].1, state[1].1, state[2].1),
        acceleration_km: (state[0].2, state[1].2, state[2].2),
        health: layout.word(block[1], 3),
        freq_num: layout.word(block[2], 3),
        age_op: layout.word(block[3], 3),
    })
}

/// Parses one record block into an [Ephemeris]
fn parse_block(
    block: &[&str],
    layout: &Layout,
    sv: SV,
    policy: TwoDigitYear,
) -> Result<Ephemeris, ParsingError> {
    let timescale = match sv.constellation {
        Constellation::Glonass => TimeScale::UTC,
        _ => TimeScale::GPST,
    };
    let toc = parse_epoch(layout.epoch(block[0]), policy, timescale)
        .ok_or(ParsingError::DateTimeParsing)?;
    match sv.constellation {
        Constellation::GPS => Ok(Ephemeris::GPS(parse_gps(block, layout, sv, toc)?)),
        Constellation::Galileo => Ok(Ephemeris::Galileo(parse_galileo(
            block, layout, sv, toc,
        )?)),
        Constellation::Glonass => Ok(Ephemeris::Glonass(parse_glonass(
            block, layout, sv, toc,
        )?)),
        _ => Err(ParsingError::SatelliteParsing),
    }
}

/// Parses navigation content, header included.
/// The cursor is an explicit line index, moved by each state.
pub(crate) fn parse(
    lines: &[&str],
    policy: TwoDigitYear,
    observer: &dyn Observer,
) -> Result<(Header, Vec<NavigationRecord>), ParsingError> {
    let mut header = Header::default();
    let mut layout = Layout::new(header.version);
    let mut default = Constellation::Glonass;
    let mut records = Vec::<NavigationRecord>::new();

    let mut cursor = 0_usize;
    let mut state = State::Header;

    loop {
        match state {
            State::Header => {
                let (parsed, next) = Header::parse(lines, cursor)?;
                if parsed.rinex_type != RinexType::NavigationData {
                    return Err(ParsingError::TypeParsing);
                }
                layout = Layout::new(parsed.version);
                default = match parsed.constellation {
                    Some(c) if c != Constellation::Mixed => c,
                    _ => Constellation::Glonass,
                };
                header = parsed;
                cursor = next;
                state = State::SeekRecord;
            },
            State::SeekRecord => {
                while cursor < lines.len() && lines[cursor].trim().is_empty() {
                    cursor += 1;
                }
                if cursor >= lines.len() {
                    break;
                }
                match parse_record_identity(lines[cursor], default) {
                    Some(sv) if block_size(sv.constellation).is_some() => {
                        state = State::ReadRecordBlock(sv);
                    },
                    Some(_) => {
                        observer.notify(Event::SkippedLine {
                            line: cursor,
                            reason: "unsupported constellation",
                        });
                        cursor += 1;
                    },
                    None => {
                        observer.notify(Event::SkippedLine {
                            line: cursor,
                            reason: "invalid satellite identifier",
                        });
                        cursor += 1;
                    },
                }
            },
            State::ReadRecordBlock(sv) => {
                let size = block_size(sv.constellation).unwrap_or(1);
                let block: Vec<&str> = (0..size)
                    .map(|i| lines.get(cursor + i).copied().unwrap_or(""))
                    .collect();

                match parse_block(&block, &layout, sv, policy) {
                    Ok(ephemeris) => {
                        let session = match records.last() {
                            Some(last) if last.ephemeris.sv() == sv => last.session + 1,
                            _ => 1,
                        };
                        records.push(NavigationRecord { session, ephemeris });
                    },
                    Err(e) => {
                        observer.notify(Event::Trace(format!(
                            "line #{}: {} record - {}",
                            cursor, sv, e
                        )));
                        observer.notify(Event::SkippedLine {
                            line: cursor,
                            reason: "invalid record",
                        });
                    },
                }
                cursor += size;
                state = State::SeekRecord;
            },
        }
    }
    Ok((header, records))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::observer::{test::Recorder, NullObserver};

    #[test]
    fn record_identity() {
        let gps = Constellation::GPS;
        assert_eq!(
            parse_record_identity("G01 2018 10 12 00 00 00", gps),
            Some(SV::new(Constellation::GPS, 1))
        );
        assert_eq!(
            parse_record_identity("E11 2018 10 12 00 00 00", gps),
            Some(SV::new(Constellation::Galileo, 11))
        );
        assert_eq!(
            parse_record_identity("G 2 2018 10 12 00 00 00", gps),
            Some(SV::new(Constellation::GPS, 2))
        );
        assert_eq!(
            parse_record_identity(" 3 20 12 31 23 45  0.0", Constellation::Glonass),
            Some(SV::new(Constellation::Glonass, 3))
        );
        assert_eq!(
            parse_record_identity("12 20 12 31 23 45  0.0", gps),
            Some(SV::new(Constellation::GPS, 12))
        );
        assert_eq!(parse_record_identity("    3.500000000000E+01", gps), None);
        assert_eq!(parse_record_identity("", gps), None);
    }

    #[test]
    fn epoch_parsing() {
        let policy = TwoDigitYear::Preserve;
        let t = parse_epoch(" 2018 10 12 00 00 00", policy, TimeScale::GPST).unwrap();
        assert_eq!(t, GnssTime::from_ymdhms(2018, 10, 12, 0, 0, 0.0).unwrap());
        let t = parse_epoch("20 12 31 23 45  0.0", policy, TimeScale::GPST).unwrap();
        assert_eq!(t, GnssTime::from_ymdhms(2020, 12, 31, 23, 45, 0.0).unwrap());
        let t = parse_epoch("95  1  1  2  0 30.5", TwoDigitYear::Fix, TimeScale::GPST).unwrap();
        assert_eq!(t, GnssTime::from_ymdhms(1995, 1, 1, 2, 0, 30.5).unwrap());
        assert!(parse_epoch("2018 10 12 00 00", policy, TimeScale::GPST).is_none());
        assert!(parse_epoch("2018 13 12 00 00 00", policy, TimeScale::GPST).is_none());
    }

    fn gps_record(prn: &str, hour: &str) -> Vec<String> {
        vec![
            format!("{} 2018 10 12 {} 00 00-2.745445817709E-05-1.080024958355E-11 0.000000000000E+00", prn, hour),
            "     3.500000000000E+01 1.175000000000E+01 4.424827168955E-09 2.781290457443E+00".to_string(),
            "     6.165355443954E-07 8.605271112174E-03 8.560344576836E-06 5.153673933029E+03".to_string(),
            "     4.320000000000E+05 7.450580596924E-08 2.093281418468E+00-1.117587089539E-08".to_string(),
            "     9.653150694497E-01 2.122812500000E+02 6.105446647626E-01-8.059621144600E-09".to_string(),
            "     1.360771254016E-10 1.000000000000E+00 2.022000000000E+03 0.000000000000E+00".to_string(),
            "     2.000000000000E+00 0.000000000000E+00 5.587935447693E-09 3.500000000000E+01".to_string(),
            "     4.248180000000E+05 4.000000000000E+00".to_string(),
        ]
    }

    fn header() -> Vec<String> {
        vec![
            format!(
                "{:<60}{}",
                "     3.03           N: GNSS NAV DATA    M: MIXED", "RINEX VERSION / TYPE"
            ),
            format!("{:<60}{}", "", "END OF HEADER"),
        ]
    }

    #[test]
    fn gps_v3_block() {
        let mut content = header();
        content.extend(gps_record("G01", "00"));
        let lines: Vec<&str> = content.iter().map(|s| s.as_str()).collect();
        let (header, records) = parse(&lines, TwoDigitYear::Preserve, &NullObserver).unwrap();
        assert_eq!(header.version, Version::new(3, 3));
        assert_eq!(records.len(), 1);

        let eph = records[0].ephemeris.as_gps().unwrap();
        assert_eq!(eph.sv, SV::new(Constellation::GPS, 1));
        assert_eq!(eph.toc, GnssTime::from_ymdhms(2018, 10, 12, 0, 0, 0.0).unwrap());
        assert_eq!(eph.clock_bias, -2.745445817709E-05);
        assert_eq!(eph.clock_drift, -1.080024958355E-11);
        assert_eq!(eph.clock_drift_rate, 0.0);
        assert_eq!(eph.iode, Some(35.0));
        assert_eq!(eph.kepler.crs, 11.75);
        assert_eq!(eph.kepler.delta_n, 4.424827168955E-09);
        assert_eq!(eph.kepler.m0, 2.781290457443);
        assert_eq!(eph.kepler.e, 8.605271112174E-03);
        assert_eq!(eph.kepler.sqrt_a, 5.153673933029E+03);
        assert_eq!(eph.kepler.toe, 432_000.0);
        assert_eq!(eph.kepler.cis, -1.117587089539E-08);
        assert_eq!(eph.kepler.omega_dot, -8.059621144600E-09);
        assert_eq!(eph.kepler.idot, 1.360771254016E-10);
        assert_eq!(eph.kepler.week, 2022);
        assert_eq!(eph.l2_codes, Some(1.0));
        assert_eq!(eph.tgd, Some(5.587935447693E-09));
        assert_eq!(eph.iodc, Some(35.0));
        assert_eq!(eph.transmission_time, Some(424_818.0));
        assert_eq!(eph.fit_interval, Some(4.0));
        assert_eq!(records[0].session, 1);
    }

    #[test]
    fn sessions() {
        let mut content = header();
        content.extend(gps_record("G01", "00"));
        content.push(String::new());
        content.extend(gps_record("G01", "02"));
        content.extend(gps_record("G02", "00"));
        content.extend(gps_record("G01", "04"));
        let lines: Vec<&str> = content.iter().map(|s| s.as_str()).collect();
        let (_, records) = parse(&lines, TwoDigitYear::Preserve, &NullObserver).unwrap();
        let sessions: Vec<u32> = records.iter().map(|r| r.session).collect();
        assert_eq!(sessions, vec![1, 2, 1, 1]);
        let prn: Vec<u8> = records.iter().map(|r| r.ephemeris.sv().prn).collect();
        assert_eq!(prn, vec![1, 1, 2, 1]);
    }

    #[test]
    fn tolerant_skips() {
        let mut content = header();
        content.push("Gxx 2018 10 12 00 00 00".to_string());
        content.extend(gps_record("G01", "00"));
        // unsupported constellation: every line is skipped
        content.extend(gps_record("C05", "00"));
        // bad epoch: the whole block is skipped
        content.extend(gps_record("G03", "99"));
        content.extend(gps_record("G04", "00"));
        let lines: Vec<&str> = content.iter().map(|s| s.as_str()).collect();
        let recorder = Recorder::default();
        let (_, records) = parse(&lines, TwoDigitYear::Preserve, &recorder).unwrap();
        let prn: Vec<u8> = records.iter().map(|r| r.ephemeris.sv().prn).collect();
        assert_eq!(prn, vec![1, 4]);
        assert!(!recorder.events.borrow().is_empty());
    }

    #[test]
    fn truncated_record() {
        let mut content = header();
        content.extend(gps_record("G01", "00"));
        let mut truncated = gps_record("G02", "00");
        truncated.truncate(3);
        content.extend(truncated);
        let lines: Vec<&str> = content.iter().map(|s| s.as_str()).collect();
        let (_, records) = parse(&lines, TwoDigitYear::Preserve, &NullObserver).unwrap();
        assert_eq!(records.len(), 1);
    }
}
