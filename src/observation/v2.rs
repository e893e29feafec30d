//! RINEX V2 observations
use crate::{
    cfg::TwoDigitYear,
    decoder::{column, decode, i64_at, satellite, zero_filled},
    observation::{epoch_at, ObservationRecord, Sessions},
    observer::{Event, Observer},
    prelude::{Constellation, GnssTime, Header, SV},
};

use std::collections::HashMap;

/// Epoch description spans
const EPOCH_SPANS: [(usize, usize); 6] = [(0, 3), (3, 6), (6, 9), (9, 12), (12, 15), (15, 26)];

/// Satellites per epoch line
const SATELLITES_PER_LINE: usize = 12;

/// Observations per line
const OBSERVABLES_PER_LINE: usize = 5;

/// F14.3 + LLI + SSI
const OBSERVABLE_WIDTH: usize = 16;
const OBSERVABLE_F14_WIDTH: usize = 14;

/// Decodes the satellites of one epoch, starting at `cursor`.
/// Returns the identifiers (None when not recognized, to preserve the block layout)
/// and the cursor, pointing past the satellite list.
fn parse_satellites(
    lines: &[&str],
    cursor: usize,
    count: usize,
    default: Constellation,
    observer: &dyn Observer,
) -> (Vec<Option<SV>>, usize) {
    let mut cursor = cursor;
    let mut satellites = Vec::with_capacity(count);

    while satellites.len() < count && cursor < lines.len() {
        let line = lines[cursor];
        let remaining = (count - satellites.len()).min(SATELLITES_PER_LINE);
        for i in 0..remaining {
            let start = 32 + i * 3;
            let system = column(line, start, start + 1);
            let prn = column(line, start + 1, start + 3);
            let sv = if system.trim().is_empty() {
                decode(prn)
                    .and_then(|prn| prn.as_i64())
                    .and_then(|prn| u8::try_from(prn).ok())
                    .map(|prn| SV::new(default, prn))
            } else {
                satellite(system, prn)
            };
            if sv.is_none() {
                observer.notify(Event::SkippedLine {
                    line: cursor,
                    reason: "invalid satellite identifier",
                });
            }
            satellites.push(sv);
        }
        cursor += 1;
    }
    (satellites, cursor)
}

/// Decodes the observations of one satellite, spread over
/// ceil(observables / 5) lines. Stops on end of input.
fn parse_observations(
    lines: &[&str],
    cursor: usize,
    observables: &[String],
) -> (HashMap<String, f64>, usize) {
    let mut cursor = cursor;
    let mut observations = HashMap::with_capacity(observables.len());

    for row in observables.chunks(OBSERVABLES_PER_LINE) {
        let line = match lines.get(cursor) {
            Some(line) => *line,
            None => break,
        };
        for (i, observable) in row.iter().enumerate() {
            let start = i * OBSERVABLE_WIDTH;
            let field = zero_filled(column(line, start, start + OBSERVABLE_F14_WIDTH));
            if let Some(value) = decode(&field).and_then(|v| v.as_f64()) {
                observations.insert(observable.clone(), value);
            }
        }
        cursor += 1;
    }
    (observations, cursor)
}

/// Parses the V2 record section, starting at `cursor`
pub(crate) fn parse(
    lines: &[&str],
    cursor: usize,
    header: &Header,
    policy: TwoDigitYear,
    observer: &dyn Observer,
) -> Vec<ObservationRecord> {
    let default = match header.constellation {
        Some(c) if c != Constellation::Mixed => c,
        _ => Constellation::GPS,
    };
    let observables = &header.observables;

    let mut records = Vec::new();
    let mut sessions = Sessions::default();
    let mut cursor = cursor;

    while cursor < lines.len() {
        let line = lines[cursor];
        if line.trim().is_empty() {
            cursor += 1;
            continue;
        }

        let count = match i64_at(line, 29, 32).and_then(|n| usize::try_from(n).ok()) {
            Some(count) => count,
            None => {
                observer.notify(Event::SkippedLine {
                    line: cursor,
                    reason: "invalid epoch description",
                });
                cursor += 1;
                continue;
            },
        };

        // special events: "count" header lines follow
        if let Some(flag) = i64_at(line, 26, 29) {
            if flag > 1 {
                observer.notify(Event::Trace(format!(
                    "line #{}: event flag {} - {} lines skipped",
                    cursor, flag, count
                )));
                cursor += 1 + count;
                continue;
            }
        }

        let epoch: GnssTime = match epoch_at(line, &EPOCH_SPANS, policy) {
            Some(epoch) => epoch,
            None => {
                observer.notify(Event::SkippedLine {
                    line: cursor,
                    reason: "invalid epoch",
                });
                cursor += 1;
                continue;
            },
        };

        let (satellites, next) = parse_satellites(lines, cursor, count, default, observer);
        cursor = next;

        for sv in satellites {
            if cursor >= lines.len() {
                break;
            }
            let (observations, next) = parse_observations(lines, cursor, observables);
            cursor = next;
            if let Some(sv) = sv {
                records.push(ObservationRecord {
                    epoch,
                    sv,
                    session: sessions.next(sv),
                    observations,
                });
            }
        }
    }
    records
}
