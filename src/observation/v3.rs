//! RINEX V3 (and later) observations
use std::collections::HashMap;

use crate::{
    cfg::TwoDigitYear,
    decoder::{column, decode, i64_at, satellite, zero_filled},
    observation::{epoch_at, ObservationRecord, Sessions},
    observer::{Event, Observer},
    prelude::Header,
};

/// Epoch marker
const EPOCH_MARKER: char = '>';

/// Epoch description spans, on the marker line
const EPOCH_SPANS: [(usize, usize); 6] = [(2, 6), (7, 9), (10, 12), (13, 15), (16, 18), (19, 29)];

/// SVNN prefix
const SVNN_SIZE: usize = 3;

/// F14.3 + LLI + SSI
const OBSERVABLE_WIDTH: usize = 16;
const OBSERVABLE_F14_WIDTH: usize = 14;

/// Decodes one satellite line, using the observables of its constellation
fn parse_observations(line: &str, observables: &[String]) -> HashMap<String, f64> {
    let mut observations = HashMap::with_capacity(observables.len());
    for (i, observable) in observables.iter().enumerate() {
        let start = SVNN_SIZE + i * OBSERVABLE_WIDTH;
        let field = zero_filled(column(line, start, start + OBSERVABLE_F14_WIDTH));
        if let Some(value) = decode(&field).and_then(|v| v.as_f64()) {
            observations.insert(observable.clone(), value);
        }
    }
    observations
}

/// Parses the V3 record section, starting at `cursor`
pub(crate) fn parse(
    lines: &[&str],
    cursor: usize,
    header: &Header,
    policy: TwoDigitYear,
    observer: &dyn Observer,
) -> Vec<ObservationRecord> {
    let mut records = Vec::new();
    let mut sessions = Sessions::default();
    let mut cursor = cursor;

    while cursor < lines.len() {
        let line = lines[cursor];
        cursor += 1;

        if !line.starts_with(EPOCH_MARKER) {
            if !line.trim().is_empty() {
                observer.notify(Event::SkippedLine {
                    line: cursor - 1,
                    reason: "unexpected content",
                });
            }
            continue;
        }

        let count = match i64_at(line, 32, 35).and_then(|n| usize::try_from(n).ok()) {
            Some(count) => count,
            None => {
                observer.notify(Event::SkippedLine {
                    line: cursor - 1,
                    reason: "invalid epoch description",
                });
                continue;
            },
        };

        // special events: "count" header lines follow
        if let Some(flag) = i64_at(line, 31, 32) {
            if flag > 1 {
                cursor += count;
                continue;
            }
        }

        let epoch = match epoch_at(line, &EPOCH_SPANS, policy) {
            Some(epoch) => epoch,
            None => {
                observer.notify(Event::SkippedLine {
                    line: cursor - 1,
                    reason: "invalid epoch",
                });
                continue;
            },
        };

        for _ in 0..count {
            let line = match lines.get(cursor) {
                Some(line) => *line,
                None => break,
            };

            let sv = match satellite(column(line, 0, 1), column(line, 1, 3)) {
                Some(sv) => sv,
                None => {
                    observer.notify(Event::SkippedLine {
                        line: cursor,
                        reason: "invalid satellite identifier",
                    });
                    cursor += 1;
                    continue;
                },
            };

            match header.sys_observables.get(&sv.constellation) {
                Some(observables) => {
                    records.push(ObservationRecord {
                        epoch,
                        sv,
                        session: sessions.next(sv),
                        observations: parse_observations(line, observables),
                    });
                },
                None => {
                    observer.notify(Event::SkippedLine {
                        line: cursor,
                        reason: "no observables declared",
                    });
                },
            }
            cursor += 1;
        }
    }
    records
}
