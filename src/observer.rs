//! Processing events and their sinks
use log::{debug, error, warn};

use crate::prelude::{GnssTime, SV};

/// Notable events reported by parsers and solvers
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A line could not be interpreted and was skipped
    SkippedLine { line: usize, reason: &'static str },
    /// No ephemeris (or precise orbit) for this satellite at this instant
    MissingEphemeris { sv: SV, t: GnssTime },
    /// Satellite rejected by the pre-fit criteria
    Rejected { sv: SV, t: GnssTime, reason: &'static str },
    /// Kepler solver stopped on its iteration cap
    KeplerNotConverged { sv: SV, precision: f64 },
    /// Least squares stopped on its iteration cap
    SolverNotConverged { t: GnssTime, variance: f64 },
    /// Not enough satellites to resolve this epoch
    NoSolution { t: GnssTime, candidates: usize },
    /// Free form debug trace
    Trace(String),
}

/// [Observer] receives processing [Event]s.
/// Algorithms receive it as a collaborator and never reach
/// for process wide state themselves.
pub trait Observer {
    fn notify(&self, event: Event);
}

/// [LogObserver] forwards [Event]s to the `log` facade.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn notify(&self, event: Event) {
        match event {
            Event::SkippedLine { line, reason } => {
                debug!("line #{}: {} - skipped", line, reason)
            },
            Event::MissingEphemeris { sv, t } => warn!("{}({}) - no orbit available", t, sv),
            Event::Rejected { sv, t, reason } => debug!("{}({}) - rejected: {}", t, sv, reason),
            Event::KeplerNotConverged { sv, precision } => {
                warn!("{} - kepler solver did not converge ({:.3E})", sv, precision)
            },
            Event::SolverNotConverged { t, variance } => {
                warn!("{} - solver did not converge (σ0²={:.3E})", t, variance)
            },
            Event::NoSolution { t, candidates } => {
                error!("{} - not enough candidates ({})", t, candidates)
            },
            Event::Trace(msg) => debug!("{}", msg),
        }
    }
}

/// [NullObserver] discards all [Event]s.
#[derive(Debug, Default, Copy, Clone)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn notify(&self, _: Event) {}
}
