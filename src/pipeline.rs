//! Single point positioning
use nalgebra::Vector3;

use crate::{
    cfg::Config,
    constants::SPEED_OF_LIGHT,
    error::Error,
    navigation::{NavigationData, Propagation, SatelliteEphemeris, SatelliteState},
    observation::{ObservationData, ObservationRecord},
    observer::{Event, Observer},
    prelude::{GnssTime, SV},
    sp3::SP3,
    trilateration::{ReceiverSolution, Trilaterator},
};

/// [OrbitSource] provides satellite states: broadcast ephemerides
/// or tabulated precise orbits.
pub trait OrbitSource {
    /// Satellite clock offset at `t` [s], used to correct the transmission time.
    /// None when no orbit is available for this satellite at this instant.
    fn clock_offset(&self, sv: SV, t: GnssTime, cfg: &Config) -> Option<f64>;
    /// Satellite position and clock correction at `t`
    fn state(
        &self,
        sv: SV,
        t: GnssTime,
        cfg: &Config,
        observer: &dyn Observer,
    ) -> Option<SatelliteState>;
}

impl OrbitSource for NavigationData {
    fn clock_offset(&self, sv: SV, t: GnssTime, cfg: &Config) -> Option<f64> {
        let eph = self.closest(sv, t, cfg.max_ephemeris_age)?;
        Some(eph.clock_polynomial(t))
    }
    fn state(
        &self,
        sv: SV,
        t: GnssTime,
        cfg: &Config,
        observer: &dyn Observer,
    ) -> Option<SatelliteState> {
        let eph = self.closest(sv, t, cfg.max_ephemeris_age)?;
        Some(eph.propagate(t, &Propagation::from(cfg), observer))
    }
}

impl OrbitSource for SP3 {
    fn clock_offset(&self, sv: SV, t: GnssTime, cfg: &Config) -> Option<f64> {
        self.interpolate(sv, t, cfg.interpolation_order)
            .map(|state| state.clock_correction)
    }
    fn state(
        &self,
        sv: SV,
        t: GnssTime,
        cfg: &Config,
        _: &dyn Observer,
    ) -> Option<SatelliteState> {
        self.interpolate(sv, t, cfg.interpolation_order)
    }
}

/// Single point positioning [Pipeline]
pub struct Pipeline<'a, O: OrbitSource + ?Sized> {
    cfg: Config,
    orbits: &'a O,
    observer: &'a dyn Observer,
}

impl<'a, O: OrbitSource + ?Sized> Pipeline<'a, O> {
    /// Builds a new [Pipeline], orbits being shared by reference
    pub fn new(cfg: Config, orbits: &'a O, observer: &'a dyn Observer) -> Self {
        Self {
            cfg,
            orbits,
            observer,
        }
    }

    /// Transmission time, satellite position and corrected range
    /// of a single observation. None when the satellite is not usable.
    fn candidate(&self, t: GnssTime, rec: &ObservationRecord) -> Option<(Vector3<f64>, f64)> {
        let sv = rec.sv;
        if !self.cfg.uses(sv.constellation) {
            return None;
        }

        let pr = match rec.value(&self.cfg.signal) {
            Some(pr) => pr,
            None => {
                self.observer.notify(Event::Rejected {
                    sv,
                    t,
                    reason: "missing pseudo range",
                });
                return None;
            },
        };

        if pr < self.cfg.min_pseudo_range {
            self.observer.notify(Event::Rejected {
                sv,
                t,
                reason: "implausible pseudo range",
            });
            return None;
        }

        // propagation delay
        let te0 = t.shifted(-pr / SPEED_OF_LIGHT);

        // satellite clock offset
        let mut te = te0;
        for _ in 0..self.cfg.light_time_iter.max(1) {
            match self.orbits.clock_offset(sv, te, &self.cfg) {
                Some(dts) => te = te0.shifted(-dts),
                None => {
                    self.observer.notify(Event::MissingEphemeris { sv, t });
                    return None;
                },
            }
        }

        let state = match self.orbits.state(sv, te, &self.cfg, self.observer) {
            Some(state) => state,
            None => {
                self.observer.notify(Event::MissingEphemeris { sv, t: te });
                return None;
            },
        };

        self.observer.notify(Event::Trace(format!(
            "{}({}) - te={} x={:.3} y={:.3} z={:.3} dts={:.3E}",
            t, sv, te, state.position[0], state.position[1], state.position[2], state.clock_correction,
        )));

        Some((state.position, pr + SPEED_OF_LIGHT * state.clock_correction))
    }

    /// Resolves the receiver state at `t`, from the observations sampled at that instant.
    /// Returns Ok(None) when fewer than 4 satellites are usable.
    pub fn resolve<'o>(
        &self,
        t: GnssTime,
        observations: impl Iterator<Item = &'o ObservationRecord>,
    ) -> Result<Option<ReceiverSolution>, Error> {
        let (positions, ranges): (Vec<_>, Vec<_>) = observations
            .filter(|rec| rec.epoch == t)
            .filter_map(|rec| self.candidate(t, rec))
            .unzip();

        if positions.len() < 4 {
            self.observer.notify(Event::NoSolution {
                t,
                candidates: positions.len(),
            });
            return Ok(None);
        }

        let solution = Trilaterator::try_from(&self.cfg)?.resolve(&positions, &ranges)?;
        if !solution.converged {
            self.observer.notify(Event::SolverNotConverged {
                t,
                variance: solution.variance.unwrap_or(f64::NAN),
            });
        }
        Ok(Some(solution))
    }

    /// Resolves every epoch of this [ObservationData].
    /// Epochs that could not be resolved are reported to the [Observer].
    pub fn resolve_all(
        &self,
        observations: &ObservationData,
    ) -> Vec<(GnssTime, Option<ReceiverSolution>)> {
        observations
            .epochs()
            .map(|t| match self.resolve(t, observations.epoch_records(t)) {
                Ok(solution) => (t, solution),
                Err(e) => {
                    self.observer
                        .notify(Event::Trace(format!("{} - resolution error: {}", t, e)));
                    (t, None)
                },
            })
            .collect()
    }
}
