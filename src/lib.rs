#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::type_complexity)]

/*
 * GNSS-SPP is part of the rtk-rs framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al.
 * This framework is shipped under the Mozilla Public V2 license.
 *
 * Documentation: https://github.com/rtk-rs/gnss-spp
 */

extern crate gnss_rs as gnss;

#[macro_use]
extern crate lazy_static;

#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

pub mod cfg;
pub mod constants;
pub mod decoder;
pub mod error;
pub mod format;
pub mod gnss_time;
pub mod header;
pub mod navigation;
pub mod observation;
pub mod observer;
pub mod pipeline;
pub mod sp3;
pub mod trilateration;
pub mod version;

#[cfg(test)]
mod tests;

/// Package to include all basic structures
pub mod prelude {
    pub use crate::{
        cfg::{Config, TwoDigitYear},
        decoder::Value,
        error::{Error, ParsingError},
        format::{Format, Product},
        gnss_time::GnssTime,
        header::{Header, RinexType},
        navigation::{
            Ephemeris, GalileoEphemeris, GlonassEphemeris, GpsEphemeris, NavigationData,
            SatelliteEphemeris,
        },
        observation::{ObservationData, ObservationRecord},
        observer::{Event, LogObserver, NullObserver, Observer},
        pipeline::{OrbitSource, Pipeline},
        sp3::{Sp3Header, PreciseOrbitSample, SP3},
        trilateration::{ReceiverSolution, Trilaterator},
        version::Version,
    };

    // pub re-export
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}
