#[cfg(test)]
mod test {
    use crate::observer::test::Recorder;
    use crate::prelude::*;
    use crate::tests::{init_logger, test_resource};

    const SP3_FILE: &str = "SP3/SYN0OPSFIN_20201770000_01D_15M_ORB.SP3";
    const NAV_FILE: &str = "NAV/V3/SYNT00FRA_R_20201770000_01D_GN.rnx";

    fn first_epoch() -> GnssTime {
        GnssTime::from_ymdhms(2020, 6, 25, 10, 0, 0.0).unwrap()
    }

    #[test]
    fn synthetic_orbits() {
        init_logger();
        let content = std::fs::read_to_string(test_resource(SP3_FILE)).unwrap();
        let recorder = Recorder::default();
        let sp3 = SP3::parse(&content, &recorder).unwrap();
        assert!(recorder.events.borrow().is_empty());

        assert_eq!(sp3.header.version, 'd');
        assert_eq!(sp3.header.epochs, Some(17));
        assert_eq!(sp3.header.coord_system.as_deref(), Some("IGS20"));
        assert_eq!(sp3.header.orbit_type.as_deref(), Some("FIT"));
        assert_eq!(sp3.header.agency.as_deref(), Some("SYN"));

        let prn: Vec<u8> = sp3.header.satellites.iter().map(|sv| sv.prn).collect();
        assert_eq!(prn, vec![2, 5, 7, 12, 15, 19, 24, 30]);
        assert_eq!(sp3.sv().count(), 8);

        let epochs: Vec<GnssTime> = sp3.epochs().collect();
        assert_eq!(epochs.len(), 17);
        assert_eq!(epochs[0], first_epoch());
        assert_eq!(epochs[16], first_epoch().shifted(4.0 * 3600.0));
        assert_eq!(sp3.samples.len(), 17 * 8);

        let g02 = SV::new(Constellation::GPS, 2);
        let first = sp3.sv_samples(g02).next().unwrap();
        assert_eq!(first.session, 1);
        assert_eq!(first.position_km, (12397.703099, -15465.579290, 17297.177878));
        assert_eq!(first.clock_us, Some(-70.429265));
        assert!(first.velocity_dm_s.is_some());
        assert_eq!(sp3.sv_samples(g02).last().unwrap().session, 17);

        // velocities are only given on the first epoch
        assert_eq!(
            sp3.samples
                .iter()
                .filter(|s| s.velocity_dm_s.is_some())
                .count(),
            8
        );
    }

    #[test]
    fn unknown_clock() {
        let sp3 = SP3::from_file(test_resource(SP3_FILE)).unwrap();
        let g24 = SV::new(Constellation::GPS, 24);
        let t = first_epoch().shifted(2700.0);

        let sample = sp3.closest(g24, t, 1.0).unwrap();
        assert_eq!(sample.clock_us, None);
        assert_eq!(sample.clock(), None);

        // the window contains the unknown clock
        assert!(sp3.interpolate(g24, t.shifted(300.0), 9).is_none());
        // far enough from it
        assert!(sp3.interpolate(g24, t.shifted(3.0 * 3600.0), 9).is_some());
    }

    #[test]
    fn precise_versus_broadcast() {
        let sp3 = SP3::from_file(test_resource(SP3_FILE)).unwrap();
        let nav = NavigationData::from_file(test_resource(NAV_FILE)).unwrap();
        let cfg = Config::default();

        let t = GnssTime::from_ymdhms(2020, 6, 25, 12, 7, 30.0).unwrap();
        for sv in sp3.sv() {
            let precise = sp3.interpolate(sv, t, cfg.interpolation_order).unwrap();
            let broadcast = nav.state(sv, t, &cfg, &NullObserver).unwrap();
            let error = (precise.position - broadcast.position).norm();
            assert!(error < 1.0E-2, "{}: {} m", sv, error);
            let error = (precise.clock_correction - broadcast.clock_correction).abs();
            assert!(error < 1.0E-11, "{}: {} s", sv, error);
        }
    }

    #[test]
    fn interpolation_boundaries() {
        let sp3 = SP3::from_file(test_resource(SP3_FILE)).unwrap();
        let g02 = SV::new(Constellation::GPS, 2);
        let t0 = first_epoch();

        // exactly on the nodes
        let sample = sp3.sv_samples(g02).nth(4).unwrap();
        let state = sp3.interpolate(g02, sample.epoch, 9).unwrap();
        assert!((state.position - sample.position()).norm() < 1.0E-6);

        // first and last nodes are reachable
        assert!(sp3.interpolate(g02, t0, 9).is_some());
        assert!(sp3.interpolate(g02, t0.shifted(4.0 * 3600.0), 9).is_some());
        assert!(sp3.interpolate(g02, t0.shifted(-1.0), 9).is_none());

        let state = sp3.interpolate(g02, t0.shifted(60.0), 9).unwrap();
        assert!(state.position.norm() > 20.0E6);
    }
}
