#[cfg(test)]
mod test {
    use crate::observer::test::Recorder;
    use crate::prelude::*;
    use crate::tests::{init_logger, test_resource};
    use nalgebra::Vector3;

    const NAV_FILE: &str = "NAV/V3/SYNT00FRA_R_20201770000_01D_GN.rnx";
    const OBS_FILE: &str = "OBS/V2/synt1770.20o";
    const SP3_FILE: &str = "SP3/SYN0OPSFIN_20201770000_01D_15M_ORB.SP3";

    /// Receiver used to synthesize the observations
    fn receiver() -> Vector3<f64> {
        Vector3::new(4_201_575.0, 189_856.0, 4_779_066.0)
    }

    /// 100us receiver clock offset
    const CLOCK_BIAS: f64 = 1.0E-4 * 299_792_458.0;

    fn verify(solutions: &[(GnssTime, Option<ReceiverSolution>)]) {
        let t0 = GnssTime::from_ymdhms(2020, 6, 25, 12, 0, 0.0).unwrap();
        assert_eq!(solutions.len(), 2);
        assert_eq!(solutions[0].0, t0);
        assert_eq!(solutions[1].0, t0.shifted(30.0));

        for (t, solution) in solutions {
            let solution = solution.as_ref().unwrap();
            let error = (solution.position - receiver()).norm();
            assert!(error < 5.0E-2, "{}: position error {} m", t, error);
            assert!(
                (solution.clock_bias - CLOCK_BIAS).abs() < 5.0E-2,
                "{}: clock error {} m",
                t,
                solution.clock_bias - CLOCK_BIAS
            );
            assert!((solution.clock_offset() - 1.0E-4).abs() < 1.0E-9);
            assert!(solution.converged);
            assert!(solution.variance.unwrap() < 1.0E-3);
        }
    }

    #[test]
    fn broadcast_positioning() {
        init_logger();
        let nav = NavigationData::from_file(test_resource(NAV_FILE)).unwrap();
        let obs = ObservationData::from_file(test_resource(OBS_FILE)).unwrap();

        let recorder = Recorder::default();
        let pipeline = Pipeline::new(Config::default(), &nav, &recorder);
        let solutions = pipeline.resolve_all(&obs);
        verify(&solutions);

        // 8 satellites on first epoch, 7 on the second one
        assert_eq!(solutions[0].1.as_ref().unwrap().residuals.len(), 8);
        assert_eq!(solutions[1].1.as_ref().unwrap().residuals.len(), 7);

        let events = recorder.events.borrow();
        let missing: Vec<SV> = events
            .iter()
            .filter_map(|e| match e {
                Event::MissingEphemeris { sv, .. } => Some(*sv),
                _ => None,
            })
            .collect();
        assert_eq!(
            missing,
            vec![
                SV::new(Constellation::GPS, 27),
                SV::new(Constellation::Glonass, 5),
                SV::new(Constellation::GPS, 27),
                SV::new(Constellation::Glonass, 5),
            ]
        );
        assert!(events.contains(&Event::Rejected {
            sv: SV::new(Constellation::GPS, 30),
            t: solutions[1].0,
            reason: "missing pseudo range",
        }));
    }

    #[test]
    fn precise_positioning() {
        init_logger();
        let sp3 = SP3::from_file(test_resource(SP3_FILE)).unwrap();
        let obs = ObservationData::from_file(test_resource(OBS_FILE)).unwrap();
        let pipeline = Pipeline::new(Config::default(), &sp3, &LogObserver);
        verify(&pipeline.resolve_all(&obs));
    }

    #[test]
    fn dynamic_orbit_source() {
        let nav = NavigationData::from_file(test_resource(NAV_FILE)).unwrap();
        let sp3 = SP3::from_file(test_resource(SP3_FILE)).unwrap();
        let obs = ObservationData::from_file(test_resource(OBS_FILE)).unwrap();

        let sources: [&dyn OrbitSource; 2] = [&nav, &sp3];
        for source in sources {
            let pipeline = Pipeline::new(Config::default(), source, &NullObserver);
            verify(&pipeline.resolve_all(&obs));
        }
    }

    #[test]
    fn unusable_epochs() {
        let nav = NavigationData::from_file(test_resource(NAV_FILE)).unwrap();
        let obs = ObservationData::from_file(test_resource(OBS_FILE)).unwrap();

        // only Galileo: nothing to navigate with
        let recorder = Recorder::default();
        let cfg = Config::default().with_constellations("E");
        let pipeline = Pipeline::new(cfg, &nav, &recorder);
        let solutions = pipeline.resolve_all(&obs);
        assert_eq!(solutions.len(), 2);
        assert!(solutions.iter().all(|(_, solution)| solution.is_none()));
        let no_solution = recorder
            .events
            .borrow()
            .iter()
            .filter(|e| matches!(e, Event::NoSolution { candidates: 0, .. }))
            .count();
        assert_eq!(no_solution, 2);

        // signal is not observed
        let cfg = Config::default().with_signal("P2");
        let pipeline = Pipeline::new(cfg, &nav, &NullObserver);
        assert!(pipeline
            .resolve_all(&obs)
            .iter()
            .all(|(_, solution)| solution.is_none()));

        // ephemerides too old
        let mut cfg = Config::default();
        cfg.max_ephemeris_age = 1.0;
        let pipeline = Pipeline::new(cfg, &nav, &NullObserver);
        let solutions = pipeline.resolve_all(&obs);
        assert!(solutions[0].1.is_some());
        assert!(solutions[1].1.is_none());
    }

    #[test]
    fn product_dispatch() {
        let nav = Product::from_file(test_resource(NAV_FILE)).unwrap();
        assert!(nav.navigation().is_some());
        let obs = Product::from_file(test_resource(OBS_FILE)).unwrap();
        assert!(obs.observation().is_some());
        let sp3 = Product::from_file(test_resource(SP3_FILE)).unwrap();
        assert!(sp3.sp3().is_some());

        let nav = nav.navigation().unwrap();
        let obs = obs.observation().unwrap();
        let pipeline = Pipeline::new(Config::default(), nav, &NullObserver);
        verify(&pipeline.resolve_all(obs));

        for (path, format) in [
            (NAV_FILE, Format::NavigationV3),
            (OBS_FILE, Format::ObservationV2),
            (SP3_FILE, Format::Sp3),
            ("NAV/V2/brdc2850.18n", Format::NavigationV2),
            ("NAV/V2/brdc2850.18g", Format::NavigationV2),
            (
                "OBS/V3/ESBC00DNK_R_20182850000_01D_30S_MO.rnx",
                Format::ObservationV3,
            ),
        ] {
            let content = std::fs::read_to_string(test_resource(path)).unwrap();
            assert_eq!(Format::from_content(&content), Some(format), "{}", path);
            assert_eq!(Format::from_path(path), Some(format), "{}", path);
        }
    }
}
