//! integrated tests
mod sp3;
mod spp;

use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the test logger, once per test binary
pub fn init_logger() {
    INIT.call_once(|| {
        env_logger::builder()
            .is_test(true)
            .filter_level(log::LevelFilter::Debug)
            .init();
    });
}

/// Absolute path of a test resource
pub fn test_resource(relative: &str) -> String {
    env!("CARGO_MANIFEST_DIR").to_owned() + "/test_resources/" + relative
}
