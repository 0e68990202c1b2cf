//! Test harness helpers.

use typebus_telemetry::{LogConfig, TelemetryError, setup_logging};

/// Set up test logging with the given filter.
///
/// Lines go through the test writer, so they are captured per test and only
/// shown for failures. Thread names are included, which tells inline
/// deliveries apart from ones made on a serial scheduler's worker.
/// Repeated calls are harmless: the first installed subscriber stays.
///
/// # Panics
///
/// Panics if `filter` is not a valid filter directive list.
///
/// # Example
///
/// ```rust
/// use typebus_test::setup_test_logging;
///
/// setup_test_logging("typebus=trace");
/// ```
pub fn setup_test_logging(filter: &str) {
    match setup_logging(&LogConfig::for_tests(filter)) {
        Ok(()) | Err(TelemetryError::InitError(_)) => {},
        Err(e) => panic!("invalid test log filter {filter:?}: {e}"),
    }
}

/// Set up test logging at `warn`, with the bus's own diagnostics at `debug`.
pub fn setup_test_logging_default() {
    setup_test_logging("warn,typebus=debug");
}
