//! Prelude module - commonly used types for convenient import.
//!
//! Use `use typebus_telemetry::prelude::*;` to import all essential types.

pub use crate::{
    BUS_TARGET, LogConfig, LogFields, LogFormat, LogTarget, TelemetryError, TelemetryResult,
    setup_default_logging, setup_logging,
};
