//! Typebus Telemetry - logging setup for processes that host event buses.
//!
//! The bus crate only emits `tracing` events (bus creation, listener
//! creation, subscription disposal, swallowed subscriber panics) under the
//! `typebus` target. This crate installs a subscriber that renders them,
//! with a separate level for the bus and thread names that identify serial
//! scheduler workers. `typebus-test` routes test output through it too.
//!
//! # Example
//!
//! ```rust,no_run
//! use typebus::EventBus;
//! use typebus_telemetry::{LogConfig, setup_logging};
//!
//! # fn main() -> Result<(), typebus_telemetry::TelemetryError> {
//! let config = LogConfig::bus_debug().with_directive("my_app=trace");
//!
//! setup_logging(&config)?;
//!
//! let bus = EventBus::with_id("main");
//! tracing::info!(bus_id = %bus.id(), "Bus ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    BUS_TARGET, LogConfig, LogFields, LogFormat, LogTarget, setup_default_logging, setup_logging,
};
