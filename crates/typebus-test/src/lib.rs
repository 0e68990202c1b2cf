//! Typebus Test - shared test utilities for the typebus crates.
//!
//! This crate provides a hand-cranked scheduler, callback recorders and a
//! few ready-made event types. It is meant to be used as a dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! typebus-test.workspace = true
//! ```
//!
//! ```rust
//! use typebus::EventBus;
//! use typebus_test::{ManualScheduler, Ping, Recorder};
//!
//! let bus = EventBus::new();
//! let scheduler = ManualScheduler::new();
//! let recorder: Recorder<Ping> = Recorder::new();
//!
//! let _subscription = bus.on_receive_on(scheduler.clone(), recorder.cloning());
//! bus.send(Ping::new(1));
//! assert!(recorder.is_empty());
//!
//! assert_eq!(scheduler.run_pending(), 1);
//! assert_eq!(recorder.values(), vec![Ping::new(1)]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
