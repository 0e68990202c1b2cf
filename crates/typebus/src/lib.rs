//! Typebus - typed in-process publish/subscribe.
//!
//! This crate provides:
//! - The [`Event`] capability and the built-in [`NamedEvent`]
//! - A per-bus registry of listeners, one per event type
//! - Inline or scheduler-routed delivery
//! - RAII subscription handles
//!
//! # Architecture
//!
//! ```text
//! send(event) ──► EventListenersRegistry ──► Listener<E> ──┬──► callback (inline)
//!                  (keyed by TypeId)         (snapshot)    └──► Scheduler ──► callback
//! ```
//!
//! Events are routed by their concrete type. A `send` for a type nobody has
//! subscribed to is a silent no-op; there is no queueing and no replay.
//! Subscriptions stay live exactly as long as the returned [`Subscription`]
//! handle: dropping it (or calling [`Subscription::dispose`]) unsubscribes.
//!
//! String-named events are layered on top of the typed path by
//! [`EventTransmittable`], using [`NamedEvent`] as the carrier type.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use typebus::{Event, EventBus};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Ping {
//!     value: i64,
//! }
//!
//! impl Event for Ping {}
//!
//! let bus = EventBus::new();
//! let last = Arc::new(Mutex::new(0));
//! let sink = Arc::clone(&last);
//!
//! let subscription = bus.on_receive(move |ping: &Ping| {
//!     *sink.lock().unwrap() = ping.value;
//! });
//!
//! bus.send(Ping { value: 42 });
//! assert_eq!(*last.lock().unwrap(), 42);
//!
//! drop(subscription);
//! bus.send(Ping { value: 7 });
//! assert_eq!(*last.lock().unwrap(), 42);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod config;
mod error;
mod event;
mod id;
mod listener;
mod registry;
mod scheduler;
mod subscription;
mod transmit;

pub use bus::{EventBus, EventBusBuilder};
pub use config::BusConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use event::{Event, EventType, NamedEvent, Params};
pub use id::{IdGenerator, SequentialIdGenerator, UuidGenerator};
pub use listener::{Listener, ListenerInfo};
pub use registry::EventListenersRegistry;
#[cfg(feature = "runtime")]
pub use scheduler::{SerialScheduler, runtime_handle};
pub use scheduler::{Immediate, Job, Scheduler};
pub use subscription::{Subscription, SubscriptionId, SubscriptionSet};
pub use transmit::EventTransmittable;
