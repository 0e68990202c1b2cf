//! Prelude module - commonly used types for convenient import.
//!
//! Use `use typebus::prelude::*;` to import all essential types, including
//! the [`EventTransmittable`] trait that provides the named-event methods.
//!
//! # Example
//!
//! ```rust
//! use typebus::prelude::*;
//!
//! let bus = EventBus::with_id("example");
//! let _subscription = bus.on_named("ready", |params| assert!(params.is_empty()));
//! bus.send_named("ready");
//! ```

// Event bus
pub use crate::{BusConfig, EventBus, EventBusBuilder, EventTransmittable};

// Events
pub use crate::{Event, EventType, NamedEvent, Params};

// Subscriptions
pub use crate::{Subscription, SubscriptionId, SubscriptionSet};

// Schedulers
pub use crate::{Immediate, Job, Scheduler};
#[cfg(feature = "runtime")]
pub use crate::{SerialScheduler, runtime_handle};
