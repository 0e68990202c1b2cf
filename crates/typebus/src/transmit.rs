//! The transmittable capability and the named-event layer.
//!
//! Named events are typed events in disguise: every name is carried by
//! [`NamedEvent`], so all named subscribers share the `NamedEvent` listener
//! and each one drops events whose name does not match its own. A send of
//! `"a"` therefore costs one closure call per named subscriber, whatever
//! name they listen for.

use tracing::trace;

use crate::bus::EventBus;
use crate::event::{Event, NamedEvent, Params};
use crate::scheduler::Scheduler;
use crate::subscription::Subscription;

/// Anything that can send and receive events.
///
/// Implementors provide the typed operations; the named-event operations
/// are provided on top of them.
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use typebus::{EventBus, EventTransmittable};
///
/// let bus = EventBus::new();
/// let ticks = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&ticks);
///
/// let _subscription = bus.on_named("tick", move |_params| {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// bus.send_named("tick");
/// bus.send_named("tock");
/// assert_eq!(ticks.load(Ordering::SeqCst), 1);
/// ```
pub trait EventTransmittable {
    /// Send a typed event.
    fn send<E: Event>(&self, event: E);

    /// Subscribe to `E`; `action` runs on the sending thread.
    fn on_receive<E, F>(&self, action: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static;

    /// Subscribe to `E`; `action` runs on `scheduler`.
    fn on_receive_on<E, S, F>(&self, scheduler: S, action: F) -> Subscription
    where
        E: Event,
        S: Scheduler,
        F: Fn(&E) + Send + Sync + 'static;

    /// Send a named event with an empty payload.
    fn send_named(&self, name: impl Into<String>) {
        self.send_named_with(name, Params::new());
    }

    /// Send a named event carrying `params`.
    fn send_named_with(&self, name: impl Into<String>, params: Params) {
        self.send(NamedEvent::with_params(name, params));
    }

    /// Subscribe to events named `name`; `action` gets the payload on the
    /// sending thread.
    fn on_named<F>(&self, name: impl Into<String>, action: F) -> Subscription
    where
        F: Fn(&Params) + Send + Sync + 'static,
    {
        let name = name.into();
        self.on_receive(move |event: &NamedEvent| {
            if event.name() == name {
                action(event.params());
            } else {
                trace!(wanted = %name, got = %event.name(), "Named event filtered");
            }
        })
    }

    /// Subscribe to events named `name`; `action` gets the payload on
    /// `scheduler`.
    fn on_named_on<S, F>(&self, name: impl Into<String>, scheduler: S, action: F) -> Subscription
    where
        S: Scheduler,
        F: Fn(&Params) + Send + Sync + 'static,
    {
        let name = name.into();
        self.on_receive_on(scheduler, move |event: &NamedEvent| {
            if event.name() == name {
                action(event.params());
            } else {
                trace!(wanted = %name, got = %event.name(), "Named event filtered");
            }
        })
    }
}

impl EventTransmittable for EventBus {
    fn send<E: Event>(&self, event: E) {
        EventBus::send(self, event);
    }

    fn on_receive<E, F>(&self, action: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        EventBus::on_receive(self, action)
    }

    fn on_receive_on<E, S, F>(&self, scheduler: S, action: F) -> Subscription
    where
        E: Event,
        S: Scheduler,
        F: Fn(&E) + Send + Sync + 'static,
    {
        EventBus::on_receive_on(self, scheduler, action)
    }
}
