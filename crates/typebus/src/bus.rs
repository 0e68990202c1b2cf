//! Event bus facade.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::BusConfig;
use crate::event::{Event, EventType};
use crate::id::{IdGenerator, UuidGenerator};
use crate::listener::ListenerInfo;
use crate::registry::EventListenersRegistry;
use crate::scheduler::Scheduler;
use crate::subscription::Subscription;

/// Typed publish/subscribe bus.
///
/// Every bus owns a private [`EventListenersRegistry`]; separately
/// constructed buses never see each other's events. Cloning a bus yields
/// another handle to the same bus (same id, same registry).
///
/// **WARNING:** a callback that captures a clone of the bus it is
/// subscribed on keeps the registry alive through an `Arc` cycle for as long
/// as the subscription lives. Dispose the subscription to break it.
#[derive(Clone)]
pub struct EventBus {
    id: Arc<str>,
    registry: Arc<EventListenersRegistry>,
}

impl EventBus {
    /// Create a bus with a generated id.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a bus with the given id.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self::builder().id(id).build()
    }

    /// Create a bus from configuration.
    #[must_use]
    pub fn from_config(config: &BusConfig) -> Self {
        let mut builder = Self::builder().isolate_panics(config.isolate_panics);
        if let Some(id) = &config.id {
            builder = builder.id(id.clone());
        }
        builder.build()
    }

    /// Start building a bus.
    #[must_use]
    pub fn builder() -> EventBusBuilder {
        EventBusBuilder::default()
    }

    /// Bus identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send `event` to every current subscriber of `E`.
    ///
    /// Inline subscribers run on this thread before `send` returns; routed
    /// subscribers are handed to their schedulers. Without subscribers the
    /// event is dropped.
    pub fn send<E: Event>(&self, event: E) {
        let Some(listener) = self.registry.get_listener::<E>() else {
            trace!(bus_id = %self.id, event_type = %EventType::of::<E>(), "No listener for event");
            return;
        };

        trace!(bus_id = %self.id, event_type = %EventType::of::<E>(), "Sending event");
        listener.send(event);
    }

    /// Call `action` for every `E` sent, on the sending thread.
    pub fn on_receive<E, F>(&self, action: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.registry
            .get_or_create_listener::<E>()
            .register_subscription(action)
    }

    /// Call `action` for every `E` sent, on `scheduler`.
    pub fn on_receive_on<E, S, F>(&self, scheduler: S, action: F) -> Subscription
    where
        E: Event,
        S: Scheduler,
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.registry
            .get_or_create_listener::<E>()
            .register_subscription_on(scheduler, action)
    }

    /// The bus's listener registry.
    #[must_use]
    pub fn registry(&self) -> &EventListenersRegistry {
        &self.registry
    }

    /// Number of event types that have a listener.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of live subscriptions for `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.registry
            .get_listener::<E>()
            .map_or(0, |listener| listener.subscriber_count())
    }

    /// Snapshot of every listener.
    #[must_use]
    pub fn listeners(&self) -> Vec<ListenerInfo> {
        self.registry.listeners()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("id", &self.id)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Builder for [`EventBus`].
pub struct EventBusBuilder {
    id: Option<String>,
    ids: Arc<dyn IdGenerator>,
    isolate_panics: bool,
}

impl Default for EventBusBuilder {
    fn default() -> Self {
        Self {
            id: None,
            ids: Arc::new(UuidGenerator),
            isolate_panics: BusConfig::default().isolate_panics,
        }
    }
}

impl EventBusBuilder {
    /// Use a fixed bus id instead of a generated one.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Source of generated bus and listener ids.
    #[must_use]
    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// Catch and log subscriber panics (default) or let them unwind.
    #[must_use]
    pub fn isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }

    /// Build the bus.
    #[must_use]
    pub fn build(self) -> EventBus {
        let id = self.id.unwrap_or_else(|| self.ids.generate());
        debug!(bus_id = %id, isolate_panics = self.isolate_panics, "Event bus created");

        EventBus {
            id: id.into(),
            registry: Arc::new(EventListenersRegistry::new(self.ids, self.isolate_panics)),
        }
    }
}

impl fmt::Debug for EventBusBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusBuilder")
            .field("id", &self.id)
            .field("isolate_panics", &self.isolate_panics)
            .finish_non_exhaustive()
    }
}
