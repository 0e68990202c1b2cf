//! Listener registry: one [`Listener`] per event type.

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::event::{Event, EventType};
use crate::id::IdGenerator;
use crate::listener::{ErasedListener, Listener, ListenerInfo};

/// Maps event types to their listeners.
///
/// Listeners are stored type-erased and narrowed back with
/// [`Arc::downcast`]; the map key is the `TypeId` of the listener's event
/// type, so the narrowing always succeeds for a well-formed registry.
/// Creation is create-if-absent under the map's entry lock, so concurrent
/// first subscribers for a type all end up on the same listener.
pub struct EventListenersRegistry {
    listeners: DashMap<TypeId, Arc<dyn ErasedListener>>,
    ids: Arc<dyn IdGenerator>,
    isolate_panics: bool,
}

impl EventListenersRegistry {
    /// Create an empty registry.
    ///
    /// `ids` names new listeners; `isolate_panics` is passed to each of them.
    #[must_use]
    pub fn new(ids: Arc<dyn IdGenerator>, isolate_panics: bool) -> Self {
        Self {
            listeners: DashMap::new(),
            ids,
            isolate_panics,
        }
    }

    /// The listener for `E`, if one was created.
    #[must_use]
    pub fn get_listener<E: Event>(&self) -> Option<Arc<Listener<E>>> {
        let erased = self
            .listeners
            .get(&TypeId::of::<E>())
            .map(|entry| Arc::clone(entry.value()))?;
        narrow(erased)
    }

    /// Create the listener for `E` and return it.
    ///
    /// If a listener for `E` already exists (for example because another
    /// thread won the race), that one is returned and nothing is replaced.
    pub fn create_listener<E: Event>(&self) -> Arc<Listener<E>> {
        let candidate = Arc::new(Listener::<E>::new(self.ids.generate(), self.isolate_panics));

        let stored = Arc::clone(
            self.listeners
                .entry(TypeId::of::<E>())
                .or_insert_with(|| {
                    debug!(
                        listener_id = %candidate.id(),
                        event_type = %EventType::of::<E>(),
                        "Listener created"
                    );
                    Arc::clone(&candidate) as Arc<dyn ErasedListener>
                })
                .value(),
        );

        narrow(stored).unwrap_or(candidate)
    }

    /// The listener for `E`, creating it on first use.
    pub fn get_or_create_listener<E: Event>(&self) -> Arc<Listener<E>> {
        self.get_listener::<E>()
            .unwrap_or_else(|| self.create_listener::<E>())
    }

    /// Whether a listener for `E` exists.
    #[must_use]
    pub fn contains<E: Event>(&self) -> bool {
        self.listeners.contains_key(&TypeId::of::<E>())
    }

    /// Number of listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no listener was ever created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Snapshot of every listener, sorted by event type name.
    #[must_use]
    pub fn listeners(&self) -> Vec<ListenerInfo> {
        let erased: Vec<Arc<dyn ErasedListener>> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut infos: Vec<ListenerInfo> = erased.iter().map(|listener| listener.info()).collect();
        infos.sort_by(|a, b| a.event_type.name().cmp(b.event_type.name()));
        infos
    }
}

impl fmt::Debug for EventListenersRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListenersRegistry")
            .field("listener_count", &self.listeners.len())
            .field("isolate_panics", &self.isolate_panics)
            .finish_non_exhaustive()
    }
}

fn narrow<E: Event>(erased: Arc<dyn ErasedListener>) -> Option<Arc<Listener<E>>> {
    erased.into_any().downcast::<Listener<E>>().ok()
}
