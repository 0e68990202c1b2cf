//! Per-type fan-out point.
//!
//! A [`Listener`] exists for every event type that has ever been subscribed
//! to on a bus. It owns the ordered list of subscriber slots for that type
//! and delivers each sent event to every slot registered at send time.
//!
//! # Dispatch rules
//!
//! - The slot list is snapshotted before delivery, so callbacks may send,
//!   subscribe or dispose re-entrantly without deadlocking.
//! - Slots registered during a dispatch do not see the in-flight event.
//! - Each slot's active flag is checked right before its callback runs, so a
//!   slot disposed mid-dispatch is skipped.
//! - Routed slots hand the event to their scheduler and check the flag again
//!   when the job runs.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, trace, warn};

use crate::event::{Event, EventType};
use crate::scheduler::Scheduler;
use crate::subscription::{Detach, Subscription, SubscriptionId};

type Deliver<E> = Box<dyn Fn(&Arc<E>) + Send + Sync>;

/// One registered callback.
struct Slot<E> {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    deliver: Deliver<E>,
}

/// Diagnostic snapshot of a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerInfo {
    /// Listener id.
    pub id: String,
    /// Event type served by the listener.
    pub event_type: EventType,
    /// Subscribers registered at snapshot time.
    pub subscribers: usize,
}

/// Fan-out point for events of type `E`.
pub struct Listener<E: Event> {
    id: String,
    isolate_panics: bool,
    slots: RwLock<Vec<Arc<Slot<E>>>>,
}

impl<E: Event> Listener<E> {
    pub(crate) fn new(id: String, isolate_panics: bool) -> Self {
        Self {
            id,
            isolate_panics,
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Listener id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The event type this listener serves.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        EventType::of::<E>()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.slots().len()
    }

    /// Diagnostic snapshot.
    #[must_use]
    pub fn info(&self) -> ListenerInfo {
        ListenerInfo {
            id: self.id.clone(),
            event_type: self.event_type(),
            subscribers: self.subscriber_count(),
        }
    }

    /// Deliver `event` to every current subscriber.
    ///
    /// The event is shared by all subscribers and scheduled jobs.
    pub fn send(&self, event: E) {
        let snapshot: Vec<Arc<Slot<E>>> = self.slots().clone();

        if snapshot.is_empty() {
            trace!(listener_id = %self.id, event_type = %self.event_type(), "No subscribers for event");
            return;
        }

        trace!(
            listener_id = %self.id,
            event_type = %self.event_type(),
            subscribers = snapshot.len(),
            "Dispatching event"
        );

        let event = Arc::new(event);
        for slot in &snapshot {
            if !slot.active.load(Ordering::Acquire) {
                continue;
            }
            trace!(subscription_id = %slot.id, "Delivering event");
            run_callback(self.isolate_panics, slot.id, self.event_type(), || {
                (slot.deliver)(&event);
            });
        }
    }

    /// Register `action`, run inline on the sending thread.
    pub fn register_subscription<F>(self: &Arc<Self>, action: F) -> Subscription
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let subscription = self.register(
            Arc::clone(&active),
            Box::new(move |event: &Arc<E>| action(&**event)),
        );

        debug!(
            listener_id = %self.id,
            event_type = %self.event_type(),
            subscription_id = %subscription.id(),
            "Subscription registered"
        );
        subscription
    }

    /// Register `action`, run on `scheduler` for every delivery.
    ///
    /// `send` does not wait for the scheduled callback.
    pub fn register_subscription_on<S, F>(self: &Arc<Self>, scheduler: S, action: F) -> Subscription
    where
        S: Scheduler,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let action = Arc::new(action);
        let active = Arc::new(AtomicBool::new(true));
        let scheduler_name = scheduler.name().to_string();
        let isolate_panics = self.isolate_panics;
        let event_type = self.event_type();
        let job_active = Arc::clone(&active);
        let id = SubscriptionId::new();

        let deliver: Deliver<E> = Box::new(move |event: &Arc<E>| {
            let event = Arc::clone(event);
            let action = Arc::clone(&action);
            let active = Arc::clone(&job_active);

            scheduler.schedule(Box::new(move || {
                if !active.load(Ordering::Acquire) {
                    return;
                }
                run_callback(isolate_panics, id, event_type, || action(&*event));
            }));
        });

        let subscription = self.register_with_id(id, active, deliver);

        debug!(
            listener_id = %self.id,
            event_type = %self.event_type(),
            subscription_id = %subscription.id(),
            scheduler = %scheduler_name,
            "Routed subscription registered"
        );
        subscription
    }

    fn register(self: &Arc<Self>, active: Arc<AtomicBool>, deliver: Deliver<E>) -> Subscription {
        self.register_with_id(SubscriptionId::new(), active, deliver)
    }

    fn register_with_id(
        self: &Arc<Self>,
        id: SubscriptionId,
        active: Arc<AtomicBool>,
        deliver: Deliver<E>,
    ) -> Subscription {
        let slot = Arc::new(Slot {
            id,
            active: Arc::clone(&active),
            deliver,
        });
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(slot);

        let detach: Arc<dyn Detach> = Arc::clone(self) as Arc<dyn Detach>;
        Subscription::new(id, self.event_type(), active, Arc::downgrade(&detach))
    }

    fn slots(&self) -> RwLockReadGuard<'_, Vec<Arc<Slot<E>>>> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<E: Event> Detach for Listener<E> {
    fn detach(&self, id: SubscriptionId) -> bool {
        let removed = {
            let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
            slots
                .iter()
                .position(|slot| slot.id == id)
                .map(|index| slots.remove(index))
        };
        // Slot drops outside the lock; its captures may re-enter the listener.
        removed.is_some()
    }
}

impl<E: Event> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("event_type", &self.event_type())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Type-erased view of a listener, as stored in the registry.
pub(crate) trait ErasedListener: Send + Sync {
    fn info(&self) -> ListenerInfo;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<E: Event> ErasedListener for Listener<E> {
    fn info(&self) -> ListenerInfo {
        Listener::info(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Run a subscriber callback, optionally containing panics.
fn run_callback(
    isolate_panics: bool,
    subscription_id: SubscriptionId,
    event_type: EventType,
    callback: impl FnOnce(),
) {
    if !isolate_panics {
        callback();
        return;
    }

    if let Err(e) = std::panic::catch_unwind(AssertUnwindSafe(callback)) {
        warn!(
            subscription_id = %subscription_id,
            event_type = %event_type,
            error = ?e,
            "Subscriber panicked"
        );
    }
}
