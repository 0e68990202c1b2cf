//! Subscription handles.
//!
//! A [`Subscription`] is the only way to unsubscribe: call
//! [`Subscription::dispose`] or let the handle go out of scope. Once disposed
//! the callback never fires again, including deliveries that were already
//! handed to a scheduler but had not run yet.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;
use uuid::Uuid;

use crate::event::EventType;

/// Identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Removal side of a listener, type-erased so handles need not be generic.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: SubscriptionId) -> bool;
}

/// A live registration of one callback.
///
/// Dropping the handle unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    event_type: EventType,
    active: Arc<AtomicBool>,
    listener: Weak<dyn Detach>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        event_type: EventType,
        active: Arc<AtomicBool>,
        listener: Weak<dyn Detach>,
    ) -> Self {
        Self {
            id,
            event_type,
            active,
            listener,
        }
    }

    /// Registration id.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The event type this subscription listens for.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Whether the callback can still fire.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Unsubscribe. Calling this more than once is a no-op.
    ///
    /// New deliveries are blocked before the registration is removed from
    /// its listener; a callback already running on another thread may finish.
    pub fn dispose(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }

        let removed = self
            .listener
            .upgrade()
            .is_some_and(|listener| listener.detach(self.id));

        debug!(
            subscription_id = %self.id,
            event_type = %self.event_type,
            removed,
            "Subscription disposed"
        );
    }

    /// Move this handle into `set`, tying its lifetime to the set.
    pub fn store_in(self, set: &mut SubscriptionSet) {
        set.insert(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owns a group of subscriptions and disposes them together.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `subscription`.
    pub fn insert(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the set holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Dispose and drop every held subscription.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl Extend<Subscription> for SubscriptionSet {
    fn extend<I: IntoIterator<Item = Subscription>>(&mut self, iter: I) {
        self.subscriptions.extend(iter);
    }
}

impl FromIterator<Subscription> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        Self {
            subscriptions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NamedEvent;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDetach {
        detached: Mutex<Vec<SubscriptionId>>,
    }

    impl Detach for RecordingDetach {
        fn detach(&self, id: SubscriptionId) -> bool {
            self.detached.lock().unwrap().push(id);
            true
        }
    }

    fn handle(listener: &Arc<RecordingDetach>) -> (Subscription, Arc<AtomicBool>) {
        let active = Arc::new(AtomicBool::new(true));
        let as_dyn: Arc<dyn Detach> = Arc::clone(listener) as Arc<dyn Detach>;
        let subscription = Subscription::new(
            SubscriptionId::new(),
            EventType::of::<NamedEvent>(),
            Arc::clone(&active),
            Arc::downgrade(&as_dyn),
        );
        (subscription, active)
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let listener = Arc::new(RecordingDetach::default());
        let (subscription, active) = handle(&listener);
        assert!(subscription.is_active());

        subscription.dispose();
        subscription.dispose();

        assert!(!subscription.is_active());
        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(listener.detached.lock().unwrap().len(), 1);

        drop(subscription);
        assert_eq!(listener.detached.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_drop_disposes() {
        let listener = Arc::new(RecordingDetach::default());
        let (subscription, active) = handle(&listener);
        let id = subscription.id();

        drop(subscription);

        assert!(!active.load(Ordering::SeqCst));
        assert_eq!(*listener.detached.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_dispose_after_listener_gone() {
        let listener = Arc::new(RecordingDetach::default());
        let (subscription, active) = handle(&listener);
        drop(listener);

        subscription.dispose();
        assert!(!active.load(Ordering::SeqCst));
    }

    #[test]
    fn test_subscription_set_disposes_on_clear_and_drop() {
        let listener = Arc::new(RecordingDetach::default());
        let mut set = SubscriptionSet::new();
        let (first, first_active) = handle(&listener);
        let (second, second_active) = handle(&listener);

        first.store_in(&mut set);
        set.insert(second);
        assert_eq!(set.len(), 2);

        set.clear();
        assert!(set.is_empty());
        assert!(!first_active.load(Ordering::SeqCst));
        assert!(!second_active.load(Ordering::SeqCst));

        let (third, third_active) = handle(&listener);
        let set: SubscriptionSet = std::iter::once(third).collect();
        drop(set);
        assert!(!third_active.load(Ordering::SeqCst));
        assert_eq!(listener.detached.lock().unwrap().len(), 3);
    }
}
