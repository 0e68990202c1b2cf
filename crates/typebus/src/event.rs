//! Event model: the [`Event`] capability and the built-in [`NamedEvent`].

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability every value sent through an [`EventBus`](crate::EventBus) must satisfy.
///
/// There are no required methods. Routing is keyed on the concrete type of
/// the value, so two types with identical fields are still distinct events.
///
/// ```rust
/// use typebus::Event;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Ping {
///     value: i64,
/// }
///
/// impl Event for Ping {}
/// ```
pub trait Event: Send + Sync + 'static {}

/// Untyped payload carried by a [`NamedEvent`].
pub type Params = HashMap<String, Value>;

/// A string-named event with an opaque key/value payload.
///
/// All named events share this one type, so every named subscriber sits on
/// the same listener and filters by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedEvent {
    name: String,
    #[serde(default)]
    params: Params,
}

impl NamedEvent {
    /// Create a named event with an empty payload.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Params::new(),
        }
    }

    /// Create a named event carrying `params`.
    #[must_use]
    pub fn with_params(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Add a single payload entry.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The event payload.
    #[must_use]
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Look up one payload entry.
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Split into name and payload.
    #[must_use]
    pub fn into_parts(self) -> (String, Params) {
        (self.name, self.params)
    }
}

impl Event for NamedEvent {}

/// Routing key for an event type.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for logs.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// The key for `E`.
    #[must_use]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: type_name::<E>(),
        }
    }

    /// The underlying type id.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
