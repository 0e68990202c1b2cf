//! Ready-made event types.

use serde::{Deserialize, Serialize};
use typebus::{Event, NamedEvent};

/// Event carrying a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ping {
    /// Payload.
    pub value: i64,
}

impl Ping {
    /// Create a ping carrying `value`.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self { value }
    }
}

impl Event for Ping {}

/// Event without payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pong;

impl Event for Pong {}

/// Event carrying a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Greeting {
    /// Payload.
    pub message: String,
}

impl Greeting {
    /// Create a greeting.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Event for Greeting {}

/// Named event used by tick-counting scenarios.
pub const TICK: &str = "tick";

/// Create a named `tick` event carrying its sequence number.
#[must_use]
pub fn test_tick(n: i64) -> NamedEvent {
    NamedEvent::new(TICK).with_param("n", n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_serialization() {
        let json = serde_json::to_string(&Ping::new(42)).unwrap();
        assert_eq!(json, r#"{"value":42}"#);
    }

    #[test]
    fn test_tick_carries_sequence() {
        let tick = test_tick(3);
        assert_eq!(tick.name(), TICK);
        assert_eq!(tick.param("n"), Some(&serde_json::json!(3)));
    }
}
