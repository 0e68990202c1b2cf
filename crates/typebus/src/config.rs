//! Bus configuration.

use serde::{Deserialize, Serialize};

/// Settings applied when building an [`EventBus`](crate::EventBus).
///
/// Deserializes from an empty table to the defaults, so it can be embedded
/// in a host application's config file:
///
/// ```rust
/// use typebus::BusConfig;
///
/// let config: BusConfig = serde_json::from_str(r#"{ "id": "ui-bus" }"#).unwrap();
/// assert_eq!(config.id.as_deref(), Some("ui-bus"));
/// assert!(config.isolate_panics);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Bus identifier. Generated when absent.
    pub id: Option<String>,
    /// Catch and log subscriber panics instead of unwinding into `send`.
    pub isolate_panics: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            id: None,
            isolate_panics: true,
        }
    }
}

impl BusConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bus identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Enable or disable panic isolation.
    #[must_use]
    pub fn with_isolate_panics(mut self, isolate: bool) -> Self {
        self.isolate_panics = isolate;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_config_default() {
        let config = BusConfig::default();
        assert!(config.id.is_none());
        assert!(config.isolate_panics);
    }

    #[test]
    fn test_bus_config_builder() {
        let config = BusConfig::new()
            .with_id("orders")
            .with_isolate_panics(false);

        assert_eq!(config.id.as_deref(), Some("orders"));
        assert!(!config.isolate_panics);
    }

    #[test]
    fn test_bus_config_serialization() {
        let config = BusConfig::new().with_id("orders");
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"id\":\"orders\""));

        let parsed: BusConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let empty: BusConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, BusConfig::default());
    }
}
