//! Membrane and `observe` configuration.
//!
//! Both structs are plain serde data with a `Default`, so a JSON document
//! (for example the `config` field of a trace script) can override any
//! subset of fields.

use serde::{Deserialize, Serialize};

use crate::object_model::ObjectError;

// ---------------------------------------------------------------------------
// MembraneConfig
// ---------------------------------------------------------------------------

/// Configuration controlling membrane bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MembraneConfig {
    /// Record structured events into the membrane's event log.
    pub record_events: bool,
    /// Maximum events retained before the oldest are dropped.
    pub event_capacity: usize,
    /// Cache size that triggers the first sweep of dead entries. The
    /// threshold doubles relative to the surviving size after each sweep.
    pub sweep_threshold: usize,
}

impl Default for MembraneConfig {
    fn default() -> Self {
        Self {
            record_events: false,
            event_capacity: 4096,
            sweep_threshold: 256,
        }
    }
}

impl MembraneConfig {
    /// Event recording on, default capacity.
    pub fn traced() -> Self {
        Self {
            record_events: true,
            ..Self::default()
        }
    }

    /// Parse from JSON; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ObjectError> {
        serde_json::from_str(text)
            .map_err(|err| ObjectError::type_error(format!("invalid membrane config: {err}")))
    }
}

// ---------------------------------------------------------------------------
// ObserveConfig
// ---------------------------------------------------------------------------

/// Bookkeeping property names used by [`crate::observe::observe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveConfig {
    /// Keys starting with this prefix never reach the change callback.
    pub bookkeeping_prefix: String,
    /// Back-reference from the observed data to its membrane.
    pub membrane_key: String,
    /// Ordered listener collection on each observed object.
    pub listeners_key: String,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            bookkeeping_prefix: "__z_".to_string(),
            membrane_key: "__z_membrane".to_string(),
            listeners_key: "__z_components".to_string(),
        }
    }
}

impl ObserveConfig {
    /// Is `key` reserved for bookkeeping?
    pub fn is_bookkeeping(&self, key: &str) -> bool {
        key.starts_with(&self.bookkeeping_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MembraneConfig::default();
        assert!(!config.record_events);
        assert_eq!(config.sweep_threshold, 256);
        assert!(MembraneConfig::traced().record_events);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = MembraneConfig::from_json(r#"{"record_events": true}"#).unwrap();
        assert!(config.record_events);
        assert_eq!(config.event_capacity, 4096);
        assert!(MembraneConfig::from_json("[1]").is_err());
    }

    #[test]
    fn observe_prefix_matches_reserved_keys() {
        let config = ObserveConfig::default();
        assert!(config.is_bookkeeping(&config.membrane_key));
        assert!(config.is_bookkeeping(&config.listeners_key));
        assert!(!config.is_bookkeeping("name"));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ObserveConfig {
            bookkeeping_prefix: "$$".to_string(),
            membrane_key: "$$m".to_string(),
            listeners_key: "$$l".to_string(),
        };
        let text = serde_json::to_string(&config).unwrap();
        let back: ObserveConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
