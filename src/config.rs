//! Runtime configuration of a state machine instance.

use serde::{Deserialize, Serialize};

/// Configuration shared by both dispatchers.
///
/// Every field has a default, so a partial JSON document such as
/// `{"name": "door"}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Instance name. Appears in log fields and names the worker thread
    /// of an active machine.
    pub name: String,

    /// Stack size for the worker thread of an active machine (bytes).
    /// `None` keeps the platform default.
    pub worker_stack_size: Option<usize>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "state-machine".to_string(),
            worker_stack_size: None,
        }
    }
}

impl MachineConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = Some(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: MachineConfig = serde_json::from_str(r#"{"name": "door"}"#).unwrap();

        assert_eq!(config, MachineConfig::named("door"));
        assert_eq!(config.worker_stack_size, None);
    }

    #[test]
    fn builder_methods_set_fields() {
        let config = MachineConfig::named("elevator").with_worker_stack_size(4 * 1024 * 1024);

        assert_eq!(config.name, "elevator");
        assert_eq!(config.worker_stack_size, Some(4 * 1024 * 1024));
    }
}
