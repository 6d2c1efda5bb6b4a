//! Engine configuration
//!
//! Deserializable from the `[engine]` table of an `adorn.toml`:
//!
//! ```toml
//! [engine]
//! storage = "per-instance"     # or "shared-slot"
//! conflicts = "warn"           # or "deny"
//! trace-applications = false
//! ```

use serde::{Deserialize, Serialize};

/// Where a validated property keeps its value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    /// One slot per instance, keyed by instance identity
    #[default]
    PerInstance,
    /// One slot captured by the accessor pair and shared by every instance.
    ///
    /// Known hazard: a write through one instance is visible through all of
    /// them. Kept selectable so the behavior can be reproduced and tested.
    SharedSlot,
}

/// What to do when two annotations both replace a body wholesale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Later replacement wins, a warning is recorded and logged
    #[default]
    Warn,
    /// Fail the class definition
    Deny,
}

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EngineConfig {
    /// Storage strategy for validated properties
    pub storage: StorageMode,
    /// Conflict handling
    pub conflicts: ConflictPolicy,
    /// Write an `applied @X to Y` line to the sink for every application
    pub trace_applications: bool,
}

impl EngineConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the storage strategy
    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }

    /// Set the conflict policy
    pub fn with_conflicts(mut self, conflicts: ConflictPolicy) -> Self {
        self.conflicts = conflicts;
        self
    }

    /// Enable or disable application tracing
    pub fn with_trace_applications(mut self, trace: bool) -> Self {
        self.trace_applications = trace;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.storage, StorageMode::PerInstance);
        assert_eq!(config.conflicts, ConflictPolicy::Warn);
        assert!(!config.trace_applications);
    }

    #[test]
    fn test_kebab_case_json() {
        let config: EngineConfig = serde_json::from_str(
            r#"{"storage": "shared-slot", "conflicts": "deny", "trace-applications": true}"#,
        )
        .unwrap();
        assert_eq!(
            config,
            EngineConfig::new()
                .with_storage(StorageMode::SharedSlot)
                .with_conflicts(ConflictPolicy::Deny)
                .with_trace_applications(true)
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"conflicts": "deny"}"#).unwrap();
        assert_eq!(config.storage, StorageMode::PerInstance);
        assert_eq!(config.conflicts, ConflictPolicy::Deny);
    }
}
