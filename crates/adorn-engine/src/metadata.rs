//! Metadata Registry
//!
//! Process-wide keyed state written by annotation side effects:
//! - **Class metadata**: per-class key -> value (installed identifiers,
//!   configuration snapshots, ...)
//! - **Member metadata**: per-(class, member) key -> value
//! - **Parameter watch list**: append-only `{methodName, parameterIndex}`
//!   records across all classes
//! - **Annotation ledger**: every annotation application, queryable by
//!   class or annotation name
//!
//! Every mutation happens under a single lock (a dashmap shard or the
//! list's `RwLock`), so a concurrent reader sees a record completely or not
//! at all. Reads return snapshots.
//!
//! ## Lifecycle
//!
//! The process-wide instance is reached through [`global`]. [`init`]
//! forces its creation and [`reset`] clears it. Tests usually construct a
//! private `MetadataRegistry` instead.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::declaration::{ClassId, DeclarationKind};
use crate::value::Value;

/// A key for metadata - can be any string
pub type MetadataKey = String;

/// A member key - the name of a member on a class
pub type MemberKey = String;

/// One watched parameter position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedParameter {
    /// Enclosing method name
    pub method_name: String,
    /// Zero-based parameter position
    pub parameter_index: usize,
}

/// One recorded annotation application
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedAnnotation {
    /// Class the annotation was applied in
    pub class_id: ClassId,
    /// Class name
    pub class: String,
    /// Member name (`<class>` for class annotations)
    pub member: String,
    /// Declaration kind of the member
    pub kind: DeclarationKind,
    /// Annotation name
    pub annotation: String,
}

/// Keyed metadata written by annotations
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    /// class -> key -> value
    classes: DashMap<ClassId, FxHashMap<MetadataKey, Value>>,
    /// (class, member) -> key -> value
    members: DashMap<(ClassId, MemberKey), FxHashMap<MetadataKey, Value>>,
    /// Append-only watch list
    watched: RwLock<Vec<WatchedParameter>>,
    /// Append-only application ledger
    applications: RwLock<Vec<AppliedAnnotation>>,
}

impl MetadataRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty registry behind an `Arc`
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // ========================================================================
    // Class metadata
    // ========================================================================

    /// Upsert a class metadata entry
    pub fn set_class_metadata(&self, class: ClassId, key: impl Into<MetadataKey>, value: Value) {
        self.classes
            .entry(class)
            .or_default()
            .insert(key.into(), value);
    }

    /// Get a class metadata entry
    pub fn class_metadata(&self, class: ClassId, key: &str) -> Option<Value> {
        self.classes
            .get(&class)
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Check if a class has a metadata entry
    pub fn has_class_metadata(&self, class: ClassId, key: &str) -> bool {
        self.classes
            .get(&class)
            .is_some_and(|entries| entries.contains_key(key))
    }

    /// Snapshot of all metadata entries of a class, sorted by key
    pub fn class_metadata_snapshot(&self, class: ClassId) -> BTreeMap<MetadataKey, Value> {
        self.classes
            .get(&class)
            .map(|entries| {
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Delete a class metadata entry
    ///
    /// Returns true if the entry existed
    pub fn delete_class_metadata(&self, class: ClassId, key: &str) -> bool {
        self.classes
            .get_mut(&class)
            .is_some_and(|mut entries| entries.remove(key).is_some())
    }

    // ========================================================================
    // Member metadata
    // ========================================================================

    /// Upsert a metadata entry on a class member
    pub fn define_member_metadata(
        &self,
        class: ClassId,
        member: &str,
        key: impl Into<MetadataKey>,
        value: Value,
    ) {
        self.members
            .entry((class, member.to_string()))
            .or_default()
            .insert(key.into(), value);
    }

    /// Get a metadata entry from a class member
    pub fn member_metadata(&self, class: ClassId, member: &str, key: &str) -> Option<Value> {
        self.members
            .get(&(class, member.to_string()))
            .and_then(|entries| entries.get(key).cloned())
    }

    /// All metadata keys on a class member, sorted
    pub fn member_metadata_keys(&self, class: ClassId, member: &str) -> Vec<MetadataKey> {
        let mut keys: Vec<_> = self
            .members
            .get(&(class, member.to_string()))
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    // ========================================================================
    // Parameter watch list
    // ========================================================================

    /// Append a watched parameter record
    pub fn record(&self, method_name: impl Into<String>, parameter_index: usize) {
        self.watched.write().push(WatchedParameter {
            method_name: method_name.into(),
            parameter_index,
        });
    }

    /// Snapshot of every record appended so far, in append order
    pub fn all_watched(&self) -> Vec<WatchedParameter> {
        self.watched.read().clone()
    }

    // ========================================================================
    // Annotation ledger
    // ========================================================================

    pub(crate) fn record_application(&self, application: AppliedAnnotation) {
        self.applications.write().push(application);
    }

    /// Every application recorded for a class, in application order
    pub fn applications_on(&self, class: ClassId) -> Vec<AppliedAnnotation> {
        self.applications
            .read()
            .iter()
            .filter(|a| a.class_id == class)
            .cloned()
            .collect()
    }

    /// Classes that carry a class-level annotation with the given name
    pub fn classes_with(&self, annotation: &str) -> Vec<ClassId> {
        let mut classes: Vec<ClassId> = self
            .applications
            .read()
            .iter()
            .filter(|a| a.kind == DeclarationKind::Class && a.annotation == annotation)
            .map(|a| a.class_id)
            .collect();
        classes.sort();
        classes.dedup();
        classes
    }

    /// Check if a class carries a class-level annotation with the given name
    pub fn class_has(&self, class: ClassId, annotation: &str) -> bool {
        self.applications.read().iter().any(|a| {
            a.class_id == class && a.kind == DeclarationKind::Class && a.annotation == annotation
        })
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Drop every store's contents
    pub fn clear(&self) {
        self.classes.clear();
        self.members.clear();
        self.watched.write().clear();
        self.applications.write().clear();
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.members.is_empty()
            && self.watched.read().is_empty()
            && self.applications.read().is_empty()
    }
}

static GLOBAL: LazyLock<Arc<MetadataRegistry>> = LazyLock::new(MetadataRegistry::shared);

/// Process-wide registry
pub fn global() -> Arc<MetadataRegistry> {
    GLOBAL.clone()
}

/// Create the process-wide registry if needed and return it
pub fn init() -> Arc<MetadataRegistry> {
    let registry = global();
    tracing::debug!("metadata registry initialized");
    registry
}

/// Clear the process-wide registry
pub fn reset() {
    GLOBAL.clear();
    tracing::debug!("metadata registry reset");
}
