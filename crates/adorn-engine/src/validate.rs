//! Property Validation Layer
//!
//! Converts a plain stored property into an accessor pair whose setter
//! enforces a [`Constraint`]. A rejected write raises a
//! [`ValidationError`] and leaves the stored value as it was.
//!
//! ## Storage
//!
//! - [`StorageMode::PerInstance`]: the value lives in the receiving
//!   instance's own field table, under the property name.
//! - [`StorageMode::SharedSlot`]: the value lives in one slot captured by
//!   the accessor closures. Every instance of the class reads and writes the
//!   same slot, so a write on one instance shows up on all of them. This is
//!   a hazard, reproduced on request only.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::StorageMode;
use crate::error::ValidationError;
use crate::intercept::{getter, setter, AccessorPair};
use crate::value::Value;

/// Placeholder replaced by the property name
pub const PROPERTY_PLACEHOLDER: &str = "{property}";

/// Placeholder replaced by the configured threshold
pub const THRESHOLD_PLACEHOLDER: &str = "{threshold}";

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A write-time invariant on a property
#[derive(Clone)]
pub struct Constraint {
    predicate: Predicate,
    threshold: Value,
    template: String,
}

impl Constraint {
    /// Create a constraint from a predicate, the threshold it was configured
    /// with, and an error message template
    ///
    /// The template may reference `{property}` and `{threshold}`.
    pub fn new<F>(predicate: F, threshold: Value, template: impl Into<String>) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            threshold,
            template: template.into(),
        }
    }

    /// Value must have at least `min` characters (strings) or items (lists, maps)
    ///
    /// Values without a length are rejected.
    pub fn min_length(min: usize) -> Self {
        Self::new(
            move |value| value.len().is_some_and(|len| len >= min),
            Value::from(min),
            "{property} should be at least {threshold} long",
        )
    }

    /// Value must have at most `max` characters (strings) or items (lists, maps)
    pub fn max_length(max: usize) -> Self {
        Self::new(
            move |value| value.len().is_some_and(|len| len <= max),
            Value::from(max),
            "{property} should be at most {threshold} long",
        )
    }

    /// Check a candidate value
    pub fn check(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }

    /// Configured threshold
    pub fn threshold(&self) -> &Value {
        &self.threshold
    }

    /// Populate the error message template for a property
    pub fn message(&self, property: &str) -> String {
        self.template
            .replace(PROPERTY_PLACEHOLDER, property)
            .replace(THRESHOLD_PLACEHOLDER, &self.threshold.to_string())
    }

    /// Check a candidate value, producing the populated error on failure
    pub fn enforce(&self, property: &str, value: &Value) -> Result<(), ValidationError> {
        if self.check(value) {
            Ok(())
        } else {
            Err(ValidationError {
                property: property.to_string(),
                message: self.message(property),
            })
        }
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("threshold", &self.threshold)
            .field("template", &self.template)
            .finish()
    }
}

/// Build a validated accessor pair for a property
pub fn validate(property: &str, constraint: Constraint, storage: StorageMode) -> AccessorPair {
    match storage {
        StorageMode::PerInstance => per_instance(property, constraint),
        StorageMode::SharedSlot => shared_slot(property, constraint),
    }
}

fn per_instance(property: &str, constraint: Constraint) -> AccessorPair {
    let read_name = property.to_string();
    let write_name = property.to_string();

    AccessorPair::new(
        Some(getter(move |this| {
            Ok(this.field(&read_name).unwrap_or_default())
        })),
        Some(setter(move |this, value| {
            constraint.enforce(&write_name, &value)?;
            this.set_field(&write_name, value);
            Ok(())
        })),
    )
}

fn shared_slot(property: &str, constraint: Constraint) -> AccessorPair {
    let slot = Arc::new(RwLock::new(Value::Null));
    let read_slot = slot.clone();
    let name = property.to_string();

    AccessorPair::new(
        Some(getter(move |_this| Ok(read_slot.read().clone()))),
        Some(setter(move |_this, value| {
            constraint.enforce(&name, &value)?;
            *slot.write() = value;
            Ok(())
        })),
    )
}

/// Add a constraint in front of an already validated pair
///
/// The new constraint is checked first; on success the write goes through
/// the previous setter, which applies its own checks and stores the value.
pub fn stack(property: &str, pair: AccessorPair, constraint: Constraint) -> AccessorPair {
    let AccessorPair { get, set } = pair;
    let name = property.to_string();

    let set = set.map(|previous| {
        setter(move |this, value| {
            constraint.enforce(&name, &value)?;
            previous(this, value)
        })
    });
    AccessorPair { get, set }
}
