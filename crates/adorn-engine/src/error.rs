//! Error types for class definition and annotated calls
//!
//! Two families:
//! - [`DefinitionError`]: raised while a class is being defined. Fatal: the
//!   class is never handed out, not even partially composed.
//! - [`CallError`]: raised by a single call into an instance (method call,
//!   property read or write). Recoverable by the caller.
//!
//! [`CompositionConflictWarning`] is not an error. It is recorded on the
//! finished class and written to the log sink, unless the engine is
//! configured to deny conflicts.

use std::fmt;

use crate::declaration::DeclarationKind;

/// Result of a call into an instance
pub type CallResult<T = crate::Value> = Result<T, CallError>;

/// Errors raised while defining a class
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    /// The same member was declared twice with the same kind
    #[error("Duplicate {kind} declaration '{member}' in class {class}")]
    DuplicateDeclaration {
        /// Class being defined
        class: String,
        /// Member name (or `method#index` for parameters)
        member: String,
        /// Declaration kind
        kind: DeclarationKind,
    },

    /// An annotation was attached to a declaration kind it does not support
    #[error("Annotation @{annotation} cannot be applied to {found} '{member}' (supports: {})", format_kinds(.supported))]
    TargetKindMismatch {
        /// Annotation name
        annotation: String,
        /// Member the annotation was attached to
        member: String,
        /// Kind of that member
        found: DeclarationKind,
        /// Kinds the annotation accepts
        supported: Vec<DeclarationKind>,
    },

    /// A factory annotation rejected its configuration payload
    #[error("Invalid configuration for @{annotation}: {reason}")]
    InvalidConfig {
        /// Annotation name
        annotation: String,
        /// Why the payload was rejected
        reason: String,
    },

    /// Two wholesale replacements collided and the engine denies conflicts
    #[error("{0}")]
    CompositionConflict(CompositionConflictWarning),
}

fn format_kinds(kinds: &[DeclarationKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A rejected property write
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Property that rejected the write
    pub property: String,
    /// Populated error message template
    pub message: String,
}

/// Errors raised by a call into an instance
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CallError {
    /// A validated property rejected a write
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No method, accessor, field or installed member has this name
    #[error("Class {class} has no member '{member}'")]
    UnknownMember {
        /// Class name
        class: String,
        /// Member name
        member: String,
    },

    /// Accessor without a setter
    #[error("Member '{member}' of class {class} is not writable")]
    NotWritable {
        /// Class name
        class: String,
        /// Member name
        member: String,
    },

    /// Accessor without a getter
    #[error("Member '{member}' of class {class} is not readable")]
    NotReadable {
        /// Class name
        class: String,
        /// Member name
        member: String,
    },

    /// A method body or wrapper raised its own condition
    #[error("{0}")]
    Raised(String),
}

impl CallError {
    /// Create a raised error from a message
    pub fn raised(message: impl Into<String>) -> Self {
        CallError::Raised(message.into())
    }
}

/// Two annotations on one declaration both replaced its body wholesale
///
/// The later-applied replacement wins; the earlier one is discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionConflictWarning {
    /// Class name
    pub class: String,
    /// Member whose body was replaced twice
    pub member: String,
    /// Annotation whose replacement was discarded (empty: the plain declaration)
    pub discarded: String,
    /// Annotation whose replacement is in effect (empty: the plain declaration)
    pub winner: String,
}

struct Origin<'a>(&'a str);

impl fmt::Display for Origin<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            "" => f.write_str("the declaration"),
            name => write!(f, "@{}", name),
        }
    }
}

impl fmt::Display for CompositionConflictWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "composition conflict on {}.{}: {} replaces the body installed by {}",
            self.class,
            self.member,
            Origin(&self.winner),
            Origin(&self.discarded)
        )
    }
}
