//! Declaration Registry
//!
//! Records, per class body, every declared member together with its kind and
//! its original, unmodified implementation (methods, accessors) or initial
//! value (properties). The registry is filled once while the class body is
//! processed and moves into the finished [`Class`](crate::Class), so the
//! originals stay inspectable for the lifetime of the class.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::DefinitionError;
use crate::intercept::{AccessorPair, Method};
use crate::value::Value;

/// Global counter for class IDs
static NEXT_CLASS_ID: AtomicU32 = AtomicU32::new(1);

/// Process-unique class identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ClassId(u32);

impl ClassId {
    /// Allocate a fresh class ID
    pub fn next() -> Self {
        ClassId(NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric ID
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of declaration an annotation can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    /// The class itself
    Class,
    /// A method
    Method,
    /// A get/set accessor pair
    Accessor,
    /// A stored property
    Property,
    /// A method parameter
    Parameter,
}

impl DeclarationKind {
    /// All kinds, in application order of their groups
    pub const ALL: [DeclarationKind; 5] = [
        DeclarationKind::Parameter,
        DeclarationKind::Property,
        DeclarationKind::Accessor,
        DeclarationKind::Method,
        DeclarationKind::Class,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Method => "method",
            DeclarationKind::Accessor => "accessor",
            DeclarationKind::Property => "property",
            DeclarationKind::Parameter => "parameter",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name of a declaration within its class
///
/// Parameters carry no name of their own; they are identified by their
/// enclosing method and zero-based position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclarationKey {
    /// The class declaration
    Class,
    /// A named member
    Member(String),
    /// A parameter of a method
    Parameter {
        /// Enclosing method name
        method: String,
        /// Zero-based parameter position
        index: usize,
    },
}

impl DeclarationKey {
    /// Key for a named member
    pub fn member(name: impl Into<String>) -> Self {
        DeclarationKey::Member(name.into())
    }

    /// Key for a parameter
    pub fn parameter(method: impl Into<String>, index: usize) -> Self {
        DeclarationKey::Parameter {
            method: method.into(),
            index,
        }
    }
}

impl fmt::Display for DeclarationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKey::Class => f.write_str("<class>"),
            DeclarationKey::Member(name) => f.write_str(name),
            DeclarationKey::Parameter { method, index } => write!(f, "{}#{}", method, index),
        }
    }
}

/// The original body or value behind a declaration
#[derive(Clone)]
pub enum Original {
    /// Class and parameter declarations have nothing to carry
    None,
    /// Original method body
    Method(Method),
    /// Original accessor pair
    Accessor(AccessorPair),
    /// Initial property value
    Value(Value),
}

impl fmt::Debug for Original {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Original::None => f.write_str("None"),
            Original::Method(_) => f.write_str("Method(..)"),
            Original::Accessor(pair) => f.debug_tuple("Accessor").field(pair).finish(),
            Original::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// A single declaration in a class body
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Owning class
    pub class_id: ClassId,
    /// Declaration kind
    pub kind: DeclarationKind,
    /// Name within the class
    pub key: DeclarationKey,
    /// Original body or initial value, never mutated
    pub original: Original,
}

/// Opaque reference to a registered declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclarationHandle {
    index: usize,
    kind: DeclarationKind,
}

impl DeclarationHandle {
    /// Kind of the referenced declaration
    #[inline]
    pub fn kind(&self) -> DeclarationKind {
        self.kind
    }
}

/// Declarations of one class body
#[derive(Debug)]
pub struct DeclarationRegistry {
    class_id: ClassId,
    class_name: String,
    /// Declarations in registration order
    declarations: Vec<Declaration>,
    /// (kind, key) -> index into `declarations`
    index: FxHashMap<(DeclarationKind, DeclarationKey), usize>,
}

impl DeclarationRegistry {
    /// Create an empty registry for a class body
    pub fn new(class_id: ClassId, class_name: impl Into<String>) -> Self {
        Self {
            class_id,
            class_name: class_name.into(),
            declarations: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Class this registry belongs to
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Name of the class
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Register a declaration
    ///
    /// Fails with [`DefinitionError::DuplicateDeclaration`] if the same
    /// `(key, kind)` pair is already registered for this class.
    pub fn register(
        &mut self,
        key: DeclarationKey,
        kind: DeclarationKind,
        original: Original,
    ) -> Result<DeclarationHandle, DefinitionError> {
        let slot = (kind, key);
        if self.index.contains_key(&slot) {
            return Err(DefinitionError::DuplicateDeclaration {
                class: self.class_name.clone(),
                member: slot.1.to_string(),
                kind,
            });
        }

        let index = self.declarations.len();
        self.declarations.push(Declaration {
            class_id: self.class_id,
            kind,
            key: slot.1.clone(),
            original,
        });
        self.index.insert(slot, index);
        Ok(DeclarationHandle { index, kind })
    }

    /// Get a declaration by handle
    pub fn get(&self, handle: DeclarationHandle) -> Option<&Declaration> {
        self.declarations.get(handle.index)
    }

    /// Find a declaration by kind and key
    pub fn find(&self, kind: DeclarationKind, key: &DeclarationKey) -> Option<&Declaration> {
        self.index
            .get(&(kind, key.clone()))
            .and_then(|&i| self.declarations.get(i))
    }

    /// Find a named member declaration
    pub fn find_member(&self, kind: DeclarationKind, name: &str) -> Option<&Declaration> {
        self.find(kind, &DeclarationKey::member(name))
    }

    /// Handles of all declarations of one kind, in registration order
    pub fn handles_of(&self, kind: DeclarationKind) -> Vec<DeclarationHandle> {
        self.declarations
            .iter()
            .enumerate()
            .filter(|(_, d)| d.kind == kind)
            .map(|(index, d)| DeclarationHandle {
                index,
                kind: d.kind,
            })
            .collect()
    }

    /// Names of all members of one kind, in registration order
    pub fn member_names(&self, kind: DeclarationKind) -> Vec<String> {
        self.declarations
            .iter()
            .filter(|d| d.kind == kind)
            .filter_map(|d| match &d.key {
                DeclarationKey::Member(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    /// Check whether a member of the given kind exists
    pub fn has_member(&self, kind: DeclarationKind, name: &str) -> bool {
        self.find_member(kind, name).is_some()
    }

    /// Iterate over all declarations in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    /// Number of declarations
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Check if no declaration was registered
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}
