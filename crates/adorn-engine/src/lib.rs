//! Adorn Annotation Engine
//!
//! Declarative augmentation of class declarations: independent annotations
//! attach behavior to classes, methods, accessors, stored properties and
//! method parameters without touching the original bodies.
//!
//! - **Declarations** (`declaration` module): per-class registry of members
//!   and their original bodies
//! - **Composition** (`compose` module): factory resolution, kind checks and
//!   bottom-up application with conflict detection
//! - **Interception** (`intercept` module): receiver-preserving wrappers for
//!   methods, getters and setters
//! - **Validation** (`validate` module): constraint-enforcing accessor pairs
//! - **Metadata** (`metadata` module): process-wide class metadata, watch
//!   list and annotation ledger
//! - **Built-ins** (`annotations` module): ready-made annotations
//!
//! # Example
//!
//! ```rust,ignore
//! use adorn_engine::{annotations, method, ClassBuilder, Engine, Value};
//!
//! let engine = Engine::new();
//! let emu = ClassBuilder::new("Emu")
//!     .method(
//!         "say",
//!         method(|_this, args| {
//!             println!("Emu says: {}", args[0]);
//!             Ok(Value::Null)
//!         }),
//!         [annotations::log()],
//!     )
//!     .define(&engine)?;
//!
//! emu.instantiate()?.call("say", &[Value::from("Hi there")])?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// ============================================================================
// Core Modules
// ============================================================================

/// Annotations, targets and the apply context
pub mod annotation;

/// Built-in annotations
pub mod annotations;

/// Class builder, classes and instances
pub mod class;

/// Composition engine
pub mod compose;

/// Engine configuration
pub mod config;

/// Declaration registry
pub mod declaration;

/// Engine entry point
pub mod engine;

/// Error types
pub mod error;

/// Method and accessor interception
pub mod intercept;

/// Metadata registry
pub mod metadata;

/// Log sinks
pub mod sink;

/// Property validation
pub mod validate;

/// Dynamic values
pub mod value;

// ============================================================================
// Re-exports
// ============================================================================

pub use annotation::{
    AccessorTarget, Annotation, ApplyContext, ClassTarget, DirectAnnotation, FactoryAnnotation,
    MethodTarget, ParameterTarget, PropertyTarget, Target,
};
pub use class::{Class, ClassBuilder, Instance, InstanceId};
pub use compose::{Composer, FinalBehavior};
pub use config::{ConflictPolicy, EngineConfig, StorageMode};
pub use declaration::{ClassId, Declaration, DeclarationKey, DeclarationKind, DeclarationRegistry};
pub use engine::Engine;
pub use error::{CallError, CallResult, CompositionConflictWarning, DefinitionError, ValidationError};
pub use intercept::{
    getter, intercept, intercept_getter, intercept_setter, method, setter, AccessorPair, Getter,
    HookType, Method, MethodWrapper, Setter,
};
pub use metadata::{AppliedAnnotation, MetadataRegistry, WatchedParameter};
pub use sink::{ConsoleSink, LogSink, MemorySink, SharedSink, TracingSink};
pub use validate::Constraint;
pub use value::Value;
