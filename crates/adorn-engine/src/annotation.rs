//! Annotations and their targets
//!
//! An [`Annotation`] is either direct (a transform ready to apply) or a
//! factory (a configuration payload plus a function turning it into a direct
//! annotation). Factories are resolved once, eagerly, while the class is
//! being defined.
//!
//! A direct annotation receives a [`Target`], the closed union of things it
//! can be attached to, and an [`ApplyContext`] giving access to the log
//! sink and the metadata registry.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::config::StorageMode;
use crate::declaration::{ClassId, DeclarationKind};
use crate::error::DefinitionError;
use crate::intercept::{
    intercept, intercept_getter, intercept_setter, AccessorPair, Getter, Method, MethodWrapper,
    Setter,
};
use crate::metadata::MetadataRegistry;
use crate::sink::SharedSink;
use crate::validate::{self, Constraint};
use crate::value::Value;

type Transform =
    Arc<dyn Fn(&mut Target<'_>, &ApplyContext<'_>) -> Result<(), DefinitionError> + Send + Sync>;

type Configure = Arc<dyn Fn(&Value) -> Result<DirectAnnotation, DefinitionError> + Send + Sync>;

// ============================================================================
// Annotation
// ============================================================================

/// An annotation attached to a declaration
#[derive(Clone)]
pub enum Annotation {
    /// Ready to apply
    Direct(DirectAnnotation),
    /// Needs its configuration evaluated first
    Factory(FactoryAnnotation),
}

impl Annotation {
    /// Create a factory annotation
    pub fn factory<F>(name: impl Into<String>, config: Value, configure: F) -> Self
    where
        F: Fn(&Value) -> Result<DirectAnnotation, DefinitionError> + Send + Sync + 'static,
    {
        Annotation::Factory(FactoryAnnotation {
            name: name.into(),
            config,
            configure: Arc::new(configure),
        })
    }

    /// Annotation name as written at the attachment site
    pub fn name(&self) -> &str {
        match self {
            Annotation::Direct(direct) => &direct.name,
            Annotation::Factory(factory) => &factory.name,
        }
    }

    /// Resolve to a direct annotation, evaluating the factory if needed
    pub fn resolve(&self) -> Result<DirectAnnotation, DefinitionError> {
        match self {
            Annotation::Direct(direct) => Ok(direct.clone()),
            Annotation::Factory(factory) => {
                tracing::debug!("evaluating factory @{} with {}", factory.name, factory.config);
                (factory.configure)(&factory.config)
            }
        }
    }
}

impl From<DirectAnnotation> for Annotation {
    fn from(direct: DirectAnnotation) -> Self {
        Annotation::Direct(direct)
    }
}

impl fmt::Debug for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Direct(direct) => direct.fmt(f),
            Annotation::Factory(factory) => f
                .debug_struct("FactoryAnnotation")
                .field("name", &factory.name)
                .field("config", &factory.config)
                .finish(),
        }
    }
}

/// A configured annotation awaiting evaluation
#[derive(Clone)]
pub struct FactoryAnnotation {
    name: String,
    config: Value,
    configure: Configure,
}

impl FactoryAnnotation {
    /// Factory name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration payload, forwarded verbatim
    pub fn config(&self) -> &Value {
        &self.config
    }
}

/// A transform ready to be applied to one declaration
#[derive(Clone)]
pub struct DirectAnnotation {
    name: String,
    supports: Vec<DeclarationKind>,
    transform: Transform,
}

impl DirectAnnotation {
    /// Create an annotation accepting the given declaration kinds
    pub fn new<F>(name: impl Into<String>, supports: &[DeclarationKind], transform: F) -> Self
    where
        F: Fn(&mut Target<'_>, &ApplyContext<'_>) -> Result<(), DefinitionError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            supports: supports.to_vec(),
            transform: Arc::new(transform),
        }
    }

    /// Class-level annotation
    pub fn class<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ClassTarget, &ApplyContext<'_>) -> Result<(), DefinitionError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, &[DeclarationKind::Class], move |target, ctx| match target {
            Target::Class(t) => f(t, ctx),
            _ => Ok(()),
        })
    }

    /// Method annotation
    pub fn method<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut MethodTarget, &ApplyContext<'_>) -> Result<(), DefinitionError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, &[DeclarationKind::Method], move |target, ctx| match target {
            Target::Method(t) => f(t, ctx),
            _ => Ok(()),
        })
    }

    /// Accessor annotation
    pub fn accessor<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut AccessorTarget, &ApplyContext<'_>) -> Result<(), DefinitionError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, &[DeclarationKind::Accessor], move |target, ctx| match target {
            Target::Accessor(t) => f(t, ctx),
            _ => Ok(()),
        })
    }

    /// Property annotation
    pub fn property<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut PropertyTarget, &ApplyContext<'_>) -> Result<(), DefinitionError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, &[DeclarationKind::Property], move |target, ctx| match target {
            Target::Property(t) => f(t, ctx),
            _ => Ok(()),
        })
    }

    /// Parameter annotation
    pub fn parameter<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&ParameterTarget, &ApplyContext<'_>) -> Result<(), DefinitionError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, &[DeclarationKind::Parameter], move |target, ctx| match target {
            Target::Parameter(t) => f(t, ctx),
            _ => Ok(()),
        })
    }

    /// Annotation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaration kinds this annotation accepts
    pub fn supported_kinds(&self) -> &[DeclarationKind] {
        &self.supports
    }

    /// Check whether the annotation accepts a declaration kind
    pub fn supports(&self, kind: DeclarationKind) -> bool {
        self.supports.contains(&kind)
    }

    /// Fail with [`DefinitionError::TargetKindMismatch`] unless `kind` is accepted
    pub fn check_kind(&self, kind: DeclarationKind, member: &str) -> Result<(), DefinitionError> {
        if self.supports(kind) {
            Ok(())
        } else {
            Err(DefinitionError::TargetKindMismatch {
                annotation: self.name.clone(),
                member: member.to_string(),
                found: kind,
                supported: self.supports.clone(),
            })
        }
    }

    pub(crate) fn apply(
        &self,
        target: &mut Target<'_>,
        ctx: &ApplyContext<'_>,
    ) -> Result<(), DefinitionError> {
        (self.transform)(target, ctx)
    }
}

impl fmt::Debug for DirectAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectAnnotation")
            .field("name", &self.name)
            .field("supports", &self.supports)
            .finish()
    }
}

// ============================================================================
// Apply context
// ============================================================================

/// What an annotation can see while it is applied
pub struct ApplyContext<'a> {
    pub(crate) registry: &'a MetadataRegistry,
    pub(crate) sink: &'a SharedSink,
    pub(crate) class_id: ClassId,
    pub(crate) class_name: &'a str,
    pub(crate) member: &'a str,
    pub(crate) annotation: &'a str,
    pub(crate) storage: StorageMode,
}

impl<'a> ApplyContext<'a> {
    /// Metadata registry the class is being defined against
    pub fn registry(&self) -> &'a MetadataRegistry {
        self.registry
    }

    /// Injected log sink
    pub fn sink(&self) -> &'a SharedSink {
        self.sink
    }

    /// Write one line to the log sink
    pub fn log(&self, line: &str) {
        self.sink.write(line);
    }

    /// Class being defined
    pub fn class_id(&self) -> ClassId {
        self.class_id
    }

    /// Name of the class being defined
    pub fn class_name(&self) -> &'a str {
        self.class_name
    }

    /// Member the annotation is attached to (`<class>` for class annotations)
    pub fn member(&self) -> &'a str {
        self.member
    }

    /// Name of the annotation being applied
    pub fn annotation(&self) -> &'a str {
        self.annotation
    }

    /// Configured storage strategy for validated properties
    pub fn storage(&self) -> StorageMode {
        self.storage
    }

    /// Upsert a class metadata entry
    pub fn set_class_metadata(&self, key: impl Into<String>, value: Value) {
        self.registry.set_class_metadata(self.class_id, key, value);
    }

    /// Upsert a metadata entry on the current member
    pub fn define_member_metadata(&self, key: impl Into<String>, value: Value) {
        self.registry
            .define_member_metadata(self.class_id, self.member, key, value);
    }
}

// ============================================================================
// Targets
// ============================================================================

/// The declaration an annotation is being applied to
pub enum Target<'a> {
    /// Class declaration
    Class(&'a mut ClassTarget),
    /// Method declaration
    Method(&'a mut MethodTarget),
    /// Accessor declaration
    Accessor(&'a mut AccessorTarget),
    /// Property declaration
    Property(&'a mut PropertyTarget),
    /// Parameter declaration
    Parameter(&'a ParameterTarget),
}

impl Target<'_> {
    /// Kind of the target
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Target::Class(_) => DeclarationKind::Class,
            Target::Method(_) => DeclarationKind::Method,
            Target::Accessor(_) => DeclarationKind::Accessor,
            Target::Property(_) => DeclarationKind::Property,
            Target::Parameter(_) => DeclarationKind::Parameter,
        }
    }
}

/// A wholesale replacement that discarded an earlier one
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Replacement {
    pub(crate) slot: &'static str,
    pub(crate) discarded: String,
    pub(crate) winner: String,
}

/// Tracks wholesale replacements per slot for conflict detection
#[derive(Debug, Default)]
pub(crate) struct ReplacementTracker {
    current: String,
    replaced_by: FxHashMap<&'static str, String>,
    pending: Vec<Replacement>,
}

impl ReplacementTracker {
    pub(crate) fn begin(&mut self, annotation: &str) {
        self.current = annotation.to_string();
    }

    fn note(&mut self, slot: &'static str) {
        match self.replaced_by.insert(slot, self.current.clone()) {
            // An annotation may overwrite its own replacement
            Some(previous) if previous != self.current => self.pending.push(Replacement {
                slot,
                discarded: previous,
                winner: self.current.clone(),
            }),
            _ => {}
        }
    }

    pub(crate) fn drain(&mut self) -> Vec<Replacement> {
        std::mem::take(&mut self.pending)
    }
}

/// Class-level target: metadata and terminal member additions
#[derive(Default)]
pub struct ClassTarget {
    /// Annotation currently being applied
    pub(crate) current: String,
    pub(crate) shared: Vec<(String, Value)>,
    /// Name, body and installing annotation, in installation order
    pub(crate) methods: Vec<(String, Method, String)>,
}

impl ClassTarget {
    /// Add a shared field visible on every instance
    pub fn add_shared(&mut self, name: impl Into<String>, value: Value) {
        self.shared.push((name.into(), value));
    }

    /// Add a method visible on every instance; not subject to composition
    ///
    /// Replacing a declared method of the same name is reported as a
    /// composition conflict.
    pub fn add_method(&mut self, name: impl Into<String>, body: Method) {
        self.methods.push((name.into(), body, self.current.clone()));
    }

    /// Names of shared fields installed so far
    pub fn shared_names(&self) -> impl Iterator<Item = &str> {
        self.shared.iter().map(|(name, _)| name.as_str())
    }
}

/// Method target: the body composed so far
pub struct MethodTarget {
    pub(crate) name: String,
    pub(crate) body: Method,
    pub(crate) tracker: ReplacementTracker,
}

impl MethodTarget {
    pub(crate) fn new(name: String, body: Method) -> Self {
        Self {
            name,
            body,
            tracker: ReplacementTracker::default(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Body as composed by the annotations applied so far
    pub fn current(&self) -> Method {
        self.body.clone()
    }

    /// Wrap the current body
    pub fn wrap<W>(&mut self, wrapper: W)
    where
        W: Fn(&crate::Instance, &Method, &[Value]) -> crate::CallResult + Send + Sync + 'static,
    {
        self.body = intercept(self.body.clone(), wrapper);
    }

    /// Wrap the current body with hooks
    pub fn wrap_with<F>(&mut self, build: F)
    where
        F: FnOnce(MethodWrapper) -> MethodWrapper,
    {
        self.body = build(MethodWrapper::new(self.body.clone())).build();
    }

    /// Replace the body wholesale, discarding everything applied so far
    pub fn replace(&mut self, body: Method) {
        self.tracker.note("body");
        self.body = body;
    }
}

/// Accessor target: getter and setter composed so far
pub struct AccessorTarget {
    pub(crate) name: String,
    pub(crate) pair: AccessorPair,
    pub(crate) tracker: ReplacementTracker,
}

impl AccessorTarget {
    pub(crate) fn new(name: String, pair: AccessorPair) -> Self {
        Self {
            name,
            pair,
            tracker: ReplacementTracker::default(),
        }
    }

    /// Accessor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pair as composed so far
    pub fn current(&self) -> AccessorPair {
        self.pair.clone()
    }

    /// Wrap the getter; no-op when the accessor has none
    pub fn wrap_getter<W>(&mut self, wrapper: W)
    where
        W: Fn(&crate::Instance, &Getter) -> crate::CallResult + Send + Sync + 'static,
    {
        match self.pair.get.take() {
            Some(get) => self.pair.get = Some(intercept_getter(get, wrapper)),
            None => tracing::debug!("accessor '{}' has no getter to wrap", self.name),
        }
    }

    /// Wrap the setter; no-op when the accessor has none
    pub fn wrap_setter<W>(&mut self, wrapper: W)
    where
        W: Fn(&crate::Instance, &Setter, Value) -> crate::CallResult<()> + Send + Sync + 'static,
    {
        match self.pair.set.take() {
            Some(set) => self.pair.set = Some(intercept_setter(set, wrapper)),
            None => tracing::debug!("accessor '{}' has no setter to wrap", self.name),
        }
    }

    /// Replace the getter wholesale; the setter is left untouched
    pub fn replace_getter(&mut self, get: Getter) {
        self.tracker.note("get");
        self.pair.get = Some(get);
    }

    /// Replace the setter wholesale; the getter is left untouched
    pub fn replace_setter(&mut self, set: Setter) {
        self.tracker.note("set");
        self.pair.set = Some(set);
    }
}

/// Property target: a stored field that may be converted to accessors
pub struct PropertyTarget {
    pub(crate) name: String,
    pub(crate) initial: Value,
    pub(crate) accessors: Option<AccessorPair>,
    pub(crate) storage: StorageMode,
}

impl PropertyTarget {
    pub(crate) fn new(name: String, initial: Value, storage: StorageMode) -> Self {
        Self {
            name,
            initial,
            accessors: None,
            storage,
        }
    }

    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared initial value
    pub fn initial(&self) -> &Value {
        &self.initial
    }

    /// Check whether the property has been converted to an accessor pair
    pub fn is_converted(&self) -> bool {
        self.accessors.is_some()
    }

    /// Enforce a constraint on every write
    ///
    /// The first call converts the stored field into an accessor pair backed
    /// by the configured storage. Later calls stack: the newest constraint is
    /// checked first, then the write is handed to the previous setter.
    pub fn validate(&mut self, constraint: Constraint) {
        self.accessors = Some(match self.accessors.take() {
            None => validate::validate(&self.name, constraint, self.storage),
            Some(pair) => validate::stack(&self.name, pair, constraint),
        });
    }
}

/// Parameter target: read-only position information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterTarget {
    /// Enclosing method name
    pub method_name: String,
    /// Zero-based parameter position
    pub parameter_index: usize,
}
