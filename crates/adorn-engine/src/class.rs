//! Class definition surface and runtime objects
//!
//! [`ClassBuilder`] collects a class body: its members, their original
//! implementations, and the annotations attached to each of them in source
//! order (farthest from the declaration first). [`Engine::define`] turns the
//! builder into an immutable [`Class`] with every annotation applied.
//!
//! [`Instance`] is a live object of a class. Method bodies, getters and
//! setters receive the instance they were invoked on.
//!
//! ```ignore
//! let emu = ClassBuilder::new("Emu")
//!     .method("say", method(|_this, args| { /* ... */ }), [annotations::log()])
//!     .define(&engine)?;
//!
//! let e = emu.instantiate()?;
//! e.call("say", &[Value::from("Hi there")])?;
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::annotation::Annotation;
use crate::declaration::{ClassId, DeclarationKey, DeclarationKind, DeclarationRegistry, Original};
use crate::engine::Engine;
use crate::error::{CallError, CallResult, CompositionConflictWarning, DefinitionError};
use crate::intercept::{AccessorPair, Method};
use crate::value::Value;

// ============================================================================
// Builder
// ============================================================================

/// A member awaiting definition
pub(crate) struct PendingMember {
    pub(crate) key: DeclarationKey,
    pub(crate) kind: DeclarationKind,
    pub(crate) original: Original,
    pub(crate) annotations: Vec<Annotation>,
}

/// Collects a class body before definition
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) annotations: Vec<Annotation>,
    pub(crate) members: Vec<PendingMember>,
}

impl ClassBuilder {
    /// Start a class body
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            members: Vec::new(),
        }
    }

    /// Attach class-level annotations, in source order
    pub fn annotate(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    /// Declare a method
    pub fn method(
        self,
        name: impl Into<String>,
        body: Method,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.member(
            DeclarationKey::member(name),
            DeclarationKind::Method,
            Original::Method(body),
            annotations,
        )
    }

    /// Declare a get/set accessor pair
    pub fn accessor(
        self,
        name: impl Into<String>,
        pair: AccessorPair,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.member(
            DeclarationKey::member(name),
            DeclarationKind::Accessor,
            Original::Accessor(pair),
            annotations,
        )
    }

    /// Declare a stored property with its initial value
    ///
    /// A `Null` initial value means "declared but not initialized".
    pub fn property(
        self,
        name: impl Into<String>,
        initial: Value,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.member(
            DeclarationKey::member(name),
            DeclarationKind::Property,
            Original::Value(initial),
            annotations,
        )
    }

    /// Declare an annotated method parameter
    pub fn parameter(
        self,
        method: impl Into<String>,
        index: usize,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.member(
            DeclarationKey::parameter(method, index),
            DeclarationKind::Parameter,
            Original::None,
            annotations,
        )
    }

    fn member(
        mut self,
        key: DeclarationKey,
        kind: DeclarationKind,
        original: Original,
        annotations: impl IntoIterator<Item = Annotation>,
    ) -> Self {
        self.members.push(PendingMember {
            key,
            kind,
            original,
            annotations: annotations.into_iter().collect(),
        });
        self
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define the class against an engine
    pub fn define(self, engine: &Engine) -> Result<Arc<Class>, DefinitionError> {
        engine.define(self)
    }
}

// ============================================================================
// Class
// ============================================================================

/// A fully defined class
///
/// Immutable: every member carries its final, composed behavior.
pub struct Class {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) declarations: DeclarationRegistry,
    pub(crate) methods: FxHashMap<String, Method>,
    pub(crate) accessors: FxHashMap<String, AccessorPair>,
    /// Property names and initial values, declaration order
    pub(crate) properties: Vec<(String, Value)>,
    /// Fields installed by class-level annotations, shared by all instances
    pub(crate) shared: FxHashMap<String, Value>,
    /// Names of members added by class-level annotations
    pub(crate) installed: Vec<String>,
    pub(crate) conflicts: Vec<CompositionConflictWarning>,
}

impl Class {
    /// Class identity
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarations with their original, unmodified implementations
    pub fn declarations(&self) -> &DeclarationRegistry {
        &self.declarations
    }

    /// Check if the class has a method (declared or installed)
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Check if the class has an accessor (declared or converted property)
    pub fn has_accessor(&self, name: &str) -> bool {
        self.accessors.contains_key(name)
    }

    /// Final behavior of a method
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Final accessor pair
    pub fn accessor(&self, name: &str) -> Option<&AccessorPair> {
        self.accessors.get(name)
    }

    /// Shared field installed by a class-level annotation
    pub fn shared(&self, name: &str) -> Option<&Value> {
        self.shared.get(name)
    }

    /// Members added by class-level annotations, in installation order
    pub fn installed_members(&self) -> &[String] {
        &self.installed
    }

    /// Composition conflicts observed while the class was defined
    pub fn conflicts(&self) -> &[CompositionConflictWarning] {
        &self.conflicts
    }

    /// Create an instance with declared initial values
    pub fn instantiate(self: &Arc<Self>) -> CallResult<Instance> {
        self.instantiate_with(std::iter::empty::<(String, Value)>())
    }

    /// Create an instance, overriding initial values
    ///
    /// Every property with a non-null value is written through its final
    /// setter, in declaration order, so validated properties reject bad
    /// initial values. Overrides naming undeclared members are written
    /// afterwards, in the given order.
    pub fn instantiate_with<K, I>(self: &Arc<Self>, values: I) -> CallResult<Instance>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut overrides: Vec<(String, Value)> =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        let instance = Instance::new(self.clone());

        for (name, initial) in &self.properties {
            let value = match overrides.iter().position(|(k, _)| k == name) {
                Some(i) => overrides.remove(i).1,
                None => initial.clone(),
            };
            if !value.is_null() {
                instance.set(name, value)?;
            }
        }
        for (name, value) in overrides {
            instance.set(&name, value)?;
        }

        tracing::trace!("instantiated {} as {}", self.name, instance.id);
        Ok(instance)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        let mut accessors: Vec<_> = self.accessors.keys().collect();
        accessors.sort();

        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("methods", &methods)
            .field("accessors", &accessors)
            .field("properties", &self.properties)
            .field("shared", &self.shared)
            .field("conflicts", &self.conflicts.len())
            .finish()
    }
}

// ============================================================================
// Instance
// ============================================================================

/// Global counter for instance IDs
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique instance identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// A live object of a class
#[derive(Debug)]
pub struct Instance {
    id: InstanceId,
    class: Arc<Class>,
    /// Own field storage
    fields: RwLock<FxHashMap<String, Value>>,
}

impl Instance {
    fn new(class: Arc<Class>) -> Self {
        Self {
            id: InstanceId(NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed)),
            class,
            fields: RwLock::new(FxHashMap::default()),
        }
    }

    /// Instance identity
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Class of this instance
    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    /// Invoke a method with this instance as receiver
    pub fn call(&self, name: &str, args: &[Value]) -> CallResult {
        let method = self
            .class
            .methods
            .get(name)
            .ok_or_else(|| self.unknown(name))?;
        method(self, args)
    }

    /// Read a member
    ///
    /// Lookup order: accessor, own field, shared field.
    pub fn get(&self, name: &str) -> CallResult {
        if let Some(pair) = self.class.accessors.get(name) {
            return match &pair.get {
                Some(get) => get(self),
                None => Err(CallError::NotReadable {
                    class: self.class.name.clone(),
                    member: name.to_string(),
                }),
            };
        }
        if let Some(value) = self.field(name) {
            return Ok(value);
        }
        self.class
            .shared
            .get(name)
            .cloned()
            .ok_or_else(|| self.unknown(name))
    }

    /// Write a member
    ///
    /// Accessors go through their setter; anything else is stored as an own
    /// field, shadowing a shared field of the same name.
    pub fn set(&self, name: &str, value: Value) -> CallResult<()> {
        if let Some(pair) = self.class.accessors.get(name) {
            return match &pair.set {
                Some(set) => set(self, value),
                None => Err(CallError::NotWritable {
                    class: self.class.name.clone(),
                    member: name.to_string(),
                }),
            };
        }
        self.set_field(name, value);
        Ok(())
    }

    /// Read own field storage directly, bypassing accessors
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).cloned()
    }

    /// Write own field storage directly, bypassing accessors
    pub fn set_field(&self, name: &str, value: Value) {
        self.fields.write().insert(name.to_string(), value);
    }

    fn unknown(&self, name: &str) -> CallError {
        CallError::UnknownMember {
            class: self.class.name.clone(),
            member: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::{getter, method, setter};

    fn account() -> Arc<Class> {
        ClassBuilder::new("Account")
            .property("id", Value::from(123456789), vec![])
            .property("owner", Value::from("Alex"), vec![])
            .property("nickname", Value::Null, vec![])
            .method(
                "deposit",
                method(|this, args| {
                    let amount = args.first().and_then(Value::as_f64).unwrap_or(0.0);
                    if amount < 0.0 {
                        return Err(CallError::raised("invalid amount"));
                    }
                    let balance = this.field("_balance").and_then(|v| v.as_f64()).unwrap_or(0.0);
                    this.set_field("_balance", Value::from(balance + amount));
                    Ok(Value::Null)
                }),
                vec![],
            )
            .accessor(
                "balance",
                AccessorPair::new(
                    Some(getter(|this| Ok(this.field("_balance").unwrap_or_default()))),
                    Some(setter(|this, value| {
                        this.set_field("_balance", value);
                        Ok(())
                    })),
                ),
                vec![],
            )
            .define(&Engine::isolated())
            .unwrap()
    }

    #[test]
    fn test_instantiate_with_initial_values() {
        let class = account();
        let acct = class
            .instantiate_with([("_balance", Value::from(1000.0))])
            .unwrap();

        assert_eq!(acct.get("id").unwrap(), Value::from(123456789));
        assert_eq!(acct.get("owner").unwrap(), Value::from("Alex"));
        assert_eq!(acct.get("balance").unwrap(), Value::from(1000.0));
        assert!(matches!(
            acct.get("nickname"),
            Err(CallError::UnknownMember { .. })
        ));
    }

    #[test]
    fn test_call_and_accessors() {
        let acct = account().instantiate().unwrap();

        acct.call("deposit", &[Value::from(50.0)]).unwrap();
        assert_eq!(acct.get("balance").unwrap(), Value::from(50.0));

        acct.set("balance", Value::from(10.0)).unwrap();
        assert_eq!(acct.field("_balance"), Some(Value::from(10.0)));

        assert_eq!(
            acct.call("deposit", &[Value::from(-1.0)]).unwrap_err(),
            CallError::raised("invalid amount")
        );
        assert_eq!(acct.get("balance").unwrap(), Value::from(10.0));
    }

    #[test]
    fn test_unknown_method() {
        let acct = account().instantiate().unwrap();
        assert_eq!(
            acct.call("withdraw", &[]).unwrap_err(),
            CallError::UnknownMember {
                class: "Account".to_string(),
                member: "withdraw".to_string(),
            }
        );
    }

    #[test]
    fn test_read_only_accessor() {
        let class = ClassBuilder::new("Person")
            .property("firstName", Value::from("John"), vec![])
            .property("lastName", Value::from("Smith"), vec![])
            .accessor(
                "fullName",
                AccessorPair::read_only(getter(|this| {
                    let first = this.get("firstName")?;
                    let last = this.get("lastName")?;
                    Ok(Value::from(format!("{} {}", first, last)))
                })),
                vec![],
            )
            .define(&Engine::isolated())
            .unwrap();

        let person = class.instantiate().unwrap();
        assert_eq!(person.get("fullName").unwrap(), Value::from("John Smith"));
        assert!(matches!(
            person.set("fullName", Value::from("x")),
            Err(CallError::NotWritable { .. })
        ));
    }

    #[test]
    fn test_instances_have_distinct_ids() {
        let class = account();
        let a = class.instantiate().unwrap();
        let b = class.instantiate().unwrap();
        assert_ne!(a.id(), b.id());
        assert!(Arc::ptr_eq(a.class(), b.class()));
    }
}
