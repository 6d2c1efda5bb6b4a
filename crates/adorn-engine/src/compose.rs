//! Annotation Composition Engine
//!
//! Turns a [`ClassBuilder`] into a [`Class`] in four passes:
//!
//! 1. **Register** every declaration (duplicate check).
//! 2. **Resolve** every factory annotation, once, in source order.
//! 3. **Check** every annotation against the kind of its declaration.
//! 4. **Apply**, grouped by kind: parameters, properties, accessors,
//!    methods, then the class itself. Within a group, declarations are
//!    processed in declaration order, except that the parameters of one
//!    method run last position first.
//!
//! Nothing is applied before passes 1-3 succeed, so duplicate and kind
//! errors never leave side effects behind.
//!
//! ## Ordering
//!
//! Annotations are listed farthest-from-declaration first and applied in
//! reverse: the nearest one wraps the original, each later one wraps the
//! result. For `[A, B]` a call observes A-pre, B-pre, body, B-post, A-post.
//!
//! ## Conflicts
//!
//! A wrapper composes; a wholesale replacement discards what was applied
//! before it. When a second replacement lands on the same slot, the engine
//! raises a [`CompositionConflictWarning`]: logged and kept on the class
//! under [`ConflictPolicy::Warn`], fatal under [`ConflictPolicy::Deny`].
//! The same applies when two declarations end up behind one member name: a
//! method installed by a class annotation over a declared method, or a
//! validated property over a declared accessor.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;

use crate::annotation::{
    AccessorTarget, Annotation, ApplyContext, ClassTarget, DirectAnnotation, MethodTarget,
    ParameterTarget, PropertyTarget, Replacement, ReplacementTracker, Target,
};
use crate::class::{Class, ClassBuilder};
use crate::config::ConflictPolicy;
use crate::declaration::{
    ClassId, Declaration, DeclarationHandle, DeclarationKey, DeclarationKind, DeclarationRegistry,
    Original,
};
use crate::engine::Engine;
use crate::error::{CompositionConflictWarning, DefinitionError};
use crate::intercept::{AccessorPair, Method};
use crate::metadata::AppliedAnnotation;
use crate::value::Value;

/// The fully composed behavior of one declaration
pub enum FinalBehavior {
    /// Class-level additions: shared fields and terminal methods
    Class(ClassTarget),
    /// Method body
    Method(Method),
    /// Accessor pair
    Accessor(AccessorPair),
    /// Stored property; converted properties carry their accessor pair
    Property {
        /// Declared initial value
        initial: Value,
        /// Accessor pair replacing the stored field, if any
        accessors: Option<AccessorPair>,
    },
    /// Parameters have no behavior of their own
    Parameter,
}

/// Something annotations can be applied to
trait Composable {
    fn as_target(&mut self) -> Target<'_>;

    fn tracker(&mut self) -> Option<&mut ReplacementTracker> {
        None
    }

    fn begin(&mut self, annotation: &str) {
        if let Some(tracker) = self.tracker() {
            tracker.begin(annotation);
        }
    }
}

impl Composable for ClassTarget {
    fn as_target(&mut self) -> Target<'_> {
        Target::Class(self)
    }

    fn begin(&mut self, annotation: &str) {
        self.current = annotation.to_string();
    }
}

impl Composable for MethodTarget {
    fn as_target(&mut self) -> Target<'_> {
        Target::Method(self)
    }

    fn tracker(&mut self) -> Option<&mut ReplacementTracker> {
        Some(&mut self.tracker)
    }
}

impl Composable for AccessorTarget {
    fn as_target(&mut self) -> Target<'_> {
        Target::Accessor(self)
    }

    fn tracker(&mut self) -> Option<&mut ReplacementTracker> {
        Some(&mut self.tracker)
    }
}

impl Composable for PropertyTarget {
    fn as_target(&mut self) -> Target<'_> {
        Target::Property(self)
    }
}

impl Composable for ParameterTarget {
    fn as_target(&mut self) -> Target<'_> {
        Target::Parameter(self)
    }
}

/// Applies annotation stacks for one class definition
pub struct Composer<'e> {
    engine: &'e Engine,
    class_id: ClassId,
    class_name: String,
    conflicts: Vec<CompositionConflictWarning>,
}

impl<'e> Composer<'e> {
    /// Create a composer for one class
    pub fn new(engine: &'e Engine, class_id: ClassId, class_name: impl Into<String>) -> Self {
        Self {
            engine,
            class_id,
            class_name: class_name.into(),
            conflicts: Vec::new(),
        }
    }

    /// Conflicts observed so far
    pub fn conflicts(&self) -> &[CompositionConflictWarning] {
        &self.conflicts
    }

    /// Apply resolved annotations, listed farthest first, to one declaration
    pub fn compose(
        &mut self,
        declaration: &Declaration,
        annotations: &[DirectAnnotation],
    ) -> Result<FinalBehavior, DefinitionError> {
        let member = declaration.key.to_string();
        for annotation in annotations {
            annotation.check_kind(declaration.kind, &member)?;
        }

        let storage = self.engine.config().storage;
        match (&declaration.key, &declaration.original) {
            (DeclarationKey::Class, _) => {
                let mut target = ClassTarget::default();
                self.apply_stack(&member, DeclarationKind::Class, annotations, &mut target)?;
                Ok(FinalBehavior::Class(target))
            }
            (DeclarationKey::Parameter { method, index }, _) => {
                let mut target = ParameterTarget {
                    method_name: method.clone(),
                    parameter_index: *index,
                };
                self.apply_stack(&member, DeclarationKind::Parameter, annotations, &mut target)?;
                Ok(FinalBehavior::Parameter)
            }
            (DeclarationKey::Member(name), Original::Method(body)) => {
                let mut target = MethodTarget::new(name.clone(), body.clone());
                self.apply_stack(&member, DeclarationKind::Method, annotations, &mut target)?;
                Ok(FinalBehavior::Method(target.body))
            }
            (DeclarationKey::Member(name), Original::Accessor(pair)) => {
                let mut target = AccessorTarget::new(name.clone(), pair.clone());
                self.apply_stack(&member, DeclarationKind::Accessor, annotations, &mut target)?;
                Ok(FinalBehavior::Accessor(target.pair))
            }
            (DeclarationKey::Member(name), Original::Value(initial)) => {
                let mut target = PropertyTarget::new(name.clone(), initial.clone(), storage);
                self.apply_stack(&member, DeclarationKind::Property, annotations, &mut target)?;
                Ok(FinalBehavior::Property {
                    initial: target.initial,
                    accessors: target.accessors,
                })
            }
            (DeclarationKey::Member(name), Original::None) => {
                let mut target = PropertyTarget::new(name.clone(), Value::Null, storage);
                self.apply_stack(&member, declaration.kind, annotations, &mut target)?;
                Ok(FinalBehavior::Property {
                    initial: target.initial,
                    accessors: target.accessors,
                })
            }
        }
    }

    fn apply_stack<T: Composable>(
        &mut self,
        member: &str,
        kind: DeclarationKind,
        annotations: &[DirectAnnotation],
        target: &mut T,
    ) -> Result<(), DefinitionError> {
        let engine = self.engine;
        let config = engine.config();

        for annotation in annotations.iter().rev() {
            target.begin(annotation.name());

            engine.registry().record_application(AppliedAnnotation {
                class_id: self.class_id,
                class: self.class_name.clone(),
                member: member.to_string(),
                kind,
                annotation: annotation.name().to_string(),
            });
            tracing::debug!(
                "applying @{} to {} {}.{}",
                annotation.name(),
                kind,
                self.class_name,
                member
            );
            if config.trace_applications {
                engine.sink().write(&format!(
                    "applied @{} to {}.{}",
                    annotation.name(),
                    self.class_name,
                    member
                ));
            }

            let ctx = ApplyContext {
                registry: engine.registry().as_ref(),
                sink: engine.sink(),
                class_id: self.class_id,
                class_name: &self.class_name,
                member,
                annotation: annotation.name(),
                storage: config.storage,
            };
            annotation.apply(&mut target.as_target(), &ctx)?;

            let replacements = target.tracker().map(ReplacementTracker::drain);
            for replacement in replacements.into_iter().flatten() {
                self.conflict(member, replacement)?;
            }
        }
        Ok(())
    }

    /// Report a member name taken over by another declaration
    ///
    /// `discarded` and `winner` name the outermost annotation on each side,
    /// empty for a declaration without annotations.
    pub(crate) fn collision(
        &mut self,
        member: &str,
        discarded: String,
        winner: String,
    ) -> Result<(), DefinitionError> {
        self.conflict(
            member,
            Replacement {
                slot: "body",
                discarded,
                winner,
            },
        )
    }

    fn conflict(&mut self, member: &str, replacement: Replacement) -> Result<(), DefinitionError> {
        let member = match replacement.slot {
            "body" => member.to_string(),
            slot => format!("{} ({})", member, slot),
        };
        let warning = CompositionConflictWarning {
            class: self.class_name.clone(),
            member,
            discarded: replacement.discarded,
            winner: replacement.winner,
        };

        let engine = self.engine;
        match engine.config().conflicts {
            ConflictPolicy::Deny => Err(DefinitionError::CompositionConflict(warning)),
            ConflictPolicy::Warn => {
                tracing::warn!("{}", warning);
                engine.sink().write(&format!("warning: {}", warning));
                self.conflicts.push(warning);
                Ok(())
            }
        }
    }
}

/// Final behaviors by member name, with the annotation that produced each
struct Members<T> {
    table: FxHashMap<String, T>,
    origins: FxHashMap<String, String>,
}

impl<T> Default for Members<T> {
    fn default() -> Self {
        Self {
            table: FxHashMap::default(),
            origins: FxHashMap::default(),
        }
    }
}

impl<T> Members<T> {
    /// Insert a final behavior; taking over an existing name is a conflict
    fn insert(
        &mut self,
        composer: &mut Composer<'_>,
        name: String,
        behavior: T,
        origin: String,
    ) -> Result<(), DefinitionError> {
        if let Some(previous) = self.origins.insert(name.clone(), origin.clone()) {
            composer.collision(&name, previous, origin)?;
        }
        self.table.insert(name, behavior);
        Ok(())
    }
}

/// Define a class from its body
pub(crate) fn define(engine: &Engine, builder: ClassBuilder) -> Result<Class, DefinitionError> {
    let ClassBuilder {
        name,
        annotations,
        members,
    } = builder;
    let class_id = ClassId::next();
    let mut declarations = DeclarationRegistry::new(class_id, name.clone());

    // Pass 1: register
    let class_handle =
        declarations.register(DeclarationKey::Class, DeclarationKind::Class, Original::None)?;
    let mut attached: Vec<(DeclarationHandle, Vec<Annotation>)> =
        Vec::with_capacity(members.len() + 1);
    for member in members {
        let handle = declarations.register(member.key, member.kind, member.original)?;
        attached.push((handle, member.annotations));
    }
    attached.push((class_handle, annotations));

    // Pass 2: resolve factories in source order
    let mut resolved: Vec<(&Declaration, Vec<DirectAnnotation>)> =
        Vec::with_capacity(attached.len());
    for (handle, annotations) in &attached {
        let Some(declaration) = declarations.get(*handle) else {
            continue;
        };
        let direct = annotations
            .iter()
            .map(Annotation::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        resolved.push((declaration, direct));
    }

    // Pass 3: kind check
    for (declaration, annotations) in &resolved {
        let member = declaration.key.to_string();
        for annotation in annotations {
            annotation.check_kind(declaration.kind, &member)?;
        }
    }

    // Pass 4: apply, grouped by kind
    let mut composer = Composer::new(engine, class_id, name.clone());
    let mut methods = Members::default();
    let mut accessors = Members::default();
    let mut properties = Vec::new();
    let mut shared = FxHashMap::default();
    let mut installed = Vec::new();

    for kind in DeclarationKind::ALL {
        let mut group: Vec<_> = resolved.iter().filter(|(d, _)| d.kind == kind).collect();
        if kind == DeclarationKind::Parameter {
            // Methods in declaration order, positions within a method descending
            let mut owners: Vec<String> = Vec::new();
            for (declaration, _) in &group {
                if let DeclarationKey::Parameter { method, .. } = &declaration.key {
                    if !owners.contains(method) {
                        owners.push(method.clone());
                    }
                }
            }
            group.sort_by_key(|(d, _)| match &d.key {
                DeclarationKey::Parameter { method, index } => (
                    owners.iter().position(|owner| owner == method),
                    Reverse(*index),
                ),
                _ => (None, Reverse(0)),
            });
        }

        for (declaration, annotations) in group {
            let name = declaration.key.to_string();
            let outermost = annotations
                .first()
                .map(|a| a.name().to_string())
                .unwrap_or_default();
            match composer.compose(declaration, annotations)? {
                FinalBehavior::Method(body) => {
                    methods.insert(&mut composer, name, body, outermost)?;
                }
                FinalBehavior::Accessor(pair) => {
                    accessors.insert(&mut composer, name, pair, outermost)?;
                }
                FinalBehavior::Property {
                    initial,
                    accessors: converted,
                } => {
                    if let Some(pair) = converted {
                        accessors.insert(&mut composer, name.clone(), pair, outermost)?;
                    }
                    properties.push((name, initial));
                }
                FinalBehavior::Class(target) => {
                    for (field, value) in target.shared {
                        installed.push(field.clone());
                        shared.insert(field, value);
                    }
                    for (method, body, by) in target.methods {
                        installed.push(method.clone());
                        methods.insert(&mut composer, method, body, by)?;
                    }
                }
                FinalBehavior::Parameter => {}
            }
        }
    }

    let conflicts = composer.conflicts;
    drop(resolved);
    Ok(Class {
        id: class_id,
        name,
        declarations,
        methods: methods.table,
        accessors: accessors.table,
        properties,
        shared,
        installed,
        conflicts,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::EngineConfig;
    use crate::intercept::method;
    use crate::sink::{LogSink, MemorySink};

    fn traced(label: &'static str, sink: Arc<MemorySink>) -> Annotation {
        DirectAnnotation::method(label, move |target, _ctx| {
            let sink = sink.clone();
            target.wrap(move |this, original, args| {
                sink.write(&format!("{}-pre", label));
                let result = original(this, args)?;
                sink.write(&format!("{}-post", label));
                Ok(result)
            });
            Ok(())
        })
        .into()
    }

    fn replacing(label: &'static str) -> Annotation {
        DirectAnnotation::method(label, move |target, _ctx| {
            target.replace(method(move |_this, _args| Ok(Value::from(label))));
            Ok(())
        })
        .into()
    }

    #[test]
    fn test_onion_order() {
        let sink = MemorySink::shared();
        let body_sink = sink.clone();
        let class = ClassBuilder::new("Emu")
            .method(
                "say",
                method(move |_this, _args| {
                    body_sink.write("body");
                    Ok(Value::Null)
                }),
                vec![traced("A", sink.clone()), traced("B", sink.clone())],
            )
            .define(&Engine::isolated())
            .unwrap();

        class.instantiate().unwrap().call("say", &[]).unwrap();
        assert_eq!(sink.lines(), vec!["A-pre", "B-pre", "body", "B-post", "A-post"]);
    }

    #[test]
    fn test_application_trace_is_bottom_up() {
        let sink = MemorySink::shared();
        let engine = Engine::isolated()
            .with_sink(sink.clone())
            .with_config(EngineConfig::new().with_trace_applications(true));

        ClassBuilder::new("Emu")
            .method(
                "say",
                method(|_this, _args| Ok(Value::Null)),
                vec![traced("A", MemorySink::shared()), traced("B", MemorySink::shared())],
            )
            .define(&engine)
            .unwrap();

        assert_eq!(
            sink.lines(),
            vec!["applied @B to Emu.say", "applied @A to Emu.say"]
        );
    }

    #[test]
    fn test_second_replacement_warns_and_wins() {
        let sink = MemorySink::shared();
        let engine = Engine::isolated().with_sink(sink.clone());
        let class = ClassBuilder::new("Emu")
            .method(
                "say",
                method(|_this, _args| Ok(Value::from("original"))),
                vec![replacing("Mock"), replacing("Stub")],
            )
            .define(&engine)
            .unwrap();

        assert_eq!(class.conflicts().len(), 1);
        assert_eq!(class.conflicts()[0].discarded, "Stub");
        assert_eq!(class.conflicts()[0].winner, "Mock");
        assert_eq!(
            sink.lines(),
            vec!["warning: composition conflict on Emu.say: @Mock replaces the body installed by @Stub"]
        );
        assert_eq!(
            class.instantiate().unwrap().call("say", &[]).unwrap(),
            Value::from("Mock")
        );
    }

    #[test]
    fn test_deny_policy_fails_definition() {
        let engine = Engine::isolated()
            .with_config(EngineConfig::new().with_conflicts(ConflictPolicy::Deny));
        let err = ClassBuilder::new("Emu")
            .method(
                "say",
                method(|_this, _args| Ok(Value::Null)),
                vec![replacing("Mock"), replacing("Stub")],
            )
            .define(&engine)
            .unwrap_err();

        assert!(matches!(err, DefinitionError::CompositionConflict(ref w) if w.winner == "Mock"));
    }

    #[test]
    fn test_single_replacement_is_not_a_conflict() {
        let sink = MemorySink::shared();
        let class = ClassBuilder::new("Emu")
            .method(
                "say",
                method(|_this, _args| Ok(Value::Null)),
                vec![traced("A", sink.clone()), replacing("Stub")],
            )
            .define(&Engine::isolated())
            .unwrap();

        assert!(class.conflicts().is_empty());
        assert_eq!(
            class.instantiate().unwrap().call("say", &[]).unwrap(),
            Value::from("Stub")
        );
        assert_eq!(sink.lines(), vec!["A-pre", "A-post"]);
    }

    #[test]
    fn test_kind_mismatch_blocks_all_side_effects() {
        let registry = crate::MetadataRegistry::shared();
        let engine = Engine::isolated().with_registry(registry.clone());
        let watch: Annotation = DirectAnnotation::parameter("Watch", |target, ctx| {
            ctx.registry()
                .record(target.method_name.clone(), target.parameter_index);
            Ok(())
        })
        .into();

        let err = ClassBuilder::new("Vehicle")
            .parameter("drive", 0, vec![watch.clone()])
            .method("drive", method(|_this, _args| Ok(Value::Null)), vec![watch])
            .define(&engine)
            .unwrap_err();

        assert!(matches!(err, DefinitionError::TargetKindMismatch { .. }));
        assert!(registry.all_watched().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_factories_resolve_once_before_application() {
        let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let make = |label: &'static str| {
            let calls = calls.clone();
            Annotation::factory(label, Value::Null, move |_config| {
                calls.lock().push(format!("resolve {}", label));
                let calls = calls.clone();
                Ok(DirectAnnotation::method(label, move |_target, _ctx| {
                    calls.lock().push(format!("apply {}", label));
                    Ok(())
                }))
            })
        };

        let class = ClassBuilder::new("Emu")
            .method("say", method(|_this, _args| Ok(Value::Null)), vec![make("A"), make("B")])
            .define(&Engine::isolated())
            .unwrap();
        class.instantiate().unwrap();
        class.instantiate().unwrap();

        assert_eq!(
            *calls.lock(),
            vec!["resolve A", "resolve B", "apply B", "apply A"]
        );
    }

    #[test]
    fn test_class_annotations_run_after_members() {
        let sink = MemorySink::shared();
        let engine = Engine::isolated()
            .with_sink(sink.clone())
            .with_config(EngineConfig::new().with_trace_applications(true));
        let noop_class: Annotation = DirectAnnotation::class("Pipe", |_, _| Ok(())).into();
        let noop_property: Annotation = DirectAnnotation::property("Column", |_, _| Ok(())).into();
        let noop_parameter: Annotation = DirectAnnotation::parameter("Watch", |_, _| Ok(())).into();

        ClassBuilder::new("Profile")
            .annotate(vec![noop_class])
            .method("drive", method(|_this, _args| Ok(Value::Null)), vec![])
            .property("name", Value::Null, vec![noop_property])
            .parameter("drive", 1, vec![noop_parameter.clone()])
            .parameter("drive", 0, vec![noop_parameter])
            .define(&engine)
            .unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                "applied @Watch to Profile.drive#1",
                "applied @Watch to Profile.drive#0",
                "applied @Column to Profile.name",
                "applied @Pipe to Profile.<class>",
            ]
        );
    }

    #[test]
    fn test_parameters_follow_method_declaration_order() {
        let sink = MemorySink::shared();
        let engine = Engine::isolated()
            .with_sink(sink.clone())
            .with_config(EngineConfig::new().with_trace_applications(true));
        let noop: Annotation = DirectAnnotation::parameter("Watch", |_, _| Ok(())).into();

        ClassBuilder::new("Vehicle")
            .parameter("drive", 1, vec![noop.clone()])
            .parameter("park", 0, vec![noop.clone()])
            .parameter("drive", 0, vec![noop.clone()])
            .parameter("drive", 2, vec![noop])
            .define(&engine)
            .unwrap();

        assert_eq!(
            sink.lines(),
            vec![
                "applied @Watch to Vehicle.drive#2",
                "applied @Watch to Vehicle.drive#1",
                "applied @Watch to Vehicle.drive#0",
                "applied @Watch to Vehicle.park#0",
            ]
        );
    }

    fn installing(name: &'static str) -> Annotation {
        DirectAnnotation::class("Component", move |target, _ctx| {
            target.add_method(name, method(|_this, _args| Ok(Value::from("installed"))));
            Ok(())
        })
        .into()
    }

    #[test]
    fn test_installed_method_over_declared_one_warns() {
        let sink = MemorySink::shared();
        let engine = Engine::isolated().with_sink(sink.clone());
        let class = ClassBuilder::new("Profile")
            .annotate(vec![installing("insertInDOM")])
            .method(
                "insertInDOM",
                method(|_this, _args| Ok(Value::from("declared"))),
                vec![traced("Log", MemorySink::shared())],
            )
            .define(&engine)
            .unwrap();

        assert_eq!(class.conflicts().len(), 1);
        assert_eq!(class.conflicts()[0].member, "insertInDOM");
        assert_eq!(class.conflicts()[0].discarded, "Log");
        assert_eq!(class.conflicts()[0].winner, "Component");
        assert_eq!(
            sink.lines(),
            vec!["warning: composition conflict on Profile.insertInDOM: @Component replaces the body installed by @Log"]
        );
        assert_eq!(
            class.instantiate().unwrap().call("insertInDOM", &[]).unwrap(),
            Value::from("installed")
        );
    }

    #[test]
    fn test_installed_method_over_declared_one_denied() {
        let engine = Engine::isolated()
            .with_config(EngineConfig::new().with_conflicts(ConflictPolicy::Deny));
        let err = ClassBuilder::new("Profile")
            .annotate(vec![installing("insertInDOM")])
            .method(
                "insertInDOM",
                method(|_this, _args| Ok(Value::Null)),
                vec![],
            )
            .define(&engine)
            .unwrap_err();

        assert!(matches!(
            err,
            DefinitionError::CompositionConflict(ref w)
                if w.member == "insertInDOM" && w.discarded.is_empty() && w.winner == "Component"
        ));
    }

    #[test]
    fn test_declared_accessor_over_validated_property_warns() {
        use crate::intercept::getter;
        use crate::validate::Constraint;

        let guard: Annotation = DirectAnnotation::property("SmallestLength", |target, _ctx| {
            target.validate(Constraint::min_length(4));
            Ok(())
        })
        .into();

        let class = ClassBuilder::new("User")
            .property("password", Value::Null, vec![guard])
            .accessor(
                "password",
                AccessorPair::read_only(getter(|_this| Ok(Value::from("hidden")))),
                vec![],
            )
            .define(&Engine::isolated())
            .unwrap();

        assert_eq!(class.conflicts().len(), 1);
        assert_eq!(class.conflicts()[0].discarded, "SmallestLength");
        assert!(class.conflicts()[0].winner.is_empty());
    }

    #[test]
    fn test_distinct_installed_names_do_not_conflict() {
        let class = ClassBuilder::new("Profile")
            .annotate(vec![installing("insertInDOM")])
            .method("render", method(|_this, _args| Ok(Value::Null)), vec![])
            .define(&Engine::isolated())
            .unwrap();

        assert!(class.conflicts().is_empty());
        assert!(class.has_method("render"));
        assert!(class.has_method("insertInDOM"));
    }

    #[test]
    fn test_class_additions_are_installed() {
        let installer: Annotation = DirectAnnotation::class("Component", |target, ctx| {
            target.add_shared("uniqueID", Value::from(42));
            target.add_method("insertInDOM", method(|_this, _args| Ok(Value::from(true))));
            ctx.set_class_metadata("uniqueID", Value::from(42));
            Ok(())
        })
        .into();

        let engine = Engine::isolated();
        let class = ClassBuilder::new("Profile")
            .annotate(vec![installer])
            .define(&engine)
            .unwrap();

        assert_eq!(class.installed_members(), &["uniqueID", "insertInDOM"]);
        let profile = class.instantiate().unwrap();
        assert_eq!(profile.get("uniqueID").unwrap(), Value::from(42));
        assert_eq!(profile.call("insertInDOM", &[]).unwrap(), Value::from(true));
        assert_eq!(
            engine.registry().class_metadata(class.id(), "uniqueID"),
            Some(Value::from(42))
        );
        assert!(engine.registry().class_has(class.id(), "Component"));
    }
}
