use std::sync::Arc;

use adorn_engine::annotations::{
    capitalize, component, component_with, log, pipe, say_hello, smallest_length, watch,
};
use adorn_engine::metadata;
use adorn_engine::{
    getter, method, AccessorPair, Annotation, CallError, ClassBuilder, ConflictPolicy,
    DefinitionError, DirectAnnotation, Engine, EngineConfig, LogSink, MemorySink,
    MetadataRegistry, StorageMode, Value,
};

fn engine_with(sink: &Arc<MemorySink>) -> Engine {
    Engine::isolated().with_sink(sink.clone())
}

fn marker(label: &'static str) -> Annotation {
    DirectAnnotation::method(label, move |target, ctx| {
        let sink = ctx.sink().clone();
        target.wrap_with(|wrapper| {
            let before = sink.clone();
            wrapper
                .with_before(move |_this, _args| {
                    before.write(&format!("{} pre", label));
                    Ok(())
                })
                .with_after(move |_this, value| {
                    sink.write(&format!("{} post", label));
                    Ok(value)
                })
        });
        Ok(())
    })
    .into()
}

fn replace_with(label: &'static str) -> Annotation {
    DirectAnnotation::method(label, move |target, _ctx| {
        target.replace(method(move |_this, _args| Ok(Value::from(label))));
        Ok(())
    })
    .into()
}

// ============================================================================
// Ordering
// ============================================================================

#[test]
fn test_onion_nesting() {
    let sink = MemorySink::shared();
    let body_sink = sink.clone();
    let class = ClassBuilder::new("Emu")
        .method(
            "say",
            method(move |_this, _args| {
                body_sink.write("body");
                Ok(Value::Null)
            }),
            [marker("A"), marker("B")],
        )
        .define(&engine_with(&sink))
        .unwrap();

    class.instantiate().unwrap().call("say", &[]).unwrap();
    assert_eq!(sink.lines(), vec!["A pre", "B pre", "body", "B post", "A post"]);
}

#[test]
fn test_log_wraps_emu_say() {
    let sink = MemorySink::shared();
    let body_sink = sink.clone();
    let class = ClassBuilder::new("Emu")
        .method(
            "say",
            method(move |_this, args| {
                let message = args.first().cloned().unwrap_or_default();
                body_sink.write(&format!("Emu says: {}", message));
                Ok(Value::Null)
            }),
            [log()],
        )
        .define(&engine_with(&sink))
        .unwrap();

    class
        .instantiate()
        .unwrap()
        .call("say", &[Value::from("Hi there")])
        .unwrap();
    assert_eq!(
        sink.lines(),
        vec!["=== begin log ===", "Emu says: Hi there", "=== end log   ==="]
    );
}

#[test]
fn test_class_annotations_apply_bottom_up() {
    let sink = MemorySink::shared();
    let engine = engine_with(&sink);
    let class = ClassBuilder::new("ProfileComponent2")
        .annotate([
            component_with(Value::map([("selector", Value::from("#my_profile"))])),
            pipe(),
        ])
        .define(&engine)
        .unwrap();

    assert_eq!(
        sink.lines(),
        vec!["Pipe Decorator Called", "Component Decorator Called"]
    );

    let profile = class.instantiate().unwrap();
    assert_eq!(profile.get("pipe").unwrap(), Value::from(true));
    assert_eq!(
        profile.get("options").unwrap().get("selector"),
        Some(&Value::from("#my_profile"))
    );
    assert_eq!(
        engine.registry().class_metadata(class.id(), "options"),
        Some(Value::map([("selector", Value::from("#my_profile"))]))
    );
    assert_eq!(engine.registry().classes_with("Pipe"), vec![class.id()]);
}

// ============================================================================
// Receiver preservation
// ============================================================================

#[test]
fn test_wrapped_method_sees_receiver_fields() {
    let class = ClassBuilder::new("Vehicle")
        .property("color", Value::Null, [])
        .method(
            "describe",
            method(|this, _args| this.get("color")),
            [log(), marker("Trace")],
        )
        .define(&Engine::isolated())
        .unwrap();

    for color in ["red", "green", "blue"] {
        let vehicle = class
            .instantiate_with([("color", Value::from(color))])
            .unwrap();
        assert_eq!(vehicle.call("describe", &[]).unwrap(), Value::from(color));
    }
}

// ============================================================================
// Accessors
// ============================================================================

fn person(annotations: Vec<Annotation>) -> Arc<adorn_engine::Class> {
    ClassBuilder::new("My_Person")
        .property("firstName", Value::from("Bobby"), [])
        .property("lastName", Value::from("Tyler"), [])
        .accessor(
            "fullName",
            AccessorPair::new(
                Some(getter(|this| {
                    let first = this.get("firstName")?;
                    let last = this.get("lastName")?;
                    Ok(Value::from(format!("{} {}", first, last)))
                })),
                Some(adorn_engine::setter(|this, value| {
                    let full = value.as_str().unwrap_or_default().to_string();
                    let (first, last) = full.split_once(' ').unwrap_or((full.as_str(), ""));
                    this.set("firstName", Value::from(first))?;
                    this.set("lastName", Value::from(last))
                })),
            ),
            annotations,
        )
        .define(&Engine::isolated())
        .unwrap()
}

#[test]
fn test_capitalize_transforms_getter_only() {
    let bobby = person(vec![capitalize()]).instantiate().unwrap();
    assert_eq!(bobby.get("fullName").unwrap(), Value::from("BOBBY TYLER"));

    bobby.set("fullName", Value::from("Ada Lovelace")).unwrap();
    assert_eq!(bobby.get("firstName").unwrap(), Value::from("Ada"));
    assert_eq!(bobby.get("fullName").unwrap(), Value::from("ADA LOVELACE"));
}

#[test]
fn test_say_hello_replaces_getter_and_keeps_setter() {
    let class = person(vec![say_hello(), capitalize()]);
    assert!(class.conflicts().is_empty());

    let bobby = class.instantiate().unwrap();
    assert_eq!(bobby.get("fullName").unwrap(), Value::from("Hello!"));

    bobby.set("fullName", Value::from("Ada Lovelace")).unwrap();
    assert_eq!(bobby.get("lastName").unwrap(), Value::from("Lovelace"));
}

// ============================================================================
// Validation
// ============================================================================

fn user(engine: &Engine) -> Arc<adorn_engine::Class> {
    ClassBuilder::new("User4")
        .property("password", Value::Null, [smallest_length(4)])
        .define(engine)
        .unwrap()
}

#[test]
fn test_validation_round_trip() {
    let user = user(&Engine::isolated()).instantiate().unwrap();

    user.set("password", Value::from("1234")).unwrap();
    assert_eq!(user.get("password").unwrap(), Value::from("1234"));

    let err = user.set("password", Value::from("123")).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Validation failed: password should be at least 4 long"
    );
    assert_eq!(user.get("password").unwrap(), Value::from("1234"));
}

#[test]
fn test_constructor_writes_are_validated() {
    let class = user(&Engine::isolated());
    assert!(class.instantiate_with([("password", Value::from("1234"))]).is_ok());
    assert!(matches!(
        class.instantiate_with([("password", Value::from("123"))]),
        Err(CallError::Validation(_))
    ));
}

#[test]
fn test_per_instance_storage() {
    let class = user(&Engine::isolated());
    let a = class.instantiate_with([("password", Value::from("alpha"))]).unwrap();
    let b = class.instantiate_with([("password", Value::from("bravo"))]).unwrap();

    assert_eq!(a.get("password").unwrap(), Value::from("alpha"));
    assert_eq!(b.get("password").unwrap(), Value::from("bravo"));
}

#[test]
fn test_shared_slot_storage_leaks() {
    let engine = Engine::isolated()
        .with_config(EngineConfig::new().with_storage(StorageMode::SharedSlot));
    let class = user(&engine);
    let a = class.instantiate_with([("password", Value::from("alpha"))]).unwrap();
    let b = class.instantiate_with([("password", Value::from("bravo"))]).unwrap();

    assert_eq!(a.get("password").unwrap(), Value::from("bravo"));
    assert_eq!(b.get("password").unwrap(), Value::from("bravo"));
}

// ============================================================================
// Watch list
// ============================================================================

#[test]
fn test_watch_list_is_append_only() {
    let registry = MetadataRegistry::shared();
    let engine = Engine::isolated().with_registry(registry.clone());

    ClassBuilder::new("Vehicle")
        .method("drive", method(|_this, _args| Ok(Value::Null)), [])
        .parameter("drive", 0, [watch()])
        .define(&engine)
        .unwrap();
    ClassBuilder::new("Boat")
        .method("sail", method(|_this, _args| Ok(Value::Null)), [])
        .parameter("sail", 0, [watch()])
        .parameter("sail", 1, [watch()])
        .define(&engine)
        .unwrap();

    let watched: Vec<_> = registry
        .all_watched()
        .into_iter()
        .map(|w| (w.method_name, w.parameter_index))
        .collect();
    // Within one method the last position is recorded first
    assert_eq!(
        watched,
        vec![
            ("drive".to_string(), 0),
            ("sail".to_string(), 1),
            ("sail".to_string(), 0),
        ]
    );
}

#[test]
fn test_watch_list_follows_method_declaration_order() {
    let registry = MetadataRegistry::shared();
    let engine = Engine::isolated().with_registry(registry.clone());

    ClassBuilder::new("Vehicle")
        .method("drive", method(|_this, _args| Ok(Value::Null)), [])
        .parameter("drive", 1, [watch()])
        .method("park", method(|_this, _args| Ok(Value::Null)), [])
        .parameter("park", 0, [watch()])
        .define(&engine)
        .unwrap();

    let watched: Vec<_> = registry
        .all_watched()
        .into_iter()
        .map(|w| (w.method_name, w.parameter_index))
        .collect();
    assert_eq!(
        watched,
        vec![("drive".to_string(), 1), ("park".to_string(), 0)]
    );
}

#[test]
fn test_watch_on_method_is_rejected() {
    let err = ClassBuilder::new("Vehicle")
        .method("drive", method(|_this, _args| Ok(Value::Null)), [watch()])
        .define(&Engine::isolated())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Annotation @Watch cannot be applied to method 'drive' (supports: parameter)"
    );
}

// ============================================================================
// Class metadata
// ============================================================================

#[test]
fn test_class_metadata_isolation() {
    let engine = Engine::isolated().with_sink(MemorySink::shared());
    let foo = ClassBuilder::new("Foo")
        .annotate([component()])
        .define(&engine)
        .unwrap();
    let bar = ClassBuilder::new("Bar").define(&engine).unwrap();

    assert!(engine.registry().has_class_metadata(foo.id(), "uniqueID"));
    assert!(!engine.registry().has_class_metadata(bar.id(), "uniqueID"));
    assert!(bar.instantiate().unwrap().get("uniqueID").is_err());
}

#[test]
fn test_duplicate_declaration_fails_definition() {
    let err = ClassBuilder::new("Account")
        .property("id", Value::from(1), [])
        .property("id", Value::from(2), [])
        .define(&Engine::isolated())
        .unwrap_err();
    assert!(matches!(err, DefinitionError::DuplicateDeclaration { .. }));
}

// ============================================================================
// Conflicts
// ============================================================================

#[test]
fn test_conflict_detection() {
    let sink = MemorySink::shared();
    let class = ClassBuilder::new("Emu")
        .method(
            "say",
            method(|_this, _args| Ok(Value::from("original"))),
            [replace_with("Later"), replace_with("Earlier")],
        )
        .define(&engine_with(&sink))
        .unwrap();

    assert_eq!(class.conflicts().len(), 1);
    assert_eq!(class.conflicts()[0].winner, "Later");
    assert_eq!(sink.lines().len(), 1);
    assert_eq!(
        class.instantiate().unwrap().call("say", &[]).unwrap(),
        Value::from("Later")
    );
}

#[test]
fn test_conflict_denied() {
    let engine = Engine::isolated()
        .with_config(EngineConfig::new().with_conflicts(ConflictPolicy::Deny));
    let err = ClassBuilder::new("Emu")
        .method(
            "say",
            method(|_this, _args| Ok(Value::Null)),
            [replace_with("Later"), replace_with("Earlier")],
        )
        .define(&engine)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "composition conflict on Emu.say: @Later replaces the body installed by @Earlier"
    );
}

#[test]
fn test_component_over_declared_method_is_a_conflict() {
    let sink = MemorySink::shared();
    let class = ClassBuilder::new("ProfileComponent")
        .annotate([component()])
        .method(
            "insertInDOM",
            method(|_this, _args| Ok(Value::from("declared"))),
            [log()],
        )
        .define(&engine_with(&sink))
        .unwrap();

    assert_eq!(class.conflicts().len(), 1);
    assert_eq!(class.conflicts()[0].discarded, "Log");
    assert_eq!(class.conflicts()[0].winner, "Component");
    assert_eq!(
        sink.lines(),
        vec![
            "Component Decorator Called",
            "warning: composition conflict on ProfileComponent.insertInDOM: @Component replaces the body installed by @Log",
        ]
    );
}

// ============================================================================
// Global registry lifecycle
// ============================================================================

#[test]
fn test_global_registry_lifecycle() {
    let registry = metadata::init();
    assert!(Arc::ptr_eq(&registry, &metadata::global()));

    let engine = Engine::new().with_sink(MemorySink::shared());
    assert!(Arc::ptr_eq(engine.registry(), &registry));

    let class = ClassBuilder::new("GlobalVehicle")
        .method("drive", method(|_this, _args| Ok(Value::Null)), [])
        .parameter("drive", 0, [watch()])
        .define(&engine)
        .unwrap();
    assert!(!registry.all_watched().is_empty());
    assert!(!registry.applications_on(class.id()).is_empty());

    metadata::reset();
    assert!(registry.is_empty());
}
