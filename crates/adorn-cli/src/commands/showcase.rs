//! `adorn showcase`: Define the demonstration classes and exercise them.

use std::sync::Arc;

use adorn_engine::annotations::{
    capitalize, component, component_with, log, pipe, sauce, say_hello, smallest_length, watch,
};
use adorn_engine::{
    getter, method, AccessorPair, Class, ClassBuilder, ConsoleSink, Engine, LogSink, SharedSink,
    Value,
};

use crate::config::{AdornConfig, ShowcaseConfig};

/// The demonstration classes, in definition order
pub struct Showcase {
    classes: Vec<Arc<Class>>,
}

impl Showcase {
    /// Define every demonstration class against an engine
    pub fn define(engine: &Engine, config: &ShowcaseConfig) -> anyhow::Result<Self> {
        let sink = engine.sink().clone();
        let classes = vec![
            profile_component(engine)?,
            parameterized_component(engine, config)?,
            composed_component(engine, config)?,
            emu(engine, sink.clone())?,
            person(engine)?,
            user(engine, config)?,
            vehicle(engine, sink)?,
            pizza(engine, config)?,
        ];
        Ok(Self { classes })
    }

    /// Find a class by name
    pub fn find(&self, name: &str) -> Option<&Arc<Class>> {
        self.classes.iter().find(|c| c.name() == name)
    }

    /// Names of all classes
    pub fn names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.name()).collect()
    }

    fn get(&self, name: &str) -> anyhow::Result<&Arc<Class>> {
        self.find(name)
            .ok_or_else(|| anyhow::anyhow!("showcase class {} is not defined", name))
    }
}

fn selector(config: &ShowcaseConfig) -> Value {
    Value::map([("selector", Value::from(config.selector.as_str()))])
}

fn profile_component(engine: &Engine) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("ProfileComponent")
        .annotate([component()])
        .define(engine)?)
}

fn parameterized_component(engine: &Engine, config: &ShowcaseConfig) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("ProfileComponenet")
        .annotate([component_with(selector(config))])
        .define(engine)?)
}

fn composed_component(engine: &Engine, config: &ShowcaseConfig) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("ProfileComponenet2")
        .annotate([component_with(selector(config)), pipe()])
        .define(engine)?)
}

fn emu(engine: &Engine, sink: SharedSink) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("Emu")
        .method(
            "say",
            method(move |_this, args| {
                let message = args.first().cloned().unwrap_or_default();
                sink.write(&format!("Emu says: {}", message));
                Ok(Value::Null)
            }),
            [log()],
        )
        .define(engine)?)
}

fn person(engine: &Engine) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("My_Person")
        .property("firstName", Value::Null, [])
        .property("lastName", Value::Null, [])
        .accessor(
            "fullName",
            AccessorPair::read_only(getter(|this| {
                let first = this.get("firstName")?;
                let last = this.get("lastName")?;
                Ok(Value::from(format!("{} {}", first, last)))
            })),
            [say_hello(), capitalize()],
        )
        .define(engine)?)
}

fn user(engine: &Engine, config: &ShowcaseConfig) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("User4")
        .property("password", Value::Null, [smallest_length(config.minimum_length)])
        .define(engine)?)
}

fn vehicle(engine: &Engine, sink: SharedSink) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("Vehicle")
        .property("color", Value::Null, [])
        .method(
            "drive",
            method(move |_this, args| {
                let speed = args.first().cloned().unwrap_or_default();
                sink.write(&format!("Driving at {}", speed));
                Ok(Value::Null)
            }),
            [],
        )
        .parameter("drive", 0, [watch()])
        .define(engine)?)
}

fn pizza(engine: &Engine, config: &ShowcaseConfig) -> anyhow::Result<Arc<Class>> {
    Ok(ClassBuilder::new("Pizza")
        .annotate([sauce(config.sauce.as_str())])
        .define(engine)?)
}

fn section(title: &str) {
    println!();
    println!("== {} ==", title);
}

/// Run the showcase, printing annotation output to stdout
pub fn execute(config: &AdornConfig) -> anyhow::Result<()> {
    let sink: SharedSink = Arc::new(ConsoleSink);
    let engine = super::engine(config, Some(sink));

    section("Class definition");
    let showcase = Showcase::define(&engine, &config.showcase)?;
    run(&engine, &showcase, &config.showcase)?;

    let conflicts: usize = showcase
        .classes
        .iter()
        .map(|c| c.conflicts().len())
        .sum();
    if conflicts > 0 {
        println!();
        println!("{} composition conflict(s) recorded", conflicts);
    }
    Ok(())
}

fn run(engine: &Engine, showcase: &Showcase, config: &ShowcaseConfig) -> anyhow::Result<()> {
    section("Class decorators");
    let component = showcase.get("ProfileComponent")?.instantiate()?;
    component.call("insertInDOM", &[])?;
    println!("uniqueID installed: {}", component.get("uniqueID").is_ok());

    let composed = showcase.get("ProfileComponenet2")?.instantiate()?;
    println!("pipe = {}", composed.get("pipe")?);
    println!("options = {}", composed.get("options")?);

    section("Method decorators");
    let emu = showcase.get("Emu")?.instantiate()?;
    emu.call("say", &[Value::from("Hi there")])?;

    section("Accessor decorators");
    let person = showcase.get("My_Person")?.instantiate_with([
        ("firstName", Value::from("Bobby")),
        ("lastName", Value::from("Tyler")),
    ])?;
    println!("{}", person.get("fullName")?);

    section("Property decorators");
    let users = showcase.get("User4")?;
    let valid: String = "1234567890".chars().cycle().take(config.minimum_length).collect();
    users.instantiate_with([("password", Value::from(valid.as_str()))])?;
    println!("password {:?} accepted", valid);

    let short = &valid[..valid.len() - 1];
    match users.instantiate_with([("password", Value::from(short))]) {
        Ok(_) => println!("password {:?} accepted", short),
        Err(e) => println!("password {:?} rejected: {}", short, e),
    }

    section("Parameter decorators");
    let vehicle = showcase
        .get("Vehicle")?
        .instantiate_with([("color", Value::from("red"))])?;
    vehicle.call("drive", &[Value::from("50mph")])?;
    let watched = engine.registry().all_watched();
    println!("{}", serde_json::to_string(&watched)?);

    section("Exercises");
    let pizza = showcase.get("Pizza")?.instantiate()?;
    println!("sauce = {}", pizza.get("sauce")?);

    Ok(())
}
