//! Built-in annotations
//!
//! | Annotation            | Target    | Effect                                          |
//! |-----------------------|-----------|-------------------------------------------------|
//! | `component()`         | class     | installs `uniqueID` and `insertInDOM`           |
//! | `component_with(cfg)` | class     | as `component()`, plus `options` = `cfg`        |
//! | `pipe()`              | class     | installs `pipe = true`                          |
//! | `sauce(kind)`         | class     | installs `sauce = kind`                         |
//! | `log()`               | method    | prints begin/end markers around the body        |
//! | `capitalize()`        | accessor  | upper-cases string getter results               |
//! | `say_hello()`         | accessor  | replaces the getter with one returning `Hello!` |
//! | `smallest_length(n)`  | property  | rejects writes shorter than `n`                 |
//! | `watch()`             | parameter | appends the position to the watch list          |

use std::time::{SystemTime, UNIX_EPOCH};

use crate::annotation::{Annotation, DirectAnnotation};
use crate::error::DefinitionError;
use crate::intercept::{getter, method};
use crate::validate::Constraint;
use crate::value::Value;

/// Name of [`component`] and [`component_with`]
pub const COMPONENT: &str = "Component";
/// Name of [`pipe`]
pub const PIPE: &str = "Pipe";
/// Name of [`sauce`]
pub const SAUCE: &str = "Sauce";
/// Name of [`log`]
pub const LOG: &str = "Log";
/// Name of [`capitalize`]
pub const CAPITALIZE: &str = "Capitalize";
/// Name of [`say_hello`]
pub const SAY_HELLO: &str = "SayHello";
/// Name of [`smallest_length`]
pub const SMALLEST_LENGTH: &str = "SmallestLength";
/// Name of [`watch`]
pub const WATCH: &str = "Watch";

fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn install_component(options: Option<Value>) -> DirectAnnotation {
    DirectAnnotation::class(COMPONENT, move |target, ctx| {
        ctx.log("Component Decorator Called");

        let unique_id = Value::from(epoch_millis());
        if let Some(options) = &options {
            target.add_shared("options", options.clone());
            ctx.set_class_metadata("options", options.clone());
        }
        target.add_shared("uniqueID", unique_id.clone());
        ctx.set_class_metadata("uniqueID", unique_id);

        let sink = ctx.sink().clone();
        target.add_method(
            "insertInDOM",
            method(move |_this, _args| {
                sink.write("inserting the component in the DOM");
                Ok(Value::Null)
            }),
        );
        Ok(())
    })
}

/// Component class annotation
pub fn component() -> Annotation {
    install_component(None).into()
}

/// Configured component class annotation
///
/// Recognized options: `{selector: string}`, non-empty.
pub fn component_with(config: Value) -> Annotation {
    Annotation::factory(COMPONENT, config, |config| {
        match config.get("selector").and_then(Value::as_str) {
            Some(selector) if !selector.is_empty() => Ok(install_component(Some(config.clone()))),
            Some(_) => Err(invalid(COMPONENT, "selector must not be empty")),
            None => Err(invalid(
                COMPONENT,
                format!("expected {{selector: string}}, got {}", config),
            )),
        }
    })
}

/// Pipe class annotation
pub fn pipe() -> Annotation {
    DirectAnnotation::class(PIPE, |target, ctx| {
        ctx.log("Pipe Decorator Called");
        target.add_shared("pipe", Value::from(true));
        ctx.set_class_metadata("pipe", Value::from(true));
        Ok(())
    })
    .into()
}

/// Sauce class annotation
pub fn sauce(kind: impl Into<String>) -> Annotation {
    Annotation::factory(SAUCE, Value::from(kind.into()), |config| {
        let kind = config.clone();
        if config.as_str().is_none() {
            return Err(invalid(
                SAUCE,
                format!("expected a string, got {}", config.type_name()),
            ));
        }
        Ok(DirectAnnotation::class(SAUCE, move |target, ctx| {
            target.add_shared("sauce", kind.clone());
            ctx.set_class_metadata("sauce", kind.clone());
            Ok(())
        }))
    })
}

/// Log method annotation
pub fn log() -> Annotation {
    DirectAnnotation::method(LOG, |target, ctx| {
        let sink = ctx.sink().clone();
        target.wrap(move |this, original, args| {
            sink.write("=== begin log ===");
            let result = original(this, args)?;
            sink.write("=== end log   ===");
            Ok(result)
        });
        Ok(())
    })
    .into()
}

/// Capitalize accessor annotation
pub fn capitalize() -> Annotation {
    DirectAnnotation::accessor(CAPITALIZE, |target, _ctx| {
        target.wrap_getter(|this, original| {
            let value = original(this)?;
            Ok(match value.as_str() {
                Some(s) => Value::from(s.to_uppercase()),
                None => value,
            })
        });
        Ok(())
    })
    .into()
}

/// SayHello accessor annotation
pub fn say_hello() -> Annotation {
    DirectAnnotation::accessor(SAY_HELLO, |target, _ctx| {
        target.replace_getter(getter(|_this| Ok(Value::from("Hello!"))));
        Ok(())
    })
    .into()
}

/// SmallestLength property annotation
pub fn smallest_length(length: usize) -> Annotation {
    smallest_length_with(Value::map([("minimumLength", Value::from(length))]))
}

/// SmallestLength property annotation from a raw payload
///
/// Recognized options: `{minimumLength: number}`, a non-negative integer.
pub fn smallest_length_with(config: Value) -> Annotation {
    Annotation::factory(SMALLEST_LENGTH, config, |config| {
        let length = config
            .get("minimumLength")
            .and_then(Value::as_i64)
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                invalid(
                    SMALLEST_LENGTH,
                    format!("expected {{minimumLength: number}}, got {}", config),
                )
            })?;

        Ok(DirectAnnotation::property(SMALLEST_LENGTH, move |target, ctx| {
            target.validate(Constraint::min_length(length));
            ctx.define_member_metadata("minimumLength", Value::from(length));
            Ok(())
        }))
    })
}

/// Watch parameter annotation
pub fn watch() -> Annotation {
    DirectAnnotation::parameter(WATCH, |target, ctx| {
        ctx.registry()
            .record(target.method_name.clone(), target.parameter_index);
        Ok(())
    })
    .into()
}

fn invalid(annotation: &str, reason: impl Into<String>) -> DefinitionError {
    DefinitionError::InvalidConfig {
        annotation: annotation.to_string(),
        reason: reason.into(),
    }
}
