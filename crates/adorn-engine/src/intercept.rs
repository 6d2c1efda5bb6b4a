//! Method/Accessor Interception Layer
//!
//! Wraps a callable so cross-cutting logic runs around the original
//! implementation. A wrapped callable:
//!
//! 1. hands the wrapper the same receiver it was invoked on,
//! 2. forwards the exact argument slice unless the wrapper builds a new one,
//! 3. lets the wrapper run logic before and/or after the original and
//!    transform the result,
//! 4. never reaches the original if the wrapper returns an error first; the
//!    error reaches the caller unchanged,
//! 5. stacks: each layer's `original` is the previous layer's wrapped result.
//!
//! ## Usage
//!
//! ```ignore
//! let logged = intercept(body, |this, original, args| {
//!     sink.write("=== begin log ===");
//!     let result = original(this, args)?;
//!     sink.write("=== end log   ===");
//!     Ok(result)
//! });
//!
//! // Or with hooks
//! let timed = MethodWrapper::new(body)
//!     .with_before(|this, args| { /* ... */ Ok(()) })
//!     .with_after(|this, result| Ok(result))
//!     .build();
//! ```

use std::fmt;
use std::sync::Arc;

use crate::class::Instance;
use crate::error::{CallError, CallResult};
use crate::value::Value;

/// A method body: receiver plus positional arguments
pub type Method = Arc<dyn Fn(&Instance, &[Value]) -> CallResult + Send + Sync>;

/// An accessor getter
pub type Getter = Arc<dyn Fn(&Instance) -> CallResult + Send + Sync>;

/// An accessor setter
pub type Setter = Arc<dyn Fn(&Instance, Value) -> CallResult<()> + Send + Sync>;

/// Create a method from a closure
pub fn method<F>(f: F) -> Method
where
    F: Fn(&Instance, &[Value]) -> CallResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Create a getter from a closure
pub fn getter<F>(f: F) -> Getter
where
    F: Fn(&Instance) -> CallResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Create a setter from a closure
pub fn setter<F>(f: F) -> Setter
where
    F: Fn(&Instance, Value) -> CallResult<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a method
///
/// `wrapper(receiver, original, args)` decides if and how `original` runs.
pub fn intercept<W>(original: Method, wrapper: W) -> Method
where
    W: Fn(&Instance, &Method, &[Value]) -> CallResult + Send + Sync + 'static,
{
    Arc::new(move |receiver, args| wrapper(receiver, &original, args))
}

/// Wrap a getter
pub fn intercept_getter<W>(original: Getter, wrapper: W) -> Getter
where
    W: Fn(&Instance, &Getter) -> CallResult + Send + Sync + 'static,
{
    Arc::new(move |receiver| wrapper(receiver, &original))
}

/// Wrap a setter
pub fn intercept_setter<W>(original: Setter, wrapper: W) -> Setter
where
    W: Fn(&Instance, &Setter, Value) -> CallResult<()> + Send + Sync + 'static,
{
    Arc::new(move |receiver, value| wrapper(receiver, &original, value))
}

/// A getter/setter pair; either half may be absent
#[derive(Clone, Default)]
pub struct AccessorPair {
    /// Getter
    pub get: Option<Getter>,
    /// Setter
    pub set: Option<Setter>,
}

impl AccessorPair {
    /// Create a pair
    pub fn new(get: Option<Getter>, set: Option<Setter>) -> Self {
        Self { get, set }
    }

    /// Getter only
    pub fn read_only(get: Getter) -> Self {
        Self {
            get: Some(get),
            set: None,
        }
    }
}

impl fmt::Debug for AccessorPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorPair")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

// ============================================================================
// Hook-based wrapper builder
// ============================================================================

type BeforeHook = Arc<dyn Fn(&Instance, &[Value]) -> CallResult<()> + Send + Sync>;
type AfterHook = Arc<dyn Fn(&Instance, Value) -> CallResult + Send + Sync>;
type AroundHook = Arc<dyn Fn(&Instance, &Method, &[Value]) -> CallResult + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&Instance, CallError) -> CallResult + Send + Sync>;

/// Hook type for wrapper functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookType {
    /// Called before the original method with args
    Before,
    /// Called after the original method with its result
    After,
    /// Called instead of the original - receives (original, args)
    Around,
    /// Called if the original (or around hook) fails
    OnError,
}

/// Builder for hook-based method wrappers
///
/// The built method behaves like:
///
/// ```ignore
/// fn wrapper(this, args) {
///     for hook in before_hooks { hook(this, args)?; }
///     let mut result = match around_hook {
///         Some(around) => around(this, original, args),
///         None => original(this, args),
///     };
///     for hook in error_hooks {
///         if let Err(e) = result { result = hook(this, e); }
///     }
///     let mut value = result?;
///     for hook in after_hooks { value = hook(this, value)?; }
///     Ok(value)
/// }
/// ```
pub struct MethodWrapper {
    original: Method,
    before_hooks: Vec<BeforeHook>,
    after_hooks: Vec<AfterHook>,
    around_hook: Option<AroundHook>,
    error_hooks: Vec<ErrorHook>,
}

impl MethodWrapper {
    /// Create a new wrapper around the given method
    pub fn new(original: Method) -> Self {
        Self {
            original,
            before_hooks: Vec::new(),
            after_hooks: Vec::new(),
            around_hook: None,
            error_hooks: Vec::new(),
        }
    }

    /// Add a before hook
    pub fn with_before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> CallResult<()> + Send + Sync + 'static,
    {
        self.before_hooks.push(Arc::new(hook));
        self
    }

    /// Add an after hook; it may transform the result
    pub fn with_after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, Value) -> CallResult + Send + Sync + 'static,
    {
        self.after_hooks.push(Arc::new(hook));
        self
    }

    /// Set the around hook, replacing any previous one
    pub fn with_around<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, &Method, &[Value]) -> CallResult + Send + Sync + 'static,
    {
        self.around_hook = Some(Arc::new(hook));
        self
    }

    /// Add an error hook; it may recover with a value or re-raise
    pub fn with_on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, CallError) -> CallResult + Send + Sync + 'static,
    {
        self.error_hooks.push(Arc::new(hook));
        self
    }

    /// Check if the wrapper has a hook of the given type
    pub fn has_hook(&self, hook_type: HookType) -> bool {
        match hook_type {
            HookType::Before => !self.before_hooks.is_empty(),
            HookType::After => !self.after_hooks.is_empty(),
            HookType::Around => self.around_hook.is_some(),
            HookType::OnError => !self.error_hooks.is_empty(),
        }
    }

    /// Check if this is a pass-through wrapper (no hooks)
    pub fn is_passthrough(&self) -> bool {
        !self.has_hook(HookType::Before)
            && !self.has_hook(HookType::After)
            && !self.has_hook(HookType::Around)
            && !self.has_hook(HookType::OnError)
    }

    /// Build the wrapped method
    ///
    /// A pass-through wrapper returns the original method unchanged.
    pub fn build(self) -> Method {
        if self.is_passthrough() {
            return self.original;
        }

        let MethodWrapper {
            original,
            before_hooks,
            after_hooks,
            around_hook,
            error_hooks,
        } = self;

        intercept(original, move |this, original, args| {
            for hook in &before_hooks {
                hook(this, args)?;
            }

            let mut result = match &around_hook {
                Some(around) => around(this, original, args),
                None => original(this, args),
            };

            for hook in &error_hooks {
                if let Err(e) = result {
                    result = hook(this, e);
                }
            }

            let mut value = result?;
            for hook in &after_hooks {
                value = hook(this, value)?;
            }
            Ok(value)
        })
    }
}

impl fmt::Debug for MethodWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodWrapper")
            .field("before_hooks", &self.before_hooks.len())
            .field("after_hooks", &self.after_hooks.len())
            .field("around_hook", &self.around_hook.is_some())
            .field("error_hooks", &self.error_hooks.len())
            .finish()
    }
}
