//! Interception handlers and the invocation record they receive.

use std::fmt;
use std::sync::Arc;

use crate::meta::Executable;
use crate::value::Value;

/// Type name under which handlers travel as [`Value::Native`].
pub const HANDLER_TYPE: &str = "wirebox.InvocationHandler";

/// A single intercepted call.
///
/// `target` is the wrapped instance for method calls, the factory instance for
/// instance factories, and [`Value::Null`] for constructors and static factories.
#[derive(Clone)]
pub struct Invocation {
    target: Value,
    executable: Arc<Executable>,
    args: Vec<Value>,
}

impl Invocation {
    /// Record a call.
    pub fn new(target: Value, executable: Arc<Executable>, args: Vec<Value>) -> Self {
        Self {
            target,
            executable,
            args,
        }
    }

    /// The receiver of the call.
    pub fn target(&self) -> &Value {
        &self.target
    }

    /// The executable being called.
    pub fn executable(&self) -> &Arc<Executable> {
        &self.executable
    }

    /// Shorthand for the executable name; `new` for constructors.
    pub fn method_name(&self) -> &str {
        self.executable.name()
    }

    /// The call arguments, already converted to the parameter types.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Run the original executable with the original arguments.
    pub fn proceed(&self) -> anyhow::Result<Value> {
        self.executable.invoke(&self.target, &self.args)
    }

    /// Run the original executable with replacement arguments.
    pub fn proceed_with(&self, args: &[Value]) -> anyhow::Result<Value> {
        self.executable.invoke(&self.target, args)
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("executable", &self.executable.signature())
            .field("target", &self.target)
            .field("args", &self.args)
            .finish()
    }
}

/// Receives intercepted calls.
///
/// Whatever the handler returns, value or error, is what the caller of the
/// intercepted method sees.
///
/// # Examples
///
/// ```rust,no_run
/// use wirebox::aspect::{Invocation, InvocationHandler};
/// use wirebox::value::Value;
///
/// let upper = |call: &Invocation| -> anyhow::Result<Value> {
///     let result = call.proceed()?;
///     Ok(Value::from(result.as_str().unwrap_or_default().to_uppercase()))
/// };
/// # fn takes(_: impl InvocationHandler) {}
/// takes(upper);
/// ```
pub trait InvocationHandler: Send + Sync {
    /// Handle one call.
    fn invoke(&self, invocation: &Invocation) -> anyhow::Result<Value>;
}

impl<F> InvocationHandler for F
where
    F: Fn(&Invocation) -> anyhow::Result<Value> + Send + Sync,
{
    fn invoke(&self, invocation: &Invocation) -> anyhow::Result<Value> {
        self(invocation)
    }
}

/// Handler that forwards every call unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl InvocationHandler for Passthrough {
    fn invoke(&self, invocation: &Invocation) -> anyhow::Result<Value> {
        invocation.proceed()
    }
}

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn InvocationHandler>;

/// Package a handler as a value, e.g. to return it from a constructor.
pub fn handler_value(handler: impl InvocationHandler + 'static) -> Value {
    let shared: HandlerRef = Arc::new(handler);
    Value::native(HANDLER_TYPE, shared)
}

/// Recover a handler from a value produced by [`handler_value`], or from an
/// object whose payload is a [`HandlerRef`].
pub fn handler_from_value(value: &Value) -> Option<HandlerRef> {
    match value {
        Value::Native(native) => native.downcast_ref::<HandlerRef>().cloned(),
        Value::Object(object) => object.payload::<HandlerRef>().cloned(),
        _ => None,
    }
}
