//! Intercepting proxies and method dispatch.
//!
//! Rust cannot subclass a type at runtime, so interception is a capability
//! injected into the [`Context`](crate::context::Context): a [`ProxyFactory`]
//! receives a target and an [`Interception`] table and returns a value that
//! stands in for the target. The contract is the only thing that matters:
//! matched calls route through the bound handler, everything else reaches the
//! target unchanged.
//!
//! Calls are made through [`dispatch`], which selects the overload from the
//! receiver's type and consults the proxy table when the receiver is a proxy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::aspect::{HandlerRef, Invocation};
use crate::builder::overload::{self, Arity};
use crate::core::WireError;
use crate::meta::{Executable, TypeRegistry};
use crate::value::{Object, Value};

/// Handlers bound to the methods of one instance.
#[derive(Clone, Default)]
pub struct Interception {
    by_signature: HashMap<String, HandlerRef>,
    whole_type: Option<HandlerRef>,
}

impl Interception {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route calls of the executable with `signature` through `handler`.
    pub fn bind(&mut self, signature: impl Into<String>, handler: HandlerRef) {
        self.by_signature.insert(signature.into(), handler);
    }

    /// Route every call without a specific binding through `handler`.
    pub fn bind_whole_type(&mut self, handler: HandlerRef) {
        self.whole_type = Some(handler);
    }

    /// The handler responsible for `executable`, if any.
    pub fn handler_for(&self, executable: &Executable) -> Option<&HandlerRef> {
        self.by_signature.get(executable.signature()).or(self.whole_type.as_ref())
    }

    /// Whether no call is intercepted.
    pub fn is_empty(&self) -> bool {
        self.by_signature.is_empty() && self.whole_type.is_none()
    }

    /// Signatures with a specific binding.
    pub fn signatures(&self) -> impl Iterator<Item = &str> {
        self.by_signature.keys().map(String::as_str)
    }
}

impl fmt::Debug for Interception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut signatures: Vec<&str> = self.signatures().collect();
        signatures.sort_unstable();
        f.debug_struct("Interception")
            .field("by_signature", &signatures)
            .field("whole_type", &self.whole_type.is_some())
            .finish()
    }
}

/// Produces stand-ins that route calls through interception handlers.
pub trait ProxyFactory: Send + Sync {
    /// Wrap `target`.
    ///
    /// # Errors
    ///
    /// Implementations fail when they cannot represent the target.
    fn make_intercepted(
        &self,
        target: Value,
        interception: Interception,
    ) -> Result<Value, WireError>;
}

/// The default factory: a proxy [`Object`] that delegates to its target.
///
/// The proxy reports the target's type, shares its fields and is recognised by
/// [`dispatch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DelegatingProxyFactory;

impl ProxyFactory for DelegatingProxyFactory {
    fn make_intercepted(
        &self,
        target: Value,
        interception: Interception,
    ) -> Result<Value, WireError> {
        match target {
            Value::Object(_) => Ok(Value::Object(Object::new_proxy(target, interception))),
            other => Err(WireError::TypeMismatch {
                expected: "object instance".to_string(),
                actual: other.type_name().to_string(),
            }),
        }
    }
}

/// Call `method` on `receiver`.
///
/// The overload is chosen among the methods visible on the receiver's type with
/// an exact argument count. Proxies route matched calls through their handler;
/// the handler's result, including its error, is returned as is.
///
/// # Errors
///
/// Returns [`WireError::NoMatchingExecutable`] (as `anyhow::Error`) when no
/// overload fits, and whatever the executable or handler returns otherwise.
pub fn dispatch(
    types: &TypeRegistry,
    receiver: &Value,
    method: &str,
    args: &[Value],
) -> anyhow::Result<Value> {
    let type_name = receiver.type_name();
    let candidates = types.methods_named(type_name, method);
    let executable = overload::select(types, &candidates, args, Arity::Exact)
        .ok_or_else(|| overload::no_match(type_name, method, args))?;
    let args = overload::prepare_args(types, &executable, args.to_vec())?;
    call(receiver, &executable, args)
}

/// Call a known executable on `receiver`, honouring proxy interception.
pub fn call(
    receiver: &Value,
    executable: &Arc<Executable>,
    args: Vec<Value>,
) -> anyhow::Result<Value> {
    if let Value::Object(object) = receiver {
        if let (Some(interception), Some(target)) = (object.interception(), object.proxy_target()) {
            if let Some(handler) = interception.handler_for(executable) {
                trace!("Intercepted {}", executable.signature());
                let invocation = Invocation::new(target.clone(), Arc::clone(executable), args);
                return handler.invoke(&invocation);
            }
            return executable.invoke(target, &args);
        }
    }
    executable.invoke(receiver, &args)
}
