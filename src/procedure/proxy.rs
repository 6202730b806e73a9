//! Proxy: wrap an intercepted product before it becomes visible.

use tracing::debug;

use crate::aspect::PointCut;
use crate::builder::Builder;
use crate::context::Context;
use crate::core::Result;
use crate::proxy::Interception;
use crate::value::Value;

/// Collect the live handlers for the method bindings of `builder`.
///
/// Constructor and static factory bindings are consumed by Create and are not
/// part of the table. A pointcut whose handler is the product of `builder`
/// itself is skipped for that builder.
pub fn interception_for(context: &Context, builder: &Builder) -> Interception {
    let mut interception = Interception::new();
    for (signature, interceptor) in builder.interceptions() {
        let executable = &interceptor.executable;
        if executable.is_constructor()
            || executable.is_static()
            || handled_by(context, &interceptor.pointcut, builder)
        {
            continue;
        }
        interception.bind(signature.clone(), interceptor.pointcut.handler(context));
    }
    if let Some(pointcut) = builder.whole_type() {
        if !handled_by(context, pointcut, builder) {
            interception.bind_whole_type(pointcut.handler(context));
        }
    }
    interception
}

fn handled_by(context: &Context, pointcut: &PointCut, builder: &Builder) -> bool {
    match pointcut.handler_builder() {
        Some(name) if !builder.name().is_empty() => context
            .canonical_name(name)
            .is_ok_and(|canonical| canonical == builder.name()),
        _ => false,
    }
}

/// Wrap `instance` when `builder` has method interceptions, else return it.
///
/// # Errors
///
/// Propagates the failure of the context's proxy factory.
pub fn wrap(context: &Context, builder: &Builder, instance: Value) -> Result<Value> {
    if !builder.is_intercepted() {
        return Ok(instance);
    }
    let interception = interception_for(context, builder);
    if interception.is_empty() {
        return Ok(instance);
    }
    debug!("Wrapping '{}' in an intercepting proxy", builder.name());
    context.proxy_factory().make_intercepted(instance, interception)
}
