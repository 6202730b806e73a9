//! Create: invoke the build executable.

use std::sync::Arc;

use anyhow::anyhow;
use tracing::debug;

use crate::aspect::Invocation;
use crate::builder::overload::{self, Arity};
use crate::builder::{Builder, FactoryOwner};
use crate::context::Context;
use crate::core::error_builders::construction_failed;
use crate::core::Result;
use crate::element::{ExecutableRef, ResolveScope};
use crate::meta::{Executable, TypeRegistry};
use crate::procedure::compound;
use crate::procedure::element::ParameterGroup;
use crate::value::Value;

/// The arguments of a group, `None` marking positions nobody declared.
pub(crate) fn resolve_group(
    group: Option<&ParameterGroup>,
    scope: &ResolveScope<'_>,
    explicit: Option<&Executable>,
) -> Result<Vec<Option<Value>>> {
    let Some(group) = group else {
        return Ok(Vec::new());
    };
    group
        .slots()
        .iter()
        .enumerate()
        .map(|(index, slot)| match slot {
            Some(element) => {
                let expected = explicit.and_then(|e| e.params().get(index));
                element.resolve(scope, expected).map(Some)
            }
            None => Ok(None),
        })
        .collect()
}

/// Choose among `candidates` for the resolved arguments and fill the gaps.
///
/// Gaps are `null` while choosing; with `auto_wire` they are then resolved by
/// the chosen parameter types.
pub(crate) fn choose(
    context: &Context,
    candidates: &[Arc<Executable>],
    resolved: Vec<Option<Value>>,
    auto_wire: bool,
    owner: &str,
    name: &str,
) -> Result<(Arc<Executable>, Vec<Value>)> {
    let types = context.types();
    let gaps: Vec<usize> =
        resolved.iter().enumerate().filter(|(_, v)| v.is_none()).map(|(i, _)| i).collect();
    let mut args: Vec<Value> = resolved.into_iter().map(Option::unwrap_or_default).collect();

    let executable = overload::select(types, candidates, &args, Arity::AllowTrailing)
        .ok_or_else(|| overload::no_match(owner, name, &args))?;

    if auto_wire {
        let supplied = args.len();
        let declared = executable.params().len();
        args.resize(declared, Value::Null);
        for position in gaps.into_iter().chain(supplied..declared) {
            if !args[position].is_null() {
                continue;
            }
            if let Some(value) = compound::resolve(context, &executable.params()[position])? {
                args[position] = value;
            }
        }
    }

    let args = overload::prepare_args(types, &executable, args)?;
    Ok((executable, args))
}

/// Where the build executable comes from, and what it is called on.
fn candidates(
    context: &Context,
    builder: &Builder,
    types: &TypeRegistry,
) -> Result<(Vec<Arc<Executable>>, Value, String)> {
    if let Some(executable) = builder.executable() {
        let receiver = match builder.factory() {
            Some(factory) => factory_receiver(context, &factory.owner)?,
            None => Value::Null,
        };
        let owner = executable.declaring_type().to_string();
        return Ok((vec![Arc::clone(executable)], receiver, owner));
    }

    match builder.factory() {
        None => {
            let type_name = builder.type_name();
            types.require(type_name)?;
            Ok((types.constructors(type_name), Value::Null, type_name.to_string()))
        }
        Some(factory) => match &factory.owner {
            FactoryOwner::Type(owner) => {
                types.require(owner)?;
                let statics = types
                    .methods_named(owner, &factory.method)
                    .into_iter()
                    .filter(|m| m.is_static())
                    .collect();
                Ok((statics, Value::Null, owner.clone()))
            }
            FactoryOwner::Builder(name) => {
                let receiver = context.build(name)?;
                let owner = receiver.type_name().to_string();
                Ok((types.methods_named(&owner, &factory.method), receiver, owner))
            }
        },
    }
}

fn factory_receiver(context: &Context, owner: &FactoryOwner) -> Result<Value> {
    match owner {
        FactoryOwner::Type(_) => Ok(Value::Null),
        FactoryOwner::Builder(name) => context.build(name),
    }
}

/// Construct the provisional instance of `builder`.
///
/// # Errors
///
/// Returns [`NoMatchingExecutable`](crate::core::WireError::NoMatchingExecutable)
/// when no executable accepts the arguments, and
/// [`ConstructionFailed`](crate::core::WireError::ConstructionFailed) when the
/// executable or its interception handler fails or produces `null`.
pub fn create(
    context: &Context,
    builder: &Builder,
    group: Option<&ParameterGroup>,
    scope: &ResolveScope<'_>,
) -> Result<Value> {
    let types = context.types();
    let (candidates, receiver, owner) = candidates(context, builder, types)?;

    let explicit = group.and_then(|g| match g.executable() {
        ExecutableRef::Explicit(executable) => Some(Arc::clone(executable)),
        _ => None,
    });
    let explicit = explicit.or_else(|| builder.executable().cloned());
    let resolved = resolve_group(group, scope, explicit.as_deref())?;

    let candidates = match explicit {
        Some(executable) => vec![executable],
        None => candidates,
    };
    let (executable, args) = choose(
        context,
        &candidates,
        resolved,
        builder.auto_wire_executable(),
        &owner,
        builder.build_executable_name(),
    )?;

    let instance = match builder.pointcut_for(&executable) {
        Some(pointcut) => {
            debug!("Constructing '{}' through handler '{}'", builder.name(), pointcut);
            let handler = pointcut.handler(context);
            handler.invoke(&Invocation::new(receiver, Arc::clone(&executable), args))
        }
        None => executable.invoke(&receiver, &args),
    }
    .map_err(|e| construction_failed(builder.name(), executable.signature(), e))?;

    if instance.is_null() {
        return Err(construction_failed(
            builder.name(),
            executable.signature(),
            anyhow!("executable produced null"),
        ));
    }
    debug!("Created '{}' via {}", builder.name(), executable.signature());
    Ok(instance)
}
