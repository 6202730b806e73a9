//! Populate: fields, auto-wiring, method injection and the init method.
//!
//! Failures of individual fields and injections do not stop the stage; they are
//! collected and reported together as [`WireError::FieldPopulation`]. The init
//! method only runs when everything else succeeded.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::builder::Builder;
use crate::context::Context;
use crate::core::error_builders::construction_failed;
use crate::core::{FieldFailure, Result, WireError};
use crate::element::{Element, ExecutableRef, ResolveScope};
use crate::procedure::compound;
use crate::procedure::create::{choose, resolve_group};
use crate::procedure::element::{Installed, ParameterGroup};
use crate::proxy;
use crate::value::Value;

/// Populate `instance`, the unwrapped product of Create.
///
/// # Errors
///
/// Returns [`WireError::FieldPopulation`] listing every failed field and
/// injection, or [`WireError::ConstructionFailed`] when the init method fails.
pub fn populate(
    context: &Context,
    builder: &Builder,
    instance: &Value,
    installed: &Installed,
    scope: &ResolveScope<'_>,
) -> Result<()> {
    let type_name = instance.type_name().to_string();
    let mut failures = Vec::new();

    for element in &installed.fields {
        let Some(field) = element.field_name() else {
            continue;
        };
        if let Err(error) = assign_field(context, scope, instance, &type_name, field, element) {
            failures.push(FieldFailure {
                field: field.to_string(),
                error: Box::new(error),
            });
        }
    }

    if builder.auto_wire_fields() {
        auto_wire_fields(context, builder, instance, &type_name, &mut failures);
    }

    for group in &installed.injections {
        if let Err(error) = inject(context, builder, instance, &type_name, group, scope) {
            failures.push(FieldFailure {
                field: format!("{}()", group.executable().name(builder.build_executable_name())),
                error: Box::new(error),
            });
        }
    }

    if !failures.is_empty() {
        return Err(WireError::FieldPopulation {
            builder: builder.name().to_string(),
            failures,
        });
    }

    if let Some(init) = builder.init_method() {
        debug!("Running init method {}.{}() of '{}'", type_name, init, builder.name());
        proxy::dispatch(context.types(), instance, init, &[])
            .map_err(|e| construction_failed(builder.name(), format!("{type_name}.{init}()"), e))?;
    }
    Ok(())
}

fn assign_field(
    context: &Context,
    scope: &ResolveScope<'_>,
    instance: &Value,
    type_name: &str,
    field: &str,
    element: &Element,
) -> Result<()> {
    let descriptor =
        context.types().field(type_name, field).ok_or_else(|| WireError::UnknownField {
            type_name: type_name.to_string(),
            field: field.to_string(),
        })?;
    let field_type = descriptor.field_type.clone();

    let value = element.resolve(scope, Some(&field_type))?;
    if value.is_null() {
        trace!("Field '{}' of '{}' resolved to null, left unset", field, scope.owner);
        return Ok(());
    }
    set_field(context, instance, field, &field_type, value)
}

fn set_field(
    context: &Context,
    instance: &Value,
    field: &str,
    field_type: &crate::meta::TypeRef,
    value: Value,
) -> Result<()> {
    if context.types().value_distance(&value, field_type).is_none() {
        return Err(WireError::TypeMismatch {
            expected: field_type.to_string(),
            actual: value.type_name().to_string(),
        });
    }
    let assigned = instance.as_object().is_some_and(|object| object.set_field(field, value));
    if !assigned {
        return Err(WireError::TypeMismatch {
            expected: "object instance".to_string(),
            actual: instance.type_name().to_string(),
        });
    }
    Ok(())
}

fn auto_wire_fields(
    context: &Context,
    builder: &Builder,
    instance: &Value,
    type_name: &str,
    failures: &mut Vec<FieldFailure>,
) {
    for descriptor in context.types().fields(type_name) {
        let declared = builder.field(&descriptor.name).is_some();
        let already_set = instance.field(&descriptor.name).is_some_and(|v| !v.is_null());
        if declared || already_set || descriptor.field_type.is_scalar() {
            continue;
        }

        let outcome = compound::resolve(context, &descriptor.field_type).and_then(|found| {
            match found {
                Some(value) => {
                    trace!("Auto-wired field '{}' of '{}'", descriptor.name, builder.name());
                    set_field(context, instance, &descriptor.name, &descriptor.field_type, value)
                }
                None => Ok(()),
            }
        });
        if let Err(error) = outcome {
            failures.push(FieldFailure {
                field: descriptor.name.clone(),
                error: Box::new(error),
            });
        }
    }
}

fn inject(
    context: &Context,
    builder: &Builder,
    instance: &Value,
    type_name: &str,
    group: &ParameterGroup,
    scope: &ResolveScope<'_>,
) -> Result<()> {
    let name = group.executable().name(builder.build_executable_name()).to_string();
    let explicit = match group.executable() {
        ExecutableRef::Explicit(executable) => Some(Arc::clone(executable)),
        _ => None,
    };

    let resolved = resolve_group(Some(group), scope, explicit.as_deref())?;
    let candidates = match explicit {
        Some(executable) => vec![executable],
        None => context.types().methods_named(type_name, &name),
    };
    let (executable, args) = choose(
        context,
        &candidates,
        resolved,
        builder.auto_wire_executable(),
        type_name,
        &name,
    )?;

    trace!("Injecting {} into '{}'", executable.signature(), builder.name());
    proxy::call(instance, &executable, args).map_err(|source| WireError::InvocationFailed {
        executable: executable.signature().to_string(),
        source,
    })?;
    Ok(())
}
