//! Compound resolution: values found by type rather than by name.
//!
//! Used when an element names a type instead of a builder, when an element
//! produced nothing but knows its destination type, and for auto-wiring.
//!
//! | type            | result                                                   |
//! |-----------------|----------------------------------------------------------|
//! | `list<T>`, `set<T>`, `T[]` | every builder assignable to `T`, best first   |
//! | `map<string,T>` | builder name to instance, for every builder assignable to `T` |
//! | class type      | the best builder for the type, else a fresh instance     |
//! | scalar, `object`| nothing                                                  |

use tracing::trace;

use crate::context::Context;
use crate::core::Result;
use crate::meta::type_ref::{self, TypeRef};
use crate::value::Value;

/// Find a value for `ty`, or `None` when the type cannot be satisfied.
///
/// # Errors
///
/// Propagates failures of the builds it triggers.
pub fn resolve(context: &Context, ty: &TypeRef) -> Result<Option<Value>> {
    match ty {
        TypeRef::List(element) | TypeRef::Set(element) | TypeRef::Array(element) => {
            let values = collect(context, element)?;
            if values.is_empty() {
                return Ok(None);
            }
            Ok(Some(match ty {
                TypeRef::Set(_) => Value::set_of(values),
                TypeRef::Array(_) => Value::Array(values),
                _ => Value::List(values),
            }))
        }
        TypeRef::Map(key, value) => {
            if key.as_named() != Some(type_ref::STRING) {
                return Ok(None);
            }
            let mut entries = Vec::new();
            for builder in context.builders_for_type(value) {
                let instance = context.build(builder.name())?;
                entries.push((Value::from(builder.name()), instance));
            }
            Ok((!entries.is_empty()).then(|| Value::map_of(entries)))
        }
        TypeRef::Named(name) => {
            if type_ref::is_scalar(name) || name == type_ref::OBJECT || name == type_ref::VOID {
                return Ok(None);
            }
            if let Some(value) = context.try_build_type(ty)? {
                return Ok(Some(value));
            }
            if context.types().constructors(name).is_empty() {
                trace!("No builder or constructor for '{}'", name);
                return Ok(None);
            }
            context.instantiate(name).map(Some)
        }
    }
}

fn collect(context: &Context, element: &TypeRef) -> Result<Vec<Value>> {
    context
        .builders_for_type(element)
        .iter()
        .map(|builder| context.build(builder.name()))
        .collect()
}
