use std::sync::Arc;

use tracing::trace;

use crate::context::Context;
use crate::core::{Result, WireError};
use crate::element::{Element, ElementSource};
use crate::meta::TypeRef;
use crate::procedure::compound;
use crate::value::Value;

/// What an element is resolved for.
#[derive(Clone, Copy)]
pub struct ResolveScope<'a> {
    /// The context that builds references.
    pub context: &'a Context,
    /// Name of the owning builder, for error messages.
    pub owner: &'a str,
    /// Whether results may be memoized on the element. Only singleton owners
    /// memoize; prototype elements resolve on every build.
    pub memoize: bool,
}

impl<'a> ResolveScope<'a> {
    /// Scope for elements of the named builder.
    pub fn new(context: &'a Context, owner: &'a str, memoize: bool) -> Self {
        Self {
            context,
            owner,
            memoize,
        }
    }
}

impl Element {
    /// Resolve this element to a value.
    ///
    /// `expected` is the type of the destination when known (a field type or an
    /// already selected parameter type); the declared type takes precedence.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::ElementUnresolved`] when a required element produces
    /// no value, and propagates build and conversion failures.
    pub fn resolve(&self, scope: &ResolveScope<'_>, expected: Option<&TypeRef>) -> Result<Value> {
        if scope.memoize {
            if let Some(value) = self.resolved() {
                return Ok(value.clone());
            }
        }

        let target = self.declared_type().or(expected);
        let mut value = self.resolve_source(scope, target)?;

        if value.is_null() {
            let fallback = match self.source() {
                ElementSource::TypeReference(ty) => Some(ty),
                ElementSource::Empty => target,
                _ => None,
            };
            if let Some(ty) = fallback {
                if let Some(found) = compound::resolve(scope.context, ty)? {
                    value = found;
                }
            }
        }

        if value.is_null() && self.is_required() {
            return Err(WireError::ElementUnresolved {
                builder: scope.owner.to_string(),
                element: self.slot().to_string(),
            });
        }

        trace!("Resolved {} of '{}' to {:?}", self.slot(), scope.owner, value);
        if scope.memoize {
            let _ = self.resolved.set(value.clone());
        }
        Ok(value)
    }

    fn resolve_source(&self, scope: &ResolveScope<'_>, target: Option<&TypeRef>) -> Result<Value> {
        let context = scope.context;
        match self.source() {
            ElementSource::Empty | ElementSource::TypeReference(_) => Ok(Value::Null),
            ElementSource::Literal(literal) => {
                let value = match literal {
                    Value::Str(text) => Value::Str(context.substitute(text)),
                    other => other.clone(),
                };
                match target {
                    Some(ty) => value.coerce_to(ty),
                    None => Ok(value),
                }
            }
            ElementSource::Reference(name) => context.build(name),
            ElementSource::Inner(builder) => context.build_inner(builder),
            ElementSource::List(items) => {
                let member = target.and_then(TypeRef::element_type);
                Ok(Value::List(resolve_all(items, scope, member)?))
            }
            ElementSource::Set(items) => {
                let member = target.and_then(TypeRef::element_type);
                Ok(Value::set_of(resolve_all(items, scope, member)?))
            }
            ElementSource::Array(items) => {
                let member = target.and_then(TypeRef::element_type);
                Ok(Value::Array(resolve_all(items, scope, member)?))
            }
            ElementSource::Map(entries) => {
                let (key_type, value_type) = match target {
                    Some(TypeRef::Map(key, value)) => (Some(key.as_ref()), Some(value.as_ref())),
                    _ => (None, None),
                };
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    pairs.push((key.resolve(scope, key_type)?, value.resolve(scope, value_type)?));
                }
                Ok(Value::map_of(pairs))
            }
        }
    }
}

fn resolve_all(
    items: &[Arc<Element>],
    scope: &ResolveScope<'_>,
    member: Option<&TypeRef>,
) -> Result<Vec<Value>> {
    items.iter().map(|item| item.resolve(scope, member)).collect()
}
