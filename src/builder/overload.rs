//! Executable overload resolution.
//!
//! Given the executables sharing a name and the argument values collected for a
//! call, pick the most specific candidate:
//!
//! 1. Reject candidates with fewer parameters than supplied values, or whose
//!    parameter types cannot accept the values.
//! 2. Rank the rest by total specificity distance, then by parameter count, then
//!    by declaration order.
//!
//! Strings that parse as the scalar a parameter asks for are accepted at
//! [`CONVERSION_COST`] per argument, so a real match always wins over a parse.

use std::sync::Arc;

use tracing::trace;

use crate::core::WireError;
use crate::meta::{Executable, TypeRef, TypeRegistry};
use crate::value::Value;

/// Distance charged for accepting a string that must be parsed into a scalar.
pub const CONVERSION_COST: u32 = 10;

/// How many trailing parameters a call may leave unfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// The argument count must equal the parameter count.
    Exact,
    /// Missing trailing arguments are filled with `null`.
    AllowTrailing,
}

/// Pick the best candidate for `args`, or `None` when nothing fits.
pub fn select(
    types: &TypeRegistry,
    candidates: &[Arc<Executable>],
    args: &[Value],
    arity: Arity,
) -> Option<Arc<Executable>> {
    candidates
        .iter()
        .enumerate()
        .filter_map(|(position, candidate)| {
            score(types, candidate, args, arity)
                .map(|cost| (cost, candidate.params().len(), position, candidate))
        })
        .min_by_key(|(cost, params, position, _)| (*cost, *params, *position))
        .map(|(cost, _, _, candidate)| {
            trace!("Selected {} at cost {}", candidate.signature(), cost);
            Arc::clone(candidate)
        })
}

/// Total specificity distance of calling `candidate` with `args`.
fn score(
    types: &TypeRegistry,
    candidate: &Executable,
    args: &[Value],
    arity: Arity,
) -> Option<u32> {
    let params = candidate.params();
    if params.len() < args.len() {
        return None;
    }
    if arity == Arity::Exact && params.len() != args.len() {
        return None;
    }

    let mut total = 0u32;
    for (index, param) in params.iter().enumerate() {
        let cost = match args.get(index) {
            Some(arg) => argument_cost(types, arg, param)?,
            None => types.value_distance(&Value::Null, param)?,
        };
        total = total.saturating_add(cost);
    }
    Some(total)
}

fn argument_cost(types: &TypeRegistry, arg: &Value, param: &TypeRef) -> Option<u32> {
    types
        .value_distance(arg, param)
        .or_else(|| arg.converts_to(param).then_some(CONVERSION_COST))
}

/// Pad `args` with `null` up to the parameter count and convert literals to the
/// declared parameter types.
///
/// # Errors
///
/// Returns [`WireError::TypeMismatch`] when a converted value is still not
/// assignable to its parameter.
pub fn prepare_args(
    types: &TypeRegistry,
    executable: &Executable,
    args: Vec<Value>,
) -> Result<Vec<Value>, WireError> {
    let mut args = args;
    args.resize(executable.params().len(), Value::Null);
    args.into_iter()
        .zip(executable.params())
        .map(|(arg, param)| {
            let converted = arg.coerce_to(param)?;
            match types.value_distance(&converted, param) {
                Some(_) => Ok(converted),
                None => Err(WireError::TypeMismatch {
                    expected: param.to_string(),
                    actual: converted.type_name().to_string(),
                }),
            }
        })
        .collect()
}

/// Comma separated runtime types of `args`, for error messages.
pub fn describe_args(args: &[Value]) -> String {
    args.iter().map(Value::type_name).collect::<Vec<_>>().join(",")
}

/// Build the error reported when [`select`] finds nothing.
pub fn no_match(type_name: &str, name: &str, args: &[Value]) -> WireError {
    WireError::NoMatchingExecutable {
        type_name: type_name.to_string(),
        name: name.to_string(),
        args: describe_args(args),
    }
}
