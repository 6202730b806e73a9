//! The build pipeline.
//!
//! Every build of a builder runs the same ordered stages:
//!
//! 1. **Install** arranges the elements into the build call, method injections
//!    and field assignments ([`element`]).
//! 2. **Create** invokes the build executable ([`create`]).
//! 3. **Proxy** wraps the product when methods are intercepted ([`proxy`]).
//! 4. **Publish** hands the final (possibly proxied) instance to the caller,
//!    which for singletons makes it visible to cyclic references.
//! 5. **Populate** assigns fields, runs injections and the init method on the
//!    unwrapped instance, so interception only applies once the build returns
//!    ([`populate`]).
//!
//! [`compound`] resolution is shared by the stages that look values up by type.
//!
//! The stages are tracked by [`Phase`], which only ever moves one step forward.

pub mod compound;
pub mod create;
pub mod element;
pub mod populate;
pub mod proxy;

use std::fmt;

use tracing::trace;

use crate::builder::Builder;
use crate::context::Context;
use crate::core::{Result, WireError};
use crate::element::ResolveScope;
use crate::value::Value;

/// Progress of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Pending,
    Installed,
    Created,
    Proxied,
    Published,
    Populated,
    Done,
}

impl Phase {
    /// The phase that follows this one, `None` after [`Phase::Done`].
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Pending => Some(Phase::Installed),
            Phase::Installed => Some(Phase::Created),
            Phase::Created => Some(Phase::Proxied),
            Phase::Proxied => Some(Phase::Published),
            Phase::Published => Some(Phase::Populated),
            Phase::Populated => Some(Phase::Done),
            Phase::Done => None,
        }
    }

    /// Move to `to`, which must be the immediate successor.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming both phases otherwise.
    pub fn advance(&mut self, to: Phase) -> Result<()> {
        if self.next() != Some(to) {
            return Err(WireError::config(format!(
                "Build cannot move from phase {self} to {to}"
            )));
        }
        *self = to;
        Ok(())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pending => "pending",
            Phase::Installed => "installed",
            Phase::Created => "created",
            Phase::Proxied => "proxied",
            Phase::Published => "published",
            Phase::Populated => "populated",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Run every stage for `builder`.
///
/// `publish` receives the instance the build returns (already proxied) before
/// population starts. Population itself works on the created instance.
///
/// # Errors
///
/// Propagates the first failing stage.
pub fn run(
    context: &Context,
    builder: &Builder,
    publish: &mut dyn FnMut(&Value),
) -> Result<Value> {
    let mut phase = Phase::Pending;
    let scope = ResolveScope::new(context, builder.name(), builder.is_singleton());

    let installed = element::install(builder)?;
    phase.advance(Phase::Installed)?;

    let created = create::create(context, builder, installed.create.as_ref(), &scope)?;
    phase.advance(Phase::Created)?;

    let instance = proxy::wrap(context, builder, created.clone())?;
    phase.advance(Phase::Proxied)?;

    publish(&instance);
    phase.advance(Phase::Published)?;

    populate::populate(context, builder, &created, &installed, &scope)?;
    phase.advance(Phase::Populated)?;

    phase.advance(Phase::Done)?;
    trace!("Build of '{}' reached phase {}", builder.name(), phase);
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;
    use crate::meta::{ClassDescriptor, TypeRegistry};
    use crate::value::Object;

    #[test]
    fn test_phase_only_moves_one_step() {
        let mut phase = Phase::Pending;
        phase.advance(Phase::Installed).unwrap();
        assert!(phase.advance(Phase::Proxied).is_err());
        assert_eq!(phase, Phase::Installed);
        assert!(phase.advance(Phase::Pending).is_err());
        assert_eq!(Phase::Done.next(), None);
    }

    #[test]
    fn test_run_publishes_before_populate() {
        let mut types = TypeRegistry::new();
        types
            .register(
                ClassDescriptor::builder("demo.Greeter")
                    .field("message", "string")
                    .constructor(&[], |_| Ok(Object::new("demo.Greeter").into()))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let context = Context::new(types);
        let builder =
            Builder::new("greeter", "demo.Greeter").with_field("message", Element::literal("hi"));

        let mut seen = None;
        let instance = run(&context, &builder, &mut |provisional: &Value| {
            seen = Some((provisional.clone(), provisional.field("message")));
        })
        .unwrap();

        let (published, message_at_publish) = seen.unwrap();
        assert!(published.same_instance(&instance));
        assert_eq!(message_at_publish, None);
        assert_eq!(instance.field("message"), Some(Value::from("hi")));
    }
}
