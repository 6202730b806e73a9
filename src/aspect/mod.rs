//! Aspect-oriented interception.
//!
//! An [`AspectProcessor`] holds an ordered list of [`PointCut`]s. When a builder
//! is registered, the processor walks the executables the builder can reach
//! (constructors and methods of its type, plus a static factory method) and
//! binds each to the first pointcut that matches it. A whole-type pointcut binds
//! every call on the product.
//!
//! The bindings are turned into live handlers during a build: the Create stage
//! calls constructor and factory handlers, and the Proxy stage wraps the product
//! so that method calls reach theirs.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wirebox::aspect::{AspectProcessor, Invocation, PointCut};
//! use wirebox::value::Value;
//!
//! let shout = PointCut::parse("public string demo.Greeter.greet()")?
//!     .with_handler(Arc::new(|call: &Invocation| -> anyhow::Result<Value> {
//!         let text = call.proceed()?;
//!         Ok(Value::from(text.as_str().unwrap_or_default().to_uppercase()))
//!     }));
//! let aspects = AspectProcessor::new().with_pointcut(shout);
//! assert_eq!(aspects.pointcuts().len(), 1);
//! # Ok::<(), wirebox::core::WireError>(())
//! ```

pub mod handler;
pub mod pointcut;

pub use handler::{
    HANDLER_TYPE, HandlerRef, Invocation, InvocationHandler, Passthrough, handler_from_value,
    handler_value,
};
pub use pointcut::PointCut;

use std::sync::Arc;
use tracing::debug;

use crate::builder::{Builder, FactoryOwner};
use crate::core::Result;
use crate::meta::TypeRegistry;

/// Adjusts builders before they are registered.
pub trait BuilderProcessor: Send + Sync {
    /// Inspect or modify `builder`.
    ///
    /// # Errors
    ///
    /// A failure aborts the registration.
    fn process(&self, builder: &mut Builder, types: &TypeRegistry) -> Result<()>;
}

/// Binds pointcuts to the executables of registered builders.
#[derive(Debug, Default)]
pub struct AspectProcessor {
    pointcuts: Vec<Arc<PointCut>>,
}

impl AspectProcessor {
    /// A processor without pointcuts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pointcut. Earlier pointcuts win.
    pub fn with_pointcut(mut self, pointcut: PointCut) -> Self {
        self.add(pointcut);
        self
    }

    /// Append a pointcut. Earlier pointcuts win.
    pub fn add(&mut self, pointcut: PointCut) {
        self.pointcuts.push(Arc::new(pointcut));
    }

    /// The pointcuts in priority order.
    pub fn pointcuts(&self) -> &[Arc<PointCut>] {
        &self.pointcuts
    }
}

impl BuilderProcessor for AspectProcessor {
    fn process(&self, builder: &mut Builder, types: &TypeRegistry) -> Result<()> {
        let type_name = builder.type_name().to_string();

        if let Some(pointcut) = self.pointcuts.iter().find(|p| p.matches_type(&type_name)) {
            if builder.intercept_whole_type(Arc::clone(pointcut)) {
                debug!("Builder '{}' intercepted as a whole by '{}'", builder.name(), pointcut);
            }
        }

        let mut executables = types.constructors(&type_name);
        executables.extend(types.methods(&type_name));
        if let Some(factory) = builder.factory() {
            if let FactoryOwner::Type(owner) = &factory.owner {
                executables.extend(types.methods_named(owner, &factory.method));
            }
        }

        for executable in executables {
            let matched = self
                .pointcuts
                .iter()
                .find(|pointcut| pointcut.matches(&executable, &type_name));
            if let Some(pointcut) = matched {
                let signature = executable.signature().to_string();
                if builder.intercept(executable, Arc::clone(pointcut)) {
                    debug!("Bound {} of '{}' to '{}'", signature, builder.name(), pointcut);
                }
            }
        }
        Ok(())
    }
}
