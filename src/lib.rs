//! wirebox - declarative object-graph construction
//!
//! wirebox builds graphs of objects from declarative recipes. A [`Builder`]
//! names a target type and lists [`Element`]s: constructor or factory
//! arguments, field values and post-construction method calls. A [`Context`]
//! registers builders, builds them on demand, caches singletons and
//! tolerates cycles that pass through fields.
//!
//! # Architecture Overview
//!
//! Types are described at runtime by a [`TypeRegistry`] of class descriptors,
//! so the engine works against any object model that can be expressed as
//! constructors, methods and fields. Values flowing through the graph are
//! [`Value`]s.
//!
//! Building one instance runs a fixed pipeline ([`procedure`]):
//!
//! 1. **Install** groups parameter elements by executable
//! 2. **Create** selects an overload and invokes the constructor or factory
//! 3. **Proxy** wraps the instance when its builder is intercepted
//! 4. **Publish** makes a singleton visible to cycles through fields
//! 5. **Populate** sets fields, runs method injections and the init method on
//!    the unwrapped instance
//!
//! Method interception is configured with [`PointCut`] patterns such as
//! `public void pkg.Type.angry(..)`, bound to builders at registration time
//! by an [`AspectProcessor`].
//!
//! # Core Modules
//!
//! - [`meta`] - Type references, class descriptors and the type registry
//! - [`value`] - Dynamic values and shared objects
//! - [`builder`] - Builder recipes and overload selection
//! - [`element`] - Element sources, slots and resolution
//! - [`procedure`] - The build pipeline
//! - [`context`] - Registry, caches, cycle tracking and lifecycle
//! - [`aspect`] - Pointcuts, handlers and the aspect processor
//! - [`proxy`] - Proxy creation and dispatch
//! - [`config`] - TOML configuration and placeholders
//! - [`core`] - Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use wirebox::builder::Builder;
//! use wirebox::context::Context;
//! use wirebox::element::Element;
//! # use wirebox::meta::TypeRegistry;
//!
//! # fn example(types: TypeRegistry) -> anyhow::Result<()> {
//! let context = Context::new(types);
//! context.register(Builder::new("printer", "demo.Printer"))?;
//! context.register(
//!     Builder::new("greeter", "demo.Greeter")
//!         .with_arg(Element::literal("hello"))
//!         .with_field("printer", Element::reference("printer")),
//! )?;
//!
//! let greeter = context.build("greeter")?;
//! let greeting = context.invoke(&greeter, "greet", &[])?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Builder`]: builder::Builder
//! [`Element`]: element::Element
//! [`Context`]: context::Context
//! [`TypeRegistry`]: meta::TypeRegistry
//! [`Value`]: value::Value
//! [`PointCut`]: aspect::PointCut
//! [`AspectProcessor`]: aspect::AspectProcessor

// Object model
pub mod meta;
pub mod value;

// Recipes and construction
pub mod builder;
pub mod context;
pub mod element;
pub mod procedure;

// Interception
pub mod aspect;
pub mod proxy;

// Supporting modules
pub mod config;
pub mod core;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
