//! Configuration documents and placeholder substitution.
//!
//! A context can be populated from TOML instead of the builder API:
//!
//! - [`model`] defines the document shape ([`ContextConfig`])
//! - [`parser`] reads documents from disk with file-path error context
//! - [`loader`] converts documents into builders and registers them
//! - [`placeholder`] substitutes `${name}` in literals and pointcut patterns
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use wirebox::config::{ConfigLoader, reload};
//! use wirebox::context::Context;
//! use wirebox::meta::TypeRegistry;
//!
//! # fn example(types: TypeRegistry) -> anyhow::Result<()> {
//! let context = Context::new(types);
//! ConfigLoader::new(&context).load_file(Path::new("context.toml"))?;
//! context.initialize()?;
//!
//! // Later, after the file changed:
//! reload(&context, Path::new("context.toml"))?;
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod model;
pub mod parser;
pub mod placeholder;

pub use loader::{ConfigLoader, reload};
pub use model::{
    AspectConfig, BuilderConfig, CallConfig, ContextConfig, ElementConfig, ElementSpec,
    ExecutableConfig, FactoryConfig,
};
pub use parser::{parse_config, parse_context_config};
pub use placeholder::{PlaceholderResolver, PropertyPlaceholders};
