//! Error handling for wirebox
//!
//! This module defines the error taxonomy used throughout the construction engine.
//! Every failure is classified into one of three kinds:
//!
//! 1. **Configuration** errors are problems with the declared object graph itself:
//!    duplicate names, circular alias chains, malformed pointcut patterns, unknown
//!    types. They are surfaced at load or build time and are never retried.
//! 2. **Resolution** errors mean a value could not be found: no builder with the
//!    requested name, a required element that produced nothing. Tolerant lookups
//!    such as [`Context::try_build`](crate::context::Context::try_build) turn the
//!    "no builder" case into `Ok(None)`.
//! 3. **Construction** errors are raised while invoking constructors, factories or
//!    setters, or while selecting an overload. They carry the builder name and the
//!    executable signature for context.
//!
//! Failures raised by user-supplied invokers and interception handlers travel as
//! [`anyhow::Error`]. They are wrapped with context when they happen during
//! construction and propagated unchanged when they happen inside an intercepted call.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wirebox::core::{ErrorKind, WireError};
//!
//! let error = WireError::DuplicateName { name: "greeter".to_string() };
//! assert_eq!(error.kind(), ErrorKind::Configuration);
//! assert!(!error.is_not_found());
//! ```

use std::fmt;
use thiserror::Error;

/// Convenience alias used by the engine's fallible operations.
pub type Result<T, E = WireError> = std::result::Result<T, E>;

/// Broad classification of a [`WireError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The declared object graph is invalid.
    Configuration,
    /// A requested value or builder does not exist.
    Resolution,
    /// Invoking an executable or assigning a field failed.
    Construction,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Resolution => write!(f, "resolution"),
            Self::Construction => write!(f, "construction"),
        }
    }
}

/// A single field that could not be populated.
///
/// Field population keeps going after a failure, so a builder can report several
/// of these at once through [`WireError::FieldPopulation`].
#[derive(Debug)]
pub struct FieldFailure {
    /// Field name, or `name()` for a method injection group.
    pub field: String,
    /// Why the assignment failed.
    pub error: Box<WireError>,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.error)
    }
}

/// The main error type for wirebox operations.
///
/// # Error Categories
///
/// ## Configuration
/// - [`DuplicateName`] - A builder name or alias is already registered
/// - [`AliasCycle`] - An alias chain loops back on itself
/// - [`MalformedPointcut`] - A pointcut pattern cannot be parsed
/// - [`CircularDependency`] - A construction cycle that cannot be tolerated
/// - [`UnknownType`] - A type name is missing from the type registry
/// - [`InvalidTypeRef`] - A type reference string is malformed
/// - [`Config`] - Other configuration problems
/// - [`RefreshInProgress`] - A refresh was requested while another one runs
///
/// ## Resolution
/// - [`BuilderNotFound`] - No builder is registered under a name
/// - [`NoBuilderForType`] - No builder is assignable to a type
/// - [`ElementUnresolved`] - A required element produced no value
/// - [`UnknownField`] - A field is not declared on the target type
/// - [`TypeMismatch`] - A value cannot be assigned to the expected type
///
/// ## Construction
/// - [`NoMatchingExecutable`] - Overload resolution found no fitting candidate
/// - [`ConstructionFailed`] - A constructor, factory or lifecycle method failed
/// - [`FieldPopulation`] - One or more fields failed to populate
/// - [`InvocationFailed`] - A method invoked through the context failed
///
/// [`DuplicateName`]: WireError::DuplicateName
/// [`AliasCycle`]: WireError::AliasCycle
/// [`MalformedPointcut`]: WireError::MalformedPointcut
/// [`CircularDependency`]: WireError::CircularDependency
/// [`UnknownType`]: WireError::UnknownType
/// [`InvalidTypeRef`]: WireError::InvalidTypeRef
/// [`Config`]: WireError::Config
/// [`RefreshInProgress`]: WireError::RefreshInProgress
/// [`BuilderNotFound`]: WireError::BuilderNotFound
/// [`NoBuilderForType`]: WireError::NoBuilderForType
/// [`ElementUnresolved`]: WireError::ElementUnresolved
/// [`UnknownField`]: WireError::UnknownField
/// [`TypeMismatch`]: WireError::TypeMismatch
/// [`NoMatchingExecutable`]: WireError::NoMatchingExecutable
/// [`ConstructionFailed`]: WireError::ConstructionFailed
/// [`FieldPopulation`]: WireError::FieldPopulation
/// [`InvocationFailed`]: WireError::InvocationFailed
#[derive(Error, Debug)]
pub enum WireError {
    /// A builder name or alias is already in use.
    ///
    /// Names and aliases share one namespace, so an alias can collide with a
    /// builder name and vice versa. The failed registration leaves existing
    /// registrations untouched.
    #[error("Name '{name}' is already registered")]
    DuplicateName {
        /// The name or alias that collided
        name: String,
    },

    /// Following an alias chain revisited a name.
    #[error("Alias chain for '{name}' is circular: {chain}")]
    AliasCycle {
        /// The name the lookup started from
        name: String,
        /// The chain that was followed, joined with arrows
        chain: String,
    },

    /// A pointcut pattern could not be compiled.
    #[error("Malformed pointcut pattern '{pattern}': {reason}")]
    MalformedPointcut {
        /// The offending pattern
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// A construction cycle was detected that cannot be satisfied.
    ///
    /// Singletons tolerate cycles through fields. Prototypes, constructor
    /// arguments and `depends_on` declarations do not.
    #[error("Circular dependency detected: {path}")]
    CircularDependency {
        /// The cycle, joined with arrows
        path: String,
    },

    /// A type name was not found in the type registry.
    #[error("Unknown type '{name}'")]
    UnknownType {
        /// The missing type name
        name: String,
    },

    /// A type reference string could not be parsed.
    #[error("Invalid type reference '{text}': {reason}")]
    InvalidTypeRef {
        /// The text that failed to parse
        text: String,
        /// What is wrong with it
        reason: String,
    },

    /// General configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Another refresh is already running on this context.
    #[error("Context refresh is already in progress")]
    RefreshInProgress,

    /// No builder is registered under the requested name.
    #[error("No builder named '{name}'{}", format_suggestions(suggestions))]
    BuilderNotFound {
        /// The requested name
        name: String,
        /// Registered names that are close to the requested one
        suggestions: Vec<String>,
    },

    /// No registered builder produces a value assignable to the type.
    #[error("No builder assignable to type '{type_name}'")]
    NoBuilderForType {
        /// The requested type
        type_name: String,
    },

    /// A required element produced no value.
    #[error("Required element {element} of builder '{builder}' resolved to no value")]
    ElementUnresolved {
        /// Owning builder
        builder: String,
        /// Description of the element slot
        element: String,
    },

    /// A field is not declared on the target type or its supertypes.
    #[error("Field '{field}' is not declared on type '{type_name}'")]
    UnknownField {
        /// The type that was searched
        type_name: String,
        /// The missing field
        field: String,
    },

    /// A value cannot be assigned to its destination.
    #[error("Cannot assign a value of type '{actual}' to '{expected}'")]
    TypeMismatch {
        /// Expected type
        expected: String,
        /// Actual value type
        actual: String,
    },

    /// Overload resolution found no executable that accepts the arguments.
    #[error("No executable '{name}' on type '{type_name}' accepts ({args})")]
    NoMatchingExecutable {
        /// The type that was searched
        type_name: String,
        /// The executable name (`new` for constructors)
        name: String,
        /// The argument types, comma separated
        args: String,
    },

    /// Invoking a constructor, factory or lifecycle method failed.
    #[error("Failed to construct '{builder}' via {executable}")]
    ConstructionFailed {
        /// The builder being constructed
        builder: String,
        /// The executable signature that failed
        executable: String,
        /// The underlying failure
        #[source]
        source: anyhow::Error,
    },

    /// One or more fields could not be populated.
    #[error(
        "Builder '{builder}' failed to populate {} field(s): {}",
        failures.len(),
        failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    FieldPopulation {
        /// The builder being populated
        builder: String,
        /// Every field failure, in declaration order
        failures: Vec<FieldFailure>,
    },

    /// A method invoked through the context failed.
    #[error("Invocation of {executable} failed")]
    InvocationFailed {
        /// The executable signature
        executable: String,
        /// The underlying failure
        #[source]
        source: anyhow::Error,
    },

    /// I/O error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error while reading configuration.
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean {}?)", suggestions.join(", "))
    }
}

impl WireError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateName { .. }
            | Self::AliasCycle { .. }
            | Self::MalformedPointcut { .. }
            | Self::CircularDependency { .. }
            | Self::UnknownType { .. }
            | Self::InvalidTypeRef { .. }
            | Self::Config { .. }
            | Self::RefreshInProgress
            | Self::Io(_)
            | Self::Toml(_) => ErrorKind::Configuration,
            Self::BuilderNotFound { .. }
            | Self::NoBuilderForType { .. }
            | Self::ElementUnresolved { .. }
            | Self::UnknownField { .. }
            | Self::TypeMismatch { .. } => ErrorKind::Resolution,
            Self::NoMatchingExecutable { .. }
            | Self::ConstructionFailed { .. }
            | Self::FieldPopulation { .. }
            | Self::InvocationFailed { .. } => ErrorKind::Construction,
        }
    }

    /// Whether this error means "no builder matched the request".
    ///
    /// Tolerant lookups downgrade exactly these errors to `None`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BuilderNotFound { .. } | Self::NoBuilderForType { .. })
    }

    /// Shorthand for [`WireError::Config`].
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
