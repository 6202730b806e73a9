//! Builders: named recipes for one runtime object.
//!
//! A [`Builder`] names a target, says how to construct it (constructor, static
//! factory or instance factory), lists the [`Element`]s that feed the
//! constructor, setters and fields, and records the interception points that
//! processors bound to it. Builders are assembled fluently, handed to
//! [`Context::register`](crate::context::Context::register), and immutable
//! afterwards.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wirebox::builder::{Builder, Scope};
//! use wirebox::element::Element;
//!
//! let greeter = Builder::new("greeter", "demo.Greeter")
//!     .with_alias("hello")
//!     .with_scope(Scope::Singleton)
//!     .with_field("message", Element::literal("hi"));
//! assert_eq!(greeter.fields().count(), 1);
//! ```

pub mod overload;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::aspect::PointCut;
use crate::core::WireError;
use crate::element::{Element, ExecutableRef, Slot};
use crate::meta::{CONSTRUCTOR_NAME, Executable, TypeRef};

/// How many instances a builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// One cached instance per context.
    #[default]
    Singleton,
    /// A fresh instance per build.
    Prototype,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Prototype => write!(f, "prototype"),
        }
    }
}

impl FromStr for Scope {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "singleton" => Ok(Self::Singleton),
            "prototype" => Ok(Self::Prototype),
            other => Err(WireError::config(format!("unknown scope '{other}'"))),
        }
    }
}

/// Who owns a factory method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactoryOwner {
    /// A static method of a type.
    Type(String),
    /// An instance method of another builder's product.
    Builder(String),
}

/// A factory method used instead of a constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Factory {
    /// Owner of the method
    pub owner: FactoryOwner,
    /// Method name
    pub method: String,
}

impl Factory {
    /// A static factory method on `type_name`.
    pub fn of_type(type_name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            owner: FactoryOwner::Type(type_name.into()),
            method: method.into(),
        }
    }

    /// An instance factory method on the product of builder `name`.
    pub fn of_builder(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            owner: FactoryOwner::Builder(name.into()),
            method: method.into(),
        }
    }
}

/// An executable bound to the pointcut that matched it.
#[derive(Debug, Clone)]
pub struct Interceptor {
    /// The intercepted executable
    pub executable: Arc<Executable>,
    /// The first pointcut that matched it
    pub pointcut: Arc<PointCut>,
}

/// A named recipe for one runtime object.
#[derive(Debug, Clone)]
pub struct Builder {
    name: String,
    aliases: Vec<String>,
    type_ref: TypeRef,
    scope: Scope,
    factory: Option<Factory>,
    executable: Option<Arc<Executable>>,
    elements: Vec<Arc<Element>>,
    interceptions: HashMap<String, Interceptor>,
    whole_type: Option<Arc<PointCut>>,
    depends_on: Vec<String>,
    auto_init: bool,
    auto_wire_fields: bool,
    auto_wire_executable: bool,
    order: i32,
    init_method: Option<String>,
    destroy_method: Option<String>,
    sequence: u64,
}

impl Builder {
    /// A singleton builder constructing `type_ref` through its constructors.
    pub fn new(name: impl Into<String>, type_ref: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            type_ref: type_ref.into(),
            scope: Scope::Singleton,
            factory: None,
            executable: None,
            elements: Vec::new(),
            interceptions: HashMap::new(),
            whole_type: None,
            depends_on: Vec::new(),
            auto_init: false,
            auto_wire_fields: false,
            auto_wire_executable: false,
            order: 0,
            init_method: None,
            destroy_method: None,
            sequence: 0,
        }
    }

    /// Add an alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Set the scope.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Construct through a factory method instead of a constructor.
    pub fn with_factory(mut self, factory: Factory) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Construct through this exact executable, skipping overload resolution.
    pub fn with_executable(mut self, executable: Arc<Executable>) -> Self {
        self.executable = Some(executable);
        self
    }

    /// Append an element. Field elements replace an earlier element for the
    /// same field.
    pub fn with_element(mut self, element: Element) -> Self {
        if let Some(name) = element.field_name() {
            let name = name.to_string();
            self.elements.retain(|existing| existing.field_name() != Some(name.as_str()));
        }
        self.elements.push(Arc::new(element));
        self
    }

    /// Append an argument of the build executable at the next free position.
    pub fn with_arg(self, element: Element) -> Self {
        self.with_element(element.with_slot(Slot::Parameter {
            executable: ExecutableRef::Build,
            index: None,
        }))
    }

    /// Append an argument of the build executable at `index`.
    pub fn with_arg_at(self, index: usize, element: Element) -> Self {
        self.with_element(element.with_slot(Slot::Parameter {
            executable: ExecutableRef::Build,
            index: Some(index),
        }))
    }

    /// Append an argument of a method invoked after construction.
    pub fn with_call_arg(self, method: impl Into<String>, element: Element) -> Self {
        self.with_element(element.for_executable(method))
    }

    /// Set a field.
    pub fn with_field(self, name: impl Into<String>, element: Element) -> Self {
        self.with_element(element.for_field(name))
    }

    /// Build `name` before this builder.
    pub fn with_depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    /// Build eagerly in [`Context::initialize`](crate::context::Context::initialize).
    pub fn with_auto_init(mut self, auto_init: bool) -> Self {
        self.auto_init = auto_init;
        self
    }

    /// Wire undeclared object fields by type.
    pub fn with_auto_wire_fields(mut self, enabled: bool) -> Self {
        self.auto_wire_fields = enabled;
        self
    }

    /// Wire missing executable arguments by type.
    pub fn with_auto_wire_executable(mut self, enabled: bool) -> Self {
        self.auto_wire_executable = enabled;
        self
    }

    /// Priority for type lookups; higher wins.
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Method called after population.
    pub fn with_init_method(mut self, method: impl Into<String>) -> Self {
        self.init_method = Some(method.into());
        self
    }

    /// Method called when the context closes.
    pub fn with_destroy_method(mut self, method: impl Into<String>) -> Self {
        self.destroy_method = Some(method.into());
        self
    }

    /// Bind `executable` to `pointcut` unless it is already bound.
    ///
    /// Returns whether the binding was made; the first match stays.
    pub fn intercept(&mut self, executable: Arc<Executable>, pointcut: Arc<PointCut>) -> bool {
        if self.interceptions.contains_key(executable.signature()) {
            return false;
        }
        self.interceptions.insert(
            executable.signature().to_string(),
            Interceptor {
                executable,
                pointcut,
            },
        );
        true
    }

    /// Route every call on the product through `pointcut` unless a whole-type
    /// pointcut is already bound.
    pub fn intercept_whole_type(&mut self, pointcut: Arc<PointCut>) -> bool {
        if self.whole_type.is_some() {
            return false;
        }
        self.whole_type = Some(pointcut);
        true
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    /// The unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternative names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The declared product type.
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// The runtime type name of the product, e.g. `demo.Greeter` or `list`.
    pub fn type_name(&self) -> &str {
        self.type_ref.runtime_name()
    }

    /// The scope.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Whether the product is cached.
    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    /// The factory, when not constructed directly.
    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    /// The explicit build executable.
    pub fn executable(&self) -> Option<&Arc<Executable>> {
        self.executable.as_ref()
    }

    /// The name of the executable that constructs the product.
    pub fn build_executable_name(&self) -> &str {
        match (&self.executable, &self.factory) {
            (Some(executable), _) => executable.name(),
            (None, Some(factory)) => &factory.method,
            (None, None) => CONSTRUCTOR_NAME,
        }
    }

    /// Every element in declaration order.
    pub fn elements(&self) -> &[Arc<Element>] {
        &self.elements
    }

    /// Field elements in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Arc<Element>> {
        self.elements.iter().filter(|element| element.field_name().is_some())
    }

    /// The element for a field.
    pub fn field(&self, name: &str) -> Option<&Arc<Element>> {
        self.fields().find(|element| element.field_name() == Some(name))
    }

    /// Executable interceptions keyed by signature.
    pub fn interceptions(&self) -> &HashMap<String, Interceptor> {
        &self.interceptions
    }

    /// The pointcut bound to this exact executable.
    ///
    /// The whole-type pointcut is not consulted: it applies to calls on the
    /// built instance, never to its construction.
    pub fn pointcut_for(&self, executable: &Executable) -> Option<&Arc<PointCut>> {
        self.interceptions.get(executable.signature()).map(|interceptor| &interceptor.pointcut)
    }

    /// The whole-type pointcut.
    pub fn whole_type(&self) -> Option<&Arc<PointCut>> {
        self.whole_type.as_ref()
    }

    /// Whether any interception is bound.
    pub fn is_intercepted(&self) -> bool {
        !self.interceptions.is_empty() || self.whole_type.is_some()
    }

    /// Names built before this builder.
    pub fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    /// Whether the builder is built eagerly on initialization.
    pub fn auto_init(&self) -> bool {
        self.auto_init
    }

    /// Whether undeclared fields are wired by type.
    pub fn auto_wire_fields(&self) -> bool {
        self.auto_wire_fields
    }

    /// Whether missing arguments are wired by type.
    pub fn auto_wire_executable(&self) -> bool {
        self.auto_wire_executable
    }

    /// Priority for type lookups.
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Method called after population.
    pub fn init_method(&self) -> Option<&str> {
        self.init_method.as_deref()
    }

    /// Method called when the context closes.
    pub fn destroy_method(&self) -> Option<&str> {
        self.destroy_method.as_deref()
    }

    /// Registration sequence number, assigned by the context.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
