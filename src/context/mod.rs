//! The build context.
//!
//! A [`Context`] owns the builder registry, the alias table, the singleton
//! cache and the "under construction" cache that lets singletons reference
//! each other in cycles. It is a cheap, cloneable handle: clones share the same
//! state, and a [`refresh`](Context::refresh) swaps that state for every clone
//! at once.
//!
//! # Building
//!
//! [`Context::build`] resolves the alias chain to a canonical name and runs
//! the build pipeline according to the builder's scope:
//!
//! - **singleton**: the cache is checked without locking. On a miss the
//!   creation lock is taken and the cache checked again; an instance that is
//!   still under construction on this thread is returned as is. Otherwise the
//!   pipeline runs and publishes the provisional instance before its fields
//!   are populated, which is what makes field cycles work.
//! - **prototype**: the pipeline runs on every call and nothing is cached.
//!
//! The creation lock is one reentrant mutex per context. Nested builds on the
//! building thread pass through it; other threads wait, so a singleton is
//! constructed at most once no matter how many threads ask for it first.
//!
//! # Examples
//!
//! ```rust,no_run
//! use wirebox::builder::Builder;
//! use wirebox::context::Context;
//! use wirebox::element::Element;
//! use wirebox::meta::{ClassDescriptor, TypeRegistry};
//! use wirebox::value::{Object, Value};
//!
//! let mut types = TypeRegistry::new();
//! types.register(
//!     ClassDescriptor::builder("demo.Greeter")
//!         .field("message", "string")
//!         .constructor(&[], |_| Ok(Object::new("demo.Greeter").into()))
//!         .build()?,
//! )?;
//!
//! let context = Context::new(types);
//! context.register(
//!     Builder::new("greeter", "demo.Greeter").with_field("message", Element::literal("hi")),
//! )?;
//! let greeter = context.build("greeter")?;
//! assert_eq!(greeter.field("message"), Some(Value::from("hi")));
//! # Ok::<(), wirebox::core::WireError>(())
//! ```

mod graph;
mod lifecycle;
mod registry;
mod tracker;

pub use graph::DependsOnGraph;
pub use lifecycle::REFRESH_METHOD;

use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tracing::{debug, trace};

use crate::aspect::BuilderProcessor;
use crate::builder::{Builder, Scope};
use crate::config::placeholder::{PlaceholderResolver, PropertyPlaceholders};
use crate::core::error_builders::builder_not_found;
use crate::core::{Result, WireError};
use crate::meta::{TypeRef, TypeRegistry};
use crate::procedure;
use crate::proxy::{self, DelegatingProxyFactory, ProxyFactory};
use crate::value::Value;

use registry::Registry;
use tracker::BuildTracker;

/// Everything a refresh replaces.
pub(crate) struct ContextState {
    registry: Registry,
    processors: RwLock<Vec<Arc<dyn BuilderProcessor>>>,
    placeholders: RwLock<Arc<dyn PlaceholderResolver>>,
    singletons: DashMap<String, Value>,
    under_construction: DashMap<String, Value>,
    created: Mutex<Vec<String>>,
}

impl ContextState {
    fn new() -> Self {
        Self {
            registry: Registry::new(),
            processors: RwLock::new(Vec::new()),
            placeholders: RwLock::new(Arc::new(PropertyPlaceholders::default())),
            singletons: DashMap::new(),
            under_construction: DashMap::new(),
            created: Mutex::new(Vec::new()),
        }
    }
}

struct Inner {
    types: Arc<TypeRegistry>,
    proxy_factory: Arc<dyn ProxyFactory>,
    state: RwLock<Arc<ContextState>>,
    creation_lock: ReentrantMutex<()>,
    tracker: BuildTracker,
    refreshing: AtomicBool,
}

/// Registry, caches and the entry point for builds.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// A context over `types` that proxies with [`DelegatingProxyFactory`].
    pub fn new(types: TypeRegistry) -> Self {
        Self::with_services(Arc::new(types), Arc::new(DelegatingProxyFactory))
    }

    /// A context with an explicit proxy factory.
    pub fn with_services(types: Arc<TypeRegistry>, proxy_factory: Arc<dyn ProxyFactory>) -> Self {
        Self {
            inner: Arc::new(Inner {
                types,
                proxy_factory,
                state: RwLock::new(Arc::new(ContextState::new())),
                creation_lock: ReentrantMutex::new(()),
                tracker: BuildTracker::new(),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn state(&self) -> Arc<ContextState> {
        Arc::clone(&*self.inner.state.read())
    }

    /// The type universe.
    pub fn types(&self) -> &TypeRegistry {
        &self.inner.types
    }

    /// The factory used to wrap intercepted products.
    pub fn proxy_factory(&self) -> &dyn ProxyFactory {
        self.inner.proxy_factory.as_ref()
    }

    /// Add a processor applied to every builder registered from now on.
    pub fn add_processor(&self, processor: impl BuilderProcessor + 'static) {
        self.state().processors.write().push(Arc::new(processor));
    }

    /// Replace the placeholder resolver.
    pub fn set_placeholders(&self, resolver: impl PlaceholderResolver + 'static) {
        *self.state().placeholders.write() = Arc::new(resolver);
    }

    /// Resolve placeholders from `properties`, then from the environment.
    pub fn set_properties<I, K, V>(&self, properties: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.set_placeholders(PropertyPlaceholders::new(properties));
    }

    /// Substitute placeholders in `text`.
    pub fn substitute(&self, text: &str) -> String {
        let resolver = Arc::clone(&*self.state().placeholders.read());
        resolver.substitute(text)
    }

    /// Run the registered processors over `builder` and register it.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::DuplicateName`] when the name or one of the aliases
    /// is taken, in which case nothing is registered, and propagates processor
    /// failures.
    pub fn register(&self, mut builder: Builder) -> Result<Arc<Builder>> {
        let state = self.state();
        self.process(&state, &mut builder)?;
        let registered = state.registry.insert(builder)?;
        debug!(
            "Registered builder '{}' of type {} ({})",
            registered.name(),
            registered.type_ref(),
            registered.scope()
        );
        Ok(registered)
    }

    fn process(&self, state: &ContextState, builder: &mut Builder) -> Result<()> {
        let processors = state.processors.read().clone();
        for processor in processors {
            processor.process(builder, self.types())?;
        }
        Ok(())
    }

    /// Make `alias` another name for `target`, which may itself be an alias.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::BuilderNotFound`] when `target` leads nowhere and
    /// [`WireError::DuplicateName`] when `alias` is taken.
    pub fn register_alias(&self, alias: &str, target: &str) -> Result<()> {
        self.state().registry.insert_alias(alias, target)?;
        trace!("Alias '{}' now refers to '{}'", alias, target);
        Ok(())
    }

    /// Remove a builder, its aliases and its cached instance.
    pub fn remove(&self, name: &str) -> Option<Arc<Builder>> {
        let state = self.state();
        let removed = state.registry.remove(name)?;
        state.singletons.remove(removed.name());
        state.created.lock().retain(|created| created != removed.name());
        debug!("Removed builder '{}'", removed.name());
        Some(removed)
    }

    /// The canonical name behind `name`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::AliasCycle`] when the alias chain loops.
    pub fn canonical_name(&self, name: &str) -> Result<String> {
        self.state().registry.canonical_name(name)
    }

    /// The builder registered under `name` or one of its aliases.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::BuilderNotFound`] with similar names as suggestions.
    pub fn builder(&self, name: &str) -> Result<Arc<Builder>> {
        let state = self.state();
        let canonical = state.registry.canonical_name(name)?;
        state
            .registry
            .get(&canonical)
            .ok_or_else(|| builder_not_found(name, state.registry.used_names()))
    }

    /// Whether `name` leads to a registered builder.
    pub fn contains(&self, name: &str) -> bool {
        let state = self.state();
        state
            .registry
            .canonical_name(name)
            .is_ok_and(|canonical| state.registry.contains(&canonical))
    }

    /// Builder names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.state().registry.names()
    }

    /// The best builder for `ty`: highest order, then first registered.
    pub fn builder_for_type(&self, ty: &TypeRef) -> Option<Arc<Builder>> {
        self.builders_for_type(ty).into_iter().next()
    }

    /// Every builder assignable to `ty`, best first.
    pub fn builders_for_type(&self, ty: &TypeRef) -> Vec<Arc<Builder>> {
        self.state().registry.for_type(self.types(), ty)
    }

    /// The cached instance of a singleton, without building it.
    pub fn singleton(&self, name: &str) -> Option<Value> {
        let state = self.state();
        let canonical = state.registry.canonical_name(name).ok()?;
        state.singletons.get(&canonical).map(|entry| entry.value().clone())
    }

    /// Build the target registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::BuilderNotFound`] when the name is unknown and
    /// propagates every failure of the build.
    pub fn build(&self, name: &str) -> Result<Value> {
        let builder = self.builder(name)?;
        self.build_registered(&builder)
    }

    /// Build the target registered under `name`, or `None` when there is none.
    ///
    /// Only the lookup of `name` itself is tolerant; failures while building
    /// are returned as errors.
    ///
    /// # Errors
    ///
    /// Propagates every failure of the build.
    pub fn try_build(&self, name: &str) -> Result<Option<Value>> {
        let state = self.state();
        let canonical = state.registry.canonical_name(name)?;
        match state.registry.get(&canonical) {
            Some(builder) => self.build_registered(&builder).map(Some),
            None => Ok(None),
        }
    }

    /// Build the best builder for `ty`.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::NoBuilderForType`] when no builder is assignable.
    pub fn build_type(&self, ty: &TypeRef) -> Result<Value> {
        self.try_build_type(ty)?.ok_or_else(|| WireError::NoBuilderForType {
            type_name: ty.to_string(),
        })
    }

    /// Build the best builder for `ty`, or `None` when none is assignable.
    ///
    /// # Errors
    ///
    /// Propagates every failure of the build.
    pub fn try_build_type(&self, ty: &TypeRef) -> Result<Option<Value>> {
        match self.builder_for_type(ty) {
            Some(builder) => self.build_registered(&builder).map(Some),
            None => Ok(None),
        }
    }

    /// Build an unregistered builder, as used for inner builders.
    ///
    /// The builder goes through the registered processors and is built as a
    /// prototype; the result is never cached.
    ///
    /// # Errors
    ///
    /// Propagates processor and build failures.
    pub fn build_inner(&self, builder: &Builder) -> Result<Value> {
        let mut builder = builder.clone().with_scope(Scope::Prototype);
        self.process(&self.state(), &mut builder)?;
        self.build_prototype(&builder)
    }

    /// A fresh instance of `type_name` from its best constructor, auto-wiring
    /// every parameter by type.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::UnknownType`] for unregistered types,
    /// [`WireError::CircularDependency`] when the constructor parameters lead
    /// back to the type, and propagates construction failures.
    pub fn instantiate(&self, type_name: &str) -> Result<Value> {
        self.types().require(type_name)?;
        let builder = Builder::new(format!("({type_name})"), type_name)
            .with_scope(Scope::Prototype)
            .with_auto_wire_executable(true);
        self.build_inner(&builder)
    }

    /// Call `method` on `target`, honouring interception.
    ///
    /// Errors raised by the method or by an interception handler are returned
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Fails with [`WireError::NoMatchingExecutable`] when no overload of the
    /// method accepts `args`, and with whatever the method returns.
    pub fn invoke(&self, target: &Value, method: &str, args: &[Value]) -> anyhow::Result<Value> {
        proxy::dispatch(self.types(), target, method, args)
    }

    fn build_registered(&self, builder: &Arc<Builder>) -> Result<Value> {
        match builder.scope() {
            Scope::Singleton => self.build_singleton(builder),
            Scope::Prototype => self.build_prototype(builder),
        }
    }

    fn build_singleton(&self, builder: &Builder) -> Result<Value> {
        let state = self.state();
        let name = builder.name();
        if let Some(instance) = state.singletons.get(name) {
            return Ok(instance.value().clone());
        }

        let _creation = self.inner.creation_lock.lock();
        let current = self.state();
        if !Arc::ptr_eq(&state, &current) {
            trace!("Context refreshed before '{}' was built", name);
            let fresh = current
                .registry
                .get(name)
                .ok_or_else(|| builder_not_found(name, current.registry.used_names()))?;
            return self.build_registered(&fresh);
        }
        if let Some(instance) = state.singletons.get(name) {
            return Ok(instance.value().clone());
        }
        if let Some(provisional) = state.under_construction.get(name) {
            trace!("Returning provisional instance of '{}'", name);
            return Ok(provisional.value().clone());
        }

        let _path = self.inner.tracker.enter(name)?;
        self.build_dependencies(builder)?;

        let outcome = procedure::run(self, builder, &mut |provisional: &Value| {
            state.under_construction.insert(name.to_string(), provisional.clone());
        });
        state.under_construction.remove(name);
        let instance = outcome?;

        state.singletons.insert(name.to_string(), instance.clone());
        state.created.lock().push(name.to_string());
        debug!("Created singleton '{}'", name);
        Ok(instance)
    }

    fn build_prototype(&self, builder: &Builder) -> Result<Value> {
        let _path = if builder.name().is_empty() {
            None
        } else {
            Some(self.inner.tracker.enter(builder.name())?)
        };
        self.build_dependencies(builder)?;
        let instance = procedure::run(self, builder, &mut |_: &Value| {})?;
        trace!("Built prototype '{}'", builder.name());
        Ok(instance)
    }

    fn build_dependencies(&self, builder: &Builder) -> Result<()> {
        for dependency in builder.depends_on() {
            trace!("'{}' depends on '{}'", builder.name(), dependency);
            self.build(dependency)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Context")
            .field("types", &self.types().len())
            .field("builders", &state.registry.len())
            .field("singletons", &state.singletons.len())
            .finish()
    }
}
