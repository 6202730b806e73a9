//! Eager initialization, shutdown and refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use crate::context::{Context, ContextState, DependsOnGraph};
use crate::core::{Result, WireError};
use crate::value::Value;

/// Name of the zero-argument method that marks a singleton as refreshable.
pub const REFRESH_METHOD: &str = "refresh";

/// Clears the refresh flag when the refresh ends, however it ends.
struct RefreshGate<'a>(&'a AtomicBool);

impl<'a> RefreshGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| WireError::RefreshInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for RefreshGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Context {
    /// Build every auto-init singleton, dependencies first.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CircularDependency`] when the `depends_on`
    /// declarations form a cycle, and propagates the first failed build.
    pub fn initialize(&self) -> Result<()> {
        let state = self.state();
        let mut builders = state.registry.all();
        builders.sort_by_key(|builder| builder.sequence());

        let mut graph = DependsOnGraph::new();
        for builder in &builders {
            graph.add_node(builder.name());
            for dependency in builder.depends_on() {
                let dependency = state.registry.canonical_name(dependency)?;
                graph.add_dependency(builder.name(), &dependency);
            }
        }

        let mut initialized = 0usize;
        for name in graph.init_order()? {
            let Some(builder) = state.registry.get(&name) else {
                continue;
            };
            if builder.is_singleton() && builder.auto_init() {
                self.build(&name)?;
                initialized += 1;
            }
        }
        info!("Initialized {} singleton(s)", initialized);
        Ok(())
    }

    /// Drop every cached singleton, running destroy methods in reverse
    /// creation order.
    ///
    /// Every destroy method runs even when an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvocationFailed`] for the first destroy method
    /// that failed.
    pub fn close(&self) -> Result<()> {
        let state = self.state();
        let created = std::mem::take(&mut *state.created.lock());
        let mut doomed = Vec::with_capacity(created.len());
        for name in created {
            if let Some((name, instance)) = state.singletons.remove(&name) {
                doomed.push((name, instance));
            }
        }
        state.singletons.clear();
        debug!("Closing context with {} singleton(s)", doomed.len());
        self.destroy_all(&state, doomed)
    }

    /// Replace the registry with the one `load` produces.
    ///
    /// `load` receives an empty staging context that shares this context's
    /// types and proxy factory; processors and placeholders are not carried
    /// over, so `load` sets up whatever it needs. When it succeeds the staging
    /// state replaces the current one for every clone of this context.
    ///
    /// Cached singletons whose builder name survives and whose type declares a
    /// zero-argument `refresh` method are kept: `refresh` is called on them and
    /// they move into the new cache. All other cached singletons are destroyed.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::RefreshInProgress`] when another refresh is running,
    /// propagates failures of `load` (leaving the current state untouched), and
    /// returns [`WireError::InvocationFailed`] when a refresh or destroy method
    /// fails after the swap.
    pub fn refresh<F>(&self, load: F) -> Result<()>
    where
        F: FnOnce(&Context) -> Result<()>,
    {
        let _gate = RefreshGate::acquire(&self.inner.refreshing)?;

        let types = Arc::clone(&self.inner.types);
        let staging = Context::with_services(types, Arc::clone(&self.inner.proxy_factory));
        load(&staging)?;
        let fresh = staging.state();

        let _creation = self.inner.creation_lock.lock();
        let previous = std::mem::replace(&mut *self.inner.state.write(), Arc::clone(&fresh));

        let created = std::mem::take(&mut *previous.created.lock());
        let mut kept = Vec::new();
        let mut doomed = Vec::new();
        for name in created {
            let Some((name, instance)) = previous.singletons.remove(&name) else {
                continue;
            };
            if self.survives(&fresh, &name, &instance) {
                kept.push((name, instance));
            } else {
                doomed.push((name, instance));
            }
        }
        previous.singletons.clear();

        let mut first_error = self.destroy_all(&previous, doomed).err();
        for (name, instance) in kept {
            debug!("Refreshing singleton '{}' in place", name);
            if let Err(source) = self.invoke(&instance, REFRESH_METHOD, &[]) {
                warn!("Refresh of '{}' failed: {}", name, source);
                first_error.get_or_insert(WireError::InvocationFailed {
                    executable: format!("{}.{}()", instance.type_name(), REFRESH_METHOD),
                    source,
                });
            }
            fresh.singletons.insert(name.clone(), instance);
            fresh.created.lock().push(name);
        }

        info!("Context refreshed with {} builder(s)", fresh.registry.len());
        first_error.map_or(Ok(()), Err)
    }

    fn survives(&self, fresh: &ContextState, name: &str, instance: &Value) -> bool {
        let still_singleton = fresh.registry.get(name).is_some_and(|b| b.is_singleton());
        let refreshable = self
            .types()
            .methods_named(instance.type_name(), REFRESH_METHOD)
            .iter()
            .any(|method| method.params().is_empty() && !method.is_static());
        still_singleton && refreshable && !fresh.singletons.contains_key(name)
    }

    fn destroy_all(&self, state: &ContextState, doomed: Vec<(String, Value)>) -> Result<()> {
        let mut first_error = None;
        for (name, instance) in doomed.into_iter().rev() {
            let Some(builder) = state.registry.get(&name) else {
                continue;
            };
            let Some(method) = builder.destroy_method() else {
                continue;
            };
            debug!("Destroying singleton '{}' via {}()", name, method);
            if let Err(source) = self.invoke(&instance, method, &[]) {
                warn!("Destroy method of '{}' failed: {}", name, source);
                first_error.get_or_insert(WireError::InvocationFailed {
                    executable: format!("{}.{}()", instance.type_name(), method),
                    source,
                });
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::test_utils::demo_types;

    fn service(name: &str) -> Builder {
        Builder::new(name, "demo.Service").with_destroy_method("close")
    }

    #[test]
    fn test_initialize_respects_depends_on() {
        let context = Context::new(demo_types());
        context
            .register(service("app").with_auto_init(true).with_depends_on("db"))
            .unwrap();
        context.register(service("db")).unwrap();
        context.register(service("lazy")).unwrap();

        context.initialize().unwrap();
        assert!(context.singleton("app").is_some());
        assert!(context.singleton("db").is_some());
        assert!(context.singleton("lazy").is_none());
        assert_eq!(*context.state().created.lock(), vec!["db", "app"]);
    }

    #[test]
    fn test_initialize_rejects_depends_on_cycle() {
        let context = Context::new(demo_types());
        context.register(service("a").with_depends_on("b")).unwrap();
        context.register(service("b").with_depends_on("a")).unwrap();
        assert!(matches!(context.initialize(), Err(WireError::CircularDependency { .. })));
    }

    #[test]
    fn test_close_destroys_in_reverse_creation_order() {
        let context = Context::new(demo_types());
        context.register(service("first")).unwrap();
        context.register(service("second")).unwrap();
        let first = context.build("first").unwrap();
        let second = context.build("second").unwrap();

        context.close().unwrap();
        assert_eq!(first.field("closed"), Some(Value::Bool(true)));
        assert_eq!(second.field("closed"), Some(Value::Bool(true)));
        let first_order = first.field("closed_at").and_then(|v| v.as_int()).unwrap();
        let second_order = second.field("closed_at").and_then(|v| v.as_int()).unwrap();
        assert!(second_order < first_order);
        assert!(context.singleton("first").is_none());
    }

    #[test]
    fn test_refresh_keeps_refreshable_singletons() {
        let context = Context::new(demo_types());
        context.register(service("svc")).unwrap();
        context.register(Builder::new("printer", "demo.Printer")).unwrap();
        context.register(service("gone")).unwrap();
        let svc = context.build("svc").unwrap();
        let printer = context.build("printer").unwrap();
        let gone = context.build("gone").unwrap();

        context
            .refresh(|staging| {
                staging.register(service("svc"))?;
                staging.register(Builder::new("printer", "demo.Printer"))?;
                Ok(())
            })
            .unwrap();

        let kept = context.build("svc").unwrap();
        assert!(kept.same_instance(&svc));
        assert_eq!(kept.field("refreshes"), Some(Value::Int(1)));
        assert!(!context.build("printer").unwrap().same_instance(&printer));
        assert_eq!(gone.field("closed"), Some(Value::Bool(true)));
        assert!(!context.contains("gone"));
    }

    #[test]
    fn test_refresh_rejects_reentry_and_keeps_state_on_failure() {
        let context = Context::new(demo_types());
        context.register(service("svc")).unwrap();

        let outer = context.clone();
        let error = context
            .refresh(|_| {
                assert!(matches!(outer.refresh(|_| Ok(())), Err(WireError::RefreshInProgress)));
                Err(WireError::config("load failed"))
            })
            .unwrap_err();
        assert!(error.to_string().contains("load failed"));
        assert!(context.contains("svc"));

        context.refresh(|_| Ok(())).unwrap();
        assert!(!context.contains("svc"));
    }
}
