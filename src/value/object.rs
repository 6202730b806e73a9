//! Runtime object instances.
//!
//! An [`Object`] is an instance of a registered type: a type name, a field map and
//! an optional host payload. Objects are shared through [`ObjectRef`] (`Arc`), and
//! identity is pointer identity, which is what "the same singleton" means.
//!
//! A proxy is also an `Object`. It reports the target's type name, forwards field
//! access to the target, and carries the [`Interception`] table that
//! [`dispatch`](crate::proxy::dispatch) consults.

use parking_lot::RwLock;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::proxy::Interception;
use crate::value::Value;

/// Shared handle to an [`Object`].
pub type ObjectRef = Arc<Object>;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

struct ProxyState {
    target: Value,
    interception: Interception,
}

/// An instance of a registered type.
pub struct Object {
    id: u64,
    class_name: String,
    fields: RwLock<BTreeMap<String, Value>>,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    proxy: Option<ProxyState>,
}

impl Object {
    fn create(
        class_name: String,
        payload: Option<Arc<dyn Any + Send + Sync>>,
        proxy: Option<ProxyState>,
    ) -> ObjectRef {
        Arc::new(Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            class_name,
            fields: RwLock::new(BTreeMap::new()),
            payload,
            proxy,
        })
    }

    /// A new instance with no fields set.
    pub fn new(class_name: impl Into<String>) -> ObjectRef {
        Self::create(class_name.into(), None, None)
    }

    /// A new instance carrying a host payload, retrievable with [`Object::payload`].
    pub fn with_payload<T>(class_name: impl Into<String>, payload: T) -> ObjectRef
    where
        T: Any + Send + Sync,
    {
        Self::create(class_name.into(), Some(Arc::new(payload)), None)
    }

    /// A proxy around `target` whose calls are routed through `interception`.
    pub fn new_proxy(target: Value, interception: Interception) -> ObjectRef {
        let class_name = target.type_name().to_string();
        Self::create(
            class_name,
            None,
            Some(ProxyState {
                target,
                interception,
            }),
        )
    }

    /// Process-unique instance number, handy in logs.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The type this instance belongs to.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Read a field. Proxies read from their target.
    pub fn field(&self, name: &str) -> Option<Value> {
        if let Some(proxy) = &self.proxy {
            return proxy.target.field(name);
        }
        self.fields.read().get(name).cloned()
    }

    /// Assign a field. Proxies assign on their target.
    ///
    /// Returns `false` when the target of a proxy is not an object.
    pub fn set_field(&self, name: impl Into<String>, value: Value) -> bool {
        if let Some(proxy) = &self.proxy {
            return match &proxy.target {
                Value::Object(target) => target.set_field(name, value),
                _ => false,
            };
        }
        self.fields.write().insert(name.into(), value);
        true
    }

    /// Names of the fields that have been assigned.
    pub fn field_names(&self) -> Vec<String> {
        if let Some(Value::Object(target)) = self.proxy.as_ref().map(|p| &p.target) {
            return target.field_names();
        }
        self.fields.read().keys().cloned().collect()
    }

    /// Borrow the host payload as `T`.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        if let Some(Value::Object(target)) = self.proxy.as_ref().map(|p| &p.target) {
            return target.payload::<T>();
        }
        self.payload.as_ref().and_then(|payload| payload.downcast_ref::<T>())
    }

    /// Whether this instance is an intercepting proxy.
    pub fn is_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    /// The wrapped instance of a proxy.
    pub fn proxy_target(&self) -> Option<&Value> {
        self.proxy.as_ref().map(|p| &p.target)
    }

    /// The interception table of a proxy.
    pub fn interception(&self) -> Option<&Interception> {
        self.proxy.as_ref().map(|p| &p.interception)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_proxy() {
            write!(f, "Proxy({}#{})", self.class_name, self.id)
        } else {
            write!(f, "Object({}#{})", self.class_name, self.id)
        }
    }
}
