//! Runtime values produced and consumed by the engine.
//!
//! [`Value`] is the currency of every build: element resolution produces values,
//! executables take and return them, fields store them. Scalars and containers are
//! plain data; [`Value::Object`] is a shared instance of a registered type and
//! [`Value::Native`] is an opaque host value (interception handlers travel this way).
//!
//! Equality is structural for data and by identity for objects and natives.

pub mod object;

pub use object::{Object, ObjectRef};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::core::WireError;
use crate::meta::type_ref::{self, TypeRef};

/// An opaque host value with a declared type name.
#[derive(Clone)]
pub struct NativeRef {
    type_name: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl NativeRef {
    /// Wrap a host value.
    pub fn new<T>(type_name: &str, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            type_name: Arc::from(type_name),
            value: Arc::new(value),
        }
    }

    /// The declared type name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the wrapped value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether two handles wrap the same host value.
    pub fn same(&self, other: &NativeRef) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for NativeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Native({})", self.type_name)
    }
}

/// A runtime value.
#[derive(Clone, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// `bool`
    Bool(bool),
    /// `int`
    Int(i64),
    /// `float`
    Float(f64),
    /// `string`
    Str(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Ordered sequence without duplicates.
    Set(Vec<Value>),
    /// Fixed sequence.
    Array(Vec<Value>),
    /// Ordered key/value pairs with unique keys.
    Map(Vec<(Value, Value)>),
    /// Instance of a registered type.
    Object(ObjectRef),
    /// Opaque host value.
    Native(NativeRef),
}

impl Value {
    /// Build a set, dropping duplicates and keeping first occurrences.
    pub fn set_of(values: impl IntoIterator<Item = Value>) -> Self {
        let mut items: Vec<Value> = Vec::new();
        for value in values {
            if !items.contains(&value) {
                items.push(value);
            }
        }
        Self::Set(items)
    }

    /// Build a map; a repeated key replaces the earlier value in place.
    pub fn map_of(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        let mut pairs: Vec<(Value, Value)> = Vec::new();
        for (key, value) in entries {
            match pairs.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => pairs.push((key, value)),
            }
        }
        Self::Map(pairs)
    }

    /// Wrap a host value.
    pub fn native<T>(type_name: &str, value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::Native(NativeRef::new(type_name, value))
    }

    /// Runtime type name used for assignability checks.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => type_ref::NULL,
            Self::Bool(_) => type_ref::BOOL,
            Self::Int(_) => type_ref::INT,
            Self::Float(_) => type_ref::FLOAT,
            Self::Str(_) => type_ref::STRING,
            Self::List(_) => type_ref::LIST,
            Self::Set(_) => type_ref::SET,
            Self::Array(_) => type_ref::ARRAY,
            Self::Map(_) => type_ref::MAP,
            Self::Object(object) => object.class_name(),
            Self::Native(native) => native.type_name(),
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string content of a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer content of a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The numeric content of a [`Value::Float`] or [`Value::Int`].
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The content of a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The items of a list, set or array.
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) | Self::Set(items) | Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The entries of a map.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a map entry by key.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.as_map()?.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The instance behind a [`Value::Object`].
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The handle behind a [`Value::Native`].
    pub fn as_native(&self) -> Option<&NativeRef> {
        match self {
            Self::Native(native) => Some(native),
            _ => None,
        }
    }

    /// Read a field of an object value.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.as_object().and_then(|object| object.field(name))
    }

    /// Whether both values are the same object or native instance.
    pub fn same_instance(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Native(a), Self::Native(b)) => a.same(b),
            _ => false,
        }
    }

    /// Whether [`Value::coerce_to`] would convert this value into a scalar of
    /// type `ty` rather than leave it as is.
    pub fn converts_to(&self, ty: &TypeRef) -> bool {
        match (self, ty.as_named()) {
            (Self::Str(s), Some(type_ref::INT)) => s.trim().parse::<i64>().is_ok(),
            (Self::Str(s), Some(type_ref::FLOAT)) => s.trim().parse::<f64>().is_ok(),
            (Self::Str(s), Some(type_ref::BOOL)) => s.trim().parse::<bool>().is_ok(),
            (Self::Int(_) | Self::Float(_) | Self::Bool(_), Some(type_ref::STRING)) => true,
            _ => false,
        }
    }

    /// Convert literal data to the shape `ty` asks for.
    ///
    /// Strings become numbers or booleans, scalars become strings, integers widen
    /// to floats and containers convert between list, set and array kinds with
    /// their members converted recursively. Objects, natives and already matching
    /// values are returned unchanged; assignability is checked by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::TypeMismatch`] when a string cannot be parsed as the
    /// requested scalar.
    pub fn coerce_to(self, ty: &TypeRef) -> Result<Value, WireError> {
        let mismatch = |value: &Value| WireError::TypeMismatch {
            expected: ty.to_string(),
            actual: format!("{} ({value})", value.type_name()),
        };

        match (self, ty) {
            (Self::Str(s), TypeRef::Named(name)) if type_ref::is_primitive(name) => {
                let trimmed = s.trim();
                let parsed = match name.as_str() {
                    type_ref::INT => trimmed.parse::<i64>().ok().map(Self::Int),
                    type_ref::FLOAT => trimmed.parse::<f64>().ok().map(Self::Float),
                    _ => trimmed.parse::<bool>().ok().map(Self::Bool),
                };
                let original = Self::Str(s.clone());
                parsed.ok_or_else(|| mismatch(&original))
            }
            (Self::Int(i), TypeRef::Named(name)) if name == type_ref::FLOAT => {
                Ok(Self::Float(i as f64))
            }
            (value @ (Self::Int(_) | Self::Float(_) | Self::Bool(_)), TypeRef::Named(name))
                if name == type_ref::STRING =>
            {
                Ok(Self::Str(value.to_string()))
            }
            (
                Self::List(items) | Self::Set(items) | Self::Array(items),
                TypeRef::List(element),
            ) => Ok(Self::List(coerce_all(items, element)?)),
            (Self::List(items) | Self::Set(items) | Self::Array(items), TypeRef::Set(element)) => {
                Ok(Self::set_of(coerce_all(items, element)?))
            }
            (
                Self::List(items) | Self::Set(items) | Self::Array(items),
                TypeRef::Array(element),
            ) => Ok(Self::Array(coerce_all(items, element)?)),
            (Self::Map(entries), TypeRef::Map(key_type, value_type)) => {
                let entries = entries
                    .into_iter()
                    .map(|(k, v)| Ok((k.coerce_to(key_type)?, v.coerce_to(value_type)?)))
                    .collect::<Result<Vec<_>, WireError>>()?;
                Ok(Self::map_of(entries))
            }
            (value, _) => Ok(value),
        }
    }
}

fn coerce_all(items: Vec<Value>, element: &TypeRef) -> Result<Vec<Value>, WireError> {
    items.into_iter().map(|item| item.coerce_to(element)).collect()
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b))
            | (Self::Set(a), Self::Set(b))
            | (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(_), Self::Object(_)) | (Self::Native(_), Self::Native(_)) => {
                self.same_instance(other)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Self::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Self::Object(object) => write!(f, "{object:?}"),
            Self::Native(native) => write!(f, "{native:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(items: &[Value]) -> String {
            items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        }

        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::List(items) | Self::Array(items) => write!(f, "[{}]", join(items)),
            Self::Set(items) => write!(f, "{{{}}}", join(items)),
            Self::Map(entries) => {
                let body = entries
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{body}}}")
            }
            Self::Object(object) => write!(f, "{}#{}", object.class_name(), object.id()),
            Self::Native(native) => write!(f, "<{}>", native.type_name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(object: ObjectRef) -> Self {
        Self::Object(object)
    }
}

impl From<NativeRef> for Value {
    fn from(native: NativeRef) -> Self {
        Self::Native(native)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from("x").type_name(), "string");
        assert_eq!(Value::from(1).type_name(), "int");
        assert_eq!(Value::List(vec![]).type_name(), "list");
        assert_eq!(Value::from(Object::new("demo.A")).type_name(), "demo.A");
        assert_eq!(Value::native("demo.Handle", 5u8).type_name(), "demo.Handle");
    }

    #[test]
    fn test_object_identity_equality() {
        let a = Object::new("demo.A");
        let first = Value::from(Arc::clone(&a));
        let second = Value::from(a);
        let other = Value::from(Object::new("demo.A"));
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert!(first.same_instance(&second));
    }

    #[test]
    fn test_set_and_map_dedupe() {
        let set = Value::set_of(vec![Value::from(1), Value::from(2), Value::from(1)]);
        assert_eq!(set.as_slice().unwrap().len(), 2);

        let map = Value::map_of(vec![
            (Value::from("a"), Value::from(1)),
            (Value::from("b"), Value::from(2)),
            (Value::from("a"), Value::from(3)),
        ]);
        assert_eq!(map.as_map().unwrap().len(), 2);
        assert_eq!(map.get(&Value::from("a")), Some(&Value::from(3)));
    }

    #[test]
    fn test_scalar_coercion() {
        let int = TypeRef::named("int");
        assert_eq!(Value::from("42").coerce_to(&int).unwrap(), Value::Int(42));
        assert!(Value::from("forty").coerce_to(&int).is_err());
        assert_eq!(
            Value::from("true").coerce_to(&TypeRef::named("bool")).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(Value::from(3).coerce_to(&TypeRef::named("float")).unwrap(), Value::Float(3.0));
        assert_eq!(Value::from(3).coerce_to(&TypeRef::named("string")).unwrap(), Value::from("3"));
        assert_eq!(
            Value::from("keep").coerce_to(&TypeRef::named("demo.A")).unwrap(),
            Value::from("keep")
        );
    }

    #[test]
    fn test_container_coercion() {
        let list = Value::List(vec![Value::from("1"), Value::from("2"), Value::from("1")]);
        let set = list.clone().coerce_to(&TypeRef::parse("set<int>").unwrap()).unwrap();
        assert_eq!(set, Value::Set(vec![Value::Int(1), Value::Int(2)]));

        let array = list.coerce_to(&TypeRef::parse("int[]").unwrap()).unwrap();
        assert_eq!(array, Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(1)]));
    }

    #[test]
    fn test_converts_to() {
        assert!(Value::from("7").converts_to(&TypeRef::named("int")));
        assert!(!Value::from("x").converts_to(&TypeRef::named("int")));
        assert!(!Value::from("x").converts_to(&TypeRef::named("string")));
    }

    #[test]
    fn test_display() {
        let value = Value::List(vec![Value::from("a"), Value::from(1), Value::Null]);
        assert_eq!(value.to_string(), "[a, 1, null]");
    }
}
