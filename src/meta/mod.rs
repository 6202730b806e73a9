//! The type universe.
//!
//! Rust has no runtime reflection, so every type the engine constructs, wires or
//! intercepts is described up front in a [`TypeRegistry`]. The registry is
//! immutable once handed to a [`Context`](crate::context::Context); builds only
//! read it.
//!
//! # Assignability
//!
//! [`TypeRegistry::distance`] answers both "can a value of type A go where B is
//! expected" and "how specific is that match". Overload resolution sums these
//! distances to pick the most specific candidate:
//!
//! | from → to                     | distance |
//! |-------------------------------|----------|
//! | identical names               | 0        |
//! | class → supertype             | hops     |
//! | `int` → `float`               | 1        |
//! | anything → `object`           | [`OBJECT_DISTANCE`] |
//! | container → same container    | 0 (element types are not checked) |
//! | `null` → non-primitive        | 0        |

pub mod class;
pub mod modifiers;
pub mod type_ref;

pub use class::{
    CONSTRUCTOR_NAME, ClassBuilder, ClassDescriptor, Executable, ExecutableKind, FieldDescriptor,
    Invoker,
};
pub use modifiers::Modifiers;
pub use type_ref::TypeRef;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::core::WireError;
use crate::value::Value;

/// Distance charged for widening any value to `object`.
pub const OBJECT_DISTANCE: u32 = 1_000;

/// Registry of every type the engine knows about.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    classes: HashMap<String, Arc<ClassDescriptor>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::DuplicateName`] when a type with the same name exists.
    pub fn register(&mut self, class: ClassDescriptor) -> Result<Arc<ClassDescriptor>, WireError> {
        if self.classes.contains_key(class.name()) {
            return Err(WireError::DuplicateName {
                name: class.name().to_string(),
            });
        }
        let class = Arc::new(class);
        self.classes.insert(class.name().to_string(), Arc::clone(&class));
        Ok(class)
    }

    /// Look up a type by name.
    pub fn class(&self, name: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes.get(name)
    }

    /// Look up a type by name, failing with [`WireError::UnknownType`].
    pub fn require(&self, name: &str) -> Result<&Arc<ClassDescriptor>, WireError> {
        self.class(name).ok_or_else(|| WireError::UnknownType {
            name: name.to_string(),
        })
    }

    /// Whether a type is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no type is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// The type followed by its transitive supertypes, breadth first.
    pub fn ancestors(&self, name: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(class) = self.classes.get(&current) {
                queue.extend(class.supertypes().iter().cloned());
            }
            order.push(current);
        }
        order
    }

    /// Specificity distance from a runtime type name to an expected type.
    ///
    /// Returns `None` when the types are incompatible.
    pub fn distance(&self, from: &str, to: &TypeRef) -> Option<u32> {
        match to {
            TypeRef::List(_) => (from == type_ref::LIST).then_some(0),
            TypeRef::Set(_) => (from == type_ref::SET).then_some(0),
            TypeRef::Map(..) => (from == type_ref::MAP).then_some(0),
            TypeRef::Array(_) => (from == type_ref::ARRAY).then_some(0),
            TypeRef::Named(target) => {
                if from == target {
                    return Some(0);
                }
                if from == type_ref::INT && target == type_ref::FLOAT {
                    return Some(1);
                }
                if let Some(hops) = self.hops(from, target) {
                    return Some(hops);
                }
                (target == type_ref::OBJECT).then_some(OBJECT_DISTANCE)
            }
        }
    }

    /// Specificity distance from a value to an expected type, honouring `null`.
    pub fn value_distance(&self, value: &Value, to: &TypeRef) -> Option<u32> {
        if value.is_null() {
            let primitive = to.as_named().is_some_and(type_ref::is_primitive);
            return (!primitive).then_some(0);
        }
        self.distance(value.type_name(), to)
    }

    /// Whether a value of runtime type `from` may be used where `to` is expected.
    pub fn is_assignable(&self, from: &str, to: &TypeRef) -> bool {
        self.distance(from, to).is_some()
    }

    /// Number of supertype hops from `from` up to `target`.
    fn hops(&self, from: &str, target: &str) -> Option<u32> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([(from.to_string(), 0u32)]);
        while let Some((current, depth)) = queue.pop_front() {
            if current == target {
                return Some(depth);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(class) = self.classes.get(&current) {
                for supertype in class.supertypes() {
                    queue.push_back((supertype.clone(), depth + 1));
                }
            }
        }
        None
    }

    /// Constructors declared by a type.
    pub fn constructors(&self, name: &str) -> Vec<Arc<Executable>> {
        self.class(name).map(|class| class.constructors().to_vec()).unwrap_or_default()
    }

    /// Every method visible on a type, including inherited ones.
    ///
    /// Subtype declarations hide supertype declarations with the same local
    /// signature.
    pub fn methods(&self, name: &str) -> Vec<Arc<Executable>> {
        let mut seen = HashSet::new();
        let mut methods = Vec::new();
        for ancestor in self.ancestors(name) {
            if let Some(class) = self.classes.get(&ancestor) {
                for method in class.methods() {
                    if seen.insert(method.local_signature().to_string()) {
                        methods.push(Arc::clone(method));
                    }
                }
            }
        }
        methods
    }

    /// Visible methods with the given name, in declaration order.
    pub fn methods_named(&self, name: &str, method: &str) -> Vec<Arc<Executable>> {
        self.methods(name).into_iter().filter(|m| m.name() == method).collect()
    }

    /// Look up a field on a type or its supertypes.
    pub fn field(&self, name: &str, field: &str) -> Option<&FieldDescriptor> {
        self.ancestors(name).iter().find_map(|ancestor| {
            self.classes
                .get(ancestor)
                .and_then(|class| class.fields().iter().find(|f| f.name == field))
        })
    }

    /// Every field visible on a type, subtype declarations first.
    pub fn fields(&self, name: &str) -> Vec<FieldDescriptor> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        for ancestor in self.ancestors(name) {
            if let Some(class) = self.classes.get(&ancestor) {
                for field in class.fields() {
                    if seen.insert(field.name.clone()) {
                        fields.push(field.clone());
                    }
                }
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;

    fn registry() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types
            .register(
                ClassDescriptor::builder("demo.Animal")
                    .field("name", "string")
                    .method("speak", &[], "string", |_, _| Ok(Value::from("...")))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        types
            .register(
                ClassDescriptor::builder("demo.Dog")
                    .extends("demo.Animal")
                    .field("breed", "string")
                    .constructor(&[], |_| Ok(Object::new("demo.Dog").into()))
                    .method("speak", &[], "string", |_, _| Ok(Value::from("woof")))
                    .method("fetch", &["string"], "void", |_, _| Ok(Value::Null))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        types
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut types = registry();
        let again = ClassDescriptor::builder("demo.Dog").build().unwrap();
        assert!(matches!(types.register(again), Err(WireError::DuplicateName { .. })));
    }

    #[test]
    fn test_distance() {
        let types = registry();
        assert_eq!(types.distance("demo.Dog", &TypeRef::named("demo.Dog")), Some(0));
        assert_eq!(types.distance("demo.Dog", &TypeRef::named("demo.Animal")), Some(1));
        assert_eq!(types.distance("demo.Dog", &TypeRef::object()), Some(OBJECT_DISTANCE));
        assert_eq!(types.distance("demo.Animal", &TypeRef::named("demo.Dog")), None);
        assert_eq!(types.distance("int", &TypeRef::named("float")), Some(1));
        assert_eq!(types.distance("list", &TypeRef::parse("list<int>").unwrap()), Some(0));
        assert_eq!(types.distance("list", &TypeRef::parse("set<int>").unwrap()), None);
    }

    #[test]
    fn test_null_distance() {
        let types = registry();
        assert_eq!(types.value_distance(&Value::Null, &TypeRef::named("demo.Dog")), Some(0));
        assert_eq!(types.value_distance(&Value::Null, &TypeRef::named("int")), None);
    }

    #[test]
    fn test_inherited_members() {
        let types = registry();
        let methods = types.methods("demo.Dog");
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[0].declaring_type(), "demo.Dog");

        assert!(types.field("demo.Dog", "name").is_some());
        assert_eq!(types.fields("demo.Dog").len(), 2);
        assert_eq!(types.ancestors("demo.Dog"), vec!["demo.Dog", "demo.Animal"]);
    }
}
