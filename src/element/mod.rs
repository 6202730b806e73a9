//! Elements: resolvable value specifications.
//!
//! An [`Element`] describes one value a builder needs, either a constructor or
//! factory argument, a method-injection argument or a field. Its [`Slot`] says
//! where the value goes; its [`ElementSource`] says where it comes from.
//!
//! Resolution lives in [`resolve`](self::resolve) and follows a fixed priority:
//! memoized value, literal, nested structure, reference, then the compound
//! fallback for elements that produced nothing but know their type.

pub mod resolve;

pub use resolve::ResolveScope;

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::builder::Builder;
use crate::meta::{Executable, TypeRef};
use crate::value::Value;

/// The executable a parameter element belongs to.
#[derive(Debug, Clone)]
pub enum ExecutableRef {
    /// Whatever the owning builder constructs with: its explicit executable,
    /// its factory method, or a constructor.
    Build,
    /// Any executable with this name, resolved by overload selection.
    Named(String),
    /// One specific executable.
    Explicit(Arc<Executable>),
}

impl ExecutableRef {
    /// The executable name this reference selects, given the owner's build
    /// executable name.
    pub fn name<'a>(&'a self, build_name: &'a str) -> &'a str {
        match self {
            Self::Build => build_name,
            Self::Named(name) => name,
            Self::Explicit(executable) => executable.name(),
        }
    }

    /// Grouping key: the signature when the executable is known, otherwise the
    /// name.
    pub fn key(&self, build_name: &str) -> String {
        match self {
            Self::Explicit(executable) => executable.signature().to_string(),
            other => other.name(build_name).to_string(),
        }
    }
}

impl fmt::Display for ExecutableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build => write!(f, "<build>"),
            Self::Named(name) => write!(f, "{name}"),
            Self::Explicit(executable) => write!(f, "{}", executable.signature()),
        }
    }
}

/// Where a resolved element value goes.
#[derive(Debug, Clone)]
pub enum Slot {
    /// An argument of an executable, optionally at a fixed position.
    Parameter {
        /// The executable the argument belongs to
        executable: ExecutableRef,
        /// Zero-based position, or `None` to fill the next free position
        index: Option<usize>,
    },
    /// A field of the built instance.
    Field(String),
    /// A member of a nested list, set, array or map element.
    Nested,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parameter {
                executable,
                index: Some(index),
            } => write!(f, "parameter {index} of {executable}"),
            Self::Parameter {
                executable,
                index: None,
            } => write!(f, "parameter of {executable}"),
            Self::Field(name) => write!(f, "field '{name}'"),
            Self::Nested => write!(f, "nested value"),
        }
    }
}

/// Where an element's value comes from.
#[derive(Debug, Clone)]
pub enum ElementSource {
    /// Nothing declared; resolution falls back on the type.
    Empty,
    /// A literal value. Strings are placeholder-substituted.
    Literal(Value),
    /// Build the named builder.
    Reference(String),
    /// Build the best builder for a type, or collect builders for a collection type.
    TypeReference(TypeRef),
    /// A list of nested elements.
    List(Vec<Arc<Element>>),
    /// A set of nested elements.
    Set(Vec<Arc<Element>>),
    /// An array of nested elements.
    Array(Vec<Arc<Element>>),
    /// Key and value elements, resolved independently.
    Map(Vec<(Arc<Element>, Arc<Element>)>),
    /// An anonymous builder owned by this element.
    Inner(Arc<Builder>),
}

/// A resolvable value specification.
///
/// # Examples
///
/// ```rust,no_run
/// use wirebox::element::Element;
///
/// // First argument of the constructor, parsed as an int.
/// let port = Element::literal("8080").with_type("int");
/// // A field pointing at another builder.
/// let repo = Element::reference("repository");
/// // Every builder assignable to `demo.Plugin`.
/// let plugins = Element::by_type("list<demo.Plugin>");
/// # let _ = (port, repo, plugins);
/// ```
#[derive(Debug, Clone)]
pub struct Element {
    slot: Slot,
    declared_type: Option<TypeRef>,
    source: ElementSource,
    required: bool,
    resolved: OnceLock<Value>,
}

impl Element {
    /// An element with the given source, bound to the build executable.
    pub fn new(source: ElementSource) -> Self {
        Self {
            slot: Slot::Parameter {
                executable: ExecutableRef::Build,
                index: None,
            },
            declared_type: None,
            source,
            required: false,
            resolved: OnceLock::new(),
        }
    }

    /// An element with no source.
    pub fn empty() -> Self {
        Self::new(ElementSource::Empty)
    }

    /// A literal value.
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::new(ElementSource::Literal(value.into()))
    }

    /// A reference to a builder by name or alias.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(ElementSource::Reference(name.into()))
    }

    /// A reference to a builder by type.
    pub fn by_type(type_ref: impl Into<TypeRef>) -> Self {
        let type_ref = type_ref.into();
        Self::new(ElementSource::TypeReference(type_ref.clone())).with_type(type_ref)
    }

    /// A list of nested elements.
    pub fn list(items: impl IntoIterator<Item = Element>) -> Self {
        Self::new(ElementSource::List(nest(items)))
    }

    /// A set of nested elements.
    pub fn set(items: impl IntoIterator<Item = Element>) -> Self {
        Self::new(ElementSource::Set(nest(items)))
    }

    /// An array of nested elements.
    pub fn array(items: impl IntoIterator<Item = Element>) -> Self {
        Self::new(ElementSource::Array(nest(items)))
    }

    /// A map of nested key and value elements.
    pub fn map(entries: impl IntoIterator<Item = (Element, Element)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (Arc::new(key.nested()), Arc::new(value.nested())))
            .collect();
        Self::new(ElementSource::Map(entries))
    }

    /// An anonymous inner builder.
    pub fn inner(builder: Builder) -> Self {
        Self::new(ElementSource::Inner(Arc::new(builder)))
    }

    /// Bind to the next free argument of the named executable.
    pub fn for_executable(self, name: impl Into<String>) -> Self {
        self.with_slot(Slot::Parameter {
            executable: ExecutableRef::Named(name.into()),
            index: None,
        })
    }

    /// Bind to one argument of a specific executable.
    pub fn for_explicit(self, executable: Arc<Executable>, index: Option<usize>) -> Self {
        self.with_slot(Slot::Parameter {
            executable: ExecutableRef::Explicit(executable),
            index,
        })
    }

    /// Fix the argument position, keeping the executable.
    pub fn at(self, index: usize) -> Self {
        let executable = match &self.slot {
            Slot::Parameter { executable, .. } => executable.clone(),
            _ => ExecutableRef::Build,
        };
        self.with_slot(Slot::Parameter {
            executable,
            index: Some(index),
        })
    }

    /// Bind to a field.
    pub fn for_field(self, name: impl Into<String>) -> Self {
        self.with_slot(Slot::Field(name.into()))
    }

    /// Replace the slot.
    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    /// Declare the value type. Literals are converted to it.
    pub fn with_type(mut self, type_ref: impl Into<TypeRef>) -> Self {
        self.declared_type = Some(type_ref.into());
        self
    }

    /// Fail resolution when no value is produced.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn nested(self) -> Self {
        self.with_slot(Slot::Nested)
    }

    /// Where the value goes.
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// The declared value type.
    pub fn declared_type(&self) -> Option<&TypeRef> {
        self.declared_type.as_ref()
    }

    /// Where the value comes from.
    pub fn source(&self) -> &ElementSource {
        &self.source
    }

    /// Whether an absent value is an error.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The memoized value, once resolved for a singleton owner.
    pub fn resolved(&self) -> Option<&Value> {
        self.resolved.get()
    }

    /// The field name for field elements.
    pub fn field_name(&self) -> Option<&str> {
        match &self.slot {
            Slot::Field(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this element is an executable argument.
    pub fn is_parameter(&self) -> bool {
        matches!(self.slot, Slot::Parameter { .. })
    }

    /// The argument position, for parameter elements with a fixed one.
    pub fn index(&self) -> Option<usize> {
        match &self.slot {
            Slot::Parameter { index, .. } => *index,
            _ => None,
        }
    }
}

fn nest(items: impl IntoIterator<Item = Element>) -> Vec<Arc<Element>> {
    items.into_iter().map(|item| Arc::new(item.nested())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_builders() {
        let element = Element::literal("x").for_executable("configure").at(1);
        assert_eq!(element.index(), Some(1));
        assert_eq!(element.slot().to_string(), "parameter 1 of configure");

        let field = Element::reference("repo").for_field("repository");
        assert_eq!(field.field_name(), Some("repository"));
        assert!(!field.is_parameter());
    }

    #[test]
    fn test_executable_ref_keys() {
        assert_eq!(ExecutableRef::Build.key("new"), "new");
        assert_eq!(ExecutableRef::Build.key("create"), "create");
        assert_eq!(ExecutableRef::Named("setName".to_string()).key("new"), "setName");
    }

    #[test]
    fn test_by_type_declares_type() {
        let element = Element::by_type("list<demo.Plugin>");
        assert_eq!(element.declared_type().unwrap().to_string(), "list<demo.Plugin>");
        assert!(matches!(element.source(), ElementSource::TypeReference(_)));
    }

    #[test]
    fn test_nested_members_use_nested_slot() {
        let element = Element::list(vec![Element::literal(1), Element::literal(2)]);
        match element.source() {
            ElementSource::List(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(items[0].slot(), Slot::Nested));
            }
            other => panic!("unexpected source {other:?}"),
        }
    }
}
