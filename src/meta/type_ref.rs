//! Type references.
//!
//! A [`TypeRef`] names a type in the registry or one of the builtin container
//! shapes. The text form is what configuration files and pointcut patterns use:
//!
//! | text            | meaning                          |
//! |-----------------|----------------------------------|
//! | `demo.Greeter`  | a registered class               |
//! | `string`        | builtin scalar                   |
//! | `list<T>`       | ordered sequence of `T`          |
//! | `set<T>`        | ordered, deduplicated set of `T` |
//! | `map<K,V>`      | ordered key/value pairs          |
//! | `T[]`           | array of `T`                     |
//!
//! Bare `list`, `set` and `map` default their element types to `object`.

use std::fmt;
use std::str::FromStr;

use crate::core::WireError;

/// Root type every value is assignable to.
pub const OBJECT: &str = "object";
/// Builtin string scalar.
pub const STRING: &str = "string";
/// Builtin 64-bit integer scalar.
pub const INT: &str = "int";
/// Builtin 64-bit float scalar.
pub const FLOAT: &str = "float";
/// Builtin boolean scalar.
pub const BOOL: &str = "bool";
/// Runtime type name of list values.
pub const LIST: &str = "list";
/// Runtime type name of set values.
pub const SET: &str = "set";
/// Runtime type name of map values.
pub const MAP: &str = "map";
/// Runtime type name of array values.
pub const ARRAY: &str = "array";
/// Pseudo type name reported for `null`.
pub const NULL: &str = "null";
/// The return type of executables that produce nothing.
pub const VOID: &str = "void";

/// Whether `name` is one of the builtin scalar types.
pub fn is_scalar(name: &str) -> bool {
    matches!(name, STRING | INT | FLOAT | BOOL)
}

/// Whether `name` is a scalar that cannot hold `null`.
pub fn is_primitive(name: &str) -> bool {
    matches!(name, INT | FLOAT | BOOL)
}

/// A reference to a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A scalar, `object`, `void` or a registered class.
    Named(String),
    /// `list<T>`
    List(Box<TypeRef>),
    /// `set<T>`
    Set(Box<TypeRef>),
    /// `map<K,V>`
    Map(Box<TypeRef>, Box<TypeRef>),
    /// `T[]`
    Array(Box<TypeRef>),
}

impl TypeRef {
    /// A named type.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// The `object` root type.
    pub fn object() -> Self {
        Self::named(OBJECT)
    }

    /// `list<element>`
    pub fn list_of(element: TypeRef) -> Self {
        Self::List(Box::new(element))
    }

    /// `set<element>`
    pub fn set_of(element: TypeRef) -> Self {
        Self::Set(Box::new(element))
    }

    /// `element[]`
    pub fn array_of(element: TypeRef) -> Self {
        Self::Array(Box::new(element))
    }

    /// `map<key,value>`
    pub fn map_of(key: TypeRef, value: TypeRef) -> Self {
        Self::Map(Box::new(key), Box::new(value))
    }

    /// Parse the text form.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidTypeRef`] for empty names, unbalanced angle
    /// brackets or a `map` without exactly two type arguments.
    pub fn parse(text: &str) -> Result<Self, WireError> {
        let trimmed = text.trim();
        let invalid = |reason: &str| WireError::InvalidTypeRef {
            text: text.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid("empty type name"));
        }

        if let Some(element) = trimmed.strip_suffix("[]") {
            return Ok(Self::array_of(Self::parse(element)?));
        }

        if let Some(open) = trimmed.find('<') {
            if !trimmed.ends_with('>') {
                return Err(invalid("missing closing '>'"));
            }
            let head = trimmed[..open].trim();
            let inner = &trimmed[open + 1..trimmed.len() - 1];
            let args = split_type_args(inner).ok_or_else(|| invalid("unbalanced '<' '>'"))?;
            return match (head, args.as_slice()) {
                (LIST, [element]) => Ok(Self::list_of(Self::parse(element)?)),
                (SET, [element]) => Ok(Self::set_of(Self::parse(element)?)),
                (MAP, [key, value]) => Ok(Self::map_of(Self::parse(key)?, Self::parse(value)?)),
                (MAP, _) => Err(invalid("map takes exactly two type arguments")),
                (LIST | SET, _) => Err(invalid("collections take exactly one type argument")),
                _ => Err(invalid("only list, set and map take type arguments")),
            };
        }

        if trimmed.contains(['>', ',', ' ']) {
            return Err(invalid("unexpected character in type name"));
        }

        Ok(match trimmed {
            LIST => Self::list_of(Self::object()),
            SET => Self::set_of(Self::object()),
            MAP => Self::map_of(Self::object(), Self::object()),
            name => Self::named(name),
        })
    }

    /// The element type of a list, set or array.
    pub fn element_type(&self) -> Option<&TypeRef> {
        match self {
            Self::List(element) | Self::Set(element) | Self::Array(element) => Some(element),
            _ => None,
        }
    }

    /// The name of a [`TypeRef::Named`] type.
    pub fn as_named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is a builtin scalar.
    pub fn is_scalar(&self) -> bool {
        self.as_named().is_some_and(is_scalar)
    }

    /// The runtime type name of values of this type, e.g. `list` for `list<int>`.
    pub fn runtime_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(_) => LIST,
            Self::Set(_) => SET,
            Self::Map(..) => MAP,
            Self::Array(_) => ARRAY,
        }
    }
}

/// Split `a, map<b,c>, d` at top-level commas.
fn split_type_args(inner: &str) -> Option<Vec<&str>> {
    let mut depth = 0i32;
    let mut start = 0;
    let mut parts = Vec::new();
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            ',' if depth == 0 => {
                parts.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(inner[start..].trim());
    Some(parts)
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(element) => write!(f, "list<{element}>"),
            Self::Set(element) => write!(f, "set<{element}>"),
            Self::Map(key, value) => write!(f, "map<{key},{value}>"),
            Self::Array(element) => write!(f, "{element}[]"),
        }
    }
}

impl FromStr for TypeRef {
    type Err = WireError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for TypeRef {
    /// Infallible conversion for literal names; malformed text becomes a plain name.
    fn from(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|_| Self::named(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_scalars() {
        assert_eq!(TypeRef::parse("demo.Greeter").unwrap(), TypeRef::named("demo.Greeter"));
        assert!(TypeRef::parse("string").unwrap().is_scalar());
        assert!(!TypeRef::parse("object").unwrap().is_scalar());
    }

    #[test]
    fn test_parse_containers() {
        assert_eq!(
            TypeRef::parse("list<demo.Plugin>").unwrap(),
            TypeRef::list_of(TypeRef::named("demo.Plugin"))
        );
        assert_eq!(
            TypeRef::parse("map<string, list<int>>").unwrap(),
            TypeRef::map_of(TypeRef::named("string"), TypeRef::list_of(TypeRef::named("int")))
        );
        assert_eq!(TypeRef::parse("int[]").unwrap(), TypeRef::array_of(TypeRef::named("int")));
        assert_eq!(TypeRef::parse("set").unwrap(), TypeRef::set_of(TypeRef::object()));
    }

    #[test]
    fn test_display_matches_parse() {
        for text in ["demo.A", "list<demo.A>", "map<string,int>", "string[]", "set<list<int>>"] {
            assert_eq!(TypeRef::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("list<int").is_err());
        assert!(TypeRef::parse("map<int>").is_err());
        assert!(TypeRef::parse("demo.A<int>").is_err());
        assert!(TypeRef::parse("a b").is_err());
    }

    #[test]
    fn test_runtime_name() {
        assert_eq!(TypeRef::parse("list<int>").unwrap().runtime_name(), LIST);
        assert_eq!(TypeRef::parse("int[]").unwrap().runtime_name(), ARRAY);
        assert_eq!(TypeRef::parse("demo.A").unwrap().runtime_name(), "demo.A");
    }
}
