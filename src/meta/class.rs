//! Class, executable and field descriptors.
//!
//! Descriptors are the load-time record of "what a type looks like": its
//! supertypes, constructors, methods and fields. The construction engine never
//! inspects host types directly; it only reads these records and calls the
//! invoker closures they carry.

use std::fmt;
use std::sync::Arc;

use crate::core::WireError;
use crate::meta::modifiers::Modifiers;
use crate::meta::type_ref::{self, TypeRef};
use crate::value::Value;

/// Name under which constructors are registered and matched.
pub const CONSTRUCTOR_NAME: &str = "new";

/// Closure that performs a call.
///
/// The first argument is the receiver; it is [`Value::Null`] for constructors and
/// static methods.
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// Whether an executable is a constructor or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutableKind {
    /// Produces a new instance of the declaring type.
    Constructor,
    /// Operates on an instance, or on the type when static.
    Method,
}

/// A constructor or method of a registered type.
pub struct Executable {
    kind: ExecutableKind,
    declaring_type: String,
    name: String,
    params: Vec<TypeRef>,
    return_type: TypeRef,
    modifiers: Modifiers,
    invoker: Invoker,
    signature: String,
}

impl Executable {
    /// Create a constructor descriptor.
    pub fn constructor(
        declaring_type: impl Into<String>,
        params: Vec<TypeRef>,
        modifiers: Modifiers,
        invoker: Invoker,
    ) -> Self {
        let declaring_type = declaring_type.into();
        let return_type = TypeRef::named(declaring_type.clone());
        Self::new(
            ExecutableKind::Constructor,
            declaring_type,
            CONSTRUCTOR_NAME.to_string(),
            params,
            return_type,
            modifiers,
            invoker,
        )
    }

    /// Create a method descriptor.
    pub fn method(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        params: Vec<TypeRef>,
        return_type: TypeRef,
        modifiers: Modifiers,
        invoker: Invoker,
    ) -> Self {
        Self::new(
            ExecutableKind::Method,
            declaring_type.into(),
            name.into(),
            params,
            return_type,
            modifiers,
            invoker,
        )
    }

    fn new(
        kind: ExecutableKind,
        declaring_type: String,
        name: String,
        params: Vec<TypeRef>,
        return_type: TypeRef,
        modifiers: Modifiers,
        invoker: Invoker,
    ) -> Self {
        let signature = format!(
            "{declaring_type}.{name}({})",
            params.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        );
        Self {
            kind,
            declaring_type,
            name,
            params,
            return_type,
            modifiers,
            invoker,
            signature,
        }
    }

    /// Constructor or method.
    pub fn kind(&self) -> ExecutableKind {
        self.kind
    }

    /// Whether this is a constructor.
    pub fn is_constructor(&self) -> bool {
        self.kind == ExecutableKind::Constructor
    }

    /// Whether this method belongs to the type rather than an instance.
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }

    /// The type that declares this executable.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// The executable name; `new` for constructors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types.
    pub fn params(&self) -> &[TypeRef] {
        &self.params
    }

    /// Declared return type; the declaring type for constructors.
    pub fn return_type(&self) -> &TypeRef {
        &self.return_type
    }

    /// Declaration modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Identity of this executable, e.g. `demo.Greeter.greet(string)`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Signature without the declaring type, used to detect overrides.
    pub fn local_signature(&self) -> &str {
        &self.signature[self.declaring_type.len() + 1..]
    }

    /// Call the executable.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> anyhow::Result<Value> {
        (self.invoker)(receiver, args)
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executable")
            .field("signature", &self.signature)
            .field("return_type", &self.return_type)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

impl fmt::Display for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature)
    }
}

/// A field declared on a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type.
    pub field_type: TypeRef,
    /// Declaration modifiers. Population ignores visibility.
    pub modifiers: Modifiers,
}

/// Everything the engine knows about one registered type.
#[derive(Debug)]
pub struct ClassDescriptor {
    name: String,
    supertypes: Vec<String>,
    modifiers: Modifiers,
    constructors: Vec<Arc<Executable>>,
    methods: Vec<Arc<Executable>>,
    fields: Vec<FieldDescriptor>,
}

impl ClassDescriptor {
    /// Start describing a type.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct supertypes (superclass and implemented interfaces).
    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// Type modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Declared constructors in declaration order.
    pub fn constructors(&self) -> &[Arc<Executable>] {
        &self.constructors
    }

    /// Methods declared directly on this type.
    pub fn methods(&self) -> &[Arc<Executable>] {
        &self.methods
    }

    /// Fields declared directly on this type.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }
}

struct PendingExecutable {
    kind: ExecutableKind,
    name: String,
    params: Vec<String>,
    return_type: String,
    modifiers: Modifiers,
    invoker: Invoker,
}

/// Fluent builder for [`ClassDescriptor`].
///
/// Type strings are parsed when [`ClassBuilder::build`] runs, so every mistake in
/// a description surfaces as one error.
///
/// # Examples
///
/// ```rust,no_run
/// use wirebox::meta::ClassDescriptor;
/// use wirebox::value::{Object, Value};
///
/// let greeter = ClassDescriptor::builder("demo.Greeter")
///     .field("message", "string")
///     .constructor(&[], |_| Ok(Object::new("demo.Greeter").into()))
///     .method("greet", &[], "string", |this, _| {
///         let message = this.field("message").unwrap_or_default();
///         Ok(Value::from(format!("{} world", message.as_str().unwrap_or(""))))
///     })
///     .build()?;
/// # Ok::<(), wirebox::core::WireError>(())
/// ```
pub struct ClassBuilder {
    name: String,
    supertypes: Vec<String>,
    modifiers: Modifiers,
    executables: Vec<PendingExecutable>,
    fields: Vec<(Modifiers, String, String)>,
}

impl ClassBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            modifiers: Modifiers::PUBLIC,
            executables: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Declare a direct supertype.
    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.supertypes.push(supertype.into());
        self
    }

    /// Replace the type modifiers (default `public`).
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Declare a public field.
    pub fn field(self, name: &str, field_type: &str) -> Self {
        self.field_with(Modifiers::PUBLIC, name, field_type)
    }

    /// Declare a field with explicit modifiers.
    pub fn field_with(mut self, modifiers: Modifiers, name: &str, field_type: &str) -> Self {
        self.fields.push((modifiers, name.to_string(), field_type.to_string()));
        self
    }

    /// Declare a public constructor.
    pub fn constructor<F>(self, params: &[&str], f: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.constructor_with(Modifiers::PUBLIC, params, f)
    }

    /// Declare a constructor with explicit modifiers.
    pub fn constructor_with<F>(mut self, modifiers: Modifiers, params: &[&str], f: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let return_type = self.name.clone();
        self.executables.push(PendingExecutable {
            kind: ExecutableKind::Constructor,
            name: CONSTRUCTOR_NAME.to_string(),
            params: params.iter().map(ToString::to_string).collect(),
            return_type,
            modifiers,
            invoker: Arc::new(move |_receiver, args| f(args)),
        });
        self
    }

    /// Declare a public instance method.
    pub fn method<F>(self, name: &str, params: &[&str], return_type: &str, f: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.method_with(Modifiers::PUBLIC, name, params, return_type, f)
    }

    /// Declare a method with explicit modifiers.
    pub fn method_with<F>(
        mut self,
        modifiers: Modifiers,
        name: &str,
        params: &[&str],
        return_type: &str,
        f: F,
    ) -> Self
    where
        F: Fn(&Value, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.executables.push(PendingExecutable {
            kind: ExecutableKind::Method,
            name: name.to_string(),
            params: params.iter().map(ToString::to_string).collect(),
            return_type: return_type.to_string(),
            modifiers,
            invoker: Arc::new(f),
        });
        self
    }

    /// Declare a public static method, typically a factory.
    pub fn static_method<F>(self, name: &str, params: &[&str], return_type: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.method_with(
            Modifiers::PUBLIC | Modifiers::STATIC,
            name,
            params,
            return_type,
            move |_receiver, args| f(args),
        )
    }

    /// Parse every type string and produce the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidTypeRef`] for the first malformed type string.
    pub fn build(self) -> Result<ClassDescriptor, WireError> {
        let mut constructors = Vec::new();
        let mut methods = Vec::new();

        for pending in self.executables {
            let params = pending
                .params
                .iter()
                .map(|p| TypeRef::parse(p))
                .collect::<Result<Vec<_>, _>>()?;
            match pending.kind {
                ExecutableKind::Constructor => {
                    constructors.push(Arc::new(Executable::constructor(
                        self.name.clone(),
                        params,
                        pending.modifiers,
                        pending.invoker,
                    )));
                }
                ExecutableKind::Method => {
                    let return_type = if pending.return_type.trim().is_empty() {
                        TypeRef::named(type_ref::VOID)
                    } else {
                        TypeRef::parse(&pending.return_type)?
                    };
                    methods.push(Arc::new(Executable::method(
                        self.name.clone(),
                        pending.name,
                        params,
                        return_type,
                        pending.modifiers,
                        pending.invoker,
                    )));
                }
            }
        }

        let fields = self
            .fields
            .into_iter()
            .map(|(modifiers, name, field_type)| {
                Ok(FieldDescriptor {
                    name,
                    field_type: TypeRef::parse(&field_type)?,
                    modifiers,
                })
            })
            .collect::<Result<Vec<_>, WireError>>()?;

        Ok(ClassDescriptor {
            name: self.name,
            supertypes: self.supertypes,
            modifiers: self.modifiers,
            constructors,
            methods,
            fields,
        })
    }
}
