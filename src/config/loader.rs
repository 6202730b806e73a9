//! Turning a [`ContextConfig`] into registered builders.
//!
//! Loading runs in three steps: properties become the context's placeholder
//! source, aspects become one [`AspectProcessor`] added before any builder is
//! registered, and builders are converted and registered in document order.
//!
//! Call arguments are indexed by their position in `args` unless they carry
//! an explicit `index`, so two calls of the same method stay two invocations.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::aspect::{AspectProcessor, PointCut};
use crate::builder::{Builder, Factory, FactoryOwner};
use crate::config::model::{
    AspectConfig, BuilderConfig, ContextConfig, ElementConfig, ElementSpec, ExecutableConfig,
};
use crate::config::parser::parse_context_config;
use crate::context::Context;
use crate::core::{Result, WireError};
use crate::element::Element;
use crate::meta::{CONSTRUCTOR_NAME, Executable, TypeRef};
use crate::procedure::element::MAX_PARAMETER_INDEX;
use crate::value::Value;

/// Loads configuration documents into a context.
///
/// ```rust,no_run
/// use wirebox::config::ConfigLoader;
/// use wirebox::context::Context;
/// use wirebox::meta::TypeRegistry;
///
/// # fn example(types: TypeRegistry) -> wirebox::core::Result<()> {
/// let context = Context::new(types);
/// ConfigLoader::new(&context).load_str(r#"
///     [[builder]]
///     name = "printer"
///     type = "demo.Printer"
/// "#)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigLoader<'a> {
    context: &'a Context,
}

impl<'a> ConfigLoader<'a> {
    /// A loader registering into `context`.
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
        }
    }

    /// Load a parsed document. Returns the number of builders registered.
    ///
    /// # Errors
    ///
    /// Fails on malformed pointcuts, type references and elements, on
    /// unresolvable explicit executables, and on registration failures. Builders
    /// registered before the failure stay registered.
    pub fn load(&self, config: &ContextConfig) -> Result<usize> {
        if !config.properties.is_empty() {
            self.context.set_properties(config.property_strings());
        }

        if !config.aspect.is_empty() {
            let mut processor = AspectProcessor::new();
            for aspect in &config.aspect {
                processor.add(self.pointcut(aspect)?);
            }
            self.context.add_processor(processor);
        }

        let document = document_types(&config.builder);
        for builder in &config.builder {
            let converted = self.convert(builder, &document)?;
            self.context.register(converted)?;
        }

        info!(
            "Loaded {} builder(s) and {} pointcut(s)",
            config.builder.len(),
            config.aspect.len()
        );
        Ok(config.builder.len())
    }

    /// Parse and load TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Toml`] for text that does not parse, otherwise as
    /// [`load`](Self::load).
    pub fn load_str(&self, text: &str) -> Result<usize> {
        let config: ContextConfig = toml::from_str(text)?;
        self.load(&config)
    }

    /// Read, parse and load a TOML file.
    ///
    /// # Errors
    ///
    /// Read and parse failures name the file; load failures are passed on.
    pub fn load_file(&self, path: &Path) -> anyhow::Result<usize> {
        let config = parse_context_config(path)?;
        debug!("Loading context configuration from {}", path.display());
        Ok(self.load(&config)?)
    }

    /// Convert one builder table without registering it.
    ///
    /// A factory builder is looked up among the registered builders.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load), minus registration failures.
    pub fn builder(&self, config: &BuilderConfig) -> Result<Builder> {
        self.convert(config, &HashMap::new())
    }

    fn pointcut(&self, aspect: &AspectConfig) -> Result<PointCut> {
        let pattern = self.context.substitute(&aspect.pointcut);
        let mut pointcut = PointCut::parse(&pattern)?;
        if let Some(name) = &aspect.handler_builder {
            pointcut = pointcut.with_handler_builder(name.as_str());
        }
        if let Some(type_name) = &aspect.handler_type {
            pointcut = pointcut.with_handler_type(type_name.as_str());
        }
        Ok(pointcut)
    }

    fn convert(&self, config: &BuilderConfig, document: &HashMap<&str, &str>) -> Result<Builder> {
        let type_ref = TypeRef::parse(&config.type_name)?;
        let mut builder = Builder::new(config.name.as_str(), type_ref)
            .with_scope(config.scope)
            .with_auto_init(config.auto_init)
            .with_auto_wire_fields(config.auto_wire_fields)
            .with_auto_wire_executable(config.auto_wire_executable)
            .with_order(config.order);

        for alias in &config.aliases {
            builder = builder.with_alias(alias.as_str());
        }
        for dependency in &config.depends_on {
            builder = builder.with_depends_on(dependency.as_str());
        }
        if let Some(method) = &config.init_method {
            builder = builder.with_init_method(method.as_str());
        }
        if let Some(method) = &config.destroy_method {
            builder = builder.with_destroy_method(method.as_str());
        }

        if let Some(factory) = &config.factory {
            let factory = match (&factory.type_name, &factory.builder) {
                (Some(owner), None) => Factory::of_type(owner.as_str(), factory.method.as_str()),
                (None, Some(owner)) => Factory::of_builder(owner.as_str(), factory.method.as_str()),
                _ => {
                    return Err(WireError::config(format!(
                        "Factory of builder '{}' must name exactly one of `type` and `builder`",
                        config.name
                    )));
                }
            };
            builder = builder.with_factory(factory);
        }

        if let Some(executable) = &config.executable {
            let executable = self.executable(&builder, executable, document)?;
            builder = builder.with_executable(executable);
        }

        for arg in &config.args {
            let (element, index) = self.element(arg, document)?;
            builder = match index {
                Some(index) => builder.with_arg_at(index, element),
                None => builder.with_arg(element),
            };
        }

        for (field, value) in &config.fields {
            let (element, _) = self.element(value, document)?;
            builder = builder.with_field(field.as_str(), element);
        }

        for call in &config.calls {
            if call.args.is_empty() {
                return Err(WireError::config(format!(
                    "Call of '{}' on builder '{}' has no arguments; use init-method instead",
                    call.method, config.name
                )));
            }
            for (position, arg) in call.args.iter().enumerate() {
                let (element, index) = self.element(arg, document)?;
                let element = element.for_executable(call.method.as_str());
                builder = builder.with_element(element.at(index.unwrap_or(position)));
            }
        }

        Ok(builder)
    }

    /// The executable pinned by `config`: a constructor of the builder type, or
    /// a method of the factory owner. Parameter types must match exactly.
    fn executable(
        &self,
        builder: &Builder,
        config: &ExecutableConfig,
        document: &HashMap<&str, &str>,
    ) -> Result<Arc<Executable>> {
        let params = config
            .params
            .iter()
            .map(|param| TypeRef::parse(param))
            .collect::<Result<Vec<_>>>()?;

        let (owner, name, candidates) = match builder.factory() {
            None => {
                let name = config.name.as_deref().unwrap_or(CONSTRUCTOR_NAME);
                if name != CONSTRUCTOR_NAME {
                    return Err(WireError::config(format!(
                        "Executable '{}' of builder '{}' needs a factory",
                        name,
                        builder.name()
                    )));
                }
                let owner = builder.type_name().to_string();
                let candidates = self.context.types().constructors(&owner);
                (owner, name.to_string(), candidates)
            }
            Some(factory) => {
                let owner = match &factory.owner {
                    FactoryOwner::Type(owner) => owner.clone(),
                    FactoryOwner::Builder(name) => {
                        match document.get(name.as_str()) {
                            Some(owner) => (*owner).to_string(),
                            None => self.context.builder(name)?.type_name().to_string(),
                        }
                    }
                };
                let name = config.name.clone().unwrap_or_else(|| factory.method.clone());
                let candidates = self.context.types().methods_named(&owner, &name);
                (owner, name, candidates)
            }
        };

        candidates
            .into_iter()
            .find(|candidate| candidate.params() == params.as_slice())
            .ok_or_else(|| WireError::NoMatchingExecutable {
                type_name: owner,
                name,
                args: config.params.join(","),
            })
    }

    /// Convert an element, returning its explicit index separately.
    fn element(
        &self,
        config: &ElementConfig,
        document: &HashMap<&str, &str>,
    ) -> Result<(Element, Option<usize>)> {
        let spec = match config {
            ElementConfig::Bool(value) => return Ok((Element::literal(*value), None)),
            ElementConfig::Int(value) => return Ok((Element::literal(*value), None)),
            ElementConfig::Float(value) => return Ok((Element::literal(*value), None)),
            ElementConfig::Str(value) => return Ok((Element::literal(value.as_str()), None)),
            ElementConfig::Detailed(spec) => spec,
        };
        if let Some(index) = spec.index.filter(|i| *i > MAX_PARAMETER_INDEX) {
            return Err(WireError::config(format!(
                "Element index {index} exceeds the limit of {MAX_PARAMETER_INDEX}"
            )));
        }
        Ok((self.detailed(spec, document)?, spec.index))
    }

    fn detailed(&self, spec: &ElementSpec, document: &HashMap<&str, &str>) -> Result<Element> {
        let sources = spec.sources();
        if sources.len() > 1 {
            return Err(WireError::config(format!(
                "Element declares more than one source: {}",
                sources.join(", ")
            )));
        }

        let mut element = if let Some(value) = &spec.value {
            Element::literal(literal(value))
        } else if let Some(name) = &spec.reference {
            Element::reference(name.as_str())
        } else if let Some(type_name) = &spec.by_type {
            Element::by_type(TypeRef::parse(type_name)?)
        } else if let Some(items) = &spec.list {
            Element::list(self.nested(items, document)?)
        } else if let Some(items) = &spec.set {
            Element::set(self.nested(items, document)?)
        } else if let Some(items) = &spec.array {
            Element::array(self.nested(items, document)?)
        } else if let Some(entries) = &spec.map {
            let mut converted = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let (value, _) = self.element(value, document)?;
                converted.push((Element::literal(key.as_str()), value));
            }
            Element::map(converted)
        } else if let Some(inner) = &spec.builder {
            Element::inner(self.convert(inner, document)?)
        } else {
            Element::empty()
        };

        if let Some(type_name) = &spec.declared_type {
            element = element.with_type(TypeRef::parse(type_name)?);
        }
        if spec.required {
            element = element.required();
        }
        Ok(element)
    }

    fn nested(
        &self,
        items: &[ElementConfig],
        document: &HashMap<&str, &str>,
    ) -> Result<Vec<Element>> {
        items.iter().map(|item| Ok(self.element(item, document)?.0)).collect()
    }
}

/// Replace the context's builders with those of the file at `path`.
///
/// Refreshable singletons survive as described on [`Context::refresh`].
///
/// # Errors
///
/// Read and parse failures leave the context untouched, as do load failures.
pub fn reload(context: &Context, path: &Path) -> anyhow::Result<()> {
    let config = parse_context_config(path)?;
    context.refresh(|staging| ConfigLoader::new(staging).load(&config).map(|_| ()))?;
    info!("Reloaded context from {}", path.display());
    Ok(())
}

/// Builder names and aliases declared in a document, mapped to their types.
fn document_types(builders: &[BuilderConfig]) -> HashMap<&str, &str> {
    let mut types = HashMap::new();
    for builder in builders {
        types.insert(builder.name.as_str(), builder.type_name.as_str());
        for alias in &builder.aliases {
            types.insert(alias.as_str(), builder.type_name.as_str());
        }
    }
    types
}

fn literal(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::from(text.as_str()),
        toml::Value::Integer(number) => Value::Int(*number),
        toml::Value::Float(number) => Value::Float(*number),
        toml::Value::Boolean(flag) => Value::Bool(*flag),
        toml::Value::Datetime(datetime) => Value::from(datetime.to_string()),
        toml::Value::Array(items) => Value::List(items.iter().map(literal).collect()),
        toml::Value::Table(table) => Value::map_of(
            table.iter().map(|(key, value)| (Value::from(key.as_str()), literal(value))),
        ),
    }
}
