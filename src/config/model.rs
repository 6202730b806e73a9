//! Serde model of a context configuration file.
//!
//! ```toml
//! [properties]
//! greeting = "hi"
//!
//! [[builder]]
//! name = "greeter"
//! type = "demo.Greeter"
//! aliases = ["hello"]
//!
//! [builder.fields]
//! message = "${greeting}"
//! printer = { ref = "printer" }
//!
//! [[builder]]
//! name = "service"
//! type = "demo.Service"
//! scope = "prototype"
//! init-method = "start"
//! calls = [{ method = "configure", args = ["fast", "safe"] }]
//!
//! [[aspect]]
//! pointcut = "public void pkg.Type.angry(..)"
//! handler-type = "demo.Shout"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::builder::Scope;

/// A whole configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ContextConfig {
    /// Values for `${name}` placeholders. Non-string values are used in their
    /// TOML text form.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, toml::Value>,

    /// Builders, registered in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub builder: Vec<BuilderConfig>,

    /// Pointcuts, in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aspect: Vec<AspectConfig>,
}

impl ContextConfig {
    /// Properties rendered as placeholder text.
    pub fn property_strings(&self) -> BTreeMap<String, String> {
        self.properties
            .iter()
            .map(|(name, value)| {
                let text = match value {
                    toml::Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (name.clone(), text)
            })
            .collect()
    }
}

/// One builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuilderConfig {
    /// Unique name; omitted for inner builders.
    #[serde(default)]
    pub name: String,

    /// Target type, in type reference syntax.
    #[serde(rename = "type")]
    pub type_name: String,

    #[serde(default)]
    pub scope: Scope,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Static or instance factory producing the target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factory: Option<FactoryConfig>,

    /// Pins the build executable to one overload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<ExecutableConfig>,

    /// Arguments of the build executable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ElementConfig>,

    /// Field values. Applied in key order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, ElementConfig>,

    /// Methods invoked after construction, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallConfig>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default)]
    pub auto_init: bool,

    #[serde(default)]
    pub auto_wire_fields: bool,

    #[serde(default)]
    pub auto_wire_executable: bool,

    #[serde(default)]
    pub order: i32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destroy_method: Option<String>,
}

/// Factory owner and method. Exactly one of `type` and `builder` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FactoryConfig {
    /// Type declaring a static factory method.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    /// Builder whose product declares an instance factory method.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,

    pub method: String,
}

/// An executable chosen by name and parameter types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ExecutableConfig {
    /// Method name; `new` or absent for a constructor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub params: Vec<String>,
}

/// A method invocation after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct CallConfig {
    pub method: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ElementConfig>,
}

/// An element: a bare scalar literal or a detailed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementConfig {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Boxed to keep the scalar variants small.
    Detailed(Box<ElementSpec>),
}

/// A detailed element. At most one source key may be set; none means an
/// empty element resolved by type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ElementSpec {
    /// Literal value of any TOML shape.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<toml::Value>,

    /// Name of the builder to build.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Type whose best builder is built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<Vec<ElementConfig>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<Vec<ElementConfig>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub array: Option<Vec<ElementConfig>>,

    /// String-keyed map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<BTreeMap<String, ElementConfig>>,

    /// Anonymous inner builder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder: Option<Box<BuilderConfig>>,

    /// Declared value type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,

    #[serde(default)]
    pub required: bool,

    /// Argument position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ElementSpec {
    /// Names of the source keys that are set.
    pub fn sources(&self) -> Vec<&'static str> {
        let mut sources = Vec::new();
        if self.value.is_some() {
            sources.push("value");
        }
        if self.reference.is_some() {
            sources.push("ref");
        }
        if self.by_type.is_some() {
            sources.push("by-type");
        }
        if self.list.is_some() {
            sources.push("list");
        }
        if self.set.is_some() {
            sources.push("set");
        }
        if self.array.is_some() {
            sources.push("array");
        }
        if self.map.is_some() {
            sources.push("map");
        }
        if self.builder.is_some() {
            sources.push("builder");
        }
        sources
    }
}

/// A pointcut and where its handler comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AspectConfig {
    /// Pattern; placeholders are substituted before parsing.
    pub pointcut: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_builder: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_type: Option<String>,
}
