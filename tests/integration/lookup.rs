use wirebox::builder::Builder;
use wirebox::element::Element;
use wirebox::meta::TypeRef;
use wirebox::value::Value;

use super::demo_context;

fn plugin_context() -> wirebox::context::Context {
    let context = demo_context();
    context.register(Builder::new("alpha", "demo.AlphaPlugin")).unwrap();
    context.register(Builder::new("beta", "demo.BetaPlugin").with_order(5)).unwrap();
    context.register(Builder::new("gamma", "demo.AlphaPlugin")).unwrap();
    context
}

fn names(values: &Value) -> Vec<String> {
    values
        .as_slice()
        .unwrap()
        .iter()
        .map(|value| value.type_name().to_string())
        .collect()
}

#[test]
fn test_type_lookup_prefers_order_then_registration() {
    let context = plugin_context();
    let plugin = TypeRef::named("demo.Plugin");

    let ordered: Vec<String> =
        context.builders_for_type(&plugin).iter().map(|b| b.name().to_string()).collect();
    assert_eq!(ordered, vec!["beta", "alpha", "gamma"]);
    assert_eq!(context.builder_for_type(&plugin).unwrap().name(), "beta");

    let alpha = TypeRef::named("demo.AlphaPlugin");
    assert_eq!(context.builder_for_type(&alpha).unwrap().name(), "alpha");
    assert!(context.build_type(&alpha).unwrap().same_instance(&context.build("alpha").unwrap()));
}

#[test]
fn test_collection_fields_aggregate_by_type() {
    let context = plugin_context();
    context
        .register(
            Builder::new("host", "demo.Host")
                .with_field("plugins", Element::by_type("list<demo.Plugin>"))
                .with_field("by_name", Element::by_type("map<string,demo.Plugin>"))
                .with_field("primary", Element::empty()),
        )
        .unwrap();

    let host = context.build("host").unwrap();
    let plugins = host.field("plugins").unwrap();
    assert_eq!(names(&plugins), vec!["demo.BetaPlugin", "demo.AlphaPlugin", "demo.AlphaPlugin"]);
    assert!(plugins.as_slice().unwrap()[0].same_instance(&context.build("beta").unwrap()));

    let by_name = host.field("by_name").unwrap();
    let gamma = by_name.get(&Value::from("gamma")).unwrap();
    assert!(gamma.same_instance(&context.build("gamma").unwrap()));
    assert_eq!(by_name.as_map().unwrap().len(), 3);

    let primary = host.field("primary").unwrap();
    assert!(primary.same_instance(&context.build("beta").unwrap()));
}

#[test]
fn test_auto_wired_fields_skip_declared_and_scalar_fields() {
    let context = plugin_context();
    context
        .register(
            Builder::new("host", "demo.Host")
                .with_auto_wire_fields(true)
                .with_field("label", Element::literal("main")),
        )
        .unwrap();

    let host = context.build("host").unwrap();
    assert_eq!(host.field("label"), Some(Value::from("main")));
    assert_eq!(names(&host.field("plugins").unwrap()).len(), 3);
    assert_eq!(host.field("primary").unwrap().type_name(), "demo.BetaPlugin");
}

#[test]
fn test_empty_collection_lookup_leaves_field_unset() {
    let context = demo_context();
    context
        .register(
            Builder::new("host", "demo.Host")
                .with_field("plugins", Element::by_type("list<demo.Plugin>")),
        )
        .unwrap();

    let host = context.build("host").unwrap();
    assert_eq!(host.field("plugins"), None);
}
