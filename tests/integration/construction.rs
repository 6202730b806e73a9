use wirebox::builder::{Builder, Scope};
use wirebox::core::WireError;
use wirebox::element::Element;
use wirebox::value::Value;

use super::demo_context;

#[test]
fn test_greeter_end_to_end() {
    let context = demo_context();
    context.register(Builder::new("printer", "demo.Printer")).unwrap();
    context
        .register(
            Builder::new("greeter", "demo.Greeter")
                .with_arg(Element::literal("hello"))
                .with_field("printer", Element::reference("printer")),
        )
        .unwrap();

    let greeter = context.build("greeter").unwrap();
    assert_eq!(context.invoke(&greeter, "greet", &[]).unwrap(), Value::from("hello!"));

    let printer = greeter.field("printer").unwrap();
    assert!(printer.same_instance(&context.build("printer").unwrap()));
    let printed = context.invoke(&printer, "print", &[Value::from("x")]).unwrap();
    assert_eq!(printed, Value::from("printed: x"));
}

#[test]
fn test_singleton_identity_and_prototype_distinctness() {
    let context = demo_context();
    context.register(Builder::new("single", "demo.Greeter").with_alias("one")).unwrap();
    context
        .register(Builder::new("many", "demo.Greeter").with_scope(Scope::Prototype))
        .unwrap();

    let first = context.build("single").unwrap();
    assert!(first.same_instance(&context.build("single").unwrap()));
    assert!(first.same_instance(&context.build("one").unwrap()));

    let a = context.build("many").unwrap();
    let b = context.build("many").unwrap();
    assert!(!a.same_instance(&b));
}

#[test]
fn test_singleton_field_cycle_is_tolerated() {
    let context = demo_context();
    context
        .register(
            Builder::new("left", "demo.Node")
                .with_field("peer", Element::reference("right"))
                .with_field("label", Element::literal("L")),
        )
        .unwrap();
    context
        .register(Builder::new("right", "demo.Node").with_field("peer", Element::reference("left")))
        .unwrap();

    let left = context.build("left").unwrap();
    let right = left.field("peer").unwrap();
    assert!(right.field("peer").unwrap().same_instance(&left));
    assert_eq!(right.field("peer").unwrap().field("label"), Some(Value::from("L")));
}

#[test]
fn test_prototype_cycle_fails_with_path() {
    let context = demo_context();
    for (name, peer) in [("a", "b"), ("b", "a")] {
        context
            .register(
                Builder::new(name, "demo.Node")
                    .with_scope(Scope::Prototype)
                    .with_field("peer", Element::reference(peer)),
            )
            .unwrap();
    }

    let error = context.build("a").unwrap_err();
    assert!(error.to_string().contains("Circular dependency detected: a → b → a"));

    // Nothing stays on the build path after a failure.
    context
        .register(Builder::new("c", "demo.Node").with_field("label", Element::literal("ok")))
        .unwrap();
    assert_eq!(context.build("c").unwrap().field("label"), Some(Value::from("ok")));
}

#[test]
fn test_alias_resolution_is_idempotent_and_names_unique() {
    let context = demo_context();
    context.register(Builder::new("printer", "demo.Printer")).unwrap();
    context.register_alias("out", "printer").unwrap();

    assert!(matches!(
        context.register_alias("out", "printer"),
        Err(WireError::DuplicateName { .. })
    ));
    assert_eq!(context.canonical_name("out").unwrap(), "printer");
    assert!(context.build("out").unwrap().same_instance(&context.build("printer").unwrap()));
}

#[test]
fn test_duplicate_registration_is_atomic() {
    let context = demo_context();
    context.register(Builder::new("printer", "demo.Printer").with_alias("p")).unwrap();

    let clash = Builder::new("greeter", "demo.Greeter").with_alias("hello").with_alias("p");
    assert!(matches!(context.register(clash), Err(WireError::DuplicateName { .. })));
    assert!(!context.contains("greeter"));
    assert!(!context.contains("hello"));

    context.register(Builder::new("hello", "demo.Greeter")).unwrap();
    assert_eq!(context.names(), vec!["printer", "hello"]);
}

#[test]
fn test_unknown_field_and_type_mismatch_are_collected() {
    let context = demo_context();
    context
        .register(
            Builder::new("greeter", "demo.Greeter")
                .with_field("colour", Element::literal("red"))
                .with_field("printer", Element::literal("not a printer")),
        )
        .unwrap();

    match context.build("greeter").unwrap_err() {
        WireError::FieldPopulation {
            builder,
            failures,
        } => {
            assert_eq!(builder, "greeter");
            assert_eq!(failures.len(), 2);
            assert!(matches!(*failures[0].error, WireError::UnknownField { .. }));
        }
        other => panic!("expected a population failure, got {other}"),
    }
    assert!(context.singleton("greeter").is_none());
}

#[test]
fn test_inner_builder_and_static_factory() {
    let context = demo_context();
    context
        .register(
            Builder::new("greeter", "demo.Greeter")
                .with_field("printer", Element::inner(Builder::new("", "demo.Printer"))),
        )
        .unwrap();
    context
        .register(
            Builder::new("text", "demo.Text")
                .with_factory(wirebox::builder::Factory::of_type("demo.Text", "of"))
                .with_arg(Element::literal("made")),
        )
        .unwrap();

    let greeter = context.build("greeter").unwrap();
    assert_eq!(greeter.field("printer").unwrap().type_name(), "demo.Printer");
    assert_eq!(context.build("text").unwrap().field("text"), Some(Value::from("made")));
    assert_eq!(context.names(), vec!["greeter", "text"]);
}

#[test]
fn test_greeter_field_literal_singleton() {
    let context = demo_context();
    let greeter = Builder::new("greeter", "demo.Greeter");
    context.register(greeter.with_field("message", Element::literal("hi"))).unwrap();

    let greeter = context.build("greeter").unwrap();
    assert_eq!(greeter.field("message"), Some(Value::from("hi")));
    assert!(greeter.same_instance(&context.build("greeter").unwrap()));
}
