use wirebox::builder::{Builder, Factory, Scope};
use wirebox::core::WireError;
use wirebox::element::Element;
use wirebox::value::Value;

use super::demo_context;

fn service(name: &str) -> Builder {
    Builder::new(name, "demo.Service").with_scope(Scope::Prototype)
}

#[test]
fn test_unindexed_and_indexed_elements_select_two_arg_overload() {
    let context = demo_context();
    context
        .register(
            service("svc")
                .with_call_arg("configure", Element::literal("a"))
                .with_element(Element::literal("b").for_executable("configure").at(1)),
        )
        .unwrap();

    let svc = context.build("svc").unwrap();
    assert_eq!(svc.field("mode"), Some(Value::from("pair:a+b")));
}

#[test]
fn test_unindexed_literal_and_indexed_reference_form_one_call() {
    let context = demo_context();
    let suffix =
        Builder::new("suffix", "string").with_factory(Factory::of_type("demo.Text", "label"));
    context.register(suffix).unwrap();
    context
        .register(
            service("svc")
                .with_call_arg("configure", Element::literal("head"))
                .with_element(Element::reference("suffix").for_executable("configure").at(1)),
        )
        .unwrap();

    let svc = context.build("svc").unwrap();
    assert_eq!(svc.field("mode"), Some(Value::from("pair:head+tail")));
}

#[test]
fn test_single_argument_selects_one_arg_overload() {
    let context = demo_context();
    context.register(service("svc").with_call_arg("configure", Element::literal("solo"))).unwrap();

    let svc = context.build("svc").unwrap();
    assert_eq!(svc.field("mode"), Some(Value::from("single:solo")));
}

#[test]
fn test_reclaimed_index_starts_a_second_invocation() {
    let context = demo_context();
    context
        .register(
            service("svc")
                .with_element(Element::literal("first").for_executable("configure").at(0))
                .with_element(Element::literal("second").for_executable("configure").at(0)),
        )
        .unwrap();

    let svc = context.build("svc").unwrap();
    assert_eq!(svc.field("mode"), Some(Value::from("single:second")));
}

#[test]
fn test_constructor_overload_follows_argument_count() {
    let context = demo_context();
    context.register(Builder::new("plain", "demo.Greeter")).unwrap();
    context
        .register(Builder::new("worded", "demo.Greeter").with_arg(Element::literal("hey")))
        .unwrap();

    assert_eq!(context.build("plain").unwrap().field("message"), None);
    assert_eq!(context.build("worded").unwrap().field("message"), Some(Value::from("hey")));
}

#[test]
fn test_literals_are_converted_to_destination_types() {
    let context = demo_context();
    context
        .register(
            service("svc")
                .with_field("refreshes", Element::literal("7"))
                .with_field("started", Element::literal("true"))
                .with_field("mode", Element::literal("${WIREBOX_UNSET_MODE}")),
        )
        .unwrap();

    let svc = context.build("svc").unwrap();
    assert_eq!(svc.field("refreshes"), Some(Value::Int(7)));
    assert_eq!(svc.field("started"), Some(Value::Bool(true)));
    assert_eq!(svc.field("mode"), Some(Value::from("${WIREBOX_UNSET_MODE}")));

    context.register(service("bad").with_field("refreshes", Element::literal("seven"))).unwrap();
    assert!(context.build("bad").unwrap_err().to_string().contains("Cannot assign"));
}

#[test]
fn test_no_fitting_overload_is_a_construction_error() {
    let context = demo_context();
    context
        .register(
            service("svc")
                .with_call_arg("configure", Element::literal("a"))
                .with_element(Element::literal("b").for_executable("configure").at(1))
                .with_element(Element::literal("c").for_executable("configure").at(2)),
        )
        .unwrap();

    let error = context.build("svc").unwrap_err();
    match error {
        WireError::FieldPopulation {
            failures, ..
        } => {
            assert_eq!(failures[0].field, "configure()");
            assert!(failures[0].error.to_string().contains("configure"));
        }
        other => panic!("expected a population failure, got {other}"),
    }
}
