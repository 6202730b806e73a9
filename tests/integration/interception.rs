use std::sync::Arc;

use wirebox::aspect::{AspectProcessor, HandlerRef, Invocation, PointCut};
use wirebox::builder::Builder;
use wirebox::element::Element;
use wirebox::test_utils::{RecordingHandler, shout_handler};
use wirebox::value::Value;

use super::demo_context;

#[test]
fn test_public_void_pattern_selects_matching_overloads() {
    let context = demo_context();
    let recorder = RecordingHandler::new();
    let handler: HandlerRef = Arc::new(recorder.clone());
    context.add_processor(AspectProcessor::new().with_pointcut(
        PointCut::parse("public void pkg.Type.angry(..)").unwrap().with_handler(handler),
    ));
    let registered = context.register(Builder::new("typed", "pkg.Type")).unwrap();

    let bound: Vec<&str> = registered.interceptions().keys().map(String::as_str).collect();
    assert!(bound.contains(&"pkg.Type.angry()"));
    assert!(bound.contains(&"pkg.Type.angry(string)"));
    assert!(!bound.contains(&"pkg.Type.angry(int)"));
    assert!(!bound.contains(&"pkg.Type.angryNow()"));
    assert!(!bound.contains(&"pkg.Type.calm()"));

    let typed = context.build("typed").unwrap();
    context.invoke(&typed, "angry", &[]).unwrap();
    context.invoke(&typed, "angry", &[Value::from("loud")]).unwrap();
    context.invoke(&typed, "angryNow", &[]).unwrap();
    assert_eq!(context.invoke(&typed, "calm", &[]).unwrap(), Value::from("calm"));

    assert_eq!(recorder.calls(), vec!["angry", "angry"]);
    assert_eq!(typed.field("last"), Some(Value::from("angryNow")));
}

#[test]
fn test_whole_type_pointcut_answers_every_call() {
    let context = demo_context();
    let recorder = RecordingHandler::returning("sentinel");
    let handler: HandlerRef = Arc::new(recorder.clone());
    let pointcut = PointCut::parse("pkg.TypeB").unwrap().with_handler(handler);
    context.add_processor(AspectProcessor::new().with_pointcut(pointcut));
    context.register(Builder::new("b", "pkg.TypeB")).unwrap();

    let b = context.build("b").unwrap();
    assert!(b.as_object().unwrap().is_proxy());
    assert!(recorder.calls().is_empty());
    assert_eq!(context.invoke(&b, "one", &[]).unwrap(), Value::from("sentinel"));
    assert_eq!(context.invoke(&b, "two", &[Value::Int(2)]).unwrap(), Value::from("sentinel"));
    assert_eq!(recorder.calls(), vec!["one", "two"]);
}

#[test]
fn test_handler_from_builder_and_from_type() {
    let context = demo_context();
    let by_builder =
        PointCut::parse("* demo.Printer.print(string)").unwrap().with_handler_builder("shout");
    let by_type = PointCut::parse("* pkg.Type.calm()").unwrap().with_handler_type("demo.Shout");
    context.add_processor(
        AspectProcessor::new().with_pointcut(by_builder).with_pointcut(by_type),
    );
    context.register(Builder::new("shout", "demo.Shout")).unwrap();
    context.register(Builder::new("printer", "demo.Printer")).unwrap();
    context.register(Builder::new("typed", "pkg.Type")).unwrap();

    let printer = context.build("printer").unwrap();
    let printed = context.invoke(&printer, "print", &[Value::from("x")]).unwrap();
    assert_eq!(printed, Value::from("PRINTED: X"));

    let typed = context.build("typed").unwrap();
    assert_eq!(context.invoke(&typed, "calm", &[]).unwrap(), Value::from("CALM"));
}

#[test]
fn test_proxied_singleton_is_injected_as_proxy() {
    let context = demo_context();
    context.add_processor(
        AspectProcessor::new()
            .with_pointcut(PointCut::parse("demo.Printer").unwrap().with_handler(shout_handler())),
    );
    context.register(Builder::new("printer", "demo.Printer")).unwrap();
    context
        .register(
            Builder::new("greeter", "demo.Greeter")
                .with_field("printer", Element::reference("printer")),
        )
        .unwrap();

    let greeter = context.build("greeter").unwrap();
    let printer = greeter.field("printer").unwrap();
    assert!(printer.as_object().unwrap().is_proxy());
    assert!(printer.same_instance(&context.build("printer").unwrap()));
    let printed = context.invoke(&printer, "print", &[Value::from("y")]).unwrap();
    assert_eq!(printed, Value::from("PRINTED: Y"));
}

#[test]
fn test_handler_errors_reach_the_caller_unchanged() {
    let context = demo_context();
    let failing: HandlerRef = Arc::new(|_: &Invocation| -> anyhow::Result<Value> {
        Err(anyhow::anyhow!("handler refused"))
    });
    let pointcut = PointCut::parse("* pkg.TypeB.one()").unwrap().with_handler(failing);
    context.add_processor(AspectProcessor::new().with_pointcut(pointcut));
    context.register(Builder::new("b", "pkg.TypeB")).unwrap();

    let b = context.build("b").unwrap();
    let error = context.invoke(&b, "one", &[]).unwrap_err();
    assert_eq!(error.to_string(), "handler refused");
    assert_eq!(context.invoke(&b, "two", &[Value::Int(4)]).unwrap(), Value::Int(8));
}

#[test]
fn test_interception_starts_after_population() {
    let context = demo_context();
    let recorder = RecordingHandler::returning("intercepted");
    let handler: HandlerRef = Arc::new(recorder.clone());
    context.add_processor(
        AspectProcessor::new()
            .with_pointcut(
                PointCut::parse("* demo.Service.configure(..)").unwrap().with_handler(handler),
            )
            .with_pointcut(
                PointCut::parse("* demo.Service.start()")
                    .unwrap()
                    .with_handler(shout_handler()),
            ),
    );
    context
        .register(
            Builder::new("svc", "demo.Service")
                .with_call_arg("configure", Element::literal("solo"))
                .with_init_method("start"),
        )
        .unwrap();

    let svc = context.build("svc").unwrap();
    assert!(svc.as_object().unwrap().is_proxy());
    assert_eq!(svc.field("mode"), Some(Value::from("single:solo")));
    assert_eq!(svc.field("started"), Some(Value::Bool(true)));
    assert!(recorder.calls().is_empty());

    let answer = context.invoke(&svc, "configure", &[Value::from("later")]).unwrap();
    assert_eq!(answer, Value::from("intercepted"));
    assert_eq!(recorder.calls(), vec!["configure"]);
    assert_eq!(svc.field("mode"), Some(Value::from("single:solo")));
}

#[test]
fn test_handler_builder_matched_by_its_own_pointcut() {
    for handler_first in [false, true] {
        let context = demo_context();
        context.add_processor(
            AspectProcessor::new()
                .with_pointcut(PointCut::parse("*").unwrap().with_handler_builder("h")),
        );
        context.register(Builder::new("h", "demo.Shout")).unwrap();
        context.register(Builder::new("printer", "demo.Printer")).unwrap();

        if handler_first {
            let h = context.build("h").unwrap();
            assert!(!h.as_object().unwrap().is_proxy());
        }
        let printer = context.build("printer").unwrap();
        assert!(printer.as_object().unwrap().is_proxy());
        let printed = context.invoke(&printer, "print", &[Value::from("z")]).unwrap();
        assert_eq!(printed, Value::from("PRINTED: Z"));
        assert!(!context.build("h").unwrap().as_object().unwrap().is_proxy());
    }
}
