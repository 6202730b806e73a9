use wirebox::builder::{Builder, Scope};
use wirebox::context::REFRESH_METHOD;
use wirebox::core::WireError;
use wirebox::value::Value;

use super::demo_context;

fn service(name: &str) -> Builder {
    Builder::new(name, "demo.Service").with_destroy_method("close")
}

#[test]
fn test_initialize_builds_dependencies_first() {
    let context = demo_context();
    let web = service("web").with_auto_init(true).with_init_method("start");
    context.register(web.with_depends_on("cache")).unwrap();
    context.register(service("cache").with_depends_on("store")).unwrap();
    context.register(service("store")).unwrap();
    context.register(service("idle")).unwrap();
    context
        .register(service("proto").with_scope(Scope::Prototype).with_auto_init(true))
        .unwrap();

    context.initialize().unwrap();
    assert!(context.singleton("store").is_some());
    assert!(context.singleton("cache").is_some());
    assert_eq!(context.singleton("web").unwrap().field("started"), Some(Value::Bool(true)));
    assert!(context.singleton("idle").is_none());
    assert!(context.singleton("proto").is_none());
}

#[test]
fn test_depends_on_cycle_is_reported() {
    let context = demo_context();
    context.register(service("a").with_depends_on("b")).unwrap();
    context.register(service("b").with_depends_on("c")).unwrap();
    context.register(service("c").with_depends_on("a")).unwrap();

    let error = context.initialize().unwrap_err();
    assert!(matches!(error, WireError::CircularDependency { .. }));
    assert!(error.to_string().starts_with("Circular dependency detected: "));
}

#[test]
fn test_close_runs_destroy_methods_newest_first() {
    let context = demo_context();
    context.register(service("older")).unwrap();
    context.register(service("newer").with_depends_on("older")).unwrap();

    let newer = context.build("newer").unwrap();
    let older = context.singleton("older").unwrap();
    context.close().unwrap();

    let newer_at = newer.field("closed_at").and_then(|v| v.as_int()).unwrap();
    let older_at = older.field("closed_at").and_then(|v| v.as_int()).unwrap();
    assert!(newer_at < older_at);
    assert!(context.singleton("newer").is_none());

    let rebuilt = context.build("newer").unwrap();
    assert!(!rebuilt.same_instance(&newer));
}

#[test]
fn test_failing_destroy_method_does_not_stop_close() {
    let context = demo_context();
    context.register(service("good")).unwrap();
    context.register(Builder::new("bad", "demo.Service").with_destroy_method("fail")).unwrap();
    let good = context.build("good").unwrap();
    context.build("bad").unwrap();

    let error = context.close().unwrap_err();
    assert!(matches!(error, WireError::InvocationFailed { .. }));
    assert_eq!(good.field("closed"), Some(Value::Bool(true)));
}

#[test]
fn test_refresh_preserves_only_refreshable_singletons() {
    let context = demo_context();
    context.register(service("svc")).unwrap();
    context.register(Builder::new("greeter", "demo.Greeter")).unwrap();
    context.register(service("retired")).unwrap();
    let svc = context.build("svc").unwrap();
    let greeter = context.build("greeter").unwrap();
    let retired = context.build("retired").unwrap();

    context
        .refresh(|staging| {
            staging.register(service("svc"))?;
            staging.register(Builder::new("greeter", "demo.Greeter"))?;
            Ok(())
        })
        .unwrap();

    assert_eq!(context.types().methods_named("demo.Service", REFRESH_METHOD).len(), 1);
    let kept = context.build("svc").unwrap();
    assert!(kept.same_instance(&svc));
    assert_eq!(kept.field("refreshes"), Some(Value::Int(1)));
    assert!(!context.build("greeter").unwrap().same_instance(&greeter));
    assert_eq!(retired.field("closed"), Some(Value::Bool(true)));
    assert_eq!(svc.field("closed"), None);
}

#[test]
fn test_refresh_is_visible_to_every_clone_and_rejects_reentry() {
    let context = demo_context();
    let clone = context.clone();
    context.register(Builder::new("printer", "demo.Printer")).unwrap();

    let nested = context.clone();
    context
        .refresh(move |staging| {
            assert!(matches!(nested.refresh(|_| Ok(())), Err(WireError::RefreshInProgress)));
            staging.register(Builder::new("greeter", "demo.Greeter"))?;
            Ok(())
        })
        .unwrap();

    assert!(clone.contains("greeter"));
    assert!(!clone.contains("printer"));
    context.refresh(|_| Ok(())).unwrap();
    assert!(clone.names().is_empty());
}
