//! A small type universe shared by unit and integration tests.
//!
//! - `demo.Greeter`: `message: string`, `printer: demo.Printer`, constructors
//!   `new()` and `new(string)`, `greet()`
//! - `demo.Printer`: `print(string) -> string`
//! - `demo.Node`: `peer: demo.Node`, `label: string`, `new()`, `new(demo.Node)`
//! - `demo.Service`: `configure(string)`, `configure(string,string)`, `start()`,
//!   `refresh()`, `close()` and the failing `fail()`
//! - `demo.Text`: static factories `of(string)` and `label() -> string`
//! - `demo.Plugin` with subtypes `demo.AlphaPlugin` and `demo.BetaPlugin`
//! - `demo.Host`: `plugins: list<demo.Plugin>`, `by_name: map<string,demo.Plugin>`,
//!   `primary: demo.Plugin`
//! - `demo.Shout`: an object whose payload is an upper-casing handler, and
//!   `demo.Handlers.shout()`, a static factory producing the same handler
//! - `pkg.Type`: `angry()`, `angry(string)`, `angryNow()`, private `angry(int)`,
//!   `calm()`
//! - `pkg.TypeB`: `one()`, `two(int)`

use anyhow::anyhow;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use crate::aspect::{HandlerRef, Invocation, handler_value};
use crate::core::WireError;
use crate::meta::{ClassDescriptor, Modifiers, TypeRegistry};
use crate::value::{Object, ObjectRef, Value};

static CLOSE_SEQUENCE: AtomicI64 = AtomicI64::new(0);

fn this(receiver: &Value) -> anyhow::Result<&ObjectRef> {
    receiver.as_object().ok_or_else(|| anyhow!("receiver is not an object"))
}

fn text_arg(args: &[Value], index: usize) -> String {
    args.get(index).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn shout() -> impl Fn(&Invocation) -> anyhow::Result<Value> + Send + Sync + 'static {
    |call: &Invocation| -> anyhow::Result<Value> {
        let result = call.proceed()?;
        Ok(match result.as_str() {
            Some(text) => Value::from(text.to_uppercase()),
            None => result,
        })
    }
}

fn register(types: &mut TypeRegistry, class: Result<ClassDescriptor, WireError>) {
    let class = class.unwrap_or_else(|e| panic!("demo type is malformed: {e}"));
    types.register(class).unwrap_or_else(|e| panic!("demo type registered twice: {e}"));
}

/// The demo type universe.
pub fn demo_types() -> TypeRegistry {
    let mut types = TypeRegistry::new();

    register(
        &mut types,
        ClassDescriptor::builder("demo.Printer")
            .constructor(&[], |_| Ok(Object::new("demo.Printer").into()))
            .method("print", &["string"], "string", |_, args| {
                Ok(Value::from(format!("printed: {}", text_arg(args, 0))))
            })
            .build(),
    );

    register(
        &mut types,
        ClassDescriptor::builder("demo.Greeter")
            .field("message", "string")
            .field("printer", "demo.Printer")
            .constructor(&[], |_| Ok(Object::new("demo.Greeter").into()))
            .constructor(&["string"], |args| {
                let greeter = Object::new("demo.Greeter");
                greeter.set_field("message", args[0].clone());
                Ok(greeter.into())
            })
            .method("greet", &[], "string", |receiver, _| {
                let message = this(receiver)?.field("message").unwrap_or_default();
                Ok(Value::from(format!("{}!", message.as_str().unwrap_or_default())))
            })
            .build(),
    );

    register(
        &mut types,
        ClassDescriptor::builder("demo.Node")
            .field("peer", "demo.Node")
            .field("label", "string")
            .constructor(&[], |_| Ok(Object::new("demo.Node").into()))
            .constructor(&["demo.Node"], |args| {
                let node = Object::new("demo.Node");
                node.set_field("peer", args[0].clone());
                Ok(node.into())
            })
            .build(),
    );

    register(
        &mut types,
        ClassDescriptor::builder("demo.Service")
            .field("mode", "string")
            .field("started", "bool")
            .field("refreshes", "int")
            .field("closed", "bool")
            .field("closed_at", "int")
            .constructor(&[], |_| Ok(Object::new("demo.Service").into()))
            .method("configure", &["string"], "void", |receiver, args| {
                let mode = format!("single:{}", text_arg(args, 0));
                this(receiver)?.set_field("mode", Value::from(mode));
                Ok(Value::Null)
            })
            .method("configure", &["string", "string"], "void", |receiver, args| {
                let mode = format!("pair:{}+{}", text_arg(args, 0), text_arg(args, 1));
                this(receiver)?.set_field("mode", Value::from(mode));
                Ok(Value::Null)
            })
            .method("start", &[], "void", |receiver, _| {
                this(receiver)?.set_field("started", Value::Bool(true));
                Ok(Value::Null)
            })
            .method("refresh", &[], "void", |receiver, _| {
                let service = this(receiver)?;
                let count = service.field("refreshes").and_then(|v| v.as_int()).unwrap_or(0);
                service.set_field("refreshes", Value::Int(count + 1));
                Ok(Value::Null)
            })
            .method("close", &[], "void", |receiver, _| {
                let service = this(receiver)?;
                service.set_field("closed", Value::Bool(true));
                let at = CLOSE_SEQUENCE.fetch_add(1, Ordering::SeqCst);
                service.set_field("closed_at", Value::Int(at));
                Ok(Value::Null)
            })
            .method("fail", &[], "void", |_, _| Err(anyhow!("service failure")))
            .build(),
    );

    register(
        &mut types,
        ClassDescriptor::builder("demo.Text")
            .field("text", "string")
            .static_method("of", &["string"], "demo.Text", |args| {
                let text = Object::new("demo.Text");
                text.set_field("text", Value::from(text_arg(args, 0)));
                Ok(text.into())
            })
            .static_method("label", &[], "string", |_| Ok(Value::from("tail")))
            .build(),
    );

    register(&mut types, ClassDescriptor::builder("demo.Plugin").build());
    for name in ["demo.AlphaPlugin", "demo.BetaPlugin"] {
        register(
            &mut types,
            ClassDescriptor::builder(name)
                .extends("demo.Plugin")
                .constructor(&[], move |_| Ok(Object::new(name).into()))
                .build(),
        );
    }
    register(
        &mut types,
        ClassDescriptor::builder("demo.Host")
            .field("plugins", "list<demo.Plugin>")
            .field("by_name", "map<string,demo.Plugin>")
            .field("primary", "demo.Plugin")
            .field("label", "string")
            .constructor(&[], |_| Ok(Object::new("demo.Host").into()))
            .build(),
    );

    register(
        &mut types,
        ClassDescriptor::builder("demo.Shout")
            .constructor(&[], |_| {
                let handler: HandlerRef = Arc::new(shout());
                Ok(Object::with_payload("demo.Shout", handler).into())
            })
            .build(),
    );
    register(
        &mut types,
        ClassDescriptor::builder("demo.Handlers")
            .static_method("shout", &[], crate::aspect::HANDLER_TYPE, |_| {
                Ok(handler_value(shout()))
            })
            .build(),
    );

    register(
        &mut types,
        ClassDescriptor::builder("pkg.Type")
            .field("last", "string")
            .constructor(&[], |_| Ok(Object::new("pkg.Type").into()))
            .method("angry", &[], "void", |receiver, _| {
                this(receiver)?.set_field("last", Value::from("angry"));
                Ok(Value::Null)
            })
            .method("angry", &["string"], "void", |receiver, args| {
                this(receiver)?.set_field("last", Value::from(text_arg(args, 0)));
                Ok(Value::Null)
            })
            .method("angryNow", &[], "void", |receiver, _| {
                this(receiver)?.set_field("last", Value::from("angryNow"));
                Ok(Value::Null)
            })
            .method_with(Modifiers::PRIVATE, "angry", &["int"], "void", |_, _| Ok(Value::Null))
            .method("calm", &[], "string", |_, _| Ok(Value::from("calm")))
            .build(),
    );

    register(
        &mut types,
        ClassDescriptor::builder("pkg.TypeB")
            .constructor(&[], |_| Ok(Object::new("pkg.TypeB").into()))
            .method("one", &[], "string", |_, _| Ok(Value::from("one")))
            .method("two", &["int"], "int", |_, args| {
                Ok(Value::Int(args.first().and_then(Value::as_int).unwrap_or(0) * 2))
            })
            .build(),
    );

    types
}

/// Register `name` with a no-argument constructor that counts its calls.
pub fn register_counting_type(types: &mut TypeRegistry, name: &str) -> Arc<AtomicUsize> {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counter);
    let owned = name.to_string();
    register(
        types,
        ClassDescriptor::builder(name)
            .constructor(&[], move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                std::thread::yield_now();
                Ok(Object::new(owned.clone()).into())
            })
            .build(),
    );
    counter
}

/// The upper-casing handler that `demo.Shout` and `demo.Handlers.shout()` carry.
pub fn shout_handler() -> HandlerRef {
    Arc::new(shout())
}
