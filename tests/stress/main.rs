//! Stress tests for concurrent builds.
//!
//! ```bash
//! cargo test --test stress
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use wirebox::builder::{Builder, Scope};
use wirebox::context::Context;
use wirebox::element::Element;
use wirebox::test_utils::{demo_types, init_test_logging, register_counting_type};
use wirebox::value::Value;

const THREADS: usize = 16;
const ROUNDS: usize = 50;

fn counted_context(types: usize) -> (Context, Vec<Arc<AtomicUsize>>) {
    init_test_logging(None);
    let mut registry = demo_types();
    let counters: Vec<_> = (0..types)
        .map(|i| register_counting_type(&mut registry, &format!("stress.Counted{i}")))
        .collect();
    let context = Context::new(registry);
    for i in 0..types {
        context
            .register(Builder::new(format!("counted{i}"), format!("stress.Counted{i}").as_str()))
            .unwrap();
    }
    (context, counters)
}

#[test]
fn test_concurrent_first_access_constructs_each_singleton_once() {
    let (context, counters) = counted_context(8);

    let instances: Vec<Vec<Value>> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    (0..counters.len())
                        .map(|i| context.build(&format!("counted{i}")).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for counter in &counters {
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
    for per_thread in &instances {
        for (i, instance) in per_thread.iter().enumerate() {
            assert!(instance.same_instance(&instances[0][i]));
        }
    }
}

#[test]
fn test_concurrent_cycles_resolve_to_one_graph() {
    init_test_logging(None);
    let context = Context::new(demo_types());
    context
        .register(Builder::new("ping", "demo.Node").with_field("peer", Element::reference("pong")))
        .unwrap();
    context
        .register(Builder::new("pong", "demo.Node").with_field("peer", Element::reference("ping")))
        .unwrap();

    let results: Vec<(Value, Value)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let context = &context;
                scope.spawn(move || {
                    let (first, second) =
                        if i % 2 == 0 { ("ping", "pong") } else { ("pong", "ping") };
                    (context.build(first).unwrap(), context.build(second).unwrap())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let ping = context.build("ping").unwrap();
    let pong = context.build("pong").unwrap();
    assert!(ping.field("peer").unwrap().same_instance(&pong));
    assert!(pong.field("peer").unwrap().same_instance(&ping));
    for (first, second) in results {
        assert!(first.same_instance(&ping) || first.same_instance(&pong));
        assert!(second.same_instance(&ping) || second.same_instance(&pong));
    }
}

#[test]
fn test_prototypes_under_contention_are_all_distinct() {
    let (context, counters) = counted_context(1);
    context
        .register(Builder::new("fresh", "stress.Counted0").with_scope(Scope::Prototype))
        .unwrap();

    let built: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    (0..ROUNDS).map(|_| context.build("fresh").unwrap()).collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(counters[0].load(Ordering::SeqCst), THREADS * ROUNDS);
    assert!(!built[0].same_instance(&built[1]));
}
