//! Integration test suite for wirebox
//!
//! End-to-end tests that drive a [`Context`](wirebox::context::Context) through
//! its public API, using the demo type universe from `wirebox::test_utils`.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! RUST_LOG=wirebox=debug cargo test --test integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - **construction**: scopes, aliases, cycles and the end-to-end greeter
//! - **overloads**: argument grouping and overload selection
//! - **interception**: pointcut matching and proxy dispatch
//! - **lookup**: type lookups, ordering and collection aggregation
//! - **config**: TOML documents, placeholders and reload
//! - **lifecycle**: initialize, close and refresh

use wirebox::context::Context;
use wirebox::test_utils::{demo_types, init_test_logging};

mod config;
mod construction;
mod interception;
mod lifecycle;
mod lookup;
mod overloads;

/// A context over the demo types, with test logging enabled.
pub fn demo_context() -> Context {
    init_test_logging(None);
    Context::new(demo_types())
}
