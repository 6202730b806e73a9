//! Test utilities for wirebox
//!
//! Compiled for the crate's own tests and, behind the `test-utils` feature, for
//! the integration suites under `tests/`.
//!
//! - [`init_test_logging`] installs a `tracing` subscriber once per process
//! - [`demo_types`] is a small type universe covering constructors, factories,
//!   overloads, inheritance and lifecycle methods
//! - [`RecordingHandler`] records intercepted calls
//!
//! # Example
//!
//! ```rust,no_run
//! use wirebox::builder::Builder;
//! use wirebox::context::Context;
//! use wirebox::test_utils::{demo_types, init_test_logging};
//!
//! init_test_logging(None);
//! let context = Context::new(demo_types());
//! context.register(Builder::new("printer", "demo.Printer")).unwrap();
//! assert!(context.build("printer").is_ok());
//! ```

pub mod fixtures;
pub mod recording;

pub use fixtures::{demo_types, register_counting_type, shout_handler};
pub use recording::RecordingHandler;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. With `level` set, that level is used;
/// otherwise `RUST_LOG` is honoured, and without either nothing is installed.
///
/// ```bash
/// RUST_LOG=wirebox=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(true)
            .try_init();
    });
}
