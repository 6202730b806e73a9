//! A handler that remembers what it intercepted.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::aspect::{Invocation, InvocationHandler};
use crate::value::Value;

/// Records the name of every intercepted method.
///
/// By default the call proceeds to the target; [`RecordingHandler::returning`]
/// answers every call with a fixed value instead. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<String>>>,
    sentinel: Option<Value>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call with `sentinel` without reaching the target.
    pub fn returning(sentinel: impl Into<Value>) -> Self {
        Self {
            calls: Arc::default(),
            sentinel: Some(sentinel.into()),
        }
    }

    /// Method names in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl InvocationHandler for RecordingHandler {
    fn invoke(&self, invocation: &Invocation) -> anyhow::Result<Value> {
        self.calls.lock().push(invocation.method_name().to_string());
        match &self.sentinel {
            Some(sentinel) => Ok(sentinel.clone()),
            None => invocation.proceed(),
        }
    }
}
