//! Per-thread build paths.
//!
//! Every build pushes its canonical name onto the path of the calling thread
//! and pops it when the returned [`PathGuard`] is dropped. Entering a name that
//! is already on the path means the build re-entered itself on the same call
//! stack, which is reported as [`WireError::CircularDependency`].
//!
//! Singletons normally never get that far: a published provisional instance
//! short-circuits the second build. What remains are cycles through
//! constructor arguments, prototypes and `depends_on`.

use dashmap::DashMap;
use std::thread::{self, ThreadId};

use crate::core::error_builders::cycle_path;
use crate::core::{Result, WireError};

/// Build paths keyed by the thread that walks them.
#[derive(Debug, Default)]
pub(crate) struct BuildTracker {
    paths: DashMap<ThreadId, Vec<String>>,
}

impl BuildTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Push `name` onto the current thread's path.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::CircularDependency`] with the cycle, closed by
    /// `name`, when the name is already on the path.
    pub(crate) fn enter(&self, name: &str) -> Result<PathGuard<'_>> {
        let thread = thread::current().id();
        let mut path = self.paths.entry(thread).or_default();
        if let Some(start) = path.iter().position(|entered| entered == name) {
            let cycle = path[start..].iter().map(String::as_str).chain([name]);
            return Err(WireError::CircularDependency {
                path: cycle_path(cycle),
            });
        }
        path.push(name.to_string());
        Ok(PathGuard {
            tracker: self,
            thread,
        })
    }

    /// The names the current thread is building, outermost first.
    pub(crate) fn current(&self) -> Vec<String> {
        self.paths.get(&thread::current().id()).map(|path| path.clone()).unwrap_or_default()
    }

    fn leave(&self, thread: ThreadId) {
        let emptied = match self.paths.get_mut(&thread) {
            Some(mut path) => {
                path.pop();
                path.is_empty()
            }
            None => false,
        };
        if emptied {
            self.paths.remove_if(&thread, |_, path| path.is_empty());
        }
    }
}

/// Pops the entered name when dropped.
#[derive(Debug)]
pub(crate) struct PathGuard<'a> {
    tracker: &'a BuildTracker,
    thread: ThreadId,
}

impl Drop for PathGuard<'_> {
    fn drop(&mut self) {
        self.tracker.leave(self.thread);
    }
}
