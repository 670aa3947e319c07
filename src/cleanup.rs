//! Deferred cleanup actions.
//!
//! A [`CleanupStack`] collects actions while a unit of work acquires
//! resources and runs them in reverse order when the work ends, whether it
//! returns normally, bails out with `?`, or unwinds. Actions registered with
//! [`CleanupStack::defer_on_failure`] are skipped once the owner calls
//! [`CleanupStack::succeed`].

use std::fmt;

struct Deferred {
    name: String,
    only_on_failure: bool,
    action: Box<dyn FnOnce()>,
}

pub struct CleanupStack {
    label: &'static str,
    actions: Vec<Deferred>,
    succeeded: bool,
}

impl CleanupStack {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            actions: Vec::new(),
            succeeded: false,
        }
    }

    /// Register an action that runs on every exit path.
    pub fn defer(&mut self, name: impl Into<String>, action: impl FnOnce() + 'static) {
        self.actions.push(Deferred {
            name: name.into(),
            only_on_failure: false,
            action: Box::new(action),
        });
    }

    /// Register an action that runs unless the work succeeded.
    pub fn defer_on_failure(&mut self, name: impl Into<String>, action: impl FnOnce() + 'static) {
        self.actions.push(Deferred {
            name: name.into(),
            only_on_failure: true,
            action: Box::new(action),
        });
    }

    pub fn succeed(&mut self) {
        self.succeeded = true;
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run all pending actions, last registered first. Later calls are no-ops.
    pub fn run(&mut self) {
        while let Some(deferred) = self.actions.pop() {
            if deferred.only_on_failure && self.succeeded {
                tracing::trace!(stack = self.label, action = %deferred.name, "Dropping failure-only cleanup");
                continue;
            }
            tracing::debug!(stack = self.label, action = %deferred.name, "Running cleanup");
            (deferred.action)();
        }
    }
}

impl Drop for CleanupStack {
    fn drop(&mut self) {
        self.run();
    }
}

impl fmt::Debug for CleanupStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.actions.iter().map(|d| d.name.as_str()).collect();
        f.debug_struct("CleanupStack")
            .field("label", &self.label)
            .field("pending", &names)
            .field("succeeded", &self.succeeded)
            .finish()
    }
}
