//! Change-listener registry and fan-out.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

/// A change callback. Receives the new value of the property.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Ordered callbacks keyed by property name.
///
/// Registration order is invocation order. The registry lock is released
/// before any callback runs, so a callback may register further listeners or
/// write to the store that owns this registry.
#[derive(Default)]
pub struct Listeners {
    by_name: Mutex<HashMap<String, Vec<Listener>>>,
}

impl Listeners {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `callback` to the list for `name`.
    ///
    /// The name does not need to have a value yet.
    pub fn on_change<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.by_name
            .lock()
            .entry(name.into())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Number of callbacks registered for `name`.
    pub fn count(&self, name: &str) -> usize {
        self.by_name.lock().get(name).map_or(0, Vec::len)
    }

    /// Names with at least one callback, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_name.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Invoke every callback for `name` with `value`, in registration order.
    ///
    /// A panicking callback is caught and the remaining callbacks still run.
    /// Returns the number of callbacks that panicked.
    ///
    /// Catching happens after the process panic hook has run, so the default
    /// hook still prints the panic to stderr even with debug output off. The
    /// hook belongs to the host; one that wants silence installs its own
    /// with [`std::panic::set_hook`].
    pub fn emit(&self, name: &str, value: &Value) -> usize {
        let callbacks = match self.by_name.lock().get(name) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut faults = 0;
        for callback in &callbacks {
            if panic::catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                faults += 1;
            }
        }
        faults
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<String, usize> = self
            .by_name
            .lock()
            .iter()
            .map(|(name, list)| (name.clone(), list.len()))
            .collect();
        f.debug_struct("Listeners").field("counts", &counts).finish()
    }
}
