//! Reactive property store.
//!
//! One flat mapping from name to [`Value`]. Every write is announced to the
//! listeners registered for that name. Outside the crate the only write is
//! [`set_external`](PropertyStore::set_external), which refuses protected
//! names; the unguarded writes belong to the router and the supervisor.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use uib_core::{DebugLog, LogKind, PropertyError, PropertyKey, is_protected, is_truthy};

use crate::listeners::Listeners;

/// Named property values plus their change listeners.
pub struct PropertyStore {
    values: RwLock<HashMap<String, Value>>,
    listeners: Listeners,
    log: Arc<DebugLog>,
}

impl PropertyStore {
    /// Create an empty store that reports through `log`.
    pub fn new(log: Arc<DebugLog>) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            listeners: Listeners::new(),
            log,
        }
    }

    /// Current value of `name`, if any.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.read().get(name).cloned()
    }

    /// Whether `name` currently has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    /// Truthiness of `name`; missing counts as false.
    pub fn flag(&self, name: &str) -> bool {
        self.values.read().get(name).is_some_and(is_truthy)
    }

    /// Current value of a counter property, 0 when unset or not a count.
    pub fn counter(&self, key: PropertyKey) -> u64 {
        self.values
            .read()
            .get(key.as_str())
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Write `value` unconditionally, then notify listeners of `name`.
    pub(crate) fn set_internal(&self, name: impl AsRef<str>, value: Value) {
        let name = name.as_ref();
        let _ = self.values.write().insert(name.to_owned(), value.clone());
        self.announce(name, &value);
    }

    /// Write `value` unless `name` is protected.
    ///
    /// A protected name is left untouched, no listener runs, and a warning
    /// goes through the debug gate.
    pub fn set_external(&self, name: &str, value: Value) -> Result<(), PropertyError> {
        if is_protected(name) {
            let err = PropertyError::Protected(name.to_owned());
            self.log.log(LogKind::Warn, format!("set: {err}"));
            return Err(err);
        }
        self.set_internal(name, value);
        Ok(())
    }

    /// Add one to a counter and notify its listeners. Returns the new count.
    ///
    /// The read and the write happen under one lock so concurrent callers
    /// never lose an increment.
    pub(crate) fn increment(&self, key: PropertyKey) -> u64 {
        let next = {
            let mut values = self.values.write();
            let next = values
                .get(key.as_str())
                .and_then(Value::as_u64)
                .unwrap_or(0)
                .saturating_add(1);
            let _ = values.insert(key.as_str().to_owned(), Value::from(next));
            next
        };
        self.announce(key.as_str(), &Value::from(next));
        next
    }

    /// Write without notifying anyone. Used for seeding and for `timerid`.
    pub(crate) fn write_quiet(&self, name: impl AsRef<str>, value: Value) {
        let _ = self.values.write().insert(name.as_ref().to_owned(), value);
    }

    /// Register a change callback for `name`.
    pub fn on_change<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.listeners.on_change(name, callback);
    }

    /// The listener registry.
    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    /// Every property as one JSON object, keys sorted.
    pub fn snapshot(&self) -> Map<String, Value> {
        let values = self.values.read();
        let mut names: Vec<&String> = values.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| (name.clone(), values[name].clone()))
            .collect()
    }

    fn announce(&self, name: &str, value: &Value) {
        self.log
            .log(LogKind::Log, format!("prop set - prop: {name}, val: {value}"));
        let faults = self.listeners.emit(name, value);
        if faults > 0 {
            self.log.log(
                LogKind::Error,
                format!("{faults} change listener(s) for {name} panicked"),
            );
        }
    }
}

impl std::fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("properties", &self.values.read().len())
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}
