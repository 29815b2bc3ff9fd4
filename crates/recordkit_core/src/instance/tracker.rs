//! Dirty-state bookkeeping for one instance.

use recordkit_value::{Record, Value};
use std::collections::BTreeSet;

static NULL: Value = Value::Null;

/// Current attribute values alongside the last-persisted baseline.
///
/// An attribute missing from either side reads as null, so setting an
/// absent attribute to null is not a change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeTracker {
    current: Record,
    original: Record,
}

impl AttributeTracker {
    /// Creates a tracker whose baseline equals `data`.
    pub fn new(data: Record) -> Self {
        Self {
            original: data.clone(),
            current: data,
        }
    }

    /// Returns the current value of an attribute.
    pub fn get(&self, name: &str) -> &Value {
        self.current.get(name).unwrap_or(&NULL)
    }

    /// Sets the current value of an attribute.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.current.insert(name.into(), value);
    }

    /// Returns all current values.
    pub fn current(&self) -> &Record {
        &self.current
    }

    /// Returns the baseline value of an attribute.
    pub fn was(&self, name: &str) -> &Value {
        self.original.get(name).unwrap_or(&NULL)
    }

    /// Returns true if the attribute differs from its baseline.
    pub fn property_changed(&self, name: &str) -> bool {
        self.get(name) != self.was(name)
    }

    /// Names of every attribute that differs from its baseline.
    pub fn changed(&self) -> BTreeSet<String> {
        self.current
            .keys()
            .chain(self.original.keys())
            .filter(|name| self.property_changed(name))
            .cloned()
            .collect()
    }

    /// Makes the current values the new baseline.
    pub fn commit(&mut self) {
        self.original = self.current.clone();
    }

    /// Discards pending changes.
    pub fn reset(&mut self) {
        self.current = self.original.clone();
    }
}
