//! Record identifier.

use recordkit_value::Value;
use std::fmt;

/// Identifier assigned to a record by its adapter.
///
/// Record IDs are:
/// - Unique within a model
/// - Immutable once assigned
/// - Ordered, so they provide a stable cursor for paging
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(u64);

impl RecordId {
    /// Creates a record ID from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Converts an attribute value back into an ID.
    ///
    /// Returns `None` unless the value is a non-negative integer.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        value
            .as_integer()
            .and_then(|n| u64::try_from(n).ok())
            .map(Self)
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<RecordId> for u64 {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl From<RecordId> for Value {
    #[allow(clippy::cast_possible_wrap)]
    fn from(id: RecordId) -> Self {
        Value::Integer(id.0 as i64)
    }
}
