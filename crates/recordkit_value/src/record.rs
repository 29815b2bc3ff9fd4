//! Attribute records.

use crate::value::Value;
use std::collections::BTreeMap;

/// An attribute record: attribute name to value, sorted by name.
pub type Record = BTreeMap<String, Value>;

/// Returns `base` with every entry of `overlay` written over it.
pub fn merge_over(mut base: Record, overlay: Record) -> Record {
    base.extend(overlay);
    base
}

/// Builds a [`Record`] from `key => value` pairs.
///
/// ```
/// use recordkit_value::{record, Value};
///
/// let r = record! { "name" => "Ann", "married" => false };
/// assert_eq!(r["married"], Value::Bool(false));
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(
            record.insert(::std::string::String::from($key), $crate::Value::from($value));
        )+
        record
    }};
}
