//! # RecordKit Value
//!
//! Dynamic attribute values and record encoding for RecordKit.
//!
//! Model instances hold their attributes as a [`Record`]: an ordered map
//! from attribute name to [`Value`]. Values compare by deep equality,
//! which is what dirty-tracking relies on.
//!
//! ## Rules
//!
//! - Map keys are attribute names and are always kept sorted
//! - Integers are signed 64-bit
//! - No floats (equality must be total and deterministic)
//!
//! ## Usage
//!
//! ```
//! use recordkit_value::{decode_record, encode_record, record, Value};
//!
//! let person = record! { "name" => "Anatoliy", "age" => 31 };
//! let bytes = encode_record(&person).unwrap();
//! let decoded = decode_record(&bytes).unwrap();
//!
//! assert_eq!(decoded.get("name"), Some(&Value::from("Anatoliy")));
//! assert_eq!(person, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod record;
mod value;

pub use codec::{decode_record, encode_record};
pub use error::{ValueError, ValueResult};
pub use record::{merge_over, Record};
pub use value::Value;
