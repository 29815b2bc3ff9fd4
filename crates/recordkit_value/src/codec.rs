//! CBOR encoding for records.
//!
//! Adapters that persist bytes (rather than live values) store records in
//! this form. Map keys are emitted in sorted order because records are
//! `BTreeMap`s, so identical records always encode to identical bytes.

use crate::error::{ValueError, ValueResult};
use crate::record::Record;

/// Encode a record to CBOR bytes.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn encode_record(record: &Record) -> ValueResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(record, &mut buf)
        .map_err(|e| ValueError::encoding_failed(format!("{e:?}")))?;
    Ok(buf)
}

/// Decode a record from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not a CBOR map of supported values.
pub fn decode_record(bytes: &[u8]) -> ValueResult<Record> {
    ciborium::from_reader(bytes).map_err(map_decode_error)
}

fn map_decode_error<E: std::fmt::Debug>(err: ciborium::de::Error<E>) -> ValueError {
    let message = match &err {
        ciborium::de::Error::Semantic(_, msg) => msg.clone(),
        other => format!("{other:?}"),
    };
    if message.contains("float values are not supported") {
        ValueError::FloatUnsupported
    } else if message.contains("integer overflow") {
        ValueError::IntegerOverflow
    } else {
        ValueError::decoding_failed(message)
    }
}
