//! Property-based test generators using proptest.
//!
//! Strategies produce data shaped for the `Person` fixture model, plus
//! arbitrary attribute values for tracker and codec properties.

use proptest::prelude::*;
use recordkit_core::{Record, Value};

/// Attributes of the `Person` fixture that tests may freely assign.
pub const PERSON_ATTRIBUTES: [&str; 4] = ["name", "gender", "married", "age"];

/// Strategy for scalar attribute values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(Value::Bytes),
    ]
}

/// Strategy for attribute values, nested up to a few levels.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for a person's name.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{0,11}").expect("Invalid regex")
}

/// Strategy for `Person` constructor data. Every attribute may be missing.
pub fn person_record_strategy() -> impl Strategy<Value = Record> {
    (
        prop::option::of(name_strategy()),
        prop::option::of(0i64..120),
        prop::option::of(any::<bool>()),
    )
        .prop_map(|(name, age, married)| {
            let mut record = Record::new();
            if let Some(name) = name {
                record.insert("name".to_string(), Value::Text(name));
            }
            if let Some(age) = age {
                record.insert("age".to_string(), Value::Integer(age));
            }
            if let Some(married) = married {
                record.insert("married".to_string(), Value::Bool(married));
            }
            record
        })
}

/// Strategy for a batch of `Person` constructor data.
pub fn person_batch_strategy(max_len: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(person_record_strategy(), 0..=max_len)
}

/// Strategy for a sequence of assignments to `Person` attributes.
pub fn assignments_strategy(max_len: usize) -> impl Strategy<Value = Vec<(&'static str, Value)>> {
    prop::collection::vec(
        (prop::sample::select(PERSON_ATTRIBUTES.to_vec()), scalar_value_strategy()),
        0..=max_len,
    )
}
