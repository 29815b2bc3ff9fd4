//! Benchmark utilities.

#![warn(missing_docs)]

use rand::Rng;
use recordkit_adapter::MemoryAdapter;
use recordkit_core::{Model, Property, PropertyKind, Record, Schema, Value};
use std::sync::Arc;

/// Generate a random lowercase name of the given length.
pub fn random_name(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// Generate `count` person records with random names and ages.
pub fn random_people(count: usize) -> Vec<Record> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| {
            let mut record = Record::new();
            record.insert("name".to_string(), Value::Text(random_name(12)));
            record.insert("age".to_string(), Value::Integer(rng.gen_range(0..100)));
            record.insert("married".to_string(), Value::Bool(rng.gen()));
            record
        })
        .collect()
}

/// Define a `Person` model over a fresh in-memory adapter.
pub fn person_model() -> Model {
    let schema = Schema::new(Arc::new(MemoryAdapter::new()));
    schema.define(
        "Person",
        vec![
            Property::new("name", PropertyKind::String),
            Property::new("age", PropertyKind::Number),
            Property::new("married", PropertyKind::Boolean).default_value(false),
        ],
    )
}

/// Build a runtime for async benchmarks.
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
}
