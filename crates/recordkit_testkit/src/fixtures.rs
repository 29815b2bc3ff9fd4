//! Model fixtures and helpers.
//!
//! Provides a `Person` model mirroring the fields most tests need, bound
//! to a fresh in-memory adapter and a controllable clock.

use recordkit_adapter::MemoryAdapter;
use recordkit_core::{
    Clock, DefaultValue, Instance, Model, Property, PropertyKind, Record, Schema, Value,
};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Model name used by [`person_model`].
pub const PERSON: &str = "Person";

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    /// Creates a clock reading `millis`.
    pub fn new(millis: i64) -> Self {
        Self {
            now: AtomicI64::new(millis),
        }
    }

    /// Sets the current reading.
    pub fn set(&self, millis: i64) {
        self.now.store(millis, Ordering::SeqCst);
    }

    /// Moves the clock forward.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Properties of the `Person` test model.
///
/// `name` is stored as `full_name`, `age` is indexed, `married` defaults to
/// false and `createdAt` defaults to the clock's reading.
pub fn person_properties(clock: Arc<dyn Clock>) -> Vec<Property> {
    vec![
        Property::new("name", PropertyKind::String).column("full_name"),
        Property::new("gender", PropertyKind::String),
        Property::new("married", PropertyKind::Boolean).default_value(false),
        Property::new("age", PropertyKind::Number).index(),
        Property::new("dob", PropertyKind::Date),
        Property::new("createdAt", PropertyKind::Number)
            .default_from(DefaultValue::now(clock))
            .column("created_at"),
    ]
}

/// Defines the `Person` model on a schema.
pub fn person_model(schema: &Schema, clock: Arc<dyn Clock>) -> Model {
    schema.define(PERSON, person_properties(clock))
}

/// A `Person` model over its own in-memory adapter.
pub struct PersonFixture {
    /// The adapter, for direct inspection.
    pub adapter: Arc<MemoryAdapter>,
    /// The schema the model was defined on.
    pub schema: Schema,
    /// The `Person` model.
    pub person: Model,
    /// Clock behind `createdAt`.
    pub clock: Arc<FixedClock>,
}

impl PersonFixture {
    /// Start time of the fixture clock.
    pub const EPOCH: i64 = 1_700_000_000_000;

    /// Creates a fixture with the clock at [`PersonFixture::EPOCH`].
    pub fn new() -> Self {
        let adapter = Arc::new(MemoryAdapter::new());
        let schema = Schema::new(adapter.clone());
        let clock = Arc::new(FixedClock::new(Self::EPOCH));
        let person = person_model(&schema, clock.clone());
        Self {
            adapter,
            schema,
            person,
            clock,
        }
    }

    /// Number of stored people.
    pub fn stored(&self) -> usize {
        self.adapter.len(PERSON)
    }
}

impl Default for PersonFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Records `{ name: "Person <i>" }` for `i` in `0..n`.
pub fn named_people(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            let mut record = Record::new();
            record.insert("name".to_string(), Value::from(format!("Person {i}")));
            record
        })
        .collect()
}

/// Creates `n` named people and returns them.
///
/// # Panics
///
/// Panics if any create fails.
pub async fn seed_people(model: &Model, n: usize) -> Vec<Instance> {
    let outcome = model.create_many(named_people(n)).await;
    assert!(
        outcome.is_ok(),
        "seeding failed: {:?}",
        outcome.errors.iter().flatten().next()
    );
    outcome.instances
}
