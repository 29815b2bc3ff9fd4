//! Adapter trait definition.

use crate::error::AdapterResult;
use crate::filter::Filter;
use crate::id::RecordId;
use async_trait::async_trait;
use recordkit_value::Record;

/// A record as returned by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// The record's id.
    pub id: RecordId,
    /// Stored attributes (never includes the id itself).
    pub data: Record,
}

impl StoredRecord {
    /// Creates a stored record.
    pub fn new(id: RecordId, data: Record) -> Self {
        Self { id, data }
    }
}

/// A storage adapter for RecordKit models.
///
/// Adapters execute primitive requests against a concrete backend. They do
/// not validate, run hooks, or track changes; the runtime does all of that
/// before a request reaches the adapter.
///
/// # Invariants
///
/// - `create` returns a fresh id that `find`/`exists` observe afterwards
/// - `all` returns records ordered by the filter, ties broken by ascending id
/// - `all` honors `skip` and `limit` exactly, so repeated paged calls over
///   unchanged data never repeat or skip a record
/// - Adapters must be `Send + Sync` for shared access
///
/// # Implementors
///
/// - [`super::MemoryAdapter`] - For testing
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short adapter name, used in logs.
    fn name(&self) -> &'static str;

    /// Stores a new record and returns its id.
    async fn create(&self, model: &str, data: Record) -> AdapterResult<RecordId>;

    /// Replaces the stored record with `data`.
    async fn save(&self, model: &str, id: RecordId, data: Record) -> AdapterResult<()>;

    /// Writes the given attributes over the stored record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record has this id.
    async fn update_attributes(&self, model: &str, id: RecordId, data: Record)
        -> AdapterResult<()>;

    /// Removes a record. Removing a missing record is not an error.
    async fn destroy(&self, model: &str, id: RecordId) -> AdapterResult<()>;

    /// Removes every record matching the filter's conditions.
    async fn destroy_all(&self, model: &str, filter: &Filter) -> AdapterResult<()>;

    /// Checks whether a record exists.
    async fn exists(&self, model: &str, id: RecordId) -> AdapterResult<bool>;

    /// Fetches one record by id.
    async fn find(&self, model: &str, id: RecordId) -> AdapterResult<Option<StoredRecord>>;

    /// Fetches the ordered, windowed set of matching records.
    async fn all(&self, model: &str, filter: &Filter) -> AdapterResult<Vec<StoredRecord>>;

    /// Counts matching records, ignoring the filter's window.
    async fn count(&self, model: &str, filter: &Filter) -> AdapterResult<usize>;
}
