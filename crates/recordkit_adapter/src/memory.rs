//! In-memory adapter for testing.

use crate::adapter::{Adapter, StoredRecord};
use crate::error::{AdapterError, AdapterResult};
use crate::filter::{Filter, ID_ATTRIBUTE};
use crate::id::RecordId;
use async_trait::async_trait;
use parking_lot::RwLock;
use recordkit_value::{decode_record, encode_record, Record};
use std::collections::{BTreeMap, HashMap};

/// Rows of one model. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    rows: BTreeMap<RecordId, Vec<u8>>,
}

impl Table {
    fn allocate(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId::new(self.next_id)
    }

    fn decode_matching(&self, filter: &Filter) -> AdapterResult<Vec<StoredRecord>> {
        let mut matching = Vec::new();
        for (id, bytes) in &self.rows {
            let data = decode_record(bytes)?;
            if filter.matches(*id, &data) {
                matching.push(StoredRecord::new(*id, data));
            }
        }
        Ok(matching)
    }

    /// Decodes only the rows inside the window. Valid when the filter has
    /// no conditions and no ordering, so id order is the result order.
    fn decode_window(&self, filter: &Filter) -> AdapterResult<Vec<StoredRecord>> {
        self.rows
            .iter()
            .skip(filter.skip)
            .take(filter.limit.unwrap_or(usize::MAX))
            .map(|(id, bytes)| -> AdapterResult<StoredRecord> {
                Ok(StoredRecord::new(*id, decode_record(bytes)?))
            })
            .collect()
    }
}

/// An in-memory adapter.
///
/// Records are stored CBOR-encoded, so a stored record can never alias
/// live instance state. Suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral models that don't need persistence
///
/// # Thread Safety
///
/// This adapter is thread-safe and can be shared across tasks.
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryAdapter {
    /// Creates a new empty in-memory adapter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored records for a model.
    #[must_use]
    pub fn len(&self, model: &str) -> usize {
        self.tables.read().get(model).map_or(0, |t| t.rows.len())
    }

    /// Returns true if no records are stored for a model.
    #[must_use]
    pub fn is_empty(&self, model: &str) -> bool {
        self.len(model) == 0
    }

    /// Removes every record of every model.
    pub fn clear(&self) {
        self.tables.write().clear();
    }
}

fn strip_id(mut data: Record) -> Record {
    data.remove(ID_ATTRIBUTE);
    data
}

#[async_trait]
impl Adapter for MemoryAdapter {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, model: &str, data: Record) -> AdapterResult<RecordId> {
        let bytes = encode_record(&strip_id(data))?;
        let mut tables = self.tables.write();
        let table = tables.entry(model.to_string()).or_default();
        let id = table.allocate();
        table.rows.insert(id, bytes);
        Ok(id)
    }

    async fn save(&self, model: &str, id: RecordId, data: Record) -> AdapterResult<()> {
        let bytes = encode_record(&strip_id(data))?;
        let mut tables = self.tables.write();
        let table = tables.entry(model.to_string()).or_default();
        table.next_id = table.next_id.max(id.get());
        table.rows.insert(id, bytes);
        Ok(())
    }

    async fn update_attributes(
        &self,
        model: &str,
        id: RecordId,
        data: Record,
    ) -> AdapterResult<()> {
        let mut tables = self.tables.write();
        let row = tables
            .get_mut(model)
            .and_then(|t| t.rows.get_mut(&id))
            .ok_or_else(|| AdapterError::not_found(model, id))?;
        let mut stored = decode_record(row)?;
        stored.extend(strip_id(data));
        *row = encode_record(&stored)?;
        Ok(())
    }

    async fn destroy(&self, model: &str, id: RecordId) -> AdapterResult<()> {
        if let Some(table) = self.tables.write().get_mut(model) {
            table.rows.remove(&id);
        }
        Ok(())
    }

    async fn destroy_all(&self, model: &str, filter: &Filter) -> AdapterResult<()> {
        let mut tables = self.tables.write();
        let Some(table) = tables.get_mut(model) else {
            return Ok(());
        };
        if filter.conditions.is_empty() {
            table.rows.clear();
            return Ok(());
        }
        let doomed: Vec<RecordId> = table
            .decode_matching(&filter.unwindowed())?
            .into_iter()
            .map(|r| r.id)
            .collect();
        for id in doomed {
            table.rows.remove(&id);
        }
        Ok(())
    }

    async fn exists(&self, model: &str, id: RecordId) -> AdapterResult<bool> {
        Ok(self
            .tables
            .read()
            .get(model)
            .is_some_and(|t| t.rows.contains_key(&id)))
    }

    async fn find(&self, model: &str, id: RecordId) -> AdapterResult<Option<StoredRecord>> {
        let tables = self.tables.read();
        match tables.get(model).and_then(|t| t.rows.get(&id)) {
            Some(bytes) => Ok(Some(StoredRecord::new(id, decode_record(bytes)?))),
            None => Ok(None),
        }
    }

    async fn all(&self, model: &str, filter: &Filter) -> AdapterResult<Vec<StoredRecord>> {
        let mut records = match self.tables.read().get(model) {
            Some(table) if filter.conditions.is_empty() && filter.order.is_empty() => {
                return table.decode_window(filter);
            }
            Some(table) => table.decode_matching(filter)?,
            None => return Ok(Vec::new()),
        };
        if !filter.order.is_empty() {
            records.sort_by(|a, b| filter.compare((a.id, &a.data), (b.id, &b.data)));
        }
        let window = records
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect();
        Ok(window)
    }

    async fn count(&self, model: &str, filter: &Filter) -> AdapterResult<usize> {
        match self.tables.read().get(model) {
            Some(table) if filter.conditions.is_empty() => Ok(table.rows.len()),
            Some(table) => Ok(table.decode_matching(&filter.unwindowed())?.len()),
            None => Ok(0),
        }
    }
}
