//! Model-level passthroughs to the adapter.

use crate::error::CoreResult;
use crate::instance::Instance;
use crate::model::Model;
use recordkit_adapter::{Filter, RecordId};

impl Model {
    /// Loads every record matching the filter, in filter order.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures.
    pub async fn all(&self, filter: &Filter) -> CoreResult<Vec<Instance>> {
        let stored = self.adapter().all(self.name(), filter).await?;
        tracing::trace!(model = %self.name(), found = stored.len(), "loaded records");
        Ok(stored
            .into_iter()
            .map(|record| Instance::load(self.clone(), record))
            .collect())
    }

    /// Loads one record by id.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures.
    pub async fn find(&self, id: RecordId) -> CoreResult<Option<Instance>> {
        let stored = self.adapter().find(self.name(), id).await?;
        Ok(stored.map(|record| Instance::load(self.clone(), record)))
    }

    /// Loads the first record matching the filter.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures.
    pub async fn find_one(&self, filter: &Filter) -> CoreResult<Option<Instance>> {
        let filter = filter.clone().limit(1);
        Ok(self.all(&filter).await?.into_iter().next())
    }

    /// Counts matching records.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures.
    pub async fn count(&self, filter: &Filter) -> CoreResult<usize> {
        Ok(self.adapter().count(self.name(), filter).await?)
    }

    /// Checks whether a record exists.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures.
    pub async fn exists(&self, id: RecordId) -> CoreResult<bool> {
        Ok(self.adapter().exists(self.name(), id).await?)
    }

    /// Removes every matching record. No hooks run.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures.
    pub async fn destroy_all(&self, filter: &Filter) -> CoreResult<()> {
        self.adapter().destroy_all(self.name(), filter).await?;
        tracing::debug!(model = %self.name(), "destroyed matching records");
        Ok(())
    }
}
