//! Fault injection for adapter failure paths.

use async_trait::async_trait;
use parking_lot::Mutex;
use recordkit_adapter::{
    Adapter, AdapterError, AdapterResult, Filter, RecordId, StoredRecord,
};
use recordkit_value::Record;
use std::collections::HashSet;
use std::sync::Arc;

/// An adapter operation, as seen by [`FaultyAdapter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `create`
    Create,
    /// `save`
    Save,
    /// `update_attributes`
    UpdateAttributes,
    /// `destroy`
    Destroy,
    /// `destroy_all`
    DestroyAll,
    /// `exists`
    Exists,
    /// `find`
    Find,
    /// `all`
    All,
    /// `count`
    Count,
}

#[derive(Debug, Default)]
struct FaultPlan {
    failing: HashSet<Operation>,
    remaining: Option<usize>,
}

/// Wraps an adapter and fails selected calls with `Unavailable`.
///
/// Every call is recorded, failed or not, so tests can also assert on the
/// exact sequence of adapter requests.
pub struct FaultyAdapter {
    inner: Arc<dyn Adapter>,
    plan: Mutex<FaultPlan>,
    calls: Mutex<Vec<Operation>>,
}

impl FaultyAdapter {
    /// Wraps `inner` with no faults planned.
    pub fn new(inner: Arc<dyn Adapter>) -> Self {
        Self {
            inner,
            plan: Mutex::new(FaultPlan::default()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call to `operation` from now on.
    pub fn fail_on(&self, operation: Operation) {
        self.plan.lock().failing.insert(operation);
    }

    /// Lets `calls` more calls through, then fails all of them.
    pub fn fail_after(&self, calls: usize) {
        self.plan.lock().remaining = Some(calls);
    }

    /// Removes every planned fault.
    pub fn heal(&self) {
        *self.plan.lock() = FaultPlan::default();
    }

    /// Every call seen so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().clone()
    }

    /// Number of calls to one operation.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls.lock().iter().filter(|op| **op == operation).count()
    }

    fn check(&self, operation: Operation) -> AdapterResult<()> {
        self.calls.lock().push(operation);
        let mut plan = self.plan.lock();
        let exhausted = match plan.remaining.as_mut() {
            Some(0) => true,
            Some(remaining) => {
                *remaining -= 1;
                false
            }
            None => false,
        };
        if exhausted || plan.failing.contains(&operation) {
            return Err(AdapterError::unavailable(format!(
                "injected {operation:?} failure"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Adapter for FaultyAdapter {
    fn name(&self) -> &'static str {
        "faulty"
    }

    async fn create(&self, model: &str, data: Record) -> AdapterResult<RecordId> {
        self.check(Operation::Create)?;
        self.inner.create(model, data).await
    }

    async fn save(&self, model: &str, id: RecordId, data: Record) -> AdapterResult<()> {
        self.check(Operation::Save)?;
        self.inner.save(model, id, data).await
    }

    async fn update_attributes(
        &self,
        model: &str,
        id: RecordId,
        data: Record,
    ) -> AdapterResult<()> {
        self.check(Operation::UpdateAttributes)?;
        self.inner.update_attributes(model, id, data).await
    }

    async fn destroy(&self, model: &str, id: RecordId) -> AdapterResult<()> {
        self.check(Operation::Destroy)?;
        self.inner.destroy(model, id).await
    }

    async fn destroy_all(&self, model: &str, filter: &Filter) -> AdapterResult<()> {
        self.check(Operation::DestroyAll)?;
        self.inner.destroy_all(model, filter).await
    }

    async fn exists(&self, model: &str, id: RecordId) -> AdapterResult<bool> {
        self.check(Operation::Exists)?;
        self.inner.exists(model, id).await
    }

    async fn find(&self, model: &str, id: RecordId) -> AdapterResult<Option<StoredRecord>> {
        self.check(Operation::Find)?;
        self.inner.find(model, id).await
    }

    async fn all(&self, model: &str, filter: &Filter) -> AdapterResult<Vec<StoredRecord>> {
        self.check(Operation::All)?;
        self.inner.all(model, filter).await
    }

    async fn count(&self, model: &str, filter: &Filter) -> AdapterResult<usize> {
        self.check(Operation::Count)?;
        self.inner.count(model, filter).await
    }
}
