//! Create, save, update and destroy orchestration.
//!
//! Each operation validates (unless told not to), runs the hooks around
//! the adapter call, and moves the tracker baseline forward only after the
//! adapter succeeded. A failed write leaves pending changes in place so
//! the caller can fix and retry.

use crate::config::{CreateOptions, SaveOptions};
use crate::error::{CoreError, CoreResult, Rejected};
use crate::hooks::{dispatch, HookSlot};
use crate::instance::{Instance, InstanceState};
use crate::model::Model;
use futures::future::join_all;
use recordkit_value::{Record, Value};

/// Result of a batch create, aligned with the input.
#[derive(Debug)]
pub struct BatchOutcome {
    /// One instance per input, persisted or not.
    pub instances: Vec<Instance>,
    /// One entry per input: `None` on success.
    pub errors: Vec<Option<CoreError>>,
}

impl BatchOutcome {
    /// Returns true if every element succeeded.
    pub fn is_ok(&self) -> bool {
        self.errors.iter().all(Option::is_none)
    }

    /// Number of failed elements.
    pub fn failures(&self) -> usize {
        self.errors.iter().filter(|e| e.is_some()).count()
    }

    /// Number of inputs.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true for an empty batch.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Splits into instances and errors.
    pub fn into_parts(self) -> (Vec<Instance>, Vec<Option<CoreError>>) {
        (self.instances, self.errors)
    }
}

impl Model {
    /// Builds an instance from `data` and persists it.
    ///
    /// Runs `beforeCreate`, validation, the adapter `create`, then
    /// `afterCreate`.
    ///
    /// # Errors
    ///
    /// Returns the instance together with the error. On a validation
    /// failure no adapter call was made and the instance is still new.
    pub async fn create(&self, data: Record) -> Result<Instance, Rejected> {
        self.create_with_options(data, CreateOptions::default()).await
    }

    /// Like [`Model::create`], with options.
    ///
    /// # Errors
    ///
    /// Same as [`Model::create`].
    pub async fn create_with_options(
        &self,
        data: Record,
        options: CreateOptions,
    ) -> Result<Instance, Rejected> {
        let mut instance = self.new_instance(data);
        match instance.run_create(options).await {
            Ok(()) => Ok(instance),
            Err(error) => Err(Rejected::new(instance, error)),
        }
    }

    /// Creates one instance per element, concurrently.
    ///
    /// Failures are isolated per element. Both result vectors have the
    /// input's length and order.
    pub async fn create_many(&self, data: Vec<Record>) -> BatchOutcome {
        let total = data.len();
        let settled = join_all(data.into_iter().map(|item| self.create(item))).await;

        let mut instances = Vec::with_capacity(total);
        let mut errors = Vec::with_capacity(total);
        for result in settled {
            match result {
                Ok(instance) => {
                    instances.push(instance);
                    errors.push(None);
                }
                Err(rejected) => {
                    let (instance, error) = rejected.into_parts();
                    instances.push(instance);
                    errors.push(Some(error));
                }
            }
        }
        let outcome = BatchOutcome { instances, errors };
        tracing::debug!(
            model = %self.name(),
            total,
            failed = outcome.failures(),
            "batch create finished"
        );
        outcome
    }
}

impl Instance {
    async fn run_create(&mut self, options: CreateOptions) -> CoreResult<()> {
        dispatch(HookSlot::BeforeCreate, self).await?;
        if options.validate {
            self.check_valid().await?;
        }
        self.insert().await?;
        dispatch(HookSlot::AfterCreate, self).await
    }

    /// Saves with default options: validate, then write.
    ///
    /// # Errors
    ///
    /// See [`Instance::save_with_options`].
    pub async fn save(&mut self) -> CoreResult<()> {
        self.save_with_options(SaveOptions::default()).await
    }

    /// Validates (unless disabled), runs `beforeSave`, writes every
    /// attribute, commits the baseline and runs `afterSave`.
    ///
    /// A new instance is created instead of saved.
    ///
    /// # Errors
    ///
    /// - `Validation` if validation fails; nothing is written and pending
    ///   changes are kept
    /// - `InvalidState` if the instance was destroyed
    /// - `Adapter` or `HookFailed` from the write or the hooks
    pub async fn save_with_options(&mut self, options: SaveOptions) -> CoreResult<()> {
        self.ensure_mutable("save")?;
        if options.validate {
            self.check_valid().await?;
        }
        dispatch(HookSlot::BeforeSave, self).await?;
        match self.id() {
            Some(id) => {
                let model = self.model().clone();
                model
                    .adapter()
                    .save(model.name(), id, self.attributes().clone())
                    .await?;
                self.commit();
                tracing::debug!(model = %model.name(), %id, "saved instance");
            }
            None => self.insert().await?,
        }
        dispatch(HookSlot::AfterSave, self).await
    }

    /// Sets one attribute and saves with validation.
    ///
    /// Every pending change is written, not only `name`.
    ///
    /// # Errors
    ///
    /// `UnknownAttribute` for undeclared names, otherwise as
    /// [`Instance::save`].
    pub async fn update_attribute(&mut self, name: &str, value: impl Into<Value>) -> CoreResult<()> {
        self.ensure_mutable("update")?;
        self.set(name, value)?;
        self.save().await
    }

    /// Sets several attributes and writes the changed ones.
    ///
    /// A persisted instance goes through the adapter's partial update with
    /// every attribute that differs from the baseline; a new one is created.
    ///
    /// # Errors
    ///
    /// As [`Instance::update_attribute`]. Nothing is applied if any name is
    /// undeclared.
    pub async fn update_attributes(&mut self, data: Record) -> CoreResult<()> {
        self.ensure_mutable("update")?;
        self.set_all(data)?;
        self.check_valid().await?;
        dispatch(HookSlot::BeforeSave, self).await?;
        match self.id() {
            Some(id) => {
                let changes: Record = self
                    .changed()
                    .into_iter()
                    .map(|name| {
                        let value = self.get(&name);
                        (name, value)
                    })
                    .collect();
                let model = self.model().clone();
                model
                    .adapter()
                    .update_attributes(model.name(), id, changes)
                    .await?;
                self.commit();
                tracing::debug!(model = %model.name(), %id, "updated instance");
            }
            None => self.insert().await?,
        }
        dispatch(HookSlot::AfterSave, self).await
    }

    /// Runs `beforeDestroy`, removes the record and runs `afterDestroy`.
    ///
    /// The instance ends up destroyed and rejects further mutations.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the instance was never persisted or is already
    /// destroyed, otherwise adapter or hook failures.
    pub async fn destroy(&mut self) -> CoreResult<()> {
        self.ensure_mutable("destroy")?;
        let Some(id) = self.id() else {
            return Err(CoreError::invalid_state(InstanceState::Transient, "destroy"));
        };
        dispatch(HookSlot::BeforeDestroy, self).await?;
        let model = self.model().clone();
        model.adapter().destroy(model.name(), id).await?;
        self.mark_destroyed();
        tracing::debug!(model = %model.name(), %id, "destroyed instance");
        dispatch(HookSlot::AfterDestroy, self).await
    }

    async fn check_valid(&mut self) -> CoreResult<()> {
        if self.is_valid().await? {
            return Ok(());
        }
        let errors = self.errors().cloned().unwrap_or_default();
        tracing::debug!(
            model = %self.model().name(),
            id = ?self.id(),
            failures = errors.len(),
            "validation failed"
        );
        Err(CoreError::Validation(errors))
    }

    async fn insert(&mut self) -> CoreResult<()> {
        let model = self.model().clone();
        let id = model
            .adapter()
            .create(model.name(), self.attributes().clone())
            .await?;
        self.mark_persisted(id);
        tracing::debug!(model = %model.name(), %id, "created instance");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Hook;
    use crate::model::{Property, PropertyKind};
    use parking_lot::Mutex;
    use recordkit_adapter::{Adapter, MemoryAdapter};
    use recordkit_value::record;
    use std::sync::Arc;

    fn person(adapter: Arc<MemoryAdapter>) -> Model {
        Model::new(
            "Person",
            vec![
                Property::new("name", PropertyKind::String),
                Property::new("age", PropertyKind::Number),
                Property::new("married", PropertyKind::Boolean).default_value(false),
            ],
            adapter,
        )
    }

    fn recorder(model: &Model) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        for slot in HookSlot::ALL {
            let log = Arc::clone(&log);
            model.set_hook(
                slot,
                Some(Hook::sync(move |_| {
                    log.lock().push(slot.to_string());
                    Ok(())
                })),
            );
        }
        log
    }

    #[tokio::test]
    async fn create_persists_merged_data() {
        let adapter = Arc::new(MemoryAdapter::new());
        let model = person(Arc::clone(&adapter));

        let instance = model.create(record! { "name" => "Ann" }).await.unwrap();
        let id = instance.id().unwrap();
        assert_eq!(instance.state(), InstanceState::Persisted);

        let stored = adapter.find("Person", id).await.unwrap().unwrap();
        assert_eq!(
            stored.data,
            record! { "name" => "Ann", "age" => Value::Null, "married" => false }
        );
    }

    #[tokio::test]
    async fn create_hook_order() {
        let model = person(Arc::new(MemoryAdapter::new()));
        let log = recorder(&model);
        model.create(record! {}).await.unwrap();
        assert_eq!(*log.lock(), ["beforeCreate", "afterCreate"]);
    }

    #[tokio::test]
    async fn invalid_create_skips_adapter() {
        let adapter = Arc::new(MemoryAdapter::new());
        let model = person(Arc::clone(&adapter));
        model.validates_presence_of("name");

        let rejected = model.create(record! {}).await.unwrap_err();
        assert!(rejected.error.is_validation());
        assert!(rejected.instance.is_new_record());
        assert!(rejected.instance.errors().unwrap().contains("name"));
        assert!(adapter.is_empty("Person"));

        let instance = model
            .create_with_options(record! {}, CreateOptions::new().validate(false))
            .await
            .unwrap();
        assert!(!instance.is_new_record());
    }

    #[tokio::test]
    async fn save_hook_order_and_commit() {
        let model = person(Arc::new(MemoryAdapter::new()));
        let mut instance = model.create(record! { "name" => "Ann" }).await.unwrap();
        let log = recorder(&model);

        instance.set("age", 30).unwrap();
        instance.save().await.unwrap();
        assert!(!instance.property_changed("age"));
        assert_eq!(*log.lock(), ["beforeSave", "afterSave"]);
    }

    #[tokio::test]
    async fn failed_validation_keeps_pending_changes() {
        let adapter = Arc::new(MemoryAdapter::new());
        let model = person(Arc::clone(&adapter));
        let mut instance = model.create(record! { "name" => "Ann" }).await.unwrap();
        model.validates_presence_of("name");

        instance.set("name", "").unwrap();
        let err = instance.save().await.unwrap_err();
        assert!(err.is_validation());
        assert!(instance.property_changed("name"));

        let stored = adapter
            .find("Person", instance.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data.get("name"), Some(&Value::from("Ann")));

        instance
            .save_with_options(SaveOptions::new().validate(false))
            .await
            .unwrap();
        assert!(instance.changed().is_empty());
    }

    #[tokio::test]
    async fn save_creates_new_instance() {
        let model = person(Arc::new(MemoryAdapter::new()));
        let mut instance = model.new_instance(record! { "name" => "Ann" });
        instance.save().await.unwrap();
        assert!(!instance.is_new_record());
    }

    #[tokio::test]
    async fn update_attributes_writes_changes() {
        let adapter = Arc::new(MemoryAdapter::new());
        let model = person(Arc::clone(&adapter));
        let mut instance = model.create(record! { "name" => "Ann" }).await.unwrap();

        instance.set("age", 3).unwrap();
        instance
            .update_attributes(record! { "married" => true })
            .await
            .unwrap();
        assert!(instance.changed().is_empty());

        let stored = adapter
            .find("Person", instance.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.data.get("age"), Some(&Value::from(3)));
        assert_eq!(stored.data.get("married"), Some(&Value::from(true)));
    }

    #[tokio::test]
    async fn destroy_transitions_to_terminal_state() {
        let adapter = Arc::new(MemoryAdapter::new());
        let model = person(Arc::clone(&adapter));
        let mut instance = model.create(record! { "name" => "Ann" }).await.unwrap();
        let id = instance.id().unwrap();
        let log = recorder(&model);

        instance.destroy().await.unwrap();
        assert_eq!(instance.state(), InstanceState::Destroyed);
        assert!(!adapter.exists("Person", id).await.unwrap());
        assert_eq!(*log.lock(), ["beforeDestroy", "afterDestroy"]);

        assert!(instance.save().await.unwrap_err().is_state());
        assert!(instance.destroy().await.unwrap_err().is_state());
        assert!(instance.update_attribute("age", 1).await.unwrap_err().is_state());
    }

    #[tokio::test]
    async fn destroying_new_instance_is_a_state_error() {
        let model = person(Arc::new(MemoryAdapter::new()));
        let mut instance = model.new_instance(record! {});
        let err = instance.destroy().await.unwrap_err();
        assert_eq!(err.to_string(), "cannot destroy a transient instance");
    }

    #[tokio::test]
    async fn create_many_isolates_failures() {
        let model = person(Arc::new(MemoryAdapter::new()));
        model.validates_presence_of("name");

        let outcome = model
            .create_many(vec![
                record! { "name" => "Ann" },
                record! {},
                record! { "name" => "Cy" },
            ])
            .await;
        assert_eq!(outcome.len(), 3);
        assert_eq!(outcome.failures(), 1);
        assert!(outcome.errors[1].as_ref().unwrap().is_validation());
        assert!(!outcome.instances[0].is_new_record());
        assert!(outcome.instances[1].is_new_record());
        assert_eq!(outcome.instances[2].get("name"), Value::from("Cy"));
    }

    #[tokio::test]
    async fn before_hook_failure_aborts_write() {
        let adapter = Arc::new(MemoryAdapter::new());
        let model = person(Arc::clone(&adapter));
        model.before_create(Hook::with_next(|_, next| next.fail("blocked")));

        let rejected = model.create(record! {}).await.unwrap_err();
        assert!(matches!(
            rejected.error,
            CoreError::HookFailed {
                slot: HookSlot::BeforeCreate,
                ..
            }
        ));
        assert!(adapter.is_empty("Person"));
    }
}
