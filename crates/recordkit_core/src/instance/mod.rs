//! Model instances.

mod tracker;

pub use tracker::AttributeTracker;

use crate::error::{CoreError, CoreResult};
use crate::model::Model;
use crate::validation::{ValidationErrors, ValidityCheck};
use recordkit_adapter::{RecordId, StoredRecord, ID_ATTRIBUTE};
use recordkit_value::{Record, Value};
use std::collections::BTreeSet;
use std::fmt;

/// Lifecycle state of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstanceState {
    /// Never persisted; has no id.
    Transient,
    /// Stored by the adapter under its id.
    Persisted,
    /// Removed from the adapter. Terminal.
    Destroyed,
}

impl InstanceState {
    /// Returns true if the instance may still be mutated.
    #[inline]
    pub fn is_mutable(&self) -> bool {
        !matches!(self, InstanceState::Destroyed)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceState::Transient => write!(f, "transient"),
            InstanceState::Persisted => write!(f, "persisted"),
            InstanceState::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// An in-memory record of one model type.
///
/// Instances are owned by the caller. The runtime borrows them for the
/// duration of an operation and never keeps a reference afterwards.
pub struct Instance {
    model: Model,
    id: Option<RecordId>,
    tracker: AttributeTracker,
    errors: Option<ValidationErrors>,
    state: InstanceState,
    validity: Option<ValidityCheck>,
}

impl Instance {
    pub(crate) fn build(model: Model, data: Record) -> Self {
        Self {
            model,
            id: None,
            tracker: AttributeTracker::new(data),
            errors: None,
            state: InstanceState::Transient,
            validity: None,
        }
    }

    pub(crate) fn load(model: Model, stored: StoredRecord) -> Self {
        let data = model.complete_stored(stored.data);
        Self {
            model,
            id: Some(stored.id),
            tracker: AttributeTracker::new(data),
            errors: None,
            state: InstanceState::Persisted,
            validity: None,
        }
    }

    /// Returns the instance's model.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Returns the id, if persisted.
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Returns true until the instance has been persisted.
    pub fn is_new_record(&self) -> bool {
        self.id.is_none()
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// Returns the current value of an attribute. `"id"` reads the id.
    pub fn get(&self, name: &str) -> Value {
        if name == ID_ATTRIBUTE {
            return self.id.map_or(Value::Null, Value::from);
        }
        self.tracker.get(name).clone()
    }

    /// Sets an attribute without persisting it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` if the model does not declare `name`, or
    /// `InvalidState` if the instance was destroyed.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> CoreResult<()> {
        self.ensure_mutable("set")?;
        if !self.model.has_property(name) {
            return Err(CoreError::unknown_attribute(self.model.name(), name));
        }
        self.tracker.set(name, value.into());
        Ok(())
    }

    /// Sets several attributes. Nothing is applied if any name is unknown.
    ///
    /// # Errors
    ///
    /// Same as [`Instance::set`].
    pub fn set_all(&mut self, data: Record) -> CoreResult<()> {
        self.ensure_mutable("set")?;
        if let Some(unknown) = data.keys().find(|name| !self.model.has_property(name)) {
            return Err(CoreError::unknown_attribute(self.model.name(), unknown.as_str()));
        }
        for (name, value) in data {
            self.tracker.set(name, value);
        }
        Ok(())
    }

    /// Returns the current attribute values, without the id.
    pub fn attributes(&self) -> &Record {
        self.tracker.current()
    }

    /// Returns the attribute values with the id included when set.
    pub fn to_record(&self) -> Record {
        let mut record = self.tracker.current().clone();
        if let Some(id) = self.id {
            record.insert(ID_ATTRIBUTE.to_string(), id.into());
        }
        record
    }

    /// Errors from the last failed validation, if any.
    pub fn errors(&self) -> Option<&ValidationErrors> {
        self.errors.as_ref()
    }

    /// Returns true if the attribute differs from its last-persisted value.
    pub fn property_changed(&self, name: &str) -> bool {
        self.tracker.property_changed(name)
    }

    /// Names of every attribute with a pending change.
    pub fn changed(&self) -> BTreeSet<String> {
        self.tracker.changed()
    }

    /// Returns the last-persisted value of an attribute.
    pub fn was(&self, name: &str) -> &Value {
        self.tracker.was(name)
    }

    /// Discards pending changes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the instance was destroyed.
    pub fn reset(&mut self) -> CoreResult<()> {
        self.ensure_mutable("reset")?;
        self.tracker.reset();
        Ok(())
    }

    /// Replaces the validity check for this instance only.
    ///
    /// Takes precedence over the model-level override.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the instance was destroyed.
    pub fn override_validity(&mut self, check: Option<ValidityCheck>) -> CoreResult<()> {
        self.ensure_mutable("override validity of")?;
        self.validity = check;
        Ok(())
    }

    pub(crate) fn validity_override(&self) -> Option<ValidityCheck> {
        self.validity
            .clone()
            .or_else(|| self.model.validity_override())
    }

    pub(crate) fn ensure_mutable(&self, operation: &'static str) -> CoreResult<()> {
        if self.state.is_mutable() {
            Ok(())
        } else {
            Err(CoreError::invalid_state(self.state, operation))
        }
    }

    pub(crate) fn set_errors(&mut self, errors: Option<ValidationErrors>) {
        self.errors = errors;
    }

    pub(crate) fn mark_persisted(&mut self, id: RecordId) {
        self.id = Some(id);
        self.state = InstanceState::Persisted;
        self.tracker.commit();
    }

    pub(crate) fn commit(&mut self) {
        self.tracker.commit();
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.state = InstanceState::Destroyed;
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model.name())
            .field("id", &self.id)
            .field("state", &self.state)
            .field("attributes", self.tracker.current())
            .field("errors", &self.errors)
            .finish()
    }
}
