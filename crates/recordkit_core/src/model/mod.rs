//! Model descriptors and schemas.
//!
//! A [`Model`] is a cheap, clonable handle to one model type: its declared
//! properties, the adapter it persists through, and its per-type rule list,
//! hook table and validity override. Everything mutable sits behind a lock
//! and is snapshotted before any await point.

mod property;

pub use property::{Clock, DefaultValue, Property, PropertyKind, SystemClock, ValueProvider};

use crate::hooks::{Hook, HookSlot, HookTable};
use crate::instance::Instance;
use crate::validation::{Rule, ValidityCheck};
use parking_lot::RwLock;
use recordkit_adapter::Adapter;
use recordkit_value::{merge_over, Record, Value};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct ModelInner {
    name: String,
    properties: Vec<Property>,
    adapter: Arc<dyn Adapter>,
    rules: RwLock<Arc<Vec<Rule>>>,
    hooks: RwLock<HookTable>,
    validity: RwLock<Option<ValidityCheck>>,
}

/// Handle to a model type.
#[derive(Clone)]
pub struct Model {
    inner: Arc<ModelInner>,
}

impl Model {
    /// Creates a model bound to an adapter.
    pub fn new(name: impl Into<String>, properties: Vec<Property>, adapter: Arc<dyn Adapter>) -> Self {
        Self {
            inner: Arc::new(ModelInner {
                name: name.into(),
                properties,
                adapter,
                rules: RwLock::new(Arc::new(Vec::new())),
                hooks: RwLock::new(HookTable::default()),
                validity: RwLock::new(None),
            }),
        }
    }

    /// Returns the model name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns the declared properties, in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.inner.properties
    }

    /// Looks up a declared property.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.inner.properties.iter().find(|p| p.name == name)
    }

    /// Returns true if the model declares this attribute.
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Returns the adapter this model persists through.
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.inner.adapter
    }

    /// Builds a transient instance: `data` merged over defaults.
    ///
    /// The merged state is the baseline, so nothing reads as changed.
    /// Attributes the model does not declare are dropped.
    pub fn new_instance(&self, data: Record) -> Instance {
        Instance::build(self.clone(), self.apply_defaults(data))
    }

    pub(crate) fn apply_defaults(&self, data: Record) -> Record {
        let (declared, undeclared): (Record, Record) =
            data.into_iter().partition(|(name, _)| self.has_property(name));
        if !undeclared.is_empty() {
            tracing::debug!(
                model = %self.name(),
                dropped = ?undeclared.keys().collect::<Vec<_>>(),
                "ignoring undeclared attributes"
            );
        }
        // Providers only run for attributes the data leaves out.
        let defaults: Record = self
            .inner
            .properties
            .iter()
            .filter(|property| !declared.contains_key(&property.name))
            .map(|property| (property.name.clone(), property.initial_value()))
            .collect();
        merge_over(defaults, declared)
    }

    /// Fills undeclared gaps in a stored record with null.
    pub(crate) fn complete_stored(&self, mut data: Record) -> Record {
        for property in &self.inner.properties {
            data.entry(property.name.clone()).or_insert(Value::Null);
        }
        data
    }

    // Validation rules

    /// Registers a rule. Rules run in registration order.
    pub fn validates(&self, rule: Rule) -> &Self {
        Arc::make_mut(&mut self.inner.rules.write()).push(rule);
        self
    }

    /// Requires the attribute to be non-blank.
    pub fn validates_presence_of(&self, attribute: &str) -> &Self {
        self.validates(Rule::presence(attribute))
    }

    /// Requires the attribute's length to fall in a range.
    pub fn validates_length_of(
        &self,
        attribute: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> &Self {
        self.validates(Rule::length(attribute, min, max))
    }

    /// Requires the attribute to be an integer.
    pub fn validates_numericality_of(&self, attribute: &str) -> &Self {
        self.validates(Rule::numericality(attribute))
    }

    /// Requires the attribute to be one of `values`.
    pub fn validates_inclusion_of(&self, attribute: &str, values: Vec<Value>) -> &Self {
        self.validates(Rule::inclusion(attribute, values))
    }

    /// Requires the attribute to be none of `values`.
    pub fn validates_exclusion_of(&self, attribute: &str, values: Vec<Value>) -> &Self {
        self.validates(Rule::exclusion(attribute, values))
    }

    /// Requires the attribute to match a pattern.
    pub fn validates_format_of(&self, attribute: &str, pattern: Regex) -> &Self {
        self.validates(Rule::format(attribute, pattern))
    }

    /// Requires no other stored record to share the attribute's value.
    pub fn validates_uniqueness_of(&self, attribute: &str) -> &Self {
        self.validates(Rule::uniqueness(attribute))
    }

    /// Removes every registered rule.
    pub fn clear_validations(&self) {
        *self.inner.rules.write() = Arc::new(Vec::new());
    }

    /// Snapshot of the registered rules.
    pub fn rules(&self) -> Arc<Vec<Rule>> {
        Arc::clone(&self.inner.rules.read())
    }

    /// Replaces the built-in validity check for every instance of this model.
    ///
    /// While set, the check's answer is authoritative and rules do not run.
    pub fn override_validity(&self, check: Option<ValidityCheck>) {
        *self.inner.validity.write() = check;
    }

    pub(crate) fn validity_override(&self) -> Option<ValidityCheck> {
        self.inner.validity.read().clone()
    }

    // Hooks

    /// Installs or clears the hook for a slot, replacing any previous one.
    pub fn set_hook(&self, slot: HookSlot, hook: Option<Hook>) {
        self.inner.hooks.write().set(slot, hook);
    }

    /// Returns the hook installed for a slot.
    pub fn hook(&self, slot: HookSlot) -> Option<Hook> {
        self.inner.hooks.read().get(slot)
    }

    /// Installs the `beforeCreate` hook.
    pub fn before_create(&self, hook: Hook) {
        self.set_hook(HookSlot::BeforeCreate, Some(hook));
    }

    /// Installs the `afterCreate` hook.
    pub fn after_create(&self, hook: Hook) {
        self.set_hook(HookSlot::AfterCreate, Some(hook));
    }

    /// Installs the `beforeSave` hook.
    pub fn before_save(&self, hook: Hook) {
        self.set_hook(HookSlot::BeforeSave, Some(hook));
    }

    /// Installs the `afterSave` hook.
    pub fn after_save(&self, hook: Hook) {
        self.set_hook(HookSlot::AfterSave, Some(hook));
    }

    /// Installs the `beforeDestroy` hook.
    pub fn before_destroy(&self, hook: Hook) {
        self.set_hook(HookSlot::BeforeDestroy, Some(hook));
    }

    /// Installs the `afterDestroy` hook.
    pub fn after_destroy(&self, hook: Hook) {
        self.set_hook(HookSlot::AfterDestroy, Some(hook));
    }

    /// Returns true if both handles refer to the same model.
    pub fn same_as(&self, other: &Model) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.inner.name)
            .field("properties", &self.inner.properties.len())
            .field("adapter", &self.inner.adapter.name())
            .finish()
    }
}

/// A set of models sharing one adapter.
pub struct Schema {
    adapter: Arc<dyn Adapter>,
    models: RwLock<HashMap<String, Model>>,
}

impl Schema {
    /// Creates a schema over an adapter.
    pub fn new(adapter: Arc<dyn Adapter>) -> Self {
        Self {
            adapter,
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Defines (or redefines) a model.
    pub fn define(&self, name: impl Into<String>, properties: Vec<Property>) -> Model {
        let name = name.into();
        let model = Model::new(name.clone(), properties, Arc::clone(&self.adapter));
        tracing::debug!(model = %name, adapter = self.adapter.name(), "defined model");
        self.models.write().insert(name, model.clone());
        model
    }

    /// Looks up a defined model.
    pub fn model(&self, name: &str) -> Option<Model> {
        self.models.read().get(name).cloned()
    }

    /// Returns the shared adapter.
    pub fn adapter(&self) -> &Arc<dyn Adapter> {
        &self.adapter
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("adapter", &self.adapter.name())
            .field("models", &self.models.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recordkit_adapter::MemoryAdapter;
    use recordkit_value::record;

    fn person() -> Model {
        let schema = Schema::new(Arc::new(MemoryAdapter::new()));
        schema.define(
            "Person",
            vec![
                Property::new("name", PropertyKind::String),
                Property::new("married", PropertyKind::Boolean).default_value(false),
            ],
        )
    }

    #[test]
    fn defaults_fill_missing_attributes() {
        let model = person();
        let merged = model.apply_defaults(record! { "name" => "Ann" });
        assert_eq!(merged, record! { "name" => "Ann", "married" => false });
    }

    #[test]
    fn supplied_values_override_defaults() {
        let model = person();
        let merged = model.apply_defaults(record! { "married" => true });
        assert_eq!(merged, record! { "name" => Value::Null, "married" => true });
    }

    #[test]
    fn providers_run_only_for_omitted_attributes() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = Schema::new(Arc::new(MemoryAdapter::new()));
        let model = schema.define(
            "Ticket",
            vec![Property::new("serial", PropertyKind::Number).default_from(
                DefaultValue::with(move || {
                    Value::from(counter.fetch_add(1, Ordering::SeqCst) as i64)
                }),
            )],
        );

        assert_eq!(
            model.apply_defaults(record! { "serial" => 9 }),
            record! { "serial" => 9 }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(model.apply_defaults(record! {}), record! { "serial" => 0 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn undeclared_attributes_are_dropped() {
        let model = person();
        let merged = model.apply_defaults(record! { "nickname" => "A" });
        assert!(!merged.contains_key("nickname"));
    }

    #[test]
    fn rules_accumulate_and_clear() {
        let model = person();
        model.validates_presence_of("name").validates_uniqueness_of("name");
        assert_eq!(model.rules().len(), 2);
        model.clear_validations();
        assert!(model.rules().is_empty());
    }

    #[test]
    fn rule_snapshot_is_stable() {
        let model = person();
        model.validates_presence_of("name");
        let snapshot = model.rules();
        model.validates_presence_of("married");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(model.rules().len(), 2);
    }

    #[test]
    fn schema_registry() {
        let schema = Schema::new(Arc::new(MemoryAdapter::new()));
        let defined = schema.define("Post", vec![]);
        let found = schema.model("Post").unwrap();
        assert!(found.same_as(&defined));
        assert!(schema.model("Missing").is_none());
    }

    #[test]
    fn hooks_replace() {
        let model = person();
        assert!(model.hook(HookSlot::AfterCreate).is_none());
        model.after_create(Hook::sync(|_| Ok(())));
        assert!(model.hook(HookSlot::AfterCreate).is_some());
        model.set_hook(HookSlot::AfterCreate, None);
        assert!(model.hook(HookSlot::AfterCreate).is_none());
    }
}
