//! Declared model properties and their defaults.

use recordkit_value::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Declared kind of a property.
///
/// Informational only: values are stored as given, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// Text.
    String,
    /// Integer.
    Number,
    /// Boolean.
    Boolean,
    /// Milliseconds since the Unix epoch.
    Date,
    /// Arbitrary nested value.
    Json,
    /// Raw bytes.
    Bytes,
}

/// Supplies a fresh value each time a default is needed.
pub trait ValueProvider: Send + Sync {
    /// Returns the value to use.
    fn provide(&self) -> Value;
}

impl<F> ValueProvider for F
where
    F: Fn() -> Value + Send + Sync,
{
    fn provide(&self) -> Value {
        self()
    }
}

/// A source of the current time.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The process wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
    }
}

struct Now(Arc<dyn Clock>);

impl ValueProvider for Now {
    fn provide(&self) -> Value {
        Value::Integer(self.0.now_millis())
    }
}

/// Default applied to a property missing from constructor data.
#[derive(Clone)]
pub enum DefaultValue {
    /// The same value every time.
    Static(Value),
    /// A value computed at construction.
    Provided(Arc<dyn ValueProvider>),
}

impl DefaultValue {
    /// A default that reads the given clock.
    pub fn now(clock: Arc<dyn Clock>) -> Self {
        Self::Provided(Arc::new(Now(clock)))
    }

    /// A default computed by a closure.
    pub fn with<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self::Provided(Arc::new(f))
    }

    /// Produces the default value.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Static(value) => value.clone(),
            Self::Provided(provider) => provider.provide(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Provided(_) => f.write_str("Provided(..)"),
        }
    }
}

impl From<Value> for DefaultValue {
    fn from(value: Value) -> Self {
        Self::Static(value)
    }
}

/// A declared property of a model.
#[derive(Debug, Clone)]
pub struct Property {
    /// Attribute name.
    pub name: String,
    /// Declared kind.
    pub kind: PropertyKind,
    /// Default for missing constructor data.
    pub default: Option<DefaultValue>,
    /// Whether adapters should index this attribute.
    pub index: bool,
    /// Storage name, if it differs from the attribute name.
    pub column: Option<String>,
}

impl Property {
    /// Creates a property with no default.
    pub fn new(name: impl Into<String>, kind: PropertyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            index: false,
            column: None,
        }
    }

    /// Sets a static default.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Static(value.into()));
        self
    }

    /// Sets a default of any kind.
    #[must_use]
    pub fn default_from(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Marks the property as indexed.
    #[must_use]
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Sets the storage name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Name the adapter should store this property under.
    pub fn storage_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    /// Value for constructor data that omits this property.
    pub fn initial_value(&self) -> Value {
        self.default.as_ref().map_or(Value::Null, DefaultValue::resolve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct Ticking(AtomicI64);

    impl Clock for Ticking {
        fn now_millis(&self) -> i64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    #[test]
    fn static_default() {
        let p = Property::new("married", PropertyKind::Boolean).default_value(false);
        assert_eq!(p.initial_value(), Value::Bool(false));
    }

    #[test]
    fn no_default_is_null() {
        assert_eq!(
            Property::new("name", PropertyKind::String).initial_value(),
            Value::Null
        );
    }

    #[test]
    fn clock_default_is_resolved_each_time() {
        let clock = Arc::new(Ticking(AtomicI64::new(100)));
        let p = Property::new("createdAt", PropertyKind::Date).default_from(DefaultValue::now(clock));
        assert_eq!(p.initial_value(), Value::Integer(100));
        assert_eq!(p.initial_value(), Value::Integer(101));
    }

    #[test]
    fn closure_default() {
        let p = Property::new("tags", PropertyKind::Json)
            .default_from(DefaultValue::with(|| Value::Array(vec![])));
        assert_eq!(p.initial_value(), Value::Array(vec![]));
    }

    #[test]
    fn storage_name() {
        let p = Property::new("name", PropertyKind::String).column("full_name");
        assert_eq!(p.storage_name(), "full_name");
        assert_eq!(Property::new("age", PropertyKind::Number).index().storage_name(), "age");
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }
}
