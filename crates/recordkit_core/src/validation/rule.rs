//! Validation rules and their evaluators.

use crate::error::CoreResult;
use crate::instance::Instance;
use futures::future::BoxFuture;
use recordkit_adapter::Filter;
use recordkit_value::Value;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Synchronous custom check. Returns true when the instance is valid.
pub type Predicate = Arc<dyn Fn(&Instance) -> bool + Send + Sync>;

/// Asynchronous custom check. Resolves to true when the instance is valid.
pub type AsyncPredicate = Arc<dyn for<'a> Fn(&'a Instance) -> BoxFuture<'a, bool> + Send + Sync>;

/// What a rule checks.
#[derive(Clone)]
pub enum RuleKind {
    /// Value must not be blank.
    Presence,
    /// Value must be blank.
    Absence,
    /// Length bounds. Null measures 0; values without a natural length
    /// are measured by their display form.
    Length {
        /// Minimum length.
        min: Option<usize>,
        /// Maximum length.
        max: Option<usize>,
        /// Exact length.
        is: Option<usize>,
    },
    /// Value must be an integer.
    Numericality,
    /// Value must be one of the listed values.
    Inclusion(Vec<Value>),
    /// Value must not be one of the listed values.
    Exclusion(Vec<Value>),
    /// Value must be text matching the pattern.
    Format(Regex),
    /// No other stored record may hold the same value.
    Uniqueness,
    /// Caller-supplied check.
    Custom(Predicate),
    /// Caller-supplied asynchronous check.
    CustomAsync(AsyncPredicate),
}

impl RuleKind {
    /// Short name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Presence => "presence",
            RuleKind::Absence => "absence",
            RuleKind::Length { .. } => "length",
            RuleKind::Numericality => "numericality",
            RuleKind::Inclusion(_) => "inclusion",
            RuleKind::Exclusion(_) => "exclusion",
            RuleKind::Format(_) => "format",
            RuleKind::Uniqueness => "uniqueness",
            RuleKind::Custom(_) => "custom",
            RuleKind::CustomAsync(_) => "custom_async",
        }
    }
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Length { min, max, is } => f
                .debug_struct("Length")
                .field("min", min)
                .field("max", max)
                .field("is", is)
                .finish(),
            RuleKind::Inclusion(values) => f.debug_tuple("Inclusion").field(values).finish(),
            RuleKind::Exclusion(values) => f.debug_tuple("Exclusion").field(values).finish(),
            RuleKind::Format(re) => f.debug_tuple("Format").field(&re.as_str()).finish(),
            other => f.write_str(other.name()),
        }
    }
}

/// When a rule applies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuleCondition {
    /// Always.
    #[default]
    Always,
    /// Only when the named attribute is truthy.
    If(String),
    /// Only when the named attribute is not truthy.
    Unless(String),
}

/// A validation rule registered on a model.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Attribute the rule checks and reports under.
    pub attribute: String,
    /// What the rule checks.
    pub kind: RuleKind,
    /// When the rule applies.
    pub condition: RuleCondition,
    /// Message used instead of the default.
    pub message: Option<String>,
    /// Skip the rule when the value is null.
    pub allow_null: bool,
    /// Skip the rule when the value is blank.
    pub allow_blank: bool,
}

impl Rule {
    /// Creates an unconditional rule.
    pub fn new(attribute: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            condition: RuleCondition::Always,
            message: None,
            allow_null: false,
            allow_blank: false,
        }
    }

    /// Value must not be blank.
    pub fn presence(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RuleKind::Presence)
    }

    /// Value must be blank.
    pub fn absence(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RuleKind::Absence)
    }

    /// Length must fall within `min..=max`.
    pub fn length(attribute: impl Into<String>, min: Option<usize>, max: Option<usize>) -> Self {
        Self::new(attribute, RuleKind::Length { min, max, is: None })
    }

    /// Length must equal `is`.
    pub fn length_is(attribute: impl Into<String>, is: usize) -> Self {
        Self::new(
            attribute,
            RuleKind::Length {
                min: None,
                max: None,
                is: Some(is),
            },
        )
    }

    /// Value must be an integer.
    pub fn numericality(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RuleKind::Numericality)
    }

    /// Value must be one of `values`.
    pub fn inclusion(attribute: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(attribute, RuleKind::Inclusion(values))
    }

    /// Value must not be one of `values`.
    pub fn exclusion(attribute: impl Into<String>, values: Vec<Value>) -> Self {
        Self::new(attribute, RuleKind::Exclusion(values))
    }

    /// Value must match `pattern`.
    pub fn format(attribute: impl Into<String>, pattern: Regex) -> Self {
        Self::new(attribute, RuleKind::Format(pattern))
    }

    /// Value must be unique among stored records.
    pub fn uniqueness(attribute: impl Into<String>) -> Self {
        Self::new(attribute, RuleKind::Uniqueness)
    }

    /// Custom check, reported under `attribute`.
    pub fn custom<F>(attribute: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        Self::new(attribute, RuleKind::Custom(Arc::new(check)))
    }

    /// Asynchronous custom check, reported under `attribute`.
    pub fn custom_async<F>(attribute: impl Into<String>, check: F) -> Self
    where
        F: for<'a> Fn(&'a Instance) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        Self::new(attribute, RuleKind::CustomAsync(Arc::new(check)))
    }

    /// Overrides the failure message.
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Applies the rule only when `attribute` is truthy.
    #[must_use]
    pub fn when(mut self, attribute: impl Into<String>) -> Self {
        self.condition = RuleCondition::If(attribute.into());
        self
    }

    /// Applies the rule only when `attribute` is not truthy.
    #[must_use]
    pub fn unless(mut self, attribute: impl Into<String>) -> Self {
        self.condition = RuleCondition::Unless(attribute.into());
        self
    }

    /// Skips the rule for null values.
    #[must_use]
    pub fn allow_null(mut self) -> Self {
        self.allow_null = true;
        self
    }

    /// Skips the rule for blank values.
    #[must_use]
    pub fn allow_blank(mut self) -> Self {
        self.allow_blank = true;
        self
    }

    pub(crate) fn applies_to(&self, instance: &Instance) -> bool {
        let condition_holds = match &self.condition {
            RuleCondition::Always => true,
            RuleCondition::If(attr) => instance.get(attr).is_truthy(),
            RuleCondition::Unless(attr) => !instance.get(attr).is_truthy(),
        };
        if !condition_holds {
            return false;
        }
        let value = instance.get(&self.attribute);
        !((self.allow_null && value.is_null()) || (self.allow_blank && value.is_blank()))
    }

    /// Runs the rule. Returns the failure message, or `None` if it passed.
    ///
    /// # Errors
    ///
    /// Uniqueness propagates adapter failures.
    pub(crate) async fn evaluate(&self, instance: &Instance) -> CoreResult<Option<&str>> {
        let value = instance.get(&self.attribute);
        let failure = match &self.kind {
            RuleKind::Presence => value.is_blank().then_some("can't be blank"),
            RuleKind::Absence => (!value.is_blank()).then_some("can't be set"),
            RuleKind::Length { min, max, is } => check_length(&value, *min, *max, *is),
            RuleKind::Numericality => value.as_integer().is_none().then_some("is not a number"),
            RuleKind::Inclusion(values) => {
                (!values.contains(&value)).then_some("is not included in the list")
            }
            RuleKind::Exclusion(values) => values.contains(&value).then_some("is reserved"),
            RuleKind::Format(pattern) => {
                let matched = value.as_text().is_some_and(|text| pattern.is_match(text));
                (!matched).then_some("is invalid")
            }
            RuleKind::Uniqueness => {
                let unique = is_unique(instance, &self.attribute, value).await?;
                (!unique).then_some("is not unique")
            }
            RuleKind::Custom(check) => (!check(instance)).then_some("is invalid"),
            RuleKind::CustomAsync(check) => (!check(instance).await).then_some("is invalid"),
        };
        Ok(failure.map(|default| self.message.as_deref().unwrap_or(default)))
    }
}

fn check_length(
    value: &Value,
    min: Option<usize>,
    max: Option<usize>,
    is: Option<usize>,
) -> Option<&'static str> {
    let len = match value {
        Value::Null => 0,
        other => other
            .len()
            .unwrap_or_else(|| other.to_string().chars().count()),
    };
    if is.is_some_and(|is| len != is) {
        Some("length is wrong")
    } else if min.is_some_and(|min| len < min) {
        Some("too short")
    } else if max.is_some_and(|max| len > max) {
        Some("too long")
    } else {
        None
    }
}

async fn is_unique(instance: &Instance, attribute: &str, value: Value) -> CoreResult<bool> {
    let model = instance.model();
    let filter = Filter::new().where_eq(attribute, value).limit(2);
    let found = model.adapter().all(model.name(), &filter).await?;
    Ok(found.iter().all(|stored| Some(stored.id) == instance.id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_checks() {
        let text = Value::from("abc");
        assert_eq!(check_length(&text, Some(4), None, None), Some("too short"));
        assert_eq!(check_length(&text, None, Some(2), None), Some("too long"));
        assert_eq!(check_length(&text, None, None, Some(2)), Some("length is wrong"));
        assert_eq!(check_length(&text, Some(1), Some(3), None), None);
        assert_eq!(check_length(&Value::Null, Some(1), None, None), Some("too short"));
        assert_eq!(check_length(&Value::from(12345), None, Some(4), None), Some("too long"));
    }

    #[test]
    fn builder_modifiers() {
        let rule = Rule::presence("email")
            .message("is required")
            .when("subscribed")
            .allow_null();
        assert_eq!(rule.message.as_deref(), Some("is required"));
        assert_eq!(rule.condition, RuleCondition::If("subscribed".into()));
        assert!(rule.allow_null);
        assert!(!rule.allow_blank);
        assert_eq!(rule.kind.name(), "presence");
    }

    #[test]
    fn debug_shows_pattern() {
        let rule = Rule::format("email", Regex::new("^.+@.+$").unwrap());
        assert_eq!(format!("{:?}", rule.kind), "Format(\"^.+@.+$\")");
        assert_eq!(format!("{:?}", RuleKind::Uniqueness), "uniqueness");
    }
}
