//! Validation pipeline.
//!
//! Every applicable rule runs on every validation; nothing short-circuits.
//! Rules are evaluated concurrently, but their messages are assembled in
//! registration order so the result is deterministic.

mod errors;
mod rule;

pub use errors::ValidationErrors;
pub use rule::{AsyncPredicate, Predicate, Rule, RuleCondition, RuleKind};

use crate::error::CoreResult;
use crate::instance::Instance;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;

/// Replaces the rule pipeline with a single authoritative answer.
#[derive(Clone)]
pub struct ValidityCheck(Arc<dyn Fn(&Instance) -> bool + Send + Sync>);

impl ValidityCheck {
    /// Wraps a check.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Instance) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// A check that always answers `valid`.
    pub fn fixed(valid: bool) -> Self {
        Self::new(move |_| valid)
    }

    /// Runs the check.
    pub fn check(&self, instance: &Instance) -> bool {
        (self.0)(instance)
    }
}

impl fmt::Debug for ValidityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ValidityCheck(..)")
    }
}

/// Runs every applicable rule of the instance's model.
pub(crate) async fn run_rules(instance: &Instance) -> CoreResult<ValidationErrors> {
    let rules = instance.model().rules();
    let applicable: Vec<&Rule> = rules.iter().filter(|r| r.applies_to(instance)).collect();
    tracing::trace!(
        model = %instance.model().name(),
        rules = applicable.len(),
        "running validation rules"
    );

    let outcomes = join_all(applicable.iter().map(|rule| rule.evaluate(instance))).await;

    let mut errors = ValidationErrors::new();
    for (rule, outcome) in applicable.iter().zip(outcomes) {
        if let Some(message) = outcome? {
            tracing::trace!(
                attribute = %rule.attribute,
                rule = rule.kind.name(),
                reason = message,
                "rule failed"
            );
            errors.add(rule.attribute.as_str(), message);
        }
    }
    Ok(errors)
}

impl Instance {
    /// Runs validation without touching the instance's errors.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures from rules that consult storage.
    pub async fn validate(&self) -> CoreResult<ValidationErrors> {
        run_rules(self).await
    }

    /// Decides validity and records the outcome in `errors()`.
    ///
    /// A validity override, if present, is authoritative and no rules run.
    /// An override answering `false` leaves an empty error set.
    ///
    /// # Errors
    ///
    /// Propagates adapter failures from rules that consult storage.
    pub async fn is_valid(&mut self) -> CoreResult<bool> {
        let errors = match self.validity_override() {
            Some(check) => {
                if check.check(self) {
                    ValidationErrors::new()
                } else {
                    tracing::trace!(model = %self.model().name(), "validity override rejected");
                    self.set_errors(Some(ValidationErrors::new()));
                    return Ok(false);
                }
            }
            None => run_rules(self).await?,
        };
        let valid = errors.is_empty();
        self.set_errors((!valid).then_some(errors));
        Ok(valid)
    }
}
