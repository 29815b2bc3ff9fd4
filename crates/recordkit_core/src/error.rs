//! Error types for RecordKit core.

use crate::hooks::HookSlot;
use crate::instance::{Instance, InstanceState};
use crate::validation::ValidationErrors;
use recordkit_adapter::AdapterError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in RecordKit core operations.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// One or more validation rules failed. No adapter call was made and
    /// the instance keeps its pending changes.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// The adapter failed. Propagated as-is; the core never retries.
    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    /// Operation not permitted in the instance's current state.
    #[error("cannot {operation} a {state} instance")]
    InvalidState {
        /// State the instance was in.
        state: InstanceState,
        /// Attempted operation.
        operation: &'static str,
    },

    /// Attribute is not declared by the model.
    #[error("unknown attribute {attribute:?} on model {model}")]
    UnknownAttribute {
        /// Model name.
        model: String,
        /// The undeclared attribute.
        attribute: String,
    },

    /// Options were rejected before any work started.
    #[error("invalid options: {message}")]
    InvalidOptions {
        /// Description of the problem.
        message: String,
    },

    /// A lifecycle hook signaled failure.
    #[error("{slot} hook failed: {message}")]
    HookFailed {
        /// The hook slot.
        slot: HookSlot,
        /// Description of the failure.
        message: String,
    },

    /// An iteration worker signaled failure.
    #[error("worker failed at index {index}: {message}")]
    WorkerFailed {
        /// Overall index of the item being processed.
        index: usize,
        /// Description of the failure.
        message: String,
    },

    /// A continuation was invoked with a failure.
    #[error("aborted: {message}")]
    Aborted {
        /// Description of the failure.
        message: String,
    },

    /// A continuation was dropped without being invoked.
    #[error("continuation dropped without being invoked")]
    ContinuationDropped,
}

impl CoreError {
    /// Creates an invalid state error.
    pub fn invalid_state(state: InstanceState, operation: &'static str) -> Self {
        Self::InvalidState { state, operation }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(model: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            model: model.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid options error.
    pub fn invalid_options(message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            message: message.into(),
        }
    }

    /// Creates an aborted error.
    pub fn aborted(message: impl Into<String>) -> Self {
        Self::Aborted {
            message: message.into(),
        }
    }

    /// Returns true for validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true for adapter failures.
    pub fn is_adapter(&self) -> bool {
        matches!(self, Self::Adapter(_))
    }

    /// Returns true for state and precondition violations.
    pub fn is_state(&self) -> bool {
        matches!(
            self,
            Self::InvalidState { .. } | Self::UnknownAttribute { .. } | Self::InvalidOptions { .. }
        )
    }

    /// Returns the per-attribute messages of a validation failure.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }

    /// Message carried by a continuation failure, for re-wrapping.
    pub(crate) fn continuation_message(&self) -> Option<String> {
        match self {
            Self::Aborted { message } => Some(message.clone()),
            Self::ContinuationDropped => Some(self.to_string()),
            _ => None,
        }
    }
}

/// A failed instance operation that hands the instance back.
///
/// The instance keeps whatever state the failure left it in: after a
/// validation failure its `errors()` are set and its pending changes are
/// intact, so it can be fixed and saved again.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct Rejected {
    /// The instance the operation ran on.
    pub instance: Box<Instance>,
    /// Why the operation failed.
    #[source]
    pub error: CoreError,
}

impl Rejected {
    /// Creates a rejection.
    pub fn new(instance: Instance, error: CoreError) -> Self {
        Self {
            instance: Box::new(instance),
            error,
        }
    }

    /// Splits the rejection into its instance and error.
    pub fn into_parts(self) -> (Instance, CoreError) {
        (*self.instance, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classes() {
        assert!(CoreError::Validation(ValidationErrors::new()).is_validation());
        assert!(CoreError::from(AdapterError::backend("down")).is_adapter());
        assert!(CoreError::invalid_state(InstanceState::Destroyed, "save").is_state());
        assert!(CoreError::unknown_attribute("Person", "nope").is_state());
        assert!(!CoreError::ContinuationDropped.is_state());
    }

    #[test]
    fn error_display() {
        let err = CoreError::invalid_state(InstanceState::Destroyed, "save");
        assert_eq!(err.to_string(), "cannot save a destroyed instance");

        let err = CoreError::HookFailed {
            slot: HookSlot::BeforeSave,
            message: "nope".into(),
        };
        assert_eq!(err.to_string(), "beforeSave hook failed: nope");
    }

    #[test]
    fn continuation_messages() {
        assert_eq!(
            CoreError::aborted("boom").continuation_message().as_deref(),
            Some("boom")
        );
        assert!(CoreError::ContinuationDropped.continuation_message().is_some());
        assert!(CoreError::invalid_options("x").continuation_message().is_none());
    }
}
