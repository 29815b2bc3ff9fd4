//! # RecordKit Core
//!
//! Model runtime for RecordKit.
//!
//! This crate provides:
//! - Model descriptors with defaults, rules and lifecycle hooks
//! - Instances with deterministic dirty tracking
//! - A validation pipeline that always runs every rule
//! - Create/save/update/destroy orchestration against an [`Adapter`]
//! - Bounded, optionally concurrent iteration over large result sets
//!
//! Every operation is an `async fn`. Each also has a `*_with` entry point
//! that takes a completion callback and runs on the current tokio runtime.
//!
//! ## Example
//!
//! ```rust
//! use recordkit_adapter::MemoryAdapter;
//! use recordkit_core::{Property, PropertyKind, Schema};
//! use recordkit_value::record;
//! use std::sync::Arc;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let schema = Schema::new(Arc::new(MemoryAdapter::new()));
//! let person = schema.define(
//!     "Person",
//!     vec![
//!         Property::new("name", PropertyKind::String),
//!         Property::new("age", PropertyKind::Number),
//!     ],
//! );
//! person.validates_presence_of("name");
//!
//! let mut ann = person.create(record! { "name" => "Ann" }).await.unwrap();
//! ann.set("age", 31).unwrap();
//! assert!(ann.property_changed("age"));
//! ann.save().await.unwrap();
//! assert!(!ann.property_changed("age"));
//!
//! let rejected = person.create(record! {}).await.unwrap_err();
//! assert!(rejected.error.is_validation());
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod completion;
mod config;
mod error;
mod hooks;
mod instance;
mod iterate;
mod lifecycle;
mod model;
mod query;
mod validation;

pub use completion::{spawn_completion, Next};
pub use config::{CreateOptions, IterateOptions, SaveOptions, DEFAULT_BATCH_SIZE};
pub use error::{CoreError, CoreResult, Rejected};
pub use hooks::{Hook, HookSlot, HookTable};
pub use instance::{AttributeTracker, Instance, InstanceState};
pub use iterate::IterationSummary;
pub use lifecycle::BatchOutcome;
pub use model::{
    Clock, DefaultValue, Model, Property, PropertyKind, Schema, SystemClock, ValueProvider,
};
pub use validation::{
    AsyncPredicate, Predicate, Rule, RuleCondition, RuleKind, ValidationErrors, ValidityCheck,
};

pub use recordkit_adapter::{Adapter, AdapterError, Filter, RecordId};
pub use recordkit_value::{Record, Value};
