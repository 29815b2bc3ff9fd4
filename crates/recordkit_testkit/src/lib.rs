//! # RecordKit Testkit
//!
//! Test utilities for RecordKit.
//!
//! This crate provides:
//! - Model fixtures over a fresh in-memory adapter
//! - A deterministic clock for time-based defaults
//! - A fault-injecting adapter wrapper
//! - Property-based test generators using proptest
//! - One-time tracing setup for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recordkit_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn creates_people() {
//!     let fixture = PersonFixture::new();
//!     let ann = fixture.person.create(record! { "name" => "Ann" }).await.unwrap();
//!     assert!(!ann.is_new_record());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod faults;
pub mod fixtures;
pub mod generators;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::faults::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::*;
    pub use recordkit_value::record;
}

pub use faults::*;
pub use fixtures::*;
pub use generators::*;
pub use logging::*;
