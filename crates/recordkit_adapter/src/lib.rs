//! # RecordKit Adapter
//!
//! Storage adapter trait and implementations for RecordKit.
//!
//! Adapters are the only storage boundary of the runtime. They execute
//! primitive create/read/update/delete requests for a named model and
//! return primitive results: ids, booleans, counts and raw records.
//!
//! ## Design Principles
//!
//! - Adapters know nothing about validation, hooks or dirty tracking
//! - One adapter serves every model of a schema; requests carry the model name
//! - Must be `Send + Sync`; every operation is `async`
//! - Records handed to an adapter are owned copies, never live instance state
//!
//! ## Available Adapters
//!
//! - [`MemoryAdapter`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use recordkit_adapter::{Adapter, Filter, MemoryAdapter};
//! use recordkit_value::record;
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let adapter = MemoryAdapter::new();
//! let id = adapter.create("Person", record! { "name" => "Ann" }).await.unwrap();
//! assert!(adapter.exists("Person", id).await.unwrap());
//! assert_eq!(adapter.count("Person", &Filter::new()).await.unwrap(), 1);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod filter;
mod id;
mod memory;

pub use adapter::{Adapter, StoredRecord};
pub use error::{AdapterError, AdapterResult};
pub use filter::{Condition, Direction, Filter, Order, ID_ATTRIBUTE};
pub use id::RecordId;
pub use memory::MemoryAdapter;
