//! Vista Core - Core types for Vista live views.
//!
//! This crate provides the foundational types shared by every Vista layer:
//!
//! - `DataType`: Declared attribute types (Boolean, Int32, Int64, Float64, String, Set, Map)
//! - `Value`: Runtime attribute values returned by accessors
//! - `Schema`: Key extractor and typed attribute accessors for an item type
//! - `Event`: The unit of change propagation between data sources and listeners
//! - `EngineConfig`: Tunables for derived-source expiry and viewport sizing
//! - `Error`: Error types for configuration and request failures
//!
//! # Example
//!
//! ```rust
//! use vista_core::{DataType, Schema, Value};
//!
//! struct Order {
//!     id: u64,
//!     status: String,
//! }
//!
//! let schema = Schema::builder("orders")
//!     .unwrap()
//!     .key(|o: &Order| o.id.to_string())
//!     .add_attribute("status", DataType::String, |o: &Order| Value::from(o.status.clone()))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let order = Order { id: 1, status: "Active".into() };
//! assert_eq!(schema.key_of(&order), "1");
//! assert_eq!(schema.value_of(&order, "status"), Some(Value::from("Active")));
//! ```

mod config;
mod error;
mod event;
pub mod schema;
mod types;
mod value;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use event::{Event, EventKind};
pub use schema::{AccessorFn, Attribute, KeyFn, Schema, SchemaBuilder};
pub use types::DataType;
pub use value::Value;
