//! Vista Service - Sessions, scoped collections and viewport requests.
//!
//! `ViewService` is the surface a request layer talks to. It owns the
//! collections of one item type, keyed by [`CollectionId`], and the sessions
//! polling for changes. A session subscribes viewports with a
//! [`ViewportRequest`], drives them through [`ViewportHandle`]s and drains
//! its notifications with [`ViewService::dequeue_pending_events`].
//!
//! A [`Sweeper`] thread destroys derived sources nobody has listened to for
//! the configured grace period.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vista_core::{DataType, EngineConfig, Schema, Value};
//! use vista_reactive::{Notification, WindowReplica};
//! use vista_service::{CollectionId, ViewService, ViewportRequest};
//!
//! struct Trade {
//!     id: u32,
//!     desk: &'static str,
//!     qty: i64,
//! }
//!
//! let schema = Schema::builder("trades")
//!     .unwrap()
//!     .key(|t: &Trade| format!("{:04}", t.id))
//!     .add_attribute("desk", DataType::String, |t: &Trade| Value::from(t.desk))
//!     .unwrap()
//!     .add_attribute("qty", DataType::Int64, |t: &Trade| Value::Int64(t.qty))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let service = ViewService::new(schema, EngineConfig::default()).unwrap();
//! let trades = service.collection(&CollectionId::global("trades"));
//!
//! let session = service.open_session();
//! let request = ViewportRequest::new("trades")
//!     .filter("desk=rates")
//!     .sort("qty=DESC")
//!     .size(2)
//!     .summary("qty", "sum");
//! service.subscribe(session, request).unwrap();
//!
//! trades.add(Trade { id: 1, desk: "rates", qty: 10 });
//! trades.add(Trade { id: 2, desk: "fx", qty: 50 });
//! trades.add(Trade { id: 3, desk: "rates", qty: 30 });
//!
//! let mut replica = WindowReplica::new();
//! let mut total = None;
//! for notification in service.dequeue_pending_events(session).unwrap() {
//!     if let Notification::Summary { value, .. } = &notification {
//!         total = Some(value.clone());
//!     }
//!     replica.apply(&notification);
//! }
//! let ids: Vec<u32> = replica.rows().iter().map(|t| t.id).collect();
//! assert_eq!(ids, vec![3, 1]);
//! assert_eq!(total, Some(Value::Float64(40.0)));
//! ```

mod collection_id;
mod service;
mod session;
mod sweeper;

pub use collection_id::{CollectionId, Scope};
pub use service::{ViewService, ViewportRequest};
pub use session::{SessionId, ViewportHandle};
pub use sweeper::Sweeper;
