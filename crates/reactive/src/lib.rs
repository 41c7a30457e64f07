//! Vista Reactive - Live derived views over keyed collections.
//!
//! This crate connects mutable collections to the consumers watching them.
//! Every mutation is pushed synchronously through a graph of data sources
//! and ends up as window-relative notifications in session queues.
//!
//! # Core Concepts
//!
//! - `SourceRegistry`: Arena owning every data source; shares identical
//!   derivations and sweeps the ones nobody listens to
//! - `BaseCollection`: A mutable root source, ordered by key
//! - `DataSource`: A root, or a filtered/sorted projection of another source
//! - `EventSink`: Anything subscribed to a source
//! - `Viewport`: A positioned, selectable window over a filtered and sorted
//!   projection, with summaries over the whole projection
//! - `SessionQueue`: FIFO of `Notification`s polled by one consumer
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vista_core::{DataType, Schema, Value};
//! use vista_query::SortCriteria;
//! use vista_reactive::{BaseCollection, SessionQueue, SourceRegistry, Viewport, ViewportConfig, WindowReplica};
//!
//! struct Job {
//!     id: &'static str,
//!     priority: i64,
//! }
//!
//! let schema = Schema::builder("jobs")
//!     .unwrap()
//!     .key(|j: &Job| j.id.to_string())
//!     .add_attribute("priority", DataType::Int64, |j: &Job| Value::Int64(j.priority))
//!     .unwrap()
//!     .build()
//!     .unwrap();
//! let registry = Arc::new(SourceRegistry::new(Arc::new(schema)));
//! let jobs = BaseCollection::new(Arc::clone(&registry));
//! jobs.snapshot(vec![Job { id: "a", priority: 3 }, Job { id: "b", priority: 1 }]);
//!
//! let queue = Arc::new(SessionQueue::new());
//! let config = ViewportConfig::new(10).sort(SortCriteria::parse("priority=ASC").unwrap());
//! let viewport = Viewport::open(Arc::clone(&registry), jobs.id(), 1, Arc::clone(&queue), config).unwrap();
//!
//! jobs.add(Job { id: "c", priority: 2 });
//!
//! let mut replica = WindowReplica::new();
//! for notification in queue.drain() {
//!     replica.apply(&notification);
//! }
//! let ids: Vec<&str> = replica.rows().iter().map(|j| j.id).collect();
//! assert_eq!(ids, vec!["b", "c", "a"]);
//! assert_eq!(viewport.total(), 3);
//! ```

pub mod collection;
pub mod listener;
pub mod notification;
pub mod queue;
pub mod registry;
pub mod source;
pub mod summary;
pub mod viewport;

pub use collection::BaseCollection;
pub use listener::{EventSink, ListenerId, ListenerSet};
pub use notification::{Notification, ViewportId};
pub use queue::{QueueSink, SessionQueue};
pub use registry::SourceRegistry;
pub use source::{Contents, DataSource, Derivation, SourceId};
pub use summary::SummaryListener;
pub use viewport::{Viewport, ViewportCell, ViewportConfig, WindowReplica};
