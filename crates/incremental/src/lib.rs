//! Vista Incremental - Incremental maintenance for Vista live views.
//!
//! This crate holds the state that derived sources and viewports keep up to
//! date without recomputing from scratch:
//!
//! - `Delta<T>`: A change to a value (+1 for insert, -1 for delete), and the
//!   translation of source events into deltas
//! - `OrderedIndex<K, T>`: Keyed items ordered by `(rank, key)`, reporting the
//!   positions every mutation touches
//! - `IncrementalCount/Sum/Avg/Min/Max`: Running aggregates; Min and Max keep
//!   an ordered multiset so removing the current extreme never rescans
//! - `Summary<T>`: Event-driven summary handlers configured as `type[:ref]`
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vista_incremental::OrderedIndex;
//!
//! let mut index: OrderedIndex<i64, &str> = OrderedIndex::new();
//! index.insert("b".into(), 20, Arc::new("second"));
//! assert_eq!(index.insert("a".into(), 10, Arc::new("first")), 0);
//!
//! let moved = index.update("a", 30, Arc::new("last")).unwrap();
//! assert_eq!((moved.from, moved.to), (0, 1));
//! ```

pub mod aggregate;
pub mod delta;
pub mod ordered;
pub mod summary;

pub use aggregate::{IncrementalAvg, IncrementalCount, IncrementalMax, IncrementalMin, IncrementalSum, Multiset};
pub use delta::{Delta, DeltaBatch, EventDeltas};
pub use ordered::{OrderedIndex, Replaced};
pub use summary::{FieldSummary, Summary, SummaryCatalog, SummaryFactory, SummaryKind, SummarySpec};
