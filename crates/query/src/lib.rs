//! Vista Query - Filter expressions and sort criteria for Vista live views.
//!
//! This crate provides:
//!
//! - `filter`: The filter text form (escape codec, operator tokens, parser)
//!   and typed predicates compiled against a schema
//! - `sort`: Sort criteria text form and compiled sorters producing ranks
//!
//! Both are single-pass: a filter is a boolean predicate over one item, a
//! sorter is a comparator key over one item.

pub mod filter;
pub mod sort;

pub use filter::{Filter, FilterCriteria, FilterExpression, Operator};
pub use sort::{Rank, SortCriteria, SortDirection, SortField, SortValue, Sorter};
