//! Change events propagated from data sources to their listeners.
//!
//! An `Event` is an immutable value. Items are shared through `Arc`, so
//! fanning one event out to many listeners never copies an item and no
//! listener can change what another one observes.

use std::fmt;
use std::sync::Arc;

/// Discriminant of an [`Event`], used for logging and routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Add,
    Update,
    Remove,
    Clear,
    Destroy,
    Snapshot,
}

/// A change emitted by a data source.
///
/// Indices are positions in the emitting source's order: `Add` carries the
/// position after insertion, `Remove` the position before removal and
/// `Update` the unchanged position. A `Snapshot` fully replaces whatever the
/// receiver held; its items are listed in order, so an item's position in
/// `items` is its index.
pub enum Event<T> {
    Add { item: Arc<T>, index: usize },
    Update { old: Arc<T>, new: Arc<T>, index: usize },
    Remove { item: Arc<T>, index: usize },
    Clear,
    Destroy,
    Snapshot { items: Vec<Arc<T>> },
}

impl<T> Event<T> {
    /// Creates an add event.
    #[inline]
    pub fn add(item: Arc<T>, index: usize) -> Self {
        Event::Add { item, index }
    }

    /// Creates an in-place update event.
    #[inline]
    pub fn update(old: Arc<T>, new: Arc<T>, index: usize) -> Self {
        Event::Update { old, new, index }
    }

    /// Creates a remove event.
    #[inline]
    pub fn remove(item: Arc<T>, index: usize) -> Self {
        Event::Remove { item, index }
    }

    /// Creates a snapshot event.
    #[inline]
    pub fn snapshot(items: Vec<Arc<T>>) -> Self {
        Event::Snapshot { items }
    }

    /// Returns the event discriminant.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Add { .. } => EventKind::Add,
            Event::Update { .. } => EventKind::Update,
            Event::Remove { .. } => EventKind::Remove,
            Event::Clear => EventKind::Clear,
            Event::Destroy => EventKind::Destroy,
            Event::Snapshot { .. } => EventKind::Snapshot,
        }
    }

    /// Returns the index carried by item-level events.
    pub fn index(&self) -> Option<usize> {
        match self {
            Event::Add { index, .. } | Event::Update { index, .. } | Event::Remove { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    /// Returns the same event with its index replaced.
    ///
    /// Events without an index are returned unchanged.
    pub fn with_index(self, index: usize) -> Self {
        match self {
            Event::Add { item, .. } => Event::Add { item, index },
            Event::Update { old, new, .. } => Event::Update { old, new, index },
            Event::Remove { item, .. } => Event::Remove { item, index },
            other => other,
        }
    }

    /// Iterates snapshot items with their indices. Empty for other kinds.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &Arc<T>)> {
        let items: &[Arc<T>] = match self {
            Event::Snapshot { items } => items,
            _ => &[],
        };
        items.iter().enumerate()
    }
}

impl<T> Clone for Event<T> {
    fn clone(&self) -> Self {
        match self {
            Event::Add { item, index } => Event::Add {
                item: Arc::clone(item),
                index: *index,
            },
            Event::Update { old, new, index } => Event::Update {
                old: Arc::clone(old),
                new: Arc::clone(new),
                index: *index,
            },
            Event::Remove { item, index } => Event::Remove {
                item: Arc::clone(item),
                index: *index,
            },
            Event::Clear => Event::Clear,
            Event::Destroy => Event::Destroy,
            Event::Snapshot { items } => Event::Snapshot {
                items: items.clone(),
            },
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Event<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Add { item, index } => f
                .debug_struct("Add")
                .field("item", item)
                .field("index", index)
                .finish(),
            Event::Update { old, new, index } => f
                .debug_struct("Update")
                .field("old", old)
                .field("new", new)
                .field("index", index)
                .finish(),
            Event::Remove { item, index } => f
                .debug_struct("Remove")
                .field("item", item)
                .field("index", index)
                .finish(),
            Event::Clear => f.write_str("Clear"),
            Event::Destroy => f.write_str("Destroy"),
            Event::Snapshot { items } => f.debug_struct("Snapshot").field("items", items).finish(),
        }
    }
}

impl<T: PartialEq> PartialEq for Event<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Event::Add { item: a, index: i }, Event::Add { item: b, index: j }) => i == j && a == b,
            (
                Event::Update { old: a0, new: a1, index: i },
                Event::Update { old: b0, new: b1, index: j },
            ) => i == j && a0 == b0 && a1 == b1,
            (Event::Remove { item: a, index: i }, Event::Remove { item: b, index: j }) => {
                i == j && a == b
            }
            (Event::Clear, Event::Clear) | (Event::Destroy, Event::Destroy) => true,
            (Event::Snapshot { items: a }, Event::Snapshot { items: b }) => a == b,
            _ => false,
        }
    }
}
