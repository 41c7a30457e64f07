//! Value deltas fed to running aggregates.
//!
//! Aggregates never see items or positions. A source event is reduced to
//! the values it adds and withdraws, read from each item through a single
//! accessor.

use vista_core::Event;

/// One value entering (`diff > 0`) or leaving (`diff < 0`) an aggregate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delta<V> {
    pub data: V,
    pub diff: i32,
}

impl<V> Delta<V> {
    #[inline]
    pub fn insert(data: V) -> Self {
        Self { data, diff: 1 }
    }

    #[inline]
    pub fn delete(data: V) -> Self {
        Self { data, diff: -1 }
    }

    #[inline]
    pub fn is_insert(&self) -> bool {
        self.diff > 0
    }

    #[inline]
    pub fn is_delete(&self) -> bool {
        self.diff < 0
    }
}

pub type DeltaBatch<V> = Vec<Delta<V>>;

/// The deltas an event implies for a value read from each item.
///
/// When `reset` is set the receiver must discard its state before applying
/// `deltas`; snapshots and clears are not expressible as deltas alone.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDeltas<V> {
    pub reset: bool,
    pub deltas: DeltaBatch<V>,
}

impl<V> EventDeltas<V> {
    /// Translates an event using `read` to extract the tracked value.
    ///
    /// `Update` withdraws the old value before adding the new one, so an
    /// extreme held by the updated item is released first.
    pub fn from_event<T, F>(event: &Event<T>, read: F) -> Self
    where
        F: Fn(&T) -> V,
    {
        let (reset, deltas) = match event {
            Event::Add { item, .. } => (false, vec![Delta::insert(read(item))]),
            Event::Remove { item, .. } => (false, vec![Delta::delete(read(item))]),
            Event::Update { old, new, .. } => {
                (false, vec![Delta::delete(read(old)), Delta::insert(read(new))])
            }
            Event::Snapshot { items } => (true, items.iter().map(|i| Delta::insert(read(i))).collect()),
            Event::Clear | Event::Destroy => (true, Vec::new()),
        };
        Self { reset, deltas }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_add_and_remove_carry_one_value() {
        let out = EventDeltas::from_event(&Event::add(Arc::new(5), 2), |v: &i32| *v * 10);
        assert!(!out.reset);
        assert_eq!(out.deltas, vec![Delta::insert(50)]);

        let out = EventDeltas::from_event(&Event::remove(Arc::new(5), 0), |v: &i32| *v);
        assert!(out.deltas[0].is_delete());
    }

    #[test]
    fn test_update_is_delete_then_insert() {
        let event = Event::update(Arc::new(3), Arc::new(7), 0);
        let out = EventDeltas::from_event(&event, |v: &i32| *v);
        assert!(!out.reset);
        assert_eq!(out.deltas, vec![Delta::delete(3), Delta::insert(7)]);
    }

    #[test]
    fn test_snapshot_and_clear_reset() {
        let event = Event::snapshot(vec![Arc::new(1), Arc::new(2)]);
        let out = EventDeltas::from_event(&event, |v: &i32| *v);
        assert!(out.reset);
        assert_eq!(out.deltas, vec![Delta::insert(1), Delta::insert(2)]);

        for event in [Event::<i32>::Clear, Event::Destroy] {
            let out = EventDeltas::from_event(&event, |v: &i32| *v);
            assert!(out.reset);
            assert!(out.deltas.is_empty());
        }
    }
}
