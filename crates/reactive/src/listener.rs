//! Listener management for data sources.
//!
//! This module provides listener IDs, the `EventSink` trait implemented by
//! anything that observes a data source, and the per-source listener set.

use crate::source::{Contents, SourceId};
use slotmap::{new_key_type, SlotMap};
use std::sync::Arc;
use vista_core::Event;

new_key_type! {
    /// Identifier of one listener on one data source.
    ///
    /// Returned by subscribe and attach; pass it back to unsubscribe.
    pub struct ListenerId;
}

/// Receives events from a data source.
///
/// Every method is called while the emitting source's lock is held, so calls
/// for one source never interleave. Implementations may take their own locks
/// but must never call back into the registry.
pub trait EventSink<T>: Send + Sync {
    /// Called once per event, in emission order. `contents` is the source's
    /// state right after the event.
    fn on_event(&self, source: SourceId, event: &Event<T>, contents: &Contents<T>);

    /// Called when the sink is attached, with the source's current contents.
    fn on_attach(&self, source: SourceId, contents: &Contents<T>) {
        let _ = (source, contents);
    }

    /// Called after all events caused by one upstream mutation have been
    /// delivered. A move arrives as `Remove` followed by `Add`; state keyed by
    /// item (selection) should only be reconciled here.
    fn on_settled(&self, source: SourceId, contents: &Contents<T>) {
        let _ = (source, contents);
    }
}

/// The sinks attached to one data source.
pub struct ListenerSet<T> {
    sinks: SlotMap<ListenerId, Arc<dyn EventSink<T>>>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ListenerSet<T> {
    pub fn new() -> Self {
        Self {
            sinks: SlotMap::with_key(),
        }
    }

    /// Adds a sink and returns its ID.
    pub fn insert(&mut self, sink: Arc<dyn EventSink<T>>) -> ListenerId {
        self.sinks.insert(sink)
    }

    /// Removes a sink by ID.
    ///
    /// Returns true if the listener was found and removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.sinks.remove(id).is_some()
    }

    /// Delivers an event to every sink.
    pub fn notify_all(&self, source: SourceId, event: &Event<T>, contents: &Contents<T>) {
        for sink in self.sinks.values() {
            sink.on_event(source, event, contents);
        }
    }

    /// Tells every sink that the current mutation is fully delivered.
    pub fn settle_all(&self, source: SourceId, contents: &Contents<T>) {
        for sink in self.sinks.values() {
            sink.on_settled(source, contents);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn clear(&mut self) {
        self.sinks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use slotmap::KeyData;
    use vista_core::EventKind;

    #[derive(Default)]
    struct Recorder {
        kinds: Mutex<Vec<EventKind>>,
        settled: Mutex<usize>,
    }

    impl EventSink<i32> for Recorder {
        fn on_event(&self, _source: SourceId, event: &Event<i32>, _contents: &Contents<i32>) {
            self.kinds.lock().push(event.kind());
        }

        fn on_settled(&self, _source: SourceId, _contents: &Contents<i32>) {
            *self.settled.lock() += 1;
        }
    }

    fn source_id() -> SourceId {
        SourceId::from(KeyData::from_ffi(1))
    }

    #[test]
    fn test_insert_remove() {
        let mut set: ListenerSet<i32> = ListenerSet::new();
        let id = set.insert(Arc::new(Recorder::default()));
        assert_eq!(set.len(), 1);
        assert!(set.remove(id));
        assert!(!set.remove(id));
        assert!(set.is_empty());
    }

    #[test]
    fn test_notify_all_in_order() {
        let mut set: ListenerSet<i32> = ListenerSet::new();
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        set.insert(a.clone());
        set.insert(b.clone());

        let contents = Contents::new();
        set.notify_all(source_id(), &Event::Clear, &contents);
        set.notify_all(source_id(), &Event::add(Arc::new(1), 0), &contents);
        set.settle_all(source_id(), &contents);

        for r in [&a, &b] {
            assert_eq!(*r.kinds.lock(), vec![EventKind::Clear, EventKind::Add]);
            assert_eq!(*r.settled.lock(), 1);
        }
    }
}
