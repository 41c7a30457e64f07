//! Base collections: the mutable roots of the source graph.

use crate::registry::SourceRegistry;
use crate::source::{DataSource, RootChange, SourceId};
use std::sync::Arc;

/// A keyed, mutable collection of items.
///
/// Every mutation is delivered synchronously to the collection's sinks and
/// to all derived sources before the call returns. Mutations on a destroyed
/// collection are ignored.
pub struct BaseCollection<T> {
    registry: Arc<SourceRegistry<T>>,
    id: SourceId,
}

impl<T> BaseCollection<T> {
    /// Creates a new, empty collection in `registry`.
    pub fn new(registry: Arc<SourceRegistry<T>>) -> Self {
        let id = registry.create_root();
        Self { registry, id }
    }

    /// Wraps an existing root source.
    pub fn attach(registry: Arc<SourceRegistry<T>>, id: SourceId) -> Option<Self> {
        registry
            .get(id)
            .filter(|source| source.is_root())
            .map(|_| Self { registry, id })
    }

    #[inline]
    pub fn id(&self) -> SourceId {
        self.id
    }

    #[inline]
    pub fn registry(&self) -> &Arc<SourceRegistry<T>> {
        &self.registry
    }

    fn source(&self) -> Option<Arc<DataSource<T>>> {
        self.registry.get(self.id)
    }

    fn apply(&self, change: RootChange<T>) -> bool {
        match self.source() {
            Some(source) => source.change(&self.registry, change),
            None => false,
        }
    }

    /// Adds an item; an item whose key is already present replaces it.
    pub fn add(&self, item: impl Into<Arc<T>>) -> bool {
        self.apply(RootChange::Upsert(item.into()))
    }

    /// Replaces the item with the same key; an absent key is added.
    pub fn update(&self, item: impl Into<Arc<T>>) -> bool {
        self.apply(RootChange::Upsert(item.into()))
    }

    /// Removes the item with `key`. Returns false if it was absent.
    pub fn remove(&self, key: &str) -> bool {
        self.apply(RootChange::Remove(key.to_string()))
    }

    /// Removes the item sharing `item`'s key.
    pub fn remove_item(&self, item: &T) -> bool {
        let key = self.registry.schema().key_of(item);
        self.remove(&key)
    }

    /// Replaces the whole contents. Later duplicates of a key win.
    pub fn snapshot<I, V>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: Into<Arc<T>>,
    {
        self.apply(RootChange::Snapshot(items.into_iter().map(Into::into).collect()))
    }

    /// Removes every item.
    pub fn clear(&self) -> bool {
        self.apply(RootChange::Clear)
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.source().and_then(|s| s.get(key))
    }

    pub fn get_at(&self, index: usize) -> Option<Arc<T>> {
        self.source().and_then(|s| s.get_at(index))
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.source().and_then(|s| s.index_of(key))
    }

    pub fn size(&self) -> usize {
        self.source().map_or(0, |s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns all items in key order.
    pub fn values(&self) -> Vec<Arc<T>> {
        self.source().map(|s| s.values()).unwrap_or_default()
    }

    pub fn is_destroyed(&self) -> bool {
        self.source().map_or(true, |s| s.is_destroyed())
    }
}

impl<T> Clone for BaseCollection<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            id: self.id,
        }
    }
}

impl<T> std::fmt::Debug for BaseCollection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseCollection").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::EventSink;
    use crate::source::Contents;
    use parking_lot::Mutex;
    use vista_core::{DataType, Event, Schema, Value};

    #[derive(Debug, PartialEq)]
    struct Item {
        id: &'static str,
        value: i64,
    }

    fn item(id: &'static str, value: i64) -> Item {
        Item { id, value }
    }

    fn collection() -> BaseCollection<Item> {
        let schema = Schema::builder("items")
            .unwrap()
            .key(|i: &Item| i.id.to_string())
            .add_attribute("value", DataType::Int64, |i: &Item| Value::Int64(i.value))
            .unwrap()
            .build()
            .unwrap();
        BaseCollection::new(Arc::new(SourceRegistry::new(Arc::new(schema))))
    }

    #[derive(Default)]
    struct Log {
        events: Mutex<Vec<Event<Item>>>,
    }

    impl EventSink<Item> for Log {
        fn on_event(&self, _source: SourceId, event: &Event<Item>, _contents: &Contents<Item>) {
            self.events.lock().push(event.clone());
        }
    }

    #[test]
    fn test_add_existing_key_updates() {
        let base = collection();
        let log = Arc::new(Log::default());
        base.registry().subscribe(base.id(), log.clone()).unwrap();

        base.add(item("a", 1));
        base.add(item("a", 2));
        assert_eq!(base.size(), 1);
        assert_eq!(base.get("a").unwrap().value, 2);

        let events = log.events.lock();
        assert_eq!(events[0], Event::add(Arc::new(item("a", 1)), 0));
        assert_eq!(events[1], Event::update(Arc::new(item("a", 1)), Arc::new(item("a", 2)), 0));
    }

    #[test]
    fn test_update_absent_key_adds() {
        let base = collection();
        assert!(base.update(item("b", 1)));
        assert_eq!(base.index_of("b"), Some(0));
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let base = collection();
        let log = Arc::new(Log::default());
        base.registry().subscribe(base.id(), log.clone()).unwrap();
        assert!(!base.remove("missing"));
        assert!(log.events.lock().is_empty());
    }

    #[test]
    fn test_remove_reports_prior_index() {
        let base = collection();
        base.snapshot(vec![item("a", 1), item("b", 2), item("c", 3)]);
        let log = Arc::new(Log::default());
        base.registry().subscribe(base.id(), log.clone()).unwrap();

        assert!(base.remove_item(&item("b", 0)));
        assert_eq!(*log.events.lock(), vec![Event::remove(Arc::new(item("b", 2)), 1)]);
        assert_eq!(base.get_at(1).unwrap().id, "c");
    }

    #[test]
    fn test_snapshot_and_clear() {
        let base = collection();
        base.snapshot(vec![item("b", 1), item("a", 2), item("b", 3)]);
        let values: Vec<(&str, i64)> = base.values().iter().map(|i| (i.id, i.value)).collect();
        assert_eq!(values, vec![("a", 2), ("b", 3)]);

        assert!(base.clear());
        assert!(base.is_empty());
    }
}
