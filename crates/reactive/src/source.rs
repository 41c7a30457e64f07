//! Data sources: root collections and the filtered/sorted projections
//! chained onto them.
//!
//! A source keeps its visible items in an [`OrderedIndex`] ordered by
//! `(rank, key)`. Root sources rank every item equally, so they are ordered
//! by key. A filter source inherits its parent's ranking and a sort source
//! replaces it, which makes a filter's order the restriction of its
//! parent's order.
//!
//! Derived sources hold shared `Arc<T>` handles to the root's items; they
//! never copy an item. Parent and child are linked through [`SourceId`]s
//! resolved in the registry arena.

use crate::listener::{EventSink, ListenerId, ListenerSet};
use crate::registry::SourceRegistry;
use parking_lot::{Mutex, MutexGuard};
use slotmap::new_key_type;
use std::sync::Arc;
use std::time::{Duration, Instant};
use vista_core::{Event, Schema};
use vista_incremental::OrderedIndex;
use vista_query::{Filter, Rank, SortCriteria, Sorter};

new_key_type! {
    /// Identifier of a data source in the registry arena.
    pub struct SourceId;
}

/// The visible, ordered items of a data source.
pub type Contents<T> = OrderedIndex<Rank, T>;

/// How a derived source is produced from its parent.
pub enum Derivation<T> {
    Filter(Arc<Filter<T>>),
    Sort(Arc<Sorter<T>>),
}

impl<T> Derivation<T> {
    /// Canonical text used to share identical derivations of one parent.
    pub fn descriptor(&self) -> String {
        match self {
            Derivation::Filter(filter) => format!("filter:{}", filter),
            Derivation::Sort(sorter) => format!("sort:{}", sorter.criteria()),
        }
    }
}

impl<T> Clone for Derivation<T> {
    fn clone(&self) -> Self {
        match self {
            Derivation::Filter(f) => Derivation::Filter(Arc::clone(f)),
            Derivation::Sort(s) => Derivation::Sort(Arc::clone(s)),
        }
    }
}

/// A mutation applied to a root source.
pub(crate) enum RootChange<T> {
    Upsert(Arc<T>),
    Remove(String),
    Snapshot(Vec<Arc<T>>),
    Clear,
}

/// Mutable state of a source, guarded by the source lock.
pub(crate) struct SourceState<T> {
    pub(crate) contents: Contents<T>,
    pub(crate) listeners: ListenerSet<T>,
    /// Derived sources chained onto this one.
    pub(crate) children: Vec<SourceId>,
    pub(crate) permanent: bool,
    /// Set when both `listeners` and `children` became empty.
    pub(crate) childless_since: Option<Instant>,
    pub(crate) destroyed: bool,
    /// Emitted since the last settle.
    dirty: bool,
}

impl<T> SourceState<T> {
    fn new(contents: Contents<T>, childless_since: Option<Instant>) -> Self {
        Self {
            contents,
            listeners: ListenerSet::new(),
            children: Vec::new(),
            permanent: false,
            childless_since,
            destroyed: false,
            dirty: false,
        }
    }

    #[inline]
    pub(crate) fn is_childless(&self) -> bool {
        self.listeners.is_empty() && self.children.is_empty()
    }

    pub(crate) fn mark_if_childless(&mut self, now: Instant) {
        if self.is_childless() && self.childless_since.is_none() {
            self.childless_since = Some(now);
        }
    }

    /// Returns true if the sweeper may destroy this source.
    pub(crate) fn is_expired(&self, now: Instant, grace: Duration) -> bool {
        !self.destroyed
            && !self.permanent
            && self.is_childless()
            && self
                .childless_since
                .is_some_and(|since| now.saturating_duration_since(since) >= grace)
    }
}

/// A node of the source graph.
pub struct DataSource<T> {
    id: SourceId,
    parent: Option<SourceId>,
    descriptor: Option<String>,
    filter: Option<Arc<Filter<T>>>,
    /// Effective ranking of this source's order.
    sorter: Arc<Sorter<T>>,
    schema: Arc<Schema<T>>,
    state: Mutex<SourceState<T>>,
}

impl<T> DataSource<T> {
    pub(crate) fn root(id: SourceId, schema: Arc<Schema<T>>) -> Self {
        Self {
            id,
            parent: None,
            descriptor: None,
            filter: None,
            sorter: Arc::new(Sorter::unsorted()),
            schema,
            state: Mutex::new(SourceState::new(Contents::new(), None)),
        }
    }

    /// Creates a derived source projecting `parent_contents`.
    pub(crate) fn derived(
        id: SourceId,
        parent: &DataSource<T>,
        parent_contents: &Contents<T>,
        derivation: Derivation<T>,
    ) -> Self {
        let descriptor = derivation.descriptor();
        let (filter, sorter) = match derivation {
            Derivation::Filter(filter) => (Some(filter), Arc::clone(&parent.sorter)),
            Derivation::Sort(sorter) => (None, sorter),
        };
        let schema = Arc::clone(&parent.schema);
        let contents = Contents::from_entries(
            parent_contents
                .iter()
                .filter(|item| filter.as_ref().map_or(true, |f| f.include(item)))
                .map(|item| (schema.key_of(item), sorter.rank(item), Arc::clone(item))),
        );
        Self {
            id,
            parent: Some(parent.id),
            descriptor: Some(descriptor),
            filter,
            sorter,
            schema,
            state: Mutex::new(SourceState::new(contents, Some(Instant::now()))),
        }
    }

    #[inline]
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Returns the upstream source; `None` for a root.
    #[inline]
    pub fn parent(&self) -> Option<SourceId> {
        self.parent
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Returns the derivation descriptor (`filter:...` or `sort:...`).
    #[inline]
    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }

    /// Returns the filter of a filter source.
    pub fn filter(&self) -> Option<&Filter<T>> {
        self.filter.as_deref()
    }

    /// Returns the sort criteria that determine this source's order.
    pub fn sort_criteria(&self) -> &SortCriteria {
        self.sorter.criteria()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SourceState<T>> {
        self.state.lock()
    }

    /// Runs `f` on the current contents under the source lock.
    ///
    /// Returns `None` once the source has been destroyed.
    pub fn with_contents<R>(&self, f: impl FnOnce(&Contents<T>) -> R) -> Option<R> {
        let state = self.state.lock();
        if state.destroyed {
            return None;
        }
        Some(f(&state.contents))
    }

    pub fn len(&self) -> usize {
        self.state.lock().contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all visible items in order.
    pub fn values(&self) -> Vec<Arc<T>> {
        self.state.lock().contents.values()
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.state.lock().contents.get_by_key(key).cloned()
    }

    pub fn get_at(&self, index: usize) -> Option<Arc<T>> {
        self.state.lock().contents.get(index).cloned()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.state.lock().contents.position(key)
    }

    /// Number of sinks plus derived children.
    pub fn listener_count(&self) -> usize {
        let state = self.state.lock();
        state.listeners.len() + state.children.len()
    }

    pub fn is_permanent(&self) -> bool {
        self.state.lock().permanent
    }

    pub fn childless_since(&self) -> Option<Instant> {
        self.state.lock().childless_since
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    /// Adds a sink and hands it the current contents.
    pub(crate) fn add_listener(&self, state: &mut SourceState<T>, sink: Arc<dyn EventSink<T>>) -> ListenerId {
        let id = state.listeners.insert(Arc::clone(&sink));
        state.childless_since = None;
        sink.on_attach(self.id, &state.contents);
        id
    }

    /// Applies a root mutation and delivers everything it causes.
    ///
    /// Returns false if nothing was applied.
    pub(crate) fn change(&self, registry: &SourceRegistry<T>, change: RootChange<T>) -> bool {
        let mut state = self.state.lock();
        if state.destroyed {
            return false;
        }
        let applied = match change {
            RootChange::Upsert(item) => {
                self.upsert(registry, &mut state, &item);
                true
            }
            RootChange::Remove(key) => {
                let present = state.contents.contains_key(&key);
                self.evict(registry, &mut state, &key);
                present
            }
            RootChange::Snapshot(items) => {
                self.replace(registry, &mut state, &items);
                true
            }
            RootChange::Clear => {
                self.process(registry, &mut state, &Event::Clear);
                true
            }
        };
        self.settle(registry, &mut state);
        applied
    }

    /// Recomputes this source's view of an upstream event and emits the
    /// resulting events.
    pub(crate) fn process(&self, registry: &SourceRegistry<T>, state: &mut SourceState<T>, upstream: &Event<T>) {
        match upstream {
            Event::Add { item, .. } => self.upsert(registry, state, item),
            Event::Update { new, .. } => self.upsert(registry, state, new),
            Event::Remove { item, .. } => {
                let key = self.schema.key_of(item);
                self.evict(registry, state, &key);
            }
            Event::Snapshot { items } => self.replace(registry, state, items),
            Event::Clear => {
                state.contents.clear();
                self.emit(registry, state, Event::Clear);
            }
            Event::Destroy => {
                state.contents.clear();
                state.destroyed = true;
                self.emit(registry, state, Event::Destroy);
            }
        }
    }

    fn admits(&self, item: &T) -> bool {
        self.filter.as_ref().map_or(true, |f| f.include(item))
    }

    /// Inserts, updates, repositions or drops an item after a change.
    fn upsert(&self, registry: &SourceRegistry<T>, state: &mut SourceState<T>, item: &Arc<T>) {
        let key = self.schema.key_of(item);
        if !self.admits(item) {
            self.evict(registry, state, &key);
            return;
        }
        let rank = self.sorter.rank(item);
        match state.contents.relocation(&key, &rank) {
            None => {
                let index = state.contents.insert(key, rank, Arc::clone(item));
                self.emit(registry, state, Event::add(Arc::clone(item), index));
            }
            Some((from, to)) if from == to => {
                if let Some(replaced) = state.contents.update(&key, rank, Arc::clone(item)) {
                    self.emit(registry, state, Event::update(replaced.old, Arc::clone(item), replaced.from));
                }
            }
            Some(_) => {
                // Moved: listeners see the removal before the insertion.
                if let Some((from, old)) = state.contents.remove(&key) {
                    self.emit(registry, state, Event::remove(old, from));
                }
                let to = state.contents.insert(key, rank, Arc::clone(item));
                self.emit(registry, state, Event::add(Arc::clone(item), to));
            }
        }
    }

    fn evict(&self, registry: &SourceRegistry<T>, state: &mut SourceState<T>, key: &str) {
        if let Some((index, item)) = state.contents.remove(key) {
            self.emit(registry, state, Event::remove(item, index));
        }
    }

    fn replace(&self, registry: &SourceRegistry<T>, state: &mut SourceState<T>, items: &[Arc<T>]) {
        state.contents.rebuild(
            items
                .iter()
                .filter(|item| self.admits(item))
                .map(|item| (self.schema.key_of(item), self.sorter.rank(item), Arc::clone(item))),
        );
        let values = state.contents.values();
        self.emit(registry, state, Event::snapshot(values));
    }

    /// Delivers an event to the sinks, then to every derived child.
    fn emit(&self, registry: &SourceRegistry<T>, state: &mut SourceState<T>, event: Event<T>) {
        state.dirty = true;
        tracing::trace!(
            target: "vista_reactive::source",
            source = ?self.id,
            kind = ?event.kind(),
            index = ?event.index(),
            sinks = state.listeners.len(),
            children = state.children.len(),
            "fan-out"
        );
        state.listeners.notify_all(self.id, &event, &state.contents);
        for &child_id in &state.children {
            let Some(child) = registry.get(child_id) else {
                continue;
            };
            let mut child_state = child.lock();
            if child_state.destroyed {
                continue;
            }
            child.process(registry, &mut child_state, &event);
        }
    }

    /// Signals the end of a mutation to every source that emitted during it.
    pub(crate) fn settle(&self, registry: &SourceRegistry<T>, state: &mut SourceState<T>) {
        if !state.dirty {
            return;
        }
        state.dirty = false;
        state.listeners.settle_all(self.id, &state.contents);
        for &child_id in &state.children {
            if let Some(child) = registry.get(child_id) {
                let mut child_state = child.lock();
                child.settle(registry, &mut child_state);
            }
        }
    }
}

impl<T> std::fmt::Debug for DataSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("descriptor", &self.descriptor)
            .finish()
    }
}
