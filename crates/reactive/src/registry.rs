//! The source arena.
//!
//! Every root and derived source lives in one slotmap owned by the
//! registry. Derived sources are shared: asking twice for the same filter or
//! sort of the same parent yields the same source. A derived source without
//! sinks or children is destroyed by [`SourceRegistry::sweep`] once it has
//! stayed that way for the grace period.
//!
//! Locking: the arena `RwLock` is only held for lookups and structural
//! edits, never while a source lock is being acquired. It may be taken
//! while source locks are held.

use crate::listener::{EventSink, ListenerId};
use crate::source::{DataSource, Derivation, SourceId, SourceState};
use hashbrown::HashMap;
use parking_lot::RwLock;
use slotmap::SlotMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument};
use vista_core::{Error, Event, Result, Schema};
use vista_query::{Filter, FilterExpression, SortCriteria, Sorter};

struct Arena<T> {
    sources: SlotMap<SourceId, Arc<DataSource<T>>>,
    /// `(parent, descriptor)` of every derived source.
    derived: HashMap<(SourceId, String), SourceId>,
}

/// Owner of all data sources of one item type.
pub struct SourceRegistry<T> {
    schema: Arc<Schema<T>>,
    arena: RwLock<Arena<T>>,
}

fn not_found(id: SourceId) -> Error {
    Error::source_not_found(format!("{:?}", id))
}

impl<T> SourceRegistry<T> {
    pub fn new(schema: Arc<Schema<T>>) -> Self {
        Self {
            schema,
            arena: RwLock::new(Arena {
                sources: SlotMap::with_key(),
                derived: HashMap::new(),
            }),
        }
    }

    #[inline]
    pub fn schema(&self) -> &Arc<Schema<T>> {
        &self.schema
    }

    /// Creates an empty root source.
    pub fn create_root(&self) -> SourceId {
        let schema = Arc::clone(&self.schema);
        let id = self
            .arena
            .write()
            .sources
            .insert_with_key(|id| Arc::new(DataSource::root(id, schema)));
        debug!(target: "vista_reactive::registry", source = ?id, "created root source");
        id
    }

    pub fn get(&self, id: SourceId) -> Option<Arc<DataSource<T>>> {
        self.arena.read().sources.get(id).cloned()
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.arena.read().sources.contains_key(id)
    }

    /// Number of live sources, roots included.
    pub fn len(&self) -> usize {
        self.arena.read().sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live derived sources.
    pub fn derived_count(&self) -> usize {
        self.arena.read().derived.len()
    }

    /// Compiles the `filter → sort` chain for a request, skipping empty stages.
    ///
    /// Nothing is created when this fails.
    pub fn compile(&self, filter: &FilterExpression, sort: &SortCriteria) -> Result<Vec<Derivation<T>>> {
        let mut stages = Vec::with_capacity(2);
        if !filter.is_empty() {
            stages.push(Derivation::Filter(Arc::new(Filter::compile(filter, &self.schema)?)));
        }
        if !sort.is_empty() {
            stages.push(Derivation::Sort(Arc::new(Sorter::compile(sort, &self.schema)?)));
        }
        Ok(stages)
    }

    /// Returns the derived source of `parent` for `derivation`, creating it
    /// if needed. Identical derivations of one parent are shared.
    #[instrument(target = "vista_reactive::registry", level = "debug", skip_all, fields(parent = ?parent))]
    pub fn create_data_source(&self, parent: SourceId, derivation: Derivation<T>) -> Result<SourceId> {
        let source = self.get(parent).ok_or_else(|| not_found(parent))?;
        let mut state = source.lock();
        if state.destroyed {
            return Err(not_found(parent));
        }
        let child = self.child_for(&source, &mut state, derivation);
        Ok(child.id())
    }

    /// Returns a filtered projection of `parent`.
    pub fn create_filtered(&self, parent: SourceId, filter: &FilterExpression) -> Result<SourceId> {
        let filter = Filter::compile(filter, &self.schema)?;
        self.create_data_source(parent, Derivation::Filter(Arc::new(filter)))
    }

    /// Returns a sorted projection of `parent`.
    pub fn create_sorted(&self, parent: SourceId, sort: &SortCriteria) -> Result<SourceId> {
        let sorter = Sorter::compile(sort, &self.schema)?;
        self.create_data_source(parent, Derivation::Sort(Arc::new(sorter)))
    }

    /// Builds or reuses the chain `source → filter → sort` and subscribes
    /// `sink` to its last stage.
    ///
    /// The chain is held locked from `source` down while it is built, so a
    /// concurrent sweep can never destroy a stage that is about to gain a
    /// listener. The sink receives `on_attach` with the target's contents
    /// before any later event.
    #[instrument(
        target = "vista_reactive::registry",
        level = "debug",
        skip_all,
        fields(source = ?source, filter = %filter, sort = %sort)
    )]
    pub fn attach(
        &self,
        source: SourceId,
        filter: &FilterExpression,
        sort: &SortCriteria,
        sink: Arc<dyn EventSink<T>>,
    ) -> Result<(SourceId, ListenerId)> {
        let stages = self.compile(filter, sort)?;
        let node = self.get(source).ok_or_else(|| not_found(source))?;
        let mut state = node.lock();
        if state.destroyed {
            return Err(not_found(source));
        }
        self.attach_at(&node, &mut state, &stages, sink)
    }

    fn attach_at(
        &self,
        node: &Arc<DataSource<T>>,
        state: &mut SourceState<T>,
        stages: &[Derivation<T>],
        sink: Arc<dyn EventSink<T>>,
    ) -> Result<(SourceId, ListenerId)> {
        match stages.split_first() {
            None => Ok((node.id(), node.add_listener(state, sink))),
            Some((stage, rest)) => {
                let child = self.child_for(node, state, stage.clone());
                let mut child_state = child.lock();
                self.attach_at(&child, &mut child_state, rest, sink)
            }
        }
    }

    /// Must be called with `state` being the locked state of `node`.
    fn child_for(&self, node: &DataSource<T>, state: &mut SourceState<T>, derivation: Derivation<T>) -> Arc<DataSource<T>> {
        let descriptor = derivation.descriptor();
        let existing = {
            let arena = self.arena.read();
            arena
                .derived
                .get(&(node.id(), descriptor.clone()))
                .filter(|id| state.children.contains(*id))
                .and_then(|id| arena.sources.get(*id).cloned())
        };
        if let Some(child) = existing {
            debug!(target: "vista_reactive::registry", source = ?child.id(), %descriptor, "reusing derived source");
            return child;
        }

        let child = {
            let mut arena = self.arena.write();
            let id = arena
                .sources
                .insert_with_key(|id| Arc::new(DataSource::derived(id, node, &state.contents, derivation)));
            arena.derived.insert((node.id(), descriptor.clone()), id);
            Arc::clone(&arena.sources[id])
        };
        state.children.push(child.id());
        state.childless_since = None;
        debug!(
            target: "vista_reactive::registry",
            source = ?child.id(),
            parent = ?node.id(),
            %descriptor,
            "created derived source"
        );
        child
    }

    /// Subscribes a sink to an existing source.
    pub fn subscribe(&self, source: SourceId, sink: Arc<dyn EventSink<T>>) -> Result<ListenerId> {
        let node = self.get(source).ok_or_else(|| not_found(source))?;
        let mut state = node.lock();
        if state.destroyed {
            return Err(not_found(source));
        }
        Ok(node.add_listener(&mut state, sink))
    }

    /// Removes a sink. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, source: SourceId, listener: ListenerId) -> bool {
        let Some(node) = self.get(source) else {
            return false;
        };
        let mut state = node.lock();
        let removed = state.listeners.remove(listener);
        if removed {
            state.mark_if_childless(Instant::now());
            debug!(
                target: "vista_reactive::registry",
                source = ?source,
                remaining = state.listeners.len() + state.children.len(),
                "unsubscribed"
            );
        }
        removed
    }

    /// Pins or unpins a derived source against sweeping.
    pub fn set_permanent(&self, id: SourceId, permanent: bool) -> bool {
        match self.get(id) {
            Some(source) => {
                source.lock().permanent = permanent;
                true
            }
            None => false,
        }
    }

    /// Destroys every derived source that has had no sinks and no children
    /// for at least `grace`. Returns the number of sources destroyed.
    #[instrument(target = "vista_reactive::registry", level = "debug", skip(self))]
    pub fn sweep(&self, now: Instant, grace: Duration) -> usize {
        let candidates: Vec<(SourceId, SourceId)> = {
            let arena = self.arena.read();
            arena
                .sources
                .iter()
                .filter_map(|(id, source)| source.parent().map(|parent| (id, parent)))
                .collect()
        };

        let mut destroyed = 0;
        for (id, parent_id) in candidates {
            let (Some(parent), Some(child)) = (self.get(parent_id), self.get(id)) else {
                continue;
            };
            let mut parent_state = parent.lock();
            let mut child_state = child.lock();
            if !child_state.is_expired(now, grace) {
                continue;
            }
            child_state.destroyed = true;
            child_state.contents.clear();
            parent_state.children.retain(|c| *c != id);
            parent_state.mark_if_childless(Instant::now());
            drop(child_state);
            // Unlinked from the derivation map before the parent can hand it out again.
            self.forget(&child);
            drop(parent_state);

            destroyed += 1;
            debug!(
                target: "vista_reactive::registry",
                source = ?id,
                parent = ?parent_id,
                descriptor = child.descriptor().unwrap_or_default(),
                "destroyed derived source"
            );
        }
        if destroyed > 0 {
            debug!(target: "vista_reactive::registry", destroyed, "sweep finished");
        }
        destroyed
    }

    /// Destroys a root source and everything derived from it.
    ///
    /// Every sink along the chain receives `Destroy`. Returns false if `id`
    /// is not a live root.
    pub fn destroy_root(&self, id: SourceId) -> bool {
        let Some(root) = self.get(id) else {
            return false;
        };
        if !root.is_root() {
            return false;
        }
        let mut removed = Vec::new();
        {
            let mut state = root.lock();
            if state.destroyed {
                return false;
            }
            root.process(self, &mut state, &Event::Destroy);
            root.settle(self, &mut state);
            self.collect_subtree(&state, &mut removed);
            state.listeners.clear();
            state.children.clear();
        }
        removed.push(Arc::clone(&root));
        for source in &removed {
            self.forget(source);
        }
        debug!(target: "vista_reactive::registry", source = ?id, removed = removed.len(), "destroyed root source");
        true
    }

    fn collect_subtree(&self, state: &SourceState<T>, out: &mut Vec<Arc<DataSource<T>>>) {
        for &child_id in &state.children {
            if let Some(child) = self.get(child_id) {
                {
                    let mut child_state = child.lock();
                    self.collect_subtree(&child_state, out);
                    child_state.listeners.clear();
                    child_state.children.clear();
                }
                out.push(child);
            }
        }
    }

    /// Removes a source from the arena and the derivation map.
    fn forget(&self, source: &DataSource<T>) {
        let mut arena = self.arena.write();
        arena.sources.remove(source.id());
        if let (Some(parent), Some(descriptor)) = (source.parent(), source.descriptor()) {
            let key = (parent, descriptor.to_string());
            if arena.derived.get(&key) == Some(&source.id()) {
                arena.derived.remove(&key);
            }
        }
    }
}

impl<T> std::fmt::Debug for SourceRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arena = self.arena.read();
        f.debug_struct("SourceRegistry")
            .field("schema", &self.schema.name())
            .field("sources", &arena.sources.len())
            .field("derived", &arena.derived.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::BaseCollection;
    use crate::source::Contents;
    use parking_lot::Mutex;
    use vista_core::{DataType, EventKind, Value};

    #[derive(Debug)]
    struct Row {
        id: &'static str,
        kind: &'static str,
        size: i64,
    }

    fn row(id: &'static str, kind: &'static str, size: i64) -> Row {
        Row { id, kind, size }
    }

    fn registry() -> Arc<SourceRegistry<Row>> {
        let schema = Schema::builder("rows")
            .unwrap()
            .key(|r: &Row| r.id.to_string())
            .add_attribute("kind", DataType::String, |r: &Row| Value::from(r.kind))
            .unwrap()
            .add_attribute("size", DataType::Int64, |r: &Row| Value::Int64(r.size))
            .unwrap()
            .build()
            .unwrap();
        Arc::new(SourceRegistry::new(Arc::new(schema)))
    }

    #[derive(Default)]
    struct Recorder {
        attached: Mutex<Vec<usize>>,
        kinds: Mutex<Vec<EventKind>>,
    }

    impl EventSink<Row> for Recorder {
        fn on_event(&self, _source: SourceId, event: &Event<Row>, _contents: &Contents<Row>) {
            self.kinds.lock().push(event.kind());
        }

        fn on_attach(&self, _source: SourceId, contents: &Contents<Row>) {
            self.attached.lock().push(contents.len());
        }
    }

    fn filter(text: &str) -> FilterExpression {
        FilterExpression::parse(text).unwrap()
    }

    fn sort(text: &str) -> SortCriteria {
        SortCriteria::parse(text).unwrap()
    }

    #[test]
    fn test_attach_shares_identical_chains() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        base.snapshot(vec![row("a", "x", 1), row("b", "y", 2)]);

        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let (s1, _) = registry
            .attach(base.id(), &filter("kind=x"), &sort("size=DESC"), first.clone())
            .unwrap();
        let (s2, _) = registry
            .attach(base.id(), &filter("kind=x"), &sort("size=DESC"), second.clone())
            .unwrap();

        assert_eq!(s1, s2);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.derived_count(), 2);
        assert_eq!(*first.attached.lock(), vec![1]);
        assert_eq!(*second.attached.lock(), vec![1]);
    }

    #[test]
    fn test_attach_skips_empty_stages() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        let sink = Arc::new(Recorder::default());
        let (source, _) = registry
            .attach(base.id(), &FilterExpression::all(), &SortCriteria::none(), sink)
            .unwrap();
        assert_eq!(source, base.id());
        assert_eq!(registry.derived_count(), 0);
    }

    #[test]
    fn test_attach_rejects_bad_definitions_without_creating() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        let sink = Arc::new(Recorder::default());

        let err = registry
            .attach(base.id(), &filter("kind=x"), &sort("missing=ASC"), sink.clone())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { .. }));
        assert_eq!(registry.len(), 1);

        let err = registry
            .attach(base.id(), &filter("size~=1"), &SortCriteria::none(), sink)
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_subscribe_unknown_source() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        let id = base.id();
        assert!(registry.destroy_root(id));
        let err = registry.subscribe(id, Arc::new(Recorder::default())).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        let listener = registry.subscribe(base.id(), Arc::new(Recorder::default())).unwrap();
        assert!(registry.unsubscribe(base.id(), listener));
        assert!(!registry.unsubscribe(base.id(), listener));
    }

    #[test]
    fn test_sweep_after_grace() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        let grace = Duration::from_secs(30);
        let (source, listener) = registry
            .attach(base.id(), &filter("kind=x"), &sort("size=ASC"), Arc::new(Recorder::default()))
            .unwrap();
        assert_eq!(registry.sweep(Instant::now() + grace * 10, grace), 0);

        assert!(registry.unsubscribe(source, listener));
        assert_eq!(registry.sweep(Instant::now(), grace), 0);
        assert!(registry.contains(source));

        // The sort stage goes first; its parent filter becomes childless then.
        assert_eq!(registry.sweep(Instant::now() + grace, grace), 1);
        assert!(!registry.contains(source));
        assert_eq!(registry.derived_count(), 1);
        assert_eq!(registry.sweep(Instant::now() + grace * 2, grace), 1);
        assert_eq!(registry.derived_count(), 0);
        assert!(registry.contains(base.id()));
    }

    #[test]
    fn test_resubscribe_within_grace_keeps_source() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        let grace = Duration::from_secs(30);
        let (source, listener) = registry
            .attach(base.id(), &filter("kind=x"), &SortCriteria::none(), Arc::new(Recorder::default()))
            .unwrap();
        registry.unsubscribe(source, listener);
        let (again, _) = registry
            .attach(base.id(), &filter("kind=x"), &SortCriteria::none(), Arc::new(Recorder::default()))
            .unwrap();
        assert_eq!(again, source);
        assert_eq!(registry.sweep(Instant::now() + grace, grace), 0);
        assert!(registry.contains(source));
    }

    #[test]
    fn test_unlinked_child_is_never_reused() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        base.add(row("a", "x", 1));
        let stale_id = registry.create_filtered(base.id(), &filter("kind=x")).unwrap();
        let stale = registry.get(stale_id).unwrap();

        // Destroyed and detached, but still present in the arena.
        {
            let root = registry.get(base.id()).unwrap();
            let mut root_state = root.lock();
            let mut stale_state = stale.lock();
            stale_state.destroyed = true;
            stale_state.contents.clear();
            root_state.children.retain(|c| *c != stale_id);
        }

        let sink = Arc::new(Recorder::default());
        let (fresh, _) = registry
            .attach(base.id(), &filter("kind=x"), &SortCriteria::none(), sink.clone())
            .unwrap();
        assert_ne!(fresh, stale_id);
        assert_eq!(*sink.attached.lock(), vec![1]);

        base.add(row("b", "x", 2));
        assert_eq!(*sink.kinds.lock(), vec![EventKind::Add]);

        // Forgetting the stale source leaves the fresh mapping in place.
        registry.forget(&stale);
        assert!(registry.contains(fresh));
        assert_eq!(registry.derived_count(), 1);
        let again = registry.create_filtered(base.id(), &filter("kind=x")).unwrap();
        assert_eq!(again, fresh);
    }

    #[test]
    fn test_permanent_sources_survive_sweep() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        let grace = Duration::from_secs(1);
        let source = registry.create_filtered(base.id(), &filter("kind=x")).unwrap();
        assert!(registry.set_permanent(source, true));
        assert_eq!(registry.sweep(Instant::now() + grace, grace), 0);

        assert!(registry.set_permanent(source, false));
        assert_eq!(registry.sweep(Instant::now() + grace, grace), 1);
        assert!(!registry.set_permanent(source, true));
    }

    #[test]
    fn test_destroy_root_cascades() {
        let registry = registry();
        let base = BaseCollection::new(Arc::clone(&registry));
        base.add(row("a", "x", 1));
        let sink = Arc::new(Recorder::default());
        registry
            .attach(base.id(), &filter("kind=x"), &sort("size=ASC"), sink.clone())
            .unwrap();

        assert!(registry.destroy_root(base.id()));
        assert_eq!(*sink.kinds.lock(), vec![EventKind::Destroy]);
        assert!(registry.is_empty());
        assert!(!registry.destroy_root(base.id()));

        // Mutating a destroyed root is a no-op.
        assert!(!base.add(row("b", "x", 2)));
        assert_eq!(base.size(), 0);
    }
}
