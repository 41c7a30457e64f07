//! Viewports: positioned, selectable windows over a derived source.
//!
//! A viewport is split in two. The [`ViewportCell`] is the sink subscribed
//! to the source; it owns the window, selection, expansion and summary
//! state and turns source events into [`Notification`]s. The [`Viewport`]
//! handle serves consumer requests and owns the binding to the current
//! `filter → sort` chain.
//!
//! Requests lock the binding, then the bound source, then the cell, so they
//! never interleave with event delivery for the same viewport.

mod replica;
mod selection;
mod window;

pub use replica::WindowReplica;

use crate::listener::{EventSink, ListenerId};
use crate::notification::{Notification, ViewportId};
use crate::queue::SessionQueue;
use crate::registry::SourceRegistry;
use crate::source::{Contents, SourceId};
use hashbrown::HashSet;
use parking_lot::Mutex;
use selection::Selection;
use std::sync::Arc;
use tracing::{debug, instrument};
use vista_core::{Error, Event, Result, Value};
use vista_incremental::Summary;
use vista_query::{FilterExpression, SortCriteria, SortDirection};
use window::Window;

/// Settings a viewport is opened with.
pub struct ViewportConfig<T> {
    pub filter: FilterExpression,
    pub sort: SortCriteria,
    pub size: usize,
    /// `(field, handler)` pairs maintained over the whole source.
    pub summaries: Vec<(String, Box<dyn Summary<T>>)>,
}

impl<T> ViewportConfig<T> {
    pub fn new(size: usize) -> Self {
        Self {
            filter: FilterExpression::all(),
            sort: SortCriteria::none(),
            size,
            summaries: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: FilterExpression) -> Self {
        self.filter = filter;
        self
    }

    pub fn sort(mut self, sort: SortCriteria) -> Self {
        self.sort = sort;
        self
    }

    pub fn summary(mut self, field: impl Into<String>, summary: Box<dyn Summary<T>>) -> Self {
        self.summaries.push((field.into(), summary));
        self
    }
}

struct SummarySlot<T> {
    field: String,
    summary: Box<dyn Summary<T>>,
    reported: Option<Value>,
}

type SelectionReport = (Vec<String>, Option<String>, Option<usize>);

struct ViewportState<T> {
    id: ViewportId,
    /// The source events are accepted from.
    source: Option<SourceId>,
    window: Window,
    selection: Selection,
    reported_selection: Option<SelectionReport>,
    expanded: HashSet<String>,
    summaries: Vec<SummarySlot<T>>,
}

impl<T> ViewportState<T> {
    fn focus_index(&self, contents: &Contents<T>) -> Option<usize> {
        let index = contents.position(self.selection.focus()?)?;
        self.window.window_index(index)
    }

    /// Reports position, selection and summary values that changed.
    fn flush(&mut self, contents: &Contents<T>, out: &mut Vec<Notification<T>>) {
        self.window.sync_position(contents.len(), out);

        let current = (
            self.selection.selected(),
            self.selection.focus().map(str::to_string),
            self.focus_index(contents),
        );
        if self.reported_selection.as_ref() != Some(&current) {
            out.push(Notification::Selection {
                viewport: self.id,
                selected: current.0.clone(),
                focus: current.1.clone(),
                focus_index: current.2,
            });
            self.reported_selection = Some(current);
        }

        for slot in &mut self.summaries {
            let value = slot.summary.value();
            if slot.reported.as_ref() != Some(&value) {
                out.push(Notification::Summary {
                    viewport: self.id,
                    field: slot.field.clone(),
                    value: value.clone(),
                });
                slot.reported = Some(value);
            }
        }
    }

    /// Scrolls just enough to show source row `index`.
    fn reveal(&mut self, index: usize, contents: &Contents<T>, out: &mut Vec<Notification<T>>) {
        let start = self.window.start();
        let size = self.window.size().max(1);
        if index < start {
            self.window.set_position(index, false, contents, out);
        } else if index >= start + size {
            self.window.set_position(index + 1 - size, false, contents, out);
        }
    }
}

/// The sink side of a viewport.
pub struct ViewportCell<T> {
    id: ViewportId,
    queue: Arc<SessionQueue<Notification<T>>>,
    state: Mutex<ViewportState<T>>,
}

impl<T: Send + Sync> EventSink<T> for ViewportCell<T> {
    fn on_event(&self, source: SourceId, event: &Event<T>, contents: &Contents<T>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.source != Some(source) {
            return;
        }
        for slot in &mut state.summaries {
            slot.summary.apply(event);
        }
        let mut out = Vec::new();
        state.window.apply(event, contents, &mut out);
        self.queue.push_all(out);
    }

    fn on_attach(&self, source: SourceId, contents: &Contents<T>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.source = Some(source);
        if !state.summaries.is_empty() {
            let snapshot = Event::snapshot(contents.values());
            for slot in &mut state.summaries {
                slot.summary.reset();
                slot.summary.apply(&snapshot);
            }
        }
        let mut out = Vec::new();
        state.window.resync(contents, &mut out);
        state.selection.prune(contents);
        state.flush(contents, &mut out);
        self.queue.push_all(out);
        debug!(target: "vista_reactive::viewport", viewport = self.id, source = ?source, rows = contents.len(), "viewport attached");
    }

    fn on_settled(&self, source: SourceId, contents: &Contents<T>) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.source != Some(source) {
            return;
        }
        let mut out = Vec::new();
        state.selection.prune(contents);
        state.flush(contents, &mut out);
        self.queue.push_all(out);
    }
}

struct Binding {
    filter: FilterExpression,
    sort: SortCriteria,
    source: SourceId,
    listener: ListenerId,
    closed: bool,
}

/// A consumer's window onto a collection.
///
/// All request methods return `false` (or do nothing) once the viewport is
/// unsubscribed or its collection destroyed.
pub struct Viewport<T> {
    cell: Arc<ViewportCell<T>>,
    registry: Arc<SourceRegistry<T>>,
    root: SourceId,
    binding: Mutex<Binding>,
}

impl<T: Send + Sync + 'static> Viewport<T> {
    /// Builds the source chain for `config` and subscribes a new viewport.
    ///
    /// Fails without creating anything if the filter, sort or root is
    /// invalid.
    #[instrument(target = "vista_reactive::viewport", level = "debug", skip_all, fields(viewport = id, root = ?root))]
    pub fn open(
        registry: Arc<SourceRegistry<T>>,
        root: SourceId,
        id: ViewportId,
        queue: Arc<SessionQueue<Notification<T>>>,
        config: ViewportConfig<T>,
    ) -> Result<Self> {
        let summaries = config
            .summaries
            .into_iter()
            .map(|(field, summary)| SummarySlot {
                field,
                summary,
                reported: None,
            })
            .collect();
        let cell = Arc::new(ViewportCell {
            id,
            queue,
            state: Mutex::new(ViewportState {
                id,
                source: None,
                window: Window::new(id, config.size),
                selection: Selection::default(),
                reported_selection: None,
                expanded: HashSet::new(),
                summaries,
            }),
        });
        let sink: Arc<dyn EventSink<T>> = cell.clone();
        let (source, listener) = registry.attach(root, &config.filter, &config.sort, sink)?;
        Ok(Self {
            cell,
            registry,
            root,
            binding: Mutex::new(Binding {
                filter: config.filter,
                sort: config.sort,
                source,
                listener,
                closed: false,
            }),
        })
    }

    /// Runs a request against the bound source and flushes what it caused.
    fn request<R>(
        &self,
        f: impl FnOnce(&mut ViewportState<T>, &Contents<T>, &mut Vec<Notification<T>>) -> R,
    ) -> Option<R> {
        let binding = self.binding.lock();
        if binding.closed {
            return None;
        }
        let source = self.registry.get(binding.source)?;
        source
            .with_contents(|contents| {
                let mut guard = self.cell.state.lock();
                let state = &mut *guard;
                if state.source != Some(binding.source) {
                    return None;
                }
                let mut out = Vec::new();
                let result = f(state, contents, &mut out);
                state.flush(contents, &mut out);
                self.cell.queue.push_all(out);
                Some(result)
            })
            .flatten()
    }

    /// Reads viewport state together with the bound source's contents.
    fn inspect<R>(&self, f: impl FnOnce(&ViewportState<T>, &Contents<T>) -> R) -> Option<R> {
        let binding = self.binding.lock();
        if binding.closed {
            return None;
        }
        let source = self.registry.get(binding.source)?;
        source.with_contents(|contents| f(&self.cell.state.lock(), contents))
    }

    /// Sets the number of visible rows.
    pub fn set_size(&self, size: usize) -> bool {
        self.request(|state, contents, out| state.window.set_size(size, contents, out))
            .is_some()
    }

    /// Moves the first visible row to `offset`, clamped to the source.
    /// With `snap_to_bottom` the window follows the tail instead.
    pub fn set_position(&self, offset: usize, snap_to_bottom: bool) -> bool {
        self.request(|state, contents, out| {
            state.window.set_position(offset, snap_to_bottom, contents, out)
        })
        .is_some()
    }

    /// Scrolls by `delta` rows. Leaves snap-to-bottom.
    pub fn move_position(&self, delta: i64) -> bool {
        self.request(|state, contents, out| {
            let target = (state.window.start() as i64).saturating_add(delta).max(0) as usize;
            state.window.set_position(target, false, contents, out)
        })
        .is_some()
    }

    /// Selects a row by key, or else by window index.
    ///
    /// Returns false if neither names a row. A plain click on nothing
    /// clears the selection.
    pub fn set_selection(&self, key: Option<&str>, index: Option<usize>, ctrl: bool, shift: bool) -> bool {
        self.request(|state, contents, _| {
            let resolved = key
                .filter(|k| contents.contains_key(k))
                .map(str::to_string)
                .or_else(|| {
                    let row = index?;
                    if row >= state.window.size() {
                        return None;
                    }
                    contents.key_at(state.window.start() + row).map(str::to_string)
                });
            match resolved {
                Some(key) => {
                    state.selection.select(&key, ctrl, shift, contents);
                    true
                }
                None => {
                    if !ctrl && !shift {
                        state.selection.clear();
                    }
                    false
                }
            }
        })
        .unwrap_or(false)
    }

    /// Moves the focus `delta` rows and scrolls it into view.
    pub fn move_selection(&self, delta: i64, ctrl: bool, shift: bool) -> bool {
        self.request(|state, contents, out| {
            let start = state.window.start();
            match state.selection.move_focus(delta, ctrl, shift, start, contents) {
                Some(index) => {
                    state.reveal(index, contents, out);
                    true
                }
                None => false,
            }
        })
        .unwrap_or(false)
    }

    /// Expands or collapses a row. Returns true if the state changed.
    pub fn set_expanded(&self, key: &str, expanded: bool) -> bool {
        self.request(|state, _, out| {
            let changed = if expanded {
                state.expanded.insert(key.to_string())
            } else {
                state.expanded.remove(key)
            };
            if changed {
                out.push(Notification::Expanded {
                    viewport: state.id,
                    key: key.to_string(),
                    expanded,
                });
            }
            changed
        })
        .unwrap_or(false)
    }

    /// Re-sends the whole window.
    pub fn resync(&self) -> bool {
        self.request(|state, contents, out| state.window.resync(contents, out))
            .is_some()
    }

    /// Replaces the filter, parsed from its text form.
    pub fn set_filter(&self, expression: &str) -> Result<()> {
        let filter = FilterExpression::parse(expression)?;
        self.set_filter_expression(filter)
    }

    pub fn set_filter_expression(&self, filter: FilterExpression) -> Result<()> {
        self.retarget(|binding| Ok((filter, binding.sort.clone())))
    }

    /// Replaces the whole sort criteria.
    pub fn set_sort(&self, sort: SortCriteria) -> Result<()> {
        self.retarget(|binding| Ok((binding.filter.clone(), sort)))
    }

    /// Makes the attribute at `attr_index` the primary sort key, or drops
    /// it from the criteria when `direction` is `None`.
    pub fn set_sort_criteria(&self, attr_index: usize, direction: Option<SortDirection>) -> Result<()> {
        let schema = Arc::clone(self.registry.schema());
        self.retarget(|binding| {
            let attribute = schema
                .attribute_at(attr_index)
                .ok_or_else(|| Error::invalid_sort(attr_index.to_string(), "no attribute at this index"))?;
            let mut sort = binding.sort.clone();
            sort.promote(attribute.name(), direction);
            Ok((binding.filter.clone(), sort))
        })
    }

    /// Rebinds the viewport to the chain for a new filter and sort.
    ///
    /// The new chain is attached before the old listener is removed, so
    /// sources shared by both are never swept in between. On error the
    /// viewport keeps its current binding.
    #[instrument(target = "vista_reactive::viewport", level = "debug", skip_all, fields(viewport = self.cell.id))]
    fn retarget(&self, f: impl FnOnce(&Binding) -> Result<(FilterExpression, SortCriteria)>) -> Result<()> {
        let mut binding = self.binding.lock();
        if binding.closed {
            return Ok(());
        }
        let (filter, sort) = f(&binding)?;

        if filter.to_string() == binding.filter.to_string() && sort.to_string() == binding.sort.to_string() {
            if let Some(source) = self.registry.get(binding.source) {
                source.with_contents(|contents| {
                    let mut guard = self.cell.state.lock();
                    let state = &mut *guard;
                    if state.source == Some(binding.source) {
                        let mut out = Vec::new();
                        state.window.resync(contents, &mut out);
                        state.flush(contents, &mut out);
                        self.cell.queue.push_all(out);
                    }
                });
            }
            return Ok(());
        }

        let sink: Arc<dyn EventSink<T>> = self.cell.clone();
        let (source, listener) = self.registry.attach(self.root, &filter, &sort, sink)?;
        let previous = std::mem::replace(
            &mut *binding,
            Binding {
                filter,
                sort,
                source,
                listener,
                closed: false,
            },
        );
        self.registry.unsubscribe(previous.source, previous.listener);
        debug!(
            target: "vista_reactive::viewport",
            viewport = self.cell.id,
            from = ?previous.source,
            to = ?source,
            filter = %binding.filter,
            sort = %binding.sort,
            "retargeted viewport"
        );
        Ok(())
    }

    /// Detaches the viewport. Returns false if it was already detached.
    pub fn unsubscribe(&self) -> bool {
        let mut binding = self.binding.lock();
        if binding.closed {
            return false;
        }
        binding.closed = true;
        self.registry.unsubscribe(binding.source, binding.listener);
        self.cell.state.lock().source = None;
        debug!(target: "vista_reactive::viewport", viewport = self.cell.id, "viewport unsubscribed");
        true
    }

    #[inline]
    pub fn id(&self) -> ViewportId {
        self.cell.id
    }

    /// The root collection this viewport was opened on.
    #[inline]
    pub fn root(&self) -> SourceId {
        self.root
    }

    /// The source currently bound.
    pub fn source(&self) -> SourceId {
        self.binding.lock().source
    }

    pub fn filter(&self) -> FilterExpression {
        self.binding.lock().filter.clone()
    }

    pub fn sort(&self) -> SortCriteria {
        self.binding.lock().sort.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.binding.lock().closed
    }

    pub fn start(&self) -> usize {
        self.cell.state.lock().window.start()
    }

    pub fn size(&self) -> usize {
        self.cell.state.lock().window.size()
    }

    pub fn snap_to_bottom(&self) -> bool {
        self.cell.state.lock().window.snap_to_bottom()
    }

    /// Rows in the bound source.
    pub fn total(&self) -> usize {
        self.inspect(|_, contents| contents.len()).unwrap_or(0)
    }

    /// The rows currently visible.
    pub fn rows(&self) -> Vec<Arc<T>> {
        self.inspect(|state, contents| {
            let start = state.window.start();
            contents.range(start, start + state.window.size())
        })
        .unwrap_or_default()
    }

    pub fn selected(&self) -> Vec<String> {
        self.cell.state.lock().selection.selected()
    }

    pub fn focus(&self) -> Option<String> {
        self.cell.state.lock().selection.focus().map(str::to_string)
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.cell.state.lock().expanded.contains(key)
    }

    /// Current value of the summary configured for `field`.
    pub fn summary(&self, field: &str) -> Option<Value> {
        let state = self.cell.state.lock();
        state
            .summaries
            .iter()
            .find(|slot| slot.field == field)
            .map(|slot| slot.summary.value())
    }
}

impl<T> std::fmt::Debug for Viewport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Viewport")
            .field("id", &self.cell.id)
            .field("root", &self.root)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::BaseCollection;
    use vista_core::{DataType, Schema};
    use vista_incremental::{SummaryCatalog, SummarySpec};

    #[derive(Debug)]
    struct Quote {
        symbol: &'static str,
        venue: &'static str,
        price: i64,
    }

    fn quote(symbol: &'static str, venue: &'static str, price: i64) -> Quote {
        Quote { symbol, venue, price }
    }

    struct Fixture {
        registry: Arc<SourceRegistry<Quote>>,
        base: BaseCollection<Quote>,
        queue: Arc<SessionQueue<Notification<Quote>>>,
    }

    fn fixture() -> Fixture {
        let schema = Schema::builder("quotes")
            .unwrap()
            .key(|q: &Quote| q.symbol.to_string())
            .add_attribute("venue", DataType::String, |q: &Quote| Value::from(q.venue))
            .unwrap()
            .add_attribute("price", DataType::Int64, |q: &Quote| Value::Int64(q.price))
            .unwrap()
            .build()
            .unwrap();
        let registry = Arc::new(SourceRegistry::new(Arc::new(schema)));
        let base = BaseCollection::new(Arc::clone(&registry));
        base.snapshot(vec![
            quote("AAA", "X", 50),
            quote("BBB", "Y", 40),
            quote("CCC", "X", 30),
            quote("DDD", "Y", 20),
            quote("EEE", "X", 10),
        ]);
        Fixture {
            registry,
            base,
            queue: Arc::new(SessionQueue::new()),
        }
    }

    impl Fixture {
        fn open(&self, config: ViewportConfig<Quote>) -> Viewport<Quote> {
            Viewport::open(Arc::clone(&self.registry), self.base.id(), 7, Arc::clone(&self.queue), config).unwrap()
        }

        fn replay(&self, replica: &mut WindowReplica<Quote>) -> Vec<Notification<Quote>> {
            let drained = self.queue.drain();
            for n in &drained {
                replica.apply(n);
            }
            drained
        }
    }

    fn symbols(rows: &[Arc<Quote>]) -> Vec<&'static str> {
        rows.iter().map(|q| q.symbol).collect()
    }

    fn by_price() -> SortCriteria {
        SortCriteria::parse("price=ASC").unwrap()
    }

    #[test]
    fn test_open_sends_position_snapshot_selection() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(2).sort(by_price()));
        let mut replica = WindowReplica::new();
        let drained = fx.replay(&mut replica);

        assert!(matches!(drained[0], Notification::Position { start: 0, size: 2, total: 5, .. }));
        assert!(matches!(drained[1], Notification::Window { event: Event::Snapshot { .. }, .. }));
        assert!(matches!(drained[2], Notification::Selection { .. }));
        assert_eq!(symbols(replica.rows()), vec!["EEE", "DDD"]);
        assert_eq!(symbols(&viewport.rows()), vec!["EEE", "DDD"]);
        assert_eq!(viewport.total(), 5);
    }

    #[test]
    fn test_insert_sorting_first_shifts_window() {
        let fx = fixture();
        let _viewport = fx.open(ViewportConfig::new(2).sort(by_price()));
        let mut replica = WindowReplica::new();
        fx.replay(&mut replica);

        fx.base.add(quote("ZZZ", "X", 1));
        let drained = fx.replay(&mut replica);
        let windowed: Vec<&Notification<Quote>> = drained
            .iter()
            .filter(|n| matches!(n, Notification::Window { .. }))
            .collect();
        assert_eq!(windowed.len(), 1);
        assert!(matches!(windowed[0], Notification::Window { event: Event::Add { index: 0, .. }, .. }));
        assert_eq!(symbols(replica.rows()), vec!["ZZZ", "EEE"]);
    }

    #[test]
    fn test_move_within_source_replays() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(3).sort(by_price()));
        let mut replica = WindowReplica::new();
        fx.replay(&mut replica);

        fx.base.update(quote("AAA", "X", 15));
        fx.replay(&mut replica);
        assert_eq!(symbols(replica.rows()), vec!["EEE", "AAA", "DDD"]);
        assert_eq!(symbols(replica.rows()), symbols(&viewport.rows()));
    }

    #[test]
    fn test_selection_follows_moved_row() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(5).sort(by_price()));
        assert!(viewport.set_selection(Some("AAA"), None, false, false));
        fx.queue.drain();

        fx.base.update(quote("AAA", "X", 0));
        let drained = fx.queue.drain();
        assert_eq!(viewport.selected(), vec!["AAA"]);
        let selection = drained.iter().find_map(|n| match n {
            Notification::Selection { focus_index, .. } => Some(*focus_index),
            _ => None,
        });
        assert_eq!(selection, Some(Some(0)));

        fx.base.remove("AAA");
        assert!(viewport.selected().is_empty());
        assert_eq!(viewport.focus(), None);
    }

    #[test]
    fn test_selection_by_window_index_and_move() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(2).sort(by_price()));
        assert!(viewport.set_selection(None, Some(1), false, false));
        assert_eq!(viewport.selected(), vec!["DDD"]);

        assert!(viewport.move_selection(2, false, true));
        assert_eq!(viewport.selected(), vec!["BBB", "CCC", "DDD"]);
        // The focus scrolled into view.
        assert_eq!(viewport.start(), 2);
        assert!(!viewport.set_selection(None, Some(9), false, false));
        assert!(viewport.selected().is_empty());
    }

    #[test]
    fn test_set_filter_resyncs_and_keeps_expanded() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(10));
        assert!(viewport.set_expanded("BBB", true));
        assert!(!viewport.set_expanded("BBB", true));
        let before = viewport.source();

        let mut replica = WindowReplica::new();
        fx.replay(&mut replica);
        viewport.set_filter("venue=Y").unwrap();
        fx.replay(&mut replica);
        assert_eq!(symbols(replica.rows()), vec!["BBB", "DDD"]);
        assert_ne!(viewport.source(), before);
        assert!(viewport.is_expanded("BBB"));

        let err = viewport.set_filter("venue>>Y").unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(viewport.filter().to_string(), "venue=Y");
    }

    #[test]
    fn test_set_sort_criteria_by_attribute_index() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(5));
        viewport.set_sort_criteria(1, Some(SortDirection::Descending)).unwrap();
        assert_eq!(viewport.sort().to_string(), "price=DESC");
        assert_eq!(symbols(&viewport.rows()), vec!["AAA", "BBB", "CCC", "DDD", "EEE"]);

        viewport.set_sort_criteria(1, None).unwrap();
        assert!(viewport.sort().is_empty());
        assert!(matches!(viewport.set_sort_criteria(9, None), Err(Error::InvalidSort { .. })));
    }

    #[test]
    fn test_retarget_releases_old_chain() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(5).filter(FilterExpression::parse("venue=X").unwrap()));
        let old = viewport.source();
        viewport.set_filter("venue=Y").unwrap();
        let source = fx.registry.get(old).unwrap();
        assert_eq!(source.listener_count(), 0);
        assert!(source.childless_since().is_some());
    }

    #[test]
    fn test_summaries_track_whole_source() {
        let fx = fixture();
        let catalog = SummaryCatalog::new();
        let schema = Arc::clone(fx.registry.schema());
        let max = catalog
            .create(&SummarySpec::parse("max").unwrap(), "price", &schema)
            .unwrap();
        let viewport = fx.open(ViewportConfig::new(1).summary("price", max));
        assert_eq!(viewport.summary("price"), Some(Value::Float64(50.0)));

        fx.queue.drain();
        fx.base.remove("AAA");
        let summaries: Vec<Value> = fx
            .queue
            .drain()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Summary { value, .. } => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(summaries, vec![Value::Float64(40.0)]);
    }

    #[test]
    fn test_unsubscribe_and_destroy() {
        let fx = fixture();
        let viewport = fx.open(ViewportConfig::new(2));
        assert!(viewport.unsubscribe());
        assert!(!viewport.unsubscribe());
        assert!(!viewport.set_position(1, false));

        let other = fx.open(ViewportConfig::new(2));
        fx.queue.drain();
        fx.registry.destroy_root(fx.base.id());
        let drained = fx.queue.drain();
        assert!(drained
            .iter()
            .any(|n| matches!(n, Notification::Window { event: Event::Destroy, .. })));
        assert!(!other.set_size(3));
    }
}
