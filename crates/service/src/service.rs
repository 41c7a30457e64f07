//! The viewport request surface.
//!
//! `ViewService` owns every collection of one item type together with the
//! sessions observing them. Requests name viewports by [`ViewportHandle`];
//! a handle that is stale (unsubscribed, session closed) makes a request a
//! no-op rather than an error.

use crate::collection_id::CollectionId;
use crate::session::{Session, SessionId, ViewportHandle};
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};
use vista_core::{EngineConfig, Error, Result, Schema, Value};
use vista_incremental::{SummaryCatalog, SummarySpec};
use vista_query::{FilterExpression, SortCriteria, SortDirection};
use vista_reactive::{
    BaseCollection, ListenerId, Notification, QueueSink, SourceRegistry, Viewport, ViewportConfig, ViewportId,
};

/// A subscription request as received from the request layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportRequest {
    /// Collection id in text form.
    pub data_source: String,
    pub filter: String,
    pub sort: String,
    /// Requested window size; the configured default when absent.
    pub size: Option<usize>,
    /// `(field, "type[:customRef]")` pairs.
    pub summaries: Vec<(String, String)>,
}

impl ViewportRequest {
    pub fn new(data_source: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = sort.into();
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn summary(mut self, field: impl Into<String>, spec: impl Into<String>) -> Self {
        self.summaries.push((field.into(), spec.into()));
        self
    }
}

struct ViewportEntry<T> {
    session: SessionId,
    viewport: Viewport<T>,
}

/// Collections, sessions and viewports of one item type.
pub struct ViewService<T> {
    registry: Arc<SourceRegistry<T>>,
    catalog: SummaryCatalog<T>,
    config: EngineConfig,
    collections: RwLock<HashMap<CollectionId, BaseCollection<T>>>,
    sessions: RwLock<HashMap<SessionId, Arc<Session<T>>>>,
    viewports: RwLock<HashMap<ViewportId, Arc<ViewportEntry<T>>>>,
    next_session: AtomicU64,
    next_viewport: AtomicU64,
}

impl<T: Send + Sync + 'static> ViewService<T> {
    /// Creates a service without custom summary handlers.
    pub fn new(schema: Schema<T>, config: EngineConfig) -> Result<Self> {
        Self::with_catalog(schema, config, SummaryCatalog::new())
    }

    /// Creates a service that resolves `custom:ref` summaries in `catalog`.
    pub fn with_catalog(schema: Schema<T>, config: EngineConfig, catalog: SummaryCatalog<T>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: Arc::new(SourceRegistry::new(Arc::new(schema))),
            catalog,
            config,
            collections: RwLock::new(HashMap::new()),
            sessions: RwLock::new(HashMap::new()),
            viewports: RwLock::new(HashMap::new()),
            next_session: AtomicU64::new(1),
            next_viewport: AtomicU64::new(1),
        })
    }

    #[inline]
    pub fn schema(&self) -> &Arc<Schema<T>> {
        self.registry.schema()
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &Arc<SourceRegistry<T>> {
        &self.registry
    }

    /// Returns the collection, creating it if needed.
    pub fn collection(&self, id: &CollectionId) -> BaseCollection<T> {
        if let Some(existing) = self.find_collection(id) {
            return existing;
        }
        self.collections
            .write()
            .entry(id.clone())
            .or_insert_with(|| {
                debug!(target: "vista_service", collection = %id, "created collection");
                BaseCollection::new(Arc::clone(&self.registry))
            })
            .clone()
    }

    pub fn find_collection(&self, id: &CollectionId) -> Option<BaseCollection<T>> {
        self.collections.read().get(id).cloned()
    }

    /// Destroys a collection; its viewports receive `Destroy`.
    pub fn drop_collection(&self, id: &CollectionId) -> bool {
        let Some(collection) = self.collections.write().remove(id) else {
            return false;
        };
        self.registry.destroy_root(collection.id());
        debug!(target: "vista_service", collection = %id, "dropped collection");
        true
    }

    pub fn open_session(&self) -> SessionId {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        self.sessions.write().insert(id, Arc::new(Session::new()));
        debug!(target: "vista_service", session = id, "opened session");
        id
    }

    /// Unsubscribes everything the session holds and discards its queue.
    pub fn close_session(&self, session: SessionId) -> bool {
        let Some(state) = self.sessions.write().remove(&session) else {
            return false;
        };
        let viewports: Vec<ViewportId> = std::mem::take(&mut *state.viewports.lock());
        for id in &viewports {
            let entry = self.viewports.write().remove(id);
            if let Some(entry) = entry {
                entry.viewport.unsubscribe();
            }
        }
        for (source, listener) in std::mem::take(&mut *state.raw.lock()) {
            self.registry.unsubscribe(source, listener);
        }
        debug!(target: "vista_service", session, viewports = viewports.len(), "closed session");
        true
    }

    fn session(&self, session: SessionId) -> Result<Arc<Session<T>>> {
        self.sessions
            .read()
            .get(&session)
            .cloned()
            .ok_or(Error::UnknownSession { session })
    }

    /// Resolves a collection for a subscription. Scoped collections are
    /// created on first use; global ones must exist.
    fn subscription_root(&self, data_source: &str) -> Result<BaseCollection<T>> {
        let id = CollectionId::parse(data_source)?;
        if id.is_global() {
            self.find_collection(&id)
                .ok_or_else(|| Error::source_not_found(data_source))
        } else {
            Ok(self.collection(&id))
        }
    }

    /// Opens a viewport for a session.
    ///
    /// Malformed filters, sorts and summaries reject the whole request;
    /// nothing is subscribed then.
    #[instrument(target = "vista_service", level = "debug", skip(self, request), fields(data_source = %request.data_source))]
    pub fn subscribe(&self, session: SessionId, request: ViewportRequest) -> Result<ViewportHandle> {
        let state = self.session(session)?;
        let root = self.subscription_root(&request.data_source)?;
        let filter = FilterExpression::parse(&request.filter)?;
        let sort = SortCriteria::parse(&request.sort)?;
        let size = request
            .size
            .map_or(self.config.default_viewport_size, |n| self.config.clamp_viewport_size(n));

        let mut config = ViewportConfig::new(size).filter(filter).sort(sort);
        for (field, spec) in &request.summaries {
            let spec = SummarySpec::parse(spec)?;
            config = config.summary(field.clone(), self.catalog.create(&spec, field, self.schema())?);
        }

        let id = self.next_viewport.fetch_add(1, Ordering::Relaxed);
        let viewport = Viewport::open(Arc::clone(&self.registry), root.id(), id, Arc::clone(&state.queue), config)?;
        self.register(session, &state, id, viewport)?;
        debug!(target: "vista_service", session, viewport = id, "subscribed viewport");
        Ok(ViewportHandle { session, viewport: id })
    }

    /// Records an opened viewport under its session.
    ///
    /// The session map stays read-locked until the viewport is recorded, so
    /// `close_session` either sees it or has already run. In the latter case
    /// the viewport is unsubscribed again.
    fn register(&self, session: SessionId, state: &Arc<Session<T>>, id: ViewportId, viewport: Viewport<T>) -> Result<()> {
        let sessions = self.sessions.read();
        if !sessions.get(&session).is_some_and(|live| Arc::ptr_eq(live, state)) {
            drop(sessions);
            viewport.unsubscribe();
            debug!(target: "vista_service", session, viewport = id, "session closed while subscribing");
            return Err(Error::UnknownSession { session });
        }
        self.viewports
            .write()
            .insert(id, Arc::new(ViewportEntry { session, viewport }));
        state.viewports.lock().push(id);
        Ok(())
    }

    fn viewport(&self, handle: ViewportHandle) -> Option<Arc<ViewportEntry<T>>> {
        self.viewports
            .read()
            .get(&handle.viewport)
            .filter(|entry| entry.session == handle.session)
            .cloned()
    }

    fn with_viewport<R>(&self, handle: ViewportHandle, f: impl FnOnce(&Viewport<T>) -> R) -> Option<R> {
        self.viewport(handle).map(|entry| f(&entry.viewport))
    }

    /// Sets the window size, clamped to the configured maximum.
    pub fn set_viewport_size(&self, handle: ViewportHandle, size: usize) -> bool {
        let size = self.config.clamp_viewport_size(size);
        self.with_viewport(handle, |v| v.set_size(size)).unwrap_or(false)
    }

    pub fn set_viewport_position(&self, handle: ViewportHandle, offset: usize, snap_to_bottom: bool) -> bool {
        self.with_viewport(handle, |v| v.set_position(offset, snap_to_bottom))
            .unwrap_or(false)
    }

    pub fn move_viewport_position(&self, handle: ViewportHandle, delta: i64) -> bool {
        self.with_viewport(handle, |v| v.move_position(delta)).unwrap_or(false)
    }

    pub fn set_viewport_selection(
        &self,
        handle: ViewportHandle,
        key: Option<&str>,
        index: Option<usize>,
        ctrl: bool,
        shift: bool,
    ) -> bool {
        self.with_viewport(handle, |v| v.set_selection(key, index, ctrl, shift))
            .unwrap_or(false)
    }

    pub fn move_viewport_selection(&self, handle: ViewportHandle, delta: i64, ctrl: bool, shift: bool) -> bool {
        self.with_viewport(handle, |v| v.move_selection(delta, ctrl, shift))
            .unwrap_or(false)
    }

    /// Replaces a viewport's filter. A malformed expression leaves the
    /// viewport unchanged.
    pub fn set_viewport_filter(&self, handle: ViewportHandle, expression: &str) -> Result<()> {
        self.with_viewport(handle, |v| v.set_filter(expression))
            .unwrap_or(Ok(()))
    }

    /// Promotes the attribute at `attr_index` to primary sort key, or
    /// removes it when `direction` is `None`.
    pub fn set_viewport_sort_criteria(
        &self,
        handle: ViewportHandle,
        attr_index: usize,
        direction: Option<SortDirection>,
    ) -> Result<()> {
        self.with_viewport(handle, |v| v.set_sort_criteria(attr_index, direction))
            .unwrap_or(Ok(()))
    }

    pub fn set_expanded(&self, handle: ViewportHandle, key: &str, expanded: bool) -> bool {
        self.with_viewport(handle, |v| v.set_expanded(key, expanded))
            .unwrap_or(false)
    }

    /// Closes a viewport. Returns false for a stale handle.
    pub fn unsubscribe(&self, handle: ViewportHandle) -> bool {
        let entry = {
            let mut viewports = self.viewports.write();
            match viewports.get(&handle.viewport) {
                Some(entry) if entry.session == handle.session => viewports.remove(&handle.viewport),
                _ => None,
            }
        };
        let Some(entry) = entry else {
            return false;
        };
        if let Some(state) = self.sessions.read().get(&handle.session) {
            state.viewports.lock().retain(|id| *id != handle.viewport);
        }
        entry.viewport.unsubscribe()
    }

    /// Returns the rows currently inside a viewport's window.
    pub fn viewport_rows(&self, handle: ViewportHandle) -> Option<Vec<Arc<T>>> {
        self.with_viewport(handle, |v| v.rows())
    }

    /// Returns the current value of one of a viewport's summaries.
    pub fn viewport_summary(&self, handle: ViewportHandle, field: &str) -> Option<Value> {
        self.with_viewport(handle, |v| v.summary(field)).flatten()
    }

    /// Forwards every raw event of a collection into the session queue.
    pub fn subscribe_raw(&self, session: SessionId, data_source: &str) -> Result<ListenerId> {
        let state = self.session(session)?;
        let root = self.subscription_root(data_source)?;
        let sink = Arc::new(QueueSink::new(Arc::clone(&state.queue)));
        let listener = self.registry.subscribe(root.id(), sink)?;
        let sessions = self.sessions.read();
        if !sessions.get(&session).is_some_and(|live| Arc::ptr_eq(live, &state)) {
            drop(sessions);
            self.registry.unsubscribe(root.id(), listener);
            return Err(Error::UnknownSession { session });
        }
        state.raw.lock().push((root.id(), listener));
        Ok(listener)
    }

    /// Drains a session's queue in FIFO order.
    pub fn dequeue_pending_events(&self, session: SessionId) -> Result<Vec<Notification<T>>> {
        Ok(self.session(session)?.queue.drain())
    }

    /// Destroys derived sources unused for longer than the grace period.
    pub fn sweep(&self) -> usize {
        self.registry.sweep(Instant::now(), self.config.sweep_grace())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn viewport_count(&self) -> usize {
        self.viewports.read().len()
    }
}

impl<T> std::fmt::Debug for ViewService<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewService")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_core::DataType;

    #[derive(Debug)]
    struct Alert {
        id: u32,
        level: &'static str,
    }

    fn service() -> ViewService<Alert> {
        let schema = Schema::builder("alerts")
            .unwrap()
            .key(|a: &Alert| format!("{:05}", a.id))
            .add_attribute("level", DataType::String, |a: &Alert| Value::from(a.level))
            .unwrap()
            .build()
            .unwrap();
        ViewService::new(schema, EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let schema = Schema::builder("alerts")
            .unwrap()
            .key(|a: &Alert| a.id.to_string())
            .build()
            .unwrap();
        let config = EngineConfig {
            sweep_interval_ms: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(ViewService::new(schema, config), Err(Error::Config { .. })));
    }

    #[test]
    fn test_subscribe_requires_session_and_collection() {
        let service = service();
        let err = service.subscribe(99, ViewportRequest::new("alerts")).unwrap_err();
        assert!(matches!(err, Error::UnknownSession { session: 99 }));

        let session = service.open_session();
        let err = service.subscribe(session, ViewportRequest::new("alerts")).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));

        // Scoped collections are created on demand.
        assert!(service
            .subscribe(session, ViewportRequest::new("alerts@user:7"))
            .is_ok());
        assert!(service.find_collection(&CollectionId::user("alerts", "7")).is_some());
    }

    #[test]
    fn test_rejected_subscription_creates_nothing() {
        let service = service();
        service.collection(&CollectionId::global("alerts"));
        let session = service.open_session();
        let sources = service.registry().len();

        for request in [
            ViewportRequest::new("alerts").filter("level"),
            ViewportRequest::new("alerts").filter("missing=1"),
            ViewportRequest::new("alerts").sort("level=UP"),
            ViewportRequest::new("alerts").summary("level", "median"),
            ViewportRequest::new("alerts").filter("level=hi").summary("level", "custom:nope"),
        ] {
            let err = service.subscribe(session, request).unwrap_err();
            assert!(err.is_configuration(), "{}", err);
        }
        assert_eq!(service.registry().len(), sources);
        assert_eq!(service.viewport_count(), 0);
        assert!(service.dequeue_pending_events(session).unwrap().is_empty());
    }

    #[test]
    fn test_size_is_clamped() {
        let service = service();
        service.collection(&CollectionId::global("alerts"));
        let session = service.open_session();
        let handle = service
            .subscribe(session, ViewportRequest::new("alerts").size(1_000_000))
            .unwrap();
        let size = service.with_viewport(handle, |v| v.size()).unwrap();
        assert_eq!(size, EngineConfig::default().max_viewport_size);

        assert!(service.set_viewport_size(handle, 0));
        assert_eq!(service.with_viewport(handle, |v| v.size()), Some(1));
    }

    #[test]
    fn test_stale_handles_are_noops() {
        let service = service();
        service.collection(&CollectionId::global("alerts"));
        let session = service.open_session();
        let handle = service.subscribe(session, ViewportRequest::new("alerts")).unwrap();

        let foreign = ViewportHandle {
            session: session + 1,
            viewport: handle.viewport,
        };
        assert!(!service.set_viewport_position(foreign, 1, false));
        assert!(!service.unsubscribe(foreign));

        assert!(service.unsubscribe(handle));
        assert!(!service.unsubscribe(handle));
        assert!(!service.set_viewport_size(handle, 5));
        assert!(service.set_viewport_filter(handle, "level=hi").is_ok());
    }

    #[test]
    fn test_close_session_releases_everything() {
        let service = service();
        let alerts = service.collection(&CollectionId::global("alerts"));
        let session = service.open_session();
        service
            .subscribe(session, ViewportRequest::new("alerts").filter("level=hi"))
            .unwrap();
        service.subscribe_raw(session, "alerts").unwrap();

        assert!(service.close_session(session));
        assert!(!service.close_session(session));
        assert_eq!(service.viewport_count(), 0);
        assert!(matches!(
            service.dequeue_pending_events(session),
            Err(Error::UnknownSession { .. })
        ));
        let root = service.registry().get(alerts.id()).unwrap();
        assert_eq!(root.listener_count(), 1);
        assert_eq!(
            service
                .registry()
                .sweep(Instant::now() + service.config().sweep_grace(), service.config().sweep_grace()),
            1
        );
        assert_eq!(root.listener_count(), 0);
    }

    #[test]
    fn test_viewport_opened_for_closed_session_is_released() {
        let service = service();
        let alerts = service.collection(&CollectionId::global("alerts"));
        let session = service.open_session();
        let state = service.session(session).unwrap();

        let viewport = Viewport::open(
            Arc::clone(service.registry()),
            alerts.id(),
            7,
            Arc::clone(&state.queue),
            ViewportConfig::new(10),
        )
        .unwrap();
        let root = service.registry().get(alerts.id()).unwrap();
        assert_eq!(root.listener_count(), 1);

        // The session goes away between opening and recording the viewport.
        assert!(service.close_session(session));
        let err = service.register(session, &state, 7, viewport).unwrap_err();
        assert!(matches!(err, Error::UnknownSession { .. }));
        assert_eq!(service.viewport_count(), 0);
        assert_eq!(root.listener_count(), 0);
        assert!(state.viewports.lock().is_empty());
    }

    #[test]
    fn test_request_from_json() {
        let request: ViewportRequest = serde_json::from_str(
            r#"{"data_source":"alerts@member:3","filter":"level=hi","size":20,"summaries":[["level","count"]]}"#,
        )
        .unwrap();
        assert_eq!(
            request,
            ViewportRequest::new("alerts@member:3")
                .filter("level=hi")
                .size(20)
                .summary("level", "count")
        );
    }
}
