//! Consumer sessions.

use parking_lot::Mutex;
use std::sync::Arc;
use vista_reactive::{ListenerId, Notification, SessionQueue, SourceId, ViewportId};

/// Identifier of a session, unique within one service.
pub type SessionId = u64;

/// Identifies one viewport of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewportHandle {
    pub session: SessionId,
    pub viewport: ViewportId,
}

/// A consumer: its outbound queue and what it is subscribed to.
pub(crate) struct Session<T> {
    pub(crate) queue: Arc<SessionQueue<Notification<T>>>,
    pub(crate) viewports: Mutex<Vec<ViewportId>>,
    /// Raw source subscriptions.
    pub(crate) raw: Mutex<Vec<(SourceId, ListenerId)>>,
}

impl<T> Session<T> {
    pub(crate) fn new() -> Self {
        Self {
            queue: Arc::new(SessionQueue::new()),
            viewports: Mutex::new(Vec::new()),
            raw: Mutex::new(Vec::new()),
        }
    }
}
