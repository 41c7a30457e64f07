//! Per-session outbound queues and the sink that feeds raw events into them.

use crate::listener::EventSink;
use crate::notification::Notification;
use crate::source::{Contents, SourceId};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use vista_core::Event;

/// FIFO of messages waiting to be polled by one consumer.
///
/// Producers push while holding source and viewport locks; the queue lock is
/// always the innermost one.
pub struct SessionQueue<M> {
    pending: Mutex<VecDeque<M>>,
}

impl<M> Default for SessionQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> SessionQueue<M> {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, message: M) {
        self.pending.lock().push_back(message);
        tracing::trace!(target: "vista_reactive::queue", "queued message");
    }

    /// Appends messages in order, under one lock acquisition.
    pub fn push_all(&self, messages: impl IntoIterator<Item = M>) {
        let mut pending = self.pending.lock();
        let before = pending.len();
        pending.extend(messages);
        tracing::trace!(target: "vista_reactive::queue", queued = pending.len() - before, "queued messages");
    }

    /// Removes and returns everything queued so far.
    pub fn drain(&self) -> Vec<M> {
        self.pending.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

/// Forwards every event of a source into a session queue.
pub struct QueueSink<T> {
    queue: Arc<SessionQueue<Notification<T>>>,
}

impl<T> QueueSink<T> {
    pub fn new(queue: Arc<SessionQueue<Notification<T>>>) -> Self {
        Self { queue }
    }
}

impl<T: Send + Sync> EventSink<T> for QueueSink<T> {
    fn on_event(&self, source: SourceId, event: &Event<T>, _contents: &Contents<T>) {
        self.queue.push(Notification::Source {
            source,
            event: event.clone(),
        });
    }

    /// The consumer starts from a snapshot of the current contents.
    fn on_attach(&self, source: SourceId, contents: &Contents<T>) {
        self.queue.push(Notification::Source {
            source,
            event: Event::snapshot(contents.values()),
        });
    }
}
