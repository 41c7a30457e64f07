//! Consumer-side model of a viewport window.

use crate::notification::Notification;
use std::sync::Arc;
use vista_core::Event;

/// Rebuilds the visible rows of one viewport from its notifications.
///
/// This is the reference consumer: replaying every `Window` and `Position`
/// notification of a viewport reproduces the rows the viewport exposes.
/// An `Add` inserts at its index and drops rows beyond the window size.
pub struct WindowReplica<T> {
    rows: Vec<Arc<T>>,
    size: usize,
}

impl<T> Default for WindowReplica<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> WindowReplica<T> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            size: usize::MAX,
        }
    }

    /// Applies one notification; notifications of other kinds are ignored.
    pub fn apply(&mut self, notification: &Notification<T>) {
        match notification {
            Notification::Position { size, .. } => {
                self.size = *size;
                self.rows.truncate(*size);
            }
            Notification::Window { event, .. } => self.apply_event(event),
            _ => {}
        }
    }

    /// Applies one window-relative event.
    pub fn apply_event(&mut self, event: &Event<T>) {
        match event {
            Event::Add { item, index } => {
                let at = (*index).min(self.rows.len());
                self.rows.insert(at, Arc::clone(item));
                self.rows.truncate(self.size);
            }
            Event::Remove { index, .. } => {
                if *index < self.rows.len() {
                    self.rows.remove(*index);
                }
            }
            Event::Update { new, index, .. } => {
                if let Some(row) = self.rows.get_mut(*index) {
                    *row = Arc::clone(new);
                }
            }
            Event::Snapshot { items } => self.rows = items.clone(),
            Event::Clear | Event::Destroy => self.rows.clear(),
        }
    }

    #[inline]
    pub fn rows(&self) -> &[Arc<T>] {
        &self.rows
    }

    /// The window size last reported.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
}
