//! Unwindowed summaries attached directly to a source.

use crate::listener::EventSink;
use crate::source::{Contents, SourceId};
use parking_lot::Mutex;
use vista_core::{Event, Value};
use vista_incremental::Summary;

/// Maintains one summary over every item of the source it is subscribed to.
pub struct SummaryListener<T> {
    summary: Mutex<Box<dyn Summary<T>>>,
}

impl<T> SummaryListener<T> {
    pub fn new(summary: Box<dyn Summary<T>>) -> Self {
        Self {
            summary: Mutex::new(summary),
        }
    }

    /// Returns the current aggregate value.
    pub fn value(&self) -> Value {
        self.summary.lock().value()
    }
}

impl<T: Send + Sync> EventSink<T> for SummaryListener<T> {
    fn on_event(&self, _source: SourceId, event: &Event<T>, _contents: &Contents<T>) {
        self.summary.lock().apply(event);
    }

    fn on_attach(&self, _source: SourceId, contents: &Contents<T>) {
        let mut summary = self.summary.lock();
        summary.reset();
        summary.apply(&Event::snapshot(contents.values()));
    }
}
