//! Outbound notifications delivered to a session.

use crate::source::SourceId;
use std::fmt;
use vista_core::{Event, Value};

/// Identifier of a viewport, unique within one service.
pub type ViewportId = u64;

/// A message queued for a session consumer.
///
/// `Window` events carry indices relative to the viewport's first row, so a
/// consumer can replay them on a fixed-size buffer.
pub enum Notification<T> {
    /// A change of the visible rows.
    Window { viewport: ViewportId, event: Event<T> },
    /// The window moved, resized, or the total row count changed.
    Position {
        viewport: ViewportId,
        start: usize,
        size: usize,
        total: usize,
        snap_to_bottom: bool,
    },
    Selection {
        viewport: ViewportId,
        selected: Vec<String>,
        focus: Option<String>,
        /// Window index of `focus`; `None` when it is outside the window.
        focus_index: Option<usize>,
    },
    Expanded {
        viewport: ViewportId,
        key: String,
        expanded: bool,
    },
    Summary {
        viewport: ViewportId,
        field: String,
        value: Value,
    },
    /// A raw event of a directly subscribed source.
    Source { source: SourceId, event: Event<T> },
}

impl<T> Notification<T> {
    /// Returns the viewport this notification belongs to.
    pub fn viewport(&self) -> Option<ViewportId> {
        match self {
            Notification::Window { viewport, .. }
            | Notification::Position { viewport, .. }
            | Notification::Selection { viewport, .. }
            | Notification::Expanded { viewport, .. }
            | Notification::Summary { viewport, .. } => Some(*viewport),
            Notification::Source { .. } => None,
        }
    }
}

impl<T> Clone for Notification<T> {
    fn clone(&self) -> Self {
        match self {
            Notification::Window { viewport, event } => Notification::Window {
                viewport: *viewport,
                event: event.clone(),
            },
            Notification::Position {
                viewport,
                start,
                size,
                total,
                snap_to_bottom,
            } => Notification::Position {
                viewport: *viewport,
                start: *start,
                size: *size,
                total: *total,
                snap_to_bottom: *snap_to_bottom,
            },
            Notification::Selection {
                viewport,
                selected,
                focus,
                focus_index,
            } => Notification::Selection {
                viewport: *viewport,
                selected: selected.clone(),
                focus: focus.clone(),
                focus_index: *focus_index,
            },
            Notification::Expanded {
                viewport,
                key,
                expanded,
            } => Notification::Expanded {
                viewport: *viewport,
                key: key.clone(),
                expanded: *expanded,
            },
            Notification::Summary { viewport, field, value } => Notification::Summary {
                viewport: *viewport,
                field: field.clone(),
                value: value.clone(),
            },
            Notification::Source { source, event } => Notification::Source {
                source: *source,
                event: event.clone(),
            },
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Notification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Window { viewport, event } => f
                .debug_struct("Window")
                .field("viewport", viewport)
                .field("event", event)
                .finish(),
            Notification::Position {
                viewport,
                start,
                size,
                total,
                snap_to_bottom,
            } => f
                .debug_struct("Position")
                .field("viewport", viewport)
                .field("start", start)
                .field("size", size)
                .field("total", total)
                .field("snap_to_bottom", snap_to_bottom)
                .finish(),
            Notification::Selection {
                viewport,
                selected,
                focus,
                focus_index,
            } => f
                .debug_struct("Selection")
                .field("viewport", viewport)
                .field("selected", selected)
                .field("focus", focus)
                .field("focus_index", focus_index)
                .finish(),
            Notification::Expanded {
                viewport,
                key,
                expanded,
            } => f
                .debug_struct("Expanded")
                .field("viewport", viewport)
                .field("key", key)
                .field("expanded", expanded)
                .finish(),
            Notification::Summary { viewport, field, value } => f
                .debug_struct("Summary")
                .field("viewport", viewport)
                .field("field", field)
                .field("value", value)
                .finish(),
            Notification::Source { source, event } => f
                .debug_struct("Source")
                .field("source", source)
                .field("event", event)
                .finish(),
        }
    }
}
