//! Window arithmetic: translating source events into window-relative events.
//!
//! The window mirrors what the consumer holds: `visible` rows starting at
//! source index `start`, with `visible == min(size, total - start)` after
//! every event. The consumer model is described by
//! [`WindowReplica`](super::WindowReplica).

use crate::notification::{Notification, ViewportId};
use crate::source::Contents;
use std::sync::Arc;
use vista_core::Event;

#[derive(Debug)]
pub(crate) struct Window {
    viewport: ViewportId,
    start: usize,
    size: usize,
    snap_to_bottom: bool,
    visible: usize,
    /// Last `(start, size, total, snap)` reported to the consumer.
    reported: Option<(usize, usize, usize, bool)>,
}

impl Window {
    pub(crate) fn new(viewport: ViewportId, size: usize) -> Self {
        Self {
            viewport,
            start: 0,
            size,
            snap_to_bottom: false,
            visible: 0,
            reported: None,
        }
    }

    #[inline]
    pub(crate) fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub(crate) fn snap_to_bottom(&self) -> bool {
        self.snap_to_bottom
    }

    /// Converts a source index to a window index.
    pub(crate) fn window_index(&self, index: usize) -> Option<usize> {
        (index >= self.start && index < self.start + self.visible).then(|| index - self.start)
    }

    fn max_start(&self, total: usize) -> usize {
        total.saturating_sub(self.size)
    }

    fn push<T>(&self, out: &mut Vec<Notification<T>>, event: Event<T>) {
        out.push(Notification::Window {
            viewport: self.viewport,
            event,
        });
    }

    fn push_row<T>(&self, out: &mut Vec<Notification<T>>, contents: &Contents<T>, index: usize, at: usize) {
        if let Some(item) = contents.get(index) {
            self.push(out, Event::add(Arc::clone(item), at));
        }
    }

    /// Reports `Position` if it differs from what was last reported.
    pub(crate) fn sync_position<T>(&mut self, total: usize, out: &mut Vec<Notification<T>>) {
        let current = (self.start, self.size, total, self.snap_to_bottom);
        if self.reported == Some(current) {
            return;
        }
        self.reported = Some(current);
        out.push(Notification::Position {
            viewport: self.viewport,
            start: self.start,
            size: self.size,
            total,
            snap_to_bottom: self.snap_to_bottom,
        });
    }

    /// Re-sends the whole window: clamps `start`, reports the position,
    /// then a `Snapshot` of the visible rows.
    pub(crate) fn resync<T>(&mut self, contents: &Contents<T>, out: &mut Vec<Notification<T>>) {
        let total = contents.len();
        self.start = if self.snap_to_bottom {
            self.max_start(total)
        } else {
            self.start.min(self.max_start(total))
        };
        self.sync_position(total, out);
        let rows = contents.range(self.start, self.start + self.size);
        self.visible = rows.len();
        self.push(out, Event::snapshot(rows));
    }

    /// Applies one source event. `contents` is the source state after it.
    pub(crate) fn apply<T>(&mut self, event: &Event<T>, contents: &Contents<T>, out: &mut Vec<Notification<T>>) {
        match event {
            Event::Add { item, index } => {
                let index = *index;
                if index < self.start {
                    self.start += 1;
                } else if index < self.start + self.size {
                    self.push(out, Event::add(Arc::clone(item), index - self.start));
                    self.visible = (self.visible + 1).min(self.size);
                }
            }
            Event::Remove { item, index } => {
                let index = *index;
                if index < self.start {
                    self.start -= 1;
                } else if index < self.start + self.visible {
                    self.push(out, Event::remove(Arc::clone(item), index - self.start));
                    self.visible -= 1;
                    // The next row scrolls in from below.
                    if self.start + self.visible < contents.len() {
                        self.push_row(out, contents, self.start + self.visible, self.visible);
                        self.visible += 1;
                    }
                }
            }
            Event::Update { old, new, index } => {
                if let Some(at) = self.window_index(*index) {
                    self.push(out, Event::update(Arc::clone(old), Arc::clone(new), at));
                }
            }
            Event::Snapshot { .. } => {
                self.resync(contents, out);
                return;
            }
            Event::Clear => {
                self.start = 0;
                self.visible = 0;
                self.push(out, Event::Clear);
            }
            Event::Destroy => {
                self.start = 0;
                self.visible = 0;
                self.push(out, Event::Destroy);
                return;
            }
        }
        if self.snap_to_bottom {
            self.scroll_to(self.max_start(contents.len()), contents, out);
        }
    }

    /// Moves the window to `target`, emitting the rows that leave and enter.
    pub(crate) fn scroll_to<T>(&mut self, target: usize, contents: &Contents<T>, out: &mut Vec<Notification<T>>) {
        let old = self.start;
        if target == old {
            return;
        }
        let distance = target.abs_diff(old);
        if distance >= self.size {
            self.start = target;
            let rows = contents.range(self.start, self.start + self.size);
            self.visible = rows.len();
            self.push(out, Event::snapshot(rows));
            return;
        }

        if target > old {
            let leaving = distance.min(self.visible);
            for offset in 0..leaving {
                if let Some(item) = contents.get(old + offset) {
                    self.push(out, Event::remove(Arc::clone(item), 0));
                }
            }
            self.visible -= leaving;
            self.start = target;
            self.fill(contents, out);
        } else {
            for index in (target..old).rev() {
                self.push_row(out, contents, index, 0);
            }
            self.start = target;
            self.visible = (self.visible + distance).min(self.size);
        }
    }

    /// Appends rows until the window is full or the source is exhausted.
    fn fill<T>(&mut self, contents: &Contents<T>, out: &mut Vec<Notification<T>>) {
        while self.visible < self.size && self.start + self.visible < contents.len() {
            self.push_row(out, contents, self.start + self.visible, self.visible);
            self.visible += 1;
        }
    }

    /// Moves the window. With `snap_to_bottom` the offset is ignored and
    /// the window follows the tail.
    pub(crate) fn set_position<T>(
        &mut self,
        offset: usize,
        snap_to_bottom: bool,
        contents: &Contents<T>,
        out: &mut Vec<Notification<T>>,
    ) {
        self.snap_to_bottom = snap_to_bottom;
        let max_start = self.max_start(contents.len());
        let target = if snap_to_bottom { max_start } else { offset.min(max_start) };
        self.scroll_to(target, contents, out);
        self.sync_position(contents.len(), out);
    }

    /// Resizes the window. Shrinking drops tail rows before the new size is
    /// reported; growing reports the size before appending rows.
    pub(crate) fn set_size<T>(&mut self, size: usize, contents: &Contents<T>, out: &mut Vec<Notification<T>>) {
        let total = contents.len();
        if size < self.size {
            while self.visible > size {
                self.visible -= 1;
                if let Some(item) = contents.get(self.start + self.visible) {
                    self.push(out, Event::remove(Arc::clone(item), self.visible));
                }
            }
            self.size = size;
            self.sync_position(total, out);
        } else if size > self.size {
            self.size = size;
            self.sync_position(total, out);
            self.fill(contents, out);
        }
        if self.snap_to_bottom {
            self.scroll_to(self.max_start(total), contents, out);
        }
        self.sync_position(total, out);
    }
}
