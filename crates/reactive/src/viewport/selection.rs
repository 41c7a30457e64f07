//! Key-based row selection.
//!
//! Selection is tracked by item key, so it follows rows when they move and
//! drops rows that leave the source.

use crate::source::Contents;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub(crate) struct Selection {
    selected: BTreeSet<String>,
    /// Fixed end of shift ranges.
    anchor: Option<String>,
    /// The most recently selected or navigated-to key.
    focus: Option<String>,
}

impl Selection {
    pub(crate) fn selected(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    #[inline]
    pub(crate) fn focus(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    /// Selects `key` with modifier semantics:
    /// plain replaces the selection, ctrl toggles `key`, shift selects the
    /// range from the anchor (adding to the selection when ctrl is held).
    pub(crate) fn select<T>(&mut self, key: &str, ctrl: bool, shift: bool, contents: &Contents<T>) {
        if shift {
            let range = self.range_to(key, contents);
            if !ctrl {
                self.selected.clear();
            }
            self.selected.extend(range);
            self.focus = Some(key.to_string());
            return;
        }
        if ctrl {
            if !self.selected.remove(key) {
                self.selected.insert(key.to_string());
            }
        } else {
            self.selected.clear();
            self.selected.insert(key.to_string());
        }
        self.anchor = Some(key.to_string());
        self.focus = Some(key.to_string());
    }

    /// Keys from the anchor to `key` in source order, inclusive. Sets the
    /// anchor to `key` when it is missing or gone.
    fn range_to<T>(&mut self, key: &str, contents: &Contents<T>) -> Vec<String> {
        let Some(to) = contents.position(key) else {
            return Vec::new();
        };
        let from = match self.anchor.as_deref().and_then(|a| contents.position(a)) {
            Some(from) => from,
            None => {
                self.anchor = Some(key.to_string());
                to
            }
        };
        let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
        (lo..=hi)
            .filter_map(|i| contents.key_at(i).map(str::to_string))
            .collect()
    }

    /// Moves the focus `delta` rows in source order, clamped to the source.
    ///
    /// Without a focus the move starts at `start` and lands there. Plain
    /// selects only the new focus, shift extends a range from the anchor,
    /// ctrl alone moves the focus without changing the selection.
    /// Returns the new focus index.
    pub(crate) fn move_focus<T>(
        &mut self,
        delta: i64,
        ctrl: bool,
        shift: bool,
        start: usize,
        contents: &Contents<T>,
    ) -> Option<usize> {
        if contents.is_empty() {
            return None;
        }
        let last = contents.len() - 1;
        let target = match self.focus.as_deref().and_then(|f| contents.position(f)) {
            Some(base) => {
                let moved = base as i64 + delta;
                moved.clamp(0, last as i64) as usize
            }
            None => start.min(last),
        };
        let key = contents.key_at(target)?.to_string();
        if ctrl && !shift {
            self.focus = Some(key);
        } else {
            self.select(&key, ctrl, shift, contents);
        }
        Some(target)
    }

    /// Drops keys no longer present. Returns true if anything changed.
    pub(crate) fn prune<T>(&mut self, contents: &Contents<T>) -> bool {
        let before = self.selected.len();
        self.selected.retain(|key| contents.contains_key(key));
        let mut changed = before != self.selected.len();
        for slot in [&mut self.anchor, &mut self.focus] {
            if slot.as_deref().is_some_and(|k| !contents.contains_key(k)) {
                *slot = None;
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn clear(&mut self) {
        self.selected.clear();
        self.anchor = None;
        self.focus = None;
    }
}
