//! Keyed, ordered item index maintained incrementally.
//!
//! Items are ordered by `(rank, key)`. The rank is whatever the owner
//! derives from an item (for a sorted source, its sort tuple); the key
//! breaks ties, so the order is total and independent of arrival order.
//! Every mutation reports the positions it touched, which is what sources
//! turn into index-bearing events.

use hashbrown::HashMap;
use std::sync::Arc;

/// Positions reported by [`OrderedIndex::update`].
#[derive(Debug)]
pub struct Replaced<T> {
    /// The item that was replaced.
    pub old: Arc<T>,
    /// Position before the update.
    pub from: usize,
    /// Position after the update.
    pub to: usize,
}

impl<T> Replaced<T> {
    /// Returns true if the item changed position.
    #[inline]
    pub fn is_moved(&self) -> bool {
        self.from != self.to
    }
}

/// Ordered index of shared items.
pub struct OrderedIndex<K, T> {
    /// `(rank, key)` pairs in order.
    order: Vec<(K, String)>,
    entries: HashMap<String, (K, Arc<T>)>,
}

impl<K: Ord + Clone, T> Default for OrderedIndex<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, T> OrderedIndex<K, T> {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Builds an index from unordered entries. Later duplicates of a key win.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, K, Arc<T>)>) -> Self {
        let mut index = Self::new();
        index.rebuild(entries);
        index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Gets an item by key.
    pub fn get_by_key(&self, key: &str) -> Option<&Arc<T>> {
        self.entries.get(key).map(|(_, item)| item)
    }

    /// Gets the item at a position.
    pub fn get(&self, index: usize) -> Option<&Arc<T>> {
        let (_, key) = self.order.get(index)?;
        self.get_by_key(key)
    }

    /// Gets the key at a position.
    pub fn key_at(&self, index: usize) -> Option<&str> {
        self.order.get(index).map(|(_, key)| key.as_str())
    }

    /// Gets the rank stored for a key.
    pub fn rank_of(&self, key: &str) -> Option<&K> {
        self.entries.get(key).map(|(rank, _)| rank)
    }

    /// Returns the current position of a key.
    pub fn position(&self, key: &str) -> Option<usize> {
        let (rank, _) = self.entries.get(key)?;
        self.search(rank, key).ok()
    }

    /// Returns `(from, to)`: the current position of `key` and the one it
    /// would occupy if its rank became `rank`. `None` if the key is absent.
    pub fn relocation(&self, key: &str, rank: &K) -> Option<(usize, usize)> {
        let from = self.position(key)?;
        let to = match self.search(rank, key) {
            Ok(at) | Err(at) if at > from => at - 1,
            Ok(at) | Err(at) => at,
        };
        Some((from, to))
    }

    /// Inserts an item and returns its position.
    ///
    /// If the key is already present its old entry is removed first.
    pub fn insert(&mut self, key: String, rank: K, item: Arc<T>) -> usize {
        if self.contains_key(&key) {
            self.remove(&key);
        }
        let at = match self.search(&rank, &key) {
            Ok(at) | Err(at) => at,
        };
        self.order.insert(at, (rank.clone(), key.clone()));
        self.entries.insert(key, (rank, item));
        at
    }

    /// Removes a key, returning its former position and item.
    pub fn remove(&mut self, key: &str) -> Option<(usize, Arc<T>)> {
        let at = self.position(key)?;
        self.order.remove(at);
        let (_, item) = self.entries.remove(key)?;
        Some((at, item))
    }

    /// Replaces the item stored under an existing key.
    ///
    /// Returns `None` if the key is absent. `from` is the position before the
    /// update and `to` the position after it.
    pub fn update(&mut self, key: &str, rank: K, item: Arc<T>) -> Option<Replaced<T>> {
        let from = self.position(key)?;
        let same_rank = self.order[from].0 == rank;
        if same_rank {
            let entry = self.entries.get_mut(key)?;
            let old = std::mem::replace(&mut entry.1, item);
            return Some(Replaced { old, from, to: from });
        }
        let (_, old) = self.remove(key)?;
        let to = self.insert(key.to_string(), rank, item);
        Some(Replaced { old, from, to })
    }

    /// Iterates items in order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> + '_ {
        self.order
            .iter()
            .filter_map(move |(_, key)| self.entries.get(key).map(|(_, item)| item))
    }

    /// Iterates keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.order.iter().map(|(_, key)| key.as_str())
    }

    /// Returns all items in order.
    pub fn values(&self) -> Vec<Arc<T>> {
        self.iter().cloned().collect()
    }

    /// Returns the items at positions `start..end`, clamped to the length.
    pub fn range(&self, start: usize, end: usize) -> Vec<Arc<T>> {
        let end = end.min(self.len());
        let start = start.min(end);
        self.order[start..end]
            .iter()
            .filter_map(|(_, key)| self.entries.get(key).map(|(_, item)| Arc::clone(item)))
            .collect()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }

    /// Replaces the whole content, sorting once.
    pub fn rebuild(&mut self, entries: impl IntoIterator<Item = (String, K, Arc<T>)>) {
        self.clear();
        for (key, rank, item) in entries {
            self.entries.insert(key, (rank, item));
        }
        self.order = self
            .entries
            .iter()
            .map(|(key, (rank, _))| (rank.clone(), key.clone()))
            .collect();
        self.order.sort_unstable();
    }

    fn search(&self, rank: &K, key: &str) -> Result<usize, usize> {
        self.order
            .binary_search_by(|(r, k)| (r, k.as_str()).cmp(&(rank, key)))
    }
}

impl<K: Clone, T> Clone for OrderedIndex<K, T> {
    fn clone(&self) -> Self {
        Self {
            order: self.order.clone(),
            entries: self.entries.clone(),
        }
    }
}

impl<K: std::fmt::Debug, T> std::fmt::Debug for OrderedIndex<K, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.order.iter()).finish()
    }
}
