//! Incremental aggregate operators.
//!
//! Each aggregate consumes value deltas and keeps a running result without
//! rescanning. Sum, Avg, Min and Max only account for numeric inputs; other
//! values (and NaN) are skipped.

use crate::delta::Delta;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use vista_core::Value;

/// Incremental COUNT aggregate.
///
/// Counts every delta, whatever its value.
#[derive(Clone, Debug, Default)]
pub struct IncrementalCount {
    count: i64,
}

impl IncrementalCount {
    /// Creates a new incremental count starting at 0.
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Applies a batch of deltas to update the count.
    pub fn apply<T>(&mut self, deltas: &[Delta<T>]) {
        for d in deltas {
            self.count += d.diff as i64;
        }
    }

    /// Returns the current count.
    #[inline]
    pub fn get(&self) -> i64 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }
}

/// Running total that keeps integer inputs exact.
///
/// Integers accumulate in an `i128`, so adding and withdrawing the same
/// integers returns to the same total. Only floats go through `f64`.
#[derive(Clone, Copy, Debug, Default)]
struct Total {
    ints: i128,
    floats: f64,
}

impl Total {
    /// Returns false when `value` is not numeric.
    fn add(&mut self, value: &Value, diff: i32) -> bool {
        if let Some(v) = value.as_i64() {
            self.ints += v as i128 * diff as i128;
            return true;
        }
        match extract_numeric(value) {
            Some(num) => {
                self.floats += num * diff as f64;
                true
            }
            None => false,
        }
    }

    fn get(&self) -> f64 {
        self.ints as f64 + self.floats
    }
}

/// Incremental SUM aggregate.
#[derive(Clone, Debug, Default)]
pub struct IncrementalSum {
    total: Total,
}

impl IncrementalSum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a batch of value deltas to update the sum.
    pub fn apply(&mut self, deltas: &[Delta<Value>]) {
        for d in deltas {
            self.total.add(&d.data, d.diff);
        }
    }

    /// Returns the current sum; 0 when nothing was summed.
    #[inline]
    pub fn get(&self) -> f64 {
        self.total.get()
    }

    pub fn reset(&mut self) {
        self.total = Total::default();
    }
}

/// Incremental AVG aggregate.
///
/// Maintains both sum and count to compute average incrementally.
#[derive(Clone, Debug, Default)]
pub struct IncrementalAvg {
    total: Total,
    count: i64,
}

impl IncrementalAvg {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a batch of value deltas to update the average.
    pub fn apply(&mut self, deltas: &[Delta<Value>]) {
        for d in deltas {
            if self.total.add(&d.data, d.diff) {
                self.count += d.diff as i64;
            }
        }
    }

    /// Returns the current average, or None if count is 0.
    pub fn get(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.total.get() / self.count as f64)
        }
    }

    /// Returns the number of numeric inputs.
    #[inline]
    pub fn count(&self) -> i64 {
        self.count
    }

    #[inline]
    pub fn sum(&self) -> f64 {
        self.total.get()
    }

    pub fn reset(&mut self) {
        self.total = Total::default();
        self.count = 0;
    }
}

/// Totally ordered numeric key. NaN never reaches it.
#[derive(Clone, Copy, Debug)]
struct Numeric(f64);

impl PartialEq for Numeric {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Numeric {}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Numeric {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Ordered multiset of numeric values: value to occurrence count.
///
/// Removing the current extreme only drops one occurrence, so the next
/// extreme is found in O(log n) without a rescan.
#[derive(Clone, Debug, Default)]
pub struct Multiset {
    counts: BTreeMap<Numeric, usize>,
}

impl Multiset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies value deltas. Deleting a value that is not present is ignored.
    pub fn apply(&mut self, deltas: &[Delta<Value>]) {
        for d in deltas {
            let Some(num) = extract_numeric(&d.data) else {
                continue;
            };
            let key = Numeric(num);
            if d.is_insert() {
                *self.counts.entry(key).or_insert(0) += d.diff as usize;
            } else if d.is_delete() {
                if let Some(count) = self.counts.get_mut(&key) {
                    *count = count.saturating_sub(d.diff.unsigned_abs() as usize);
                    if *count == 0 {
                        self.counts.remove(&key);
                    }
                }
            }
        }
    }

    /// Smallest value present.
    pub fn first(&self) -> Option<f64> {
        self.counts.keys().next().map(|n| n.0)
    }

    /// Largest value present.
    pub fn last(&self) -> Option<f64> {
        self.counts.keys().next_back().map(|n| n.0)
    }

    /// Number of occurrences of a value.
    pub fn occurrences(&self, value: f64) -> usize {
        self.counts.get(&Numeric(value)).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}

/// Incremental MIN aggregate over a [`Multiset`].
#[derive(Clone, Debug, Default)]
pub struct IncrementalMin {
    values: Multiset,
}

impl IncrementalMin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, deltas: &[Delta<Value>]) {
        self.values.apply(deltas);
    }

    /// Returns the current minimum, or None if empty.
    pub fn get(&self) -> Option<f64> {
        self.values.first()
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Incremental MAX aggregate over a [`Multiset`].
#[derive(Clone, Debug, Default)]
pub struct IncrementalMax {
    values: Multiset,
}

impl IncrementalMax {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, deltas: &[Delta<Value>]) {
        self.values.apply(deltas);
    }

    /// Returns the current maximum, or None if empty.
    pub fn get(&self) -> Option<f64> {
        self.values.last()
    }

    pub fn reset(&mut self) {
        self.values.clear();
    }
}

/// Extracts a numeric value for aggregation. Non-numeric inputs and NaN are
/// skipped.
fn extract_numeric(value: &Value) -> Option<f64> {
    let num = value.as_numeric();
    if num.is_none() && !value.is_null() {
        tracing::trace!(
            target: "vista_incremental::aggregate",
            value = %value,
            "skipping non-numeric aggregate input"
        );
    }
    num
}
