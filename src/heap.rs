//! Capacity-limited min-heap used for warm-up thresholds.
//!
//! A `BoundedMinHeap` with capacity `C` retains the `C` largest values pushed so far.
//! Its minimum is the smallest of those, which is exactly the acceptance threshold the
//! online selector needs after a warm-up window.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// A min-heap that never holds more than `capacity` items.
#[derive(Debug, Clone)]
pub struct BoundedMinHeap<T: Ord> {
    heap: BinaryHeap<Reverse<T>>,
    capacity: usize,
}

impl<T: Ord> BoundedMinHeap<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
        }
    }

    /// Offer an item; returns whether it was kept.
    ///
    /// When the heap is full the current minimum is evicted only if `item` is strictly larger.
    /// A zero-capacity heap keeps nothing.
    pub fn push(&mut self, item: T) -> bool {
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(item));
            return true;
        }
        let evict = matches!(self.heap.peek(), Some(Reverse(min)) if item > *min);
        if evict {
            self.heap.pop();
            self.heap.push(Reverse(item));
        }
        evict
    }

    pub fn peek_min(&self) -> Option<&T> {
        self.heap.peek().map(|Reverse(x)| x)
    }

    pub fn pop_min(&mut self) -> Option<T> {
        self.heap.pop().map(|Reverse(x)| x)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Consume the heap, largest first.
    pub fn into_sorted_desc(self) -> Vec<T> {
        // `into_sorted_vec` is ascending in `Reverse<T>`, i.e. descending in `T`.
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(x)| x)
            .collect()
    }
}

/// Totally ordered score for heap storage (`f64::total_cmp`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Threshold(pub(crate) f64);

impl PartialEq for Threshold {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Threshold {}

impl PartialOrd for Threshold {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Threshold {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
