//! Population counts: the one-time pre-pass over the whole pool.
//!
//! Both the quota assignor and the online selector treat these counts as ground truth.
//! The online selector in particular needs them *before* the first arrival, so they are
//! modeled as an explicit value rather than discovered while streaming.

use std::collections::BTreeMap;

use crate::Item;

/// Per-category item counts plus the total pool size `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Population<C: Ord> {
    counts: BTreeMap<C, usize>,
    total: usize,
}

impl<C: Ord + Clone> Population<C> {
    /// Count items per category.
    pub fn from_items<I>(items: &[Item<C, I>]) -> Self {
        let mut counts: BTreeMap<C, usize> = BTreeMap::new();
        for it in items {
            *counts.entry(it.category.clone()).or_insert(0) += 1;
        }
        Self {
            counts,
            total: items.len(),
        }
    }

    pub fn from_counts(counts: BTreeMap<C, usize>) -> Self {
        let total = counts.values().sum();
        Self { counts, total }
    }

    /// Count for `category` (0 if unseen).
    pub fn count(&self, category: &C) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of categories `d`.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<C, usize> {
        &self.counts
    }
}

impl<C: Ord + Clone> FromIterator<(C, usize)> for Population<C> {
    fn from_iter<T: IntoIterator<Item = (C, usize)>>(iter: T) -> Self {
        Self::from_counts(iter.into_iter().collect())
    }
}

/// Warm-up window length `⌊ratio · n / e⌋` (the classical secretary cutoff, scaled).
///
/// # Example
///
/// ```rust
/// use diverse_topk::warmup_len;
///
/// assert_eq!(warmup_len(100, 1.0), 36);
/// assert_eq!(warmup_len(100, 0.25), 9);
/// assert_eq!(warmup_len(2, 1.0), 0);
/// ```
pub fn warmup_len(n: usize, ratio: f64) -> usize {
    (ratio * (n as f64 / std::f64::consts::E)).floor() as usize
}
