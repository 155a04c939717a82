//! `diverse_topk`: top-K selection under per-category representation quotas.
//!
//! Given a labeled pool of scored items, pick the `K` highest-scoring ones while every
//! category `c` contributes between `floor(c)` and `ceiling(c)` items.  Two settings:
//!
//! - **Offline**: the whole pool is available and sorted by score.  [`diverse_top_k`] fills
//!   floors greedily, then spends the shared slack budget (`K − Σfloor`) on the best items
//!   whose category still has ceiling headroom.  This greedy rule is optimal.
//! - **Online**: items arrive one at a time in an order the selector does not control, and
//!   each must be accepted or rejected on the spot.  [`OnlineSelector`] generalizes the
//!   classical secretary `1/e` strategy to many categories at once: per-category warm-up
//!   windows calibrate floor thresholds, a global warm-up calibrates the slack threshold,
//!   and two "last chance" rules keep quotas reachable under unlucky arrival orders.
//!
//! Quotas come from [`assign_quotas`] / [`QuotaAssigner`] (minimum, average, proportional,
//! and relaxed variants) or from the caller directly.
//!
//! **Goals:**
//! - **Reproducible**: every random choice goes through a caller-supplied or seeded RNG.
//! - **Single pass**: the online selector never looks ahead and never revisits an item; it only
//!   needs the per-category population counts up front ([`Population`]).
//! - **Short over wrong**: infeasible quotas yield a short [`Selection`], never an error.
//!
//! **Non-goals:**
//! - No data loading, category binning, or plotting.
//! - No persistence or concurrency: selector state lives for one stream.
//!
//! Scores are `f64` compared with `total_cmp`; ties are broken by input order and callers
//! should not rely on any particular tie order.
//!
//! ```rust
//! use diverse_topk::{diverse_top_k, Item, Quota};
//! use std::collections::BTreeMap;
//!
//! let items = vec![
//!     Item::new(9.0, "a", 1),
//!     Item::new(8.0, "a", 2),
//!     Item::new(7.0, "a", 3),
//!     Item::new(1.0, "b", 4),
//! ];
//! let quotas = BTreeMap::from([("a", Quota::new(1, 2)), ("b", Quota::new(1, 1))]);
//! let sel = diverse_top_k(&items, 3, &quotas).unwrap();
//! assert_eq!(sel.chosen, vec![1, 2, 4]);
//! ```

use std::collections::BTreeMap;

mod error;
pub use error::{Error, Result};

mod heap;
pub use heap::BoundedMinHeap;

mod population;
pub use population::*;

mod selection;
pub use selection::*;

mod quota;
pub use quota::*;

mod offline;
pub use offline::*;

mod online;
pub use online::*;

mod evaluate;
pub use evaluate::*;

/// One scored, labeled item.  Items are never mutated; selectors record only `id`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Item<C, I> {
    pub score: f64,
    pub category: C,
    pub id: I,
}

impl<C, I> Item<C, I> {
    pub fn new(score: f64, category: C, id: I) -> Self {
        Self {
            score,
            category,
            id,
        }
    }
}

/// Per-category bounds on how many items may be chosen.
///
/// Intended invariant: `floor <= ceiling <= population(category)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quota {
    /// Minimum items that must be chosen (if feasible).
    pub floor: usize,
    /// Maximum items that may be chosen.
    pub ceiling: usize,
}

impl Quota {
    pub fn new(floor: usize, ceiling: usize) -> Self {
        Self { floor, ceiling }
    }

    /// `floor == ceiling == n`.
    pub fn fixed(n: usize) -> Self {
        Self::new(n, n)
    }

    pub fn contains(&self, count: usize) -> bool {
        self.floor <= count && count <= self.ceiling
    }
}

/// Quotas keyed by category.  Ordered so that iteration (and seeded sampling) is stable.
pub type Quotas<C> = BTreeMap<C, Quota>;

/// Sum of floors across categories.
pub fn floor_sum<C>(quotas: &Quotas<C>) -> usize {
    quotas.values().map(|q| q.floor).sum()
}

/// Sum of ceilings across categories.
pub fn ceiling_sum<C>(quotas: &Quotas<C>) -> usize {
    quotas.values().map(|q| q.ceiling).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_contains_is_inclusive() {
        let q = Quota::new(1, 3);
        assert!(!q.contains(0));
        assert!(q.contains(1));
        assert!(q.contains(3));
        assert!(!q.contains(4));
        assert!(Quota::fixed(2).contains(2));
    }

    #[test]
    fn sums() {
        let q = BTreeMap::from([("a", Quota::new(1, 4)), ("b", Quota::new(2, 2))]);
        assert_eq!(floor_sum(&q), 3);
        assert_eq!(ceiling_sum(&q), 6);
    }
}
