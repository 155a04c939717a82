//! Online (streaming) selection with warm-up thresholds.
//!
//! Items arrive one at a time, in an order the selector does not control, and each must be
//! accepted or rejected immediately.  The strategy is the secretary-problem cutoff applied at
//! two levels:
//!
//! - **Per category** (floors): the first `R_c = ⌊ratio · n_c / e⌋` arrivals of category `c`
//!   are only observed; their `floor_c` best scores seed a threshold heap.  Afterwards an item
//!   beating the heap minimum is accepted toward the floor (and evicts that minimum).
//! - **Globally** (slack): the first `r = ⌊ratio · N / e⌋` arrivals overall seed a heap of
//!   capacity `slack = K − Σfloor`; afterwards an item beating its minimum is accepted toward
//!   its category's ceiling, spending one unit of slack.
//!
//! Two forced rules keep quotas reachable when the thresholds are unlucky:
//!
//! - a category's item is taken when its remaining items exactly equal its unfilled floor;
//! - an item is taken when the remaining items of all categories with ceiling headroom exactly
//!   equal the number of selections still needed.
//!
//! Rules are evaluated in a fixed priority order, first match wins:
//!
//! 1. warm-up bookkeeping (global and category heaps), never exclusive;
//! 2. category still warming up: no decision;
//! 3. floor acceptance (threshold, or last chance);
//! 4. slack acceptance (global threshold);
//! 5. feasibility acceptance;
//! 6. reject.
//!
//! The counts `n_c` and `N` must be known before the first arrival: pass a [`Population`].

use std::collections::BTreeMap;
use std::fmt::Debug;

use tracing::{debug, trace};

use crate::error::label;
use crate::heap::Threshold;
use crate::selection::validate_items;
use crate::{
    floor_sum, validate_quotas, warmup_len, BoundedMinHeap, Error, Item, Population, Quota, Quotas,
    Result, Selection,
};

/// Online selector configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OnlineConfig {
    /// Scale applied to the `1/e` warm-up windows, in `(0, 1]`.
    ///
    /// `1.0` is the classical cutoff.  Smaller values examine fewer items before thresholds
    /// start accepting, trading accuracy for a shorter walking distance.
    pub warmup_ratio: f64,
}

impl Default for OnlineConfig {
    fn default() -> Self {
        Self { warmup_ratio: 1.0 }
    }
}

impl OnlineConfig {
    pub fn with_warmup_ratio(warmup_ratio: f64) -> Self {
        Self { warmup_ratio }
    }

    pub fn validate(&self) -> Result<()> {
        let r = self.warmup_ratio;
        if r.is_finite() && r > 0.0 && r <= 1.0 {
            Ok(())
        } else {
            Err(Error::InvalidWarmupRatio { ratio: r })
        }
    }
}

/// Why an item was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Acceptance {
    /// Beat the category's warm-up threshold while its floor was unmet.
    FloorThreshold,
    /// The category's remaining items exactly matched its unfilled floor.
    FloorLastChance,
    /// Beat the global warm-up threshold, spending slack.
    SlackThreshold,
    /// Remaining feasible items exactly matched the selections still needed.
    Feasibility,
}

/// Outcome of offering one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    Accepted(Acceptance),
    /// The item's category is still inside its warm-up window.
    WarmingUp,
    Rejected,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }
}

#[derive(Debug, Clone)]
struct CategoryState {
    quota: Quota,
    population: usize,
    warmup: usize,
    visited: usize,
    accepted: usize,
    heap: BoundedMinHeap<Threshold>,
}

impl CategoryState {
    fn remaining(&self) -> usize {
        self.population - self.visited
    }

    fn below_floor(&self) -> bool {
        self.accepted < self.quota.floor
    }

    fn below_ceiling(&self) -> bool {
        self.accepted < self.quota.ceiling
    }
}

// An empty heap has no threshold: every score clears it.
fn clears(heap: &BoundedMinHeap<Threshold>, score: f64) -> bool {
    heap.peek_min().map_or(true, |min| score > min.0)
}

/// Single-stream online selector.
///
/// Create one per stream; state is never reset or shared.
#[derive(Debug, Clone)]
pub struct OnlineSelector<C: Ord, I> {
    k: usize,
    categories: BTreeMap<C, CategoryState>,
    global: BoundedMinHeap<Threshold>,
    global_warmup: usize,
    slack: usize,
    total_seen: usize,
    out: Selection<C, I>,
}

impl<C, I> OnlineSelector<C, I>
where
    C: Ord + Clone + Debug,
    I: Clone,
{
    /// Set up thresholds for a stream whose per-category counts are `population`.
    ///
    /// Categories with a quota but absent from `population` are treated as empty.
    ///
    /// # Errors
    ///
    /// Invalid warm-up ratio, `floor > ceiling`, or a population category without a quota.
    pub fn new(
        k: usize,
        quotas: &Quotas<C>,
        population: &Population<C>,
        cfg: OnlineConfig,
    ) -> Result<Self> {
        cfg.validate()?;
        validate_quotas(quotas)?;
        if let Some(c) = population.counts().keys().find(|c| !quotas.contains_key(*c)) {
            return Err(Error::UnknownCategory { category: label(c) });
        }

        let categories: BTreeMap<C, CategoryState> = quotas
            .iter()
            .map(|(c, &quota)| {
                let n = population.count(c);
                let state = CategoryState {
                    quota,
                    population: n,
                    warmup: warmup_len(n, cfg.warmup_ratio),
                    visited: 0,
                    accepted: 0,
                    heap: BoundedMinHeap::new(quota.floor),
                };
                (c.clone(), state)
            })
            .collect();
        let slack = k.saturating_sub(floor_sum(quotas));
        let global_warmup = warmup_len(population.total(), cfg.warmup_ratio);

        debug!(
            k,
            slack,
            global_warmup,
            stream_len = population.total(),
            warmup_ratio = cfg.warmup_ratio,
            "online selector ready"
        );
        Ok(Self {
            k,
            categories,
            global: BoundedMinHeap::new(slack),
            global_warmup,
            slack,
            total_seen: 0,
            out: Selection::empty(quotas),
        })
    }

    /// Decide on one arrival.  Irrevocable.
    ///
    /// # Errors
    ///
    /// Non-finite score, unknown category, more arrivals for a category than its population
    /// count, or an offer after `k` items were accepted.
    pub fn offer(&mut self, item: &Item<C, I>) -> Result<Verdict>
    where
        I: Debug,
    {
        if self.is_complete() {
            return Err(Error::SelectionClosed { k: self.k });
        }
        if !item.score.is_finite() {
            return Err(Error::NonFiniteScore { id: label(&item.id) });
        }
        let needed = self.k - self.out.len();
        // Summed before borrowing the item's category mutably.
        let feasible: usize = self
            .categories
            .values()
            .filter(|s| s.below_ceiling())
            .map(CategoryState::remaining)
            .sum();

        let Some(cat) = self.categories.get_mut(&item.category) else {
            return Err(Error::UnknownCategory {
                category: label(&item.category),
            });
        };
        if cat.visited >= cat.population {
            return Err(Error::PopulationExceeded {
                category: label(&item.category),
                count: cat.population,
            });
        }

        let score = Threshold(item.score);
        if self.total_seen < self.global_warmup {
            self.global.push(score);
        }

        let verdict = if cat.visited < cat.warmup {
            cat.heap.push(score);
            Verdict::WarmingUp
        } else if cat.below_floor() && clears(&cat.heap, item.score) {
            cat.heap.pop_min();
            Verdict::Accepted(Acceptance::FloorThreshold)
        } else if cat.remaining() == cat.quota.floor.saturating_sub(cat.accepted) {
            cat.heap.pop_min();
            Verdict::Accepted(Acceptance::FloorLastChance)
        } else if self.total_seen >= self.global_warmup
            && clears(&self.global, item.score)
            && cat.below_ceiling()
            && self.slack > 0
        {
            self.global.pop_min();
            self.slack -= 1;
            Verdict::Accepted(Acceptance::SlackThreshold)
        } else if cat.below_ceiling() && feasible == needed {
            self.slack = self.slack.saturating_sub(1);
            Verdict::Accepted(Acceptance::Feasibility)
        } else {
            Verdict::Rejected
        };

        if let Verdict::Accepted(reason) = verdict {
            cat.accepted += 1;
            self.out.push(item);
            trace!(
                id = ?item.id,
                category = ?item.category,
                score = item.score,
                ?reason,
                seen = self.total_seen,
                "accepted"
            );
        }
        cat.visited += 1;
        self.total_seen += 1;
        self.out.examined = self.total_seen;
        Ok(verdict)
    }

    /// True once `k` items have been accepted.
    pub fn is_complete(&self) -> bool {
        self.out.len() >= self.k
    }

    /// Items examined so far (the walking distance).
    pub fn examined(&self) -> usize {
        self.total_seen
    }

    /// Unspent slack.
    pub fn slack(&self) -> usize {
        self.slack
    }

    /// Selection so far.
    pub fn selection(&self) -> &Selection<C, I> {
        &self.out
    }

    pub fn finish(self) -> Selection<C, I> {
        debug!(
            k = self.k,
            chosen = self.out.len(),
            examined = self.total_seen,
            slack_left = self.slack,
            "online selection done"
        );
        self.out
    }
}

/// Run the online selector over `items` in the given (arrival) order.
///
/// Validates the whole slice first (finite scores, unique identifiers, quota'd categories),
/// computes the [`Population`] pre-pass, then streams.  Stops at `k` acceptances;
/// [`Selection::examined`] is the walking distance.
pub fn online_diverse_select<C, I>(
    items: &[Item<C, I>],
    k: usize,
    quotas: &Quotas<C>,
    cfg: OnlineConfig,
) -> Result<Selection<C, I>>
where
    C: Ord + Clone + Debug,
    I: Ord + Clone + Debug,
{
    validate_items(items, quotas)?;
    let population = Population::from_items(items);
    let mut selector = OnlineSelector::new(k, quotas, &population, cfg)?;
    for it in items {
        if selector.is_complete() {
            break;
        }
        selector.offer(it)?;
    }
    Ok(selector.finish())
}
