//! Selection output and the input checks shared by both selectors.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use crate::error::label;
use crate::{Error, Item, Quotas, Result};

/// Result of a selector run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection<C: Ord, I> {
    /// Chosen identifiers, in acceptance order. At most `k` long.
    pub chosen: Vec<I>,
    /// Sum of the chosen items' scores (0 when nothing was chosen).
    pub total_score: f64,
    /// Chosen count per category; every quota'd category is present, possibly with 0.
    pub per_category: BTreeMap<C, usize>,
    /// Items examined before stopping.
    ///
    /// For the online selector this is the walking distance. For the offline selector it is
    /// the number of sorted items scanned.
    pub examined: usize,
}

impl<C: Ord + Clone, I> Selection<C, I> {
    pub(crate) fn empty(quotas: &Quotas<C>) -> Self {
        Self {
            chosen: Vec::new(),
            total_score: 0.0,
            per_category: quotas.keys().map(|c| (c.clone(), 0)).collect(),
            examined: 0,
        }
    }

    pub(crate) fn push(&mut self, item: &Item<C, I>)
    where
        I: Clone,
    {
        self.chosen.push(item.id.clone());
        self.total_score += item.score;
        *self.per_category.entry(item.category.clone()).or_insert(0) += 1;
    }
}

impl<C: Ord, I> Selection<C, I> {
    pub fn len(&self) -> usize {
        self.chosen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chosen.is_empty()
    }

    /// True when exactly `k` identifiers were chosen.
    pub fn is_complete(&self, k: usize) -> bool {
        self.chosen.len() == k
    }

    /// Whether every category's chosen count lies within its `[floor, ceiling]`.
    pub fn satisfies(&self, quotas: &Quotas<C>) -> bool {
        quotas
            .iter()
            .all(|(c, q)| q.contains(self.per_category.get(c).copied().unwrap_or(0)))
    }
}

/// Check every quota has `floor <= ceiling`.
pub fn validate_quotas<C: Ord + Debug>(quotas: &Quotas<C>) -> Result<()> {
    for (c, q) in quotas {
        if q.floor > q.ceiling {
            return Err(Error::InvalidQuota {
                category: label(c),
                floor: q.floor,
                ceiling: q.ceiling,
            });
        }
    }
    Ok(())
}

/// Fail-fast checks on a full item slice: finite scores, unique ids, quota'd categories.
pub(crate) fn validate_items<C, I>(items: &[Item<C, I>], quotas: &Quotas<C>) -> Result<()>
where
    C: Ord + Debug,
    I: Ord + Debug,
{
    let mut seen: BTreeSet<&I> = BTreeSet::new();
    for it in items {
        if !it.score.is_finite() {
            return Err(Error::NonFiniteScore { id: label(&it.id) });
        }
        if !quotas.contains_key(&it.category) {
            return Err(Error::UnknownCategory {
                category: label(&it.category),
            });
        }
        if !seen.insert(&it.id) {
            return Err(Error::DuplicateId { id: label(&it.id) });
        }
    }
    Ok(())
}

/// Sort items by descending score. Stable: equal scores keep their input order.
pub fn sort_by_score_desc<C, I>(items: &mut [Item<C, I>]) {
    items.sort_by(|a, b| b.score.total_cmp(&a.score));
}
