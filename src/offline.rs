//! Offline selection: the whole pool is known and sorted by score.

use std::fmt::Debug;

use tracing::debug;

use crate::selection::validate_items;
use crate::{floor_sum, validate_quotas, Error, Item, Quotas, Result, Selection};

/// Choose up to `k` items maximizing total score subject to `quotas`.
///
/// `items` must be sorted by non-increasing score (see [`crate::sort_by_score_desc`]).
/// The scan accepts an item when its category is below floor, or when it is below ceiling
/// and shared slack (`k − Σfloor`) remains; it stops at `k` acceptances.
///
/// Greedy is optimal here: floors are mandatory, and giving each unit of slack to the
/// highest-scoring item with ceiling headroom cannot be improved by an exchange.
///
/// If the quotas cannot reach `k` (ceilings too tight, pool too small) the result is short.
/// Callers must check [`Selection::is_complete`].
///
/// # Errors
///
/// Fails before any selection work on non-finite scores, duplicate identifiers, categories
/// without a quota, `floor > ceiling`, or unsorted input.
pub fn diverse_top_k<C, I>(items: &[Item<C, I>], k: usize, quotas: &Quotas<C>) -> Result<Selection<C, I>>
where
    C: Ord + Clone + Debug,
    I: Ord + Clone + Debug,
{
    validate_quotas(quotas)?;
    validate_items(items, quotas)?;
    if let Some(i) = items.windows(2).position(|w| w[0].score < w[1].score) {
        return Err(Error::NotSorted { index: i + 1 });
    }

    let mut out = Selection::empty(quotas);
    let mut slack = k.saturating_sub(floor_sum(quotas));

    for it in items {
        if out.len() >= k {
            break;
        }
        out.examined += 1;
        // Every category is present: validate_items checked membership.
        let Some(quota) = quotas.get(&it.category) else {
            continue;
        };
        let taken = out.per_category.get(&it.category).copied().unwrap_or(0);
        if taken < quota.floor {
            out.push(it);
        } else if taken < quota.ceiling && slack > 0 {
            out.push(it);
            slack -= 1;
        }
    }

    debug!(
        k,
        chosen = out.len(),
        examined = out.examined,
        total_score = out.total_score,
        "offline selection done"
    );
    Ok(out)
}
