//! Quota assignment: turn `(K, population counts)` into per-category `(floor, ceiling)`.
//!
//! Five policies are provided.  When `K >= d` (`d` = number of categories):
//!
//! | policy | floor | ceiling |
//! |---|---|---|
//! | `Minimum` | 1 | 1, plus all `K − d` leftover slots on one random category |
//! | `Average` | `min(⌊K/d⌋, n_c)` | `min(⌈K/d⌉, n_c)`, plus `K − Σceiling` leftover on one random category |
//! | `Proportional` | `⌊K·n_c/N⌋` | `⌈K·n_c/N⌉` |
//! | `RelaxedAverage { t }` | average floor `− t` (≥ 0) | average ceiling (before leftover) `+ t` (≤ `n_c`) |
//! | `RelaxedProportional { t }` | proportional floor `− t` (≥ 0) | proportional ceiling `+ t` (≤ `n_c`) |
//!
//! When `K < d` every policy picks `K` categories uniformly at random and gives them `(1, 1)`;
//! the rest get `(0, 0)`.
//!
//! A leftover host must have population `>= ceiling + leftover`.  If no category qualifies the
//! assignment fails with [`Error::NoEligibleCategory`] rather than guessing.

use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::seq::{index, IndexedRandom};
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::label;
use crate::{Error, Population, Quota, Quotas, Result};

/// Which quota rule to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuotaPolicy {
    /// At least one item per category.
    Minimum,
    /// Equal share per category.
    #[default]
    Average,
    /// Share proportional to category population.
    Proportional,
    /// Equal share, widened by `tightness` on both sides.
    RelaxedAverage { tightness: usize },
    /// Proportional share, widened by `tightness` on both sides.
    RelaxedProportional { tightness: usize },
}

impl QuotaPolicy {
    /// Relaxation amount (`0` for the strict policies).
    pub fn tightness(&self) -> usize {
        match *self {
            QuotaPolicy::RelaxedAverage { tightness }
            | QuotaPolicy::RelaxedProportional { tightness } => tightness,
            _ => 0,
        }
    }
}

/// Assign quotas for `k` selections over `population` using `rng` for every random choice.
///
/// Returned quotas always satisfy `floor <= ceiling <= population(c)`.
pub fn assign_quotas<C, R>(
    policy: QuotaPolicy,
    k: usize,
    population: &Population<C>,
    rng: &mut R,
) -> Result<Quotas<C>>
where
    C: Ord + Clone + Debug,
    R: Rng + ?Sized,
{
    let d = population.len();
    if d == 0 {
        if k == 0 {
            return Ok(Quotas::new());
        }
        return Err(Error::NoCategories { k });
    }

    let quotas = if k < d {
        sample_categories(k, population, rng)?
    } else {
        match policy {
            QuotaPolicy::Minimum => minimum(k, population, rng)?,
            QuotaPolicy::Average => average(k, population, rng)?,
            QuotaPolicy::Proportional => proportional(k, population),
            QuotaPolicy::RelaxedAverage { tightness } => {
                relax(average_bounds(k, population), population, tightness)
            }
            QuotaPolicy::RelaxedProportional { tightness } => {
                relax(proportional(k, population), population, tightness)
            }
        }
    };

    debug!(
        ?policy,
        k,
        categories = d,
        floor_sum = crate::floor_sum(&quotas),
        ceiling_sum = crate::ceiling_sum(&quotas),
        "assigned quotas"
    );
    Ok(quotas)
}

/// Seedable quota assigner.
///
/// Owns its RNG so repeated assignments from one seed form a reproducible sequence.
#[derive(Debug, Clone)]
pub struct QuotaAssigner {
    policy: QuotaPolicy,
    rng: StdRng,
}

impl QuotaAssigner {
    /// Create an assigner with a deterministic fixed seed (0).
    pub fn new(policy: QuotaPolicy) -> Self {
        Self::with_seed(policy, 0)
    }

    pub fn with_seed(policy: QuotaPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn policy(&self) -> QuotaPolicy {
        self.policy
    }

    pub fn assign<C>(&mut self, k: usize, population: &Population<C>) -> Result<Quotas<C>>
    where
        C: Ord + Clone + Debug,
    {
        assign_quotas(self.policy, k, population, &mut self.rng)
    }
}

fn require_nonempty<C: Ord + Clone + Debug>(population: &Population<C>) -> Result<()> {
    match population.counts().iter().find(|(_, &n)| n == 0) {
        Some((c, _)) => Err(Error::EmptyCategory { category: label(c) }),
        None => Ok(()),
    }
}

// K < d: K distinct categories get (1, 1), everyone else (0, 0).
fn sample_categories<C, R>(k: usize, population: &Population<C>, rng: &mut R) -> Result<Quotas<C>>
where
    C: Ord + Clone + Debug,
    R: Rng + ?Sized,
{
    require_nonempty(population)?;
    let mut quotas: Quotas<C> = population
        .counts()
        .keys()
        .map(|c| (c.clone(), Quota::fixed(0)))
        .collect();
    let labels: Vec<&C> = population.counts().keys().collect();
    for i in index::sample(rng, labels.len(), k) {
        quotas.insert(labels[i].clone(), Quota::fixed(1));
    }
    Ok(quotas)
}

fn minimum<C, R>(k: usize, population: &Population<C>, rng: &mut R) -> Result<Quotas<C>>
where
    C: Ord + Clone + Debug,
    R: Rng + ?Sized,
{
    require_nonempty(population)?;
    let mut quotas: Quotas<C> = population
        .counts()
        .keys()
        .map(|c| (c.clone(), Quota::fixed(1)))
        .collect();
    let leftover = k - population.len();
    place_leftover(&mut quotas, population, leftover, rng)?;
    Ok(quotas)
}

// `(min(⌊K/d⌋, n_c), min(⌈K/d⌉, n_c))`, no leftover placement.
fn average_bounds<C: Ord + Clone>(k: usize, population: &Population<C>) -> Quotas<C> {
    let d = population.len();
    let lo = k / d;
    let hi = k.div_ceil(d);
    population
        .counts()
        .iter()
        .map(|(c, &n)| (c.clone(), Quota::new(lo.min(n), hi.min(n))))
        .collect()
}

fn average<C, R>(k: usize, population: &Population<C>, rng: &mut R) -> Result<Quotas<C>>
where
    C: Ord + Clone + Debug,
    R: Rng + ?Sized,
{
    let mut quotas = average_bounds(k, population);
    let leftover = k.saturating_sub(crate::ceiling_sum(&quotas));
    place_leftover(&mut quotas, population, leftover, rng)?;
    Ok(quotas)
}

fn proportional<C: Ord + Clone>(k: usize, population: &Population<C>) -> Quotas<C> {
    let total = population.total();
    population
        .counts()
        .iter()
        .map(|(c, &n)| {
            let q = if total == 0 {
                Quota::fixed(0)
            } else {
                // Exact integer form of floor/ceil(K * n / N); the product is widened so it
                // cannot overflow, and both bounds are clamped to n before narrowing.
                let scaled = k as u128 * n as u128;
                let total = total as u128;
                let cap = n as u128;
                Quota::new(
                    (scaled / total).min(cap) as usize,
                    scaled.div_ceil(total).min(cap) as usize,
                )
            };
            (c.clone(), q)
        })
        .collect()
}

fn relax<C: Ord + Clone>(mut quotas: Quotas<C>, population: &Population<C>, t: usize) -> Quotas<C> {
    for (c, q) in quotas.iter_mut() {
        q.floor = q.floor.saturating_sub(t);
        q.ceiling = q.ceiling.saturating_add(t).min(population.count(c));
    }
    quotas
}

// All `leftover` slots go to one category that can absorb them.
fn place_leftover<C, R>(
    quotas: &mut Quotas<C>,
    population: &Population<C>,
    leftover: usize,
    rng: &mut R,
) -> Result<()>
where
    C: Ord + Clone + Debug,
    R: Rng + ?Sized,
{
    if leftover == 0 {
        return Ok(());
    }
    let eligible: Vec<&C> = quotas
        .iter()
        .filter(|(c, q)| population.count(c) >= q.ceiling + leftover)
        .map(|(c, _)| c)
        .collect();
    let chosen = eligible
        .choose(rng)
        .map(|c| (*c).clone())
        .ok_or(Error::NoEligibleCategory { leftover })?;
    if let Some(q) = quotas.get_mut(&chosen) {
        q.ceiling += leftover;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn pop(pairs: &[(&'static str, usize)]) -> Population<&'static str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn minimum_puts_every_leftover_on_one_category() {
        let p = pop(&[("a", 6), ("b", 4)]);
        for seed in 0..20 {
            let q = QuotaAssigner::with_seed(QuotaPolicy::Minimum, seed)
                .assign(5, &p)
                .unwrap();
            assert_eq!(crate::floor_sum(&q), 2);
            assert_eq!(crate::ceiling_sum(&q), 5);
            let widened: Vec<_> = q.values().filter(|q| q.ceiling > 1).collect();
            assert_eq!(widened.len(), 1);
            assert_eq!(widened[0].ceiling, 4);
        }
    }

    #[test]
    fn minimum_rejects_empty_category() {
        let p = pop(&[("a", 6), ("b", 0)]);
        let err = QuotaAssigner::new(QuotaPolicy::Minimum).assign(3, &p).unwrap_err();
        assert_eq!(
            err,
            Error::EmptyCategory {
                category: "\"b\"".to_string()
            }
        );
    }

    #[test]
    fn leftover_without_host_is_an_error() {
        // Leftover 5 needs a category with >= 6 items.
        let p = pop(&[("a", 3), ("b", 3)]);
        let err = QuotaAssigner::new(QuotaPolicy::Minimum).assign(7, &p).unwrap_err();
        assert_eq!(err, Error::NoEligibleCategory { leftover: 5 });
    }

    #[test]
    fn average_splits_evenly() {
        let p = pop(&[("a", 10), ("b", 10), ("c", 10)]);
        let q = QuotaAssigner::new(QuotaPolicy::Average).assign(7, &p).unwrap();
        for quota in q.values() {
            assert_eq!(*quota, Quota::new(2, 3));
        }
    }

    #[test]
    fn average_moves_shortfall_to_a_large_category() {
        // ceilings: a=1 (capped), b=3 -> sum 4, leftover 2 must land on b (needs >= 5).
        let p = pop(&[("a", 1), ("b", 8)]);
        let q = QuotaAssigner::new(QuotaPolicy::Average).assign(6, &p).unwrap();
        assert_eq!(q["a"], Quota::new(1, 1));
        assert_eq!(q["b"], Quota::new(3, 5));
    }

    #[test]
    fn relaxed_average_does_not_place_leftover() {
        // Capped ceilings sum to 4 < 6; relaxation widens b but nothing else is added.
        let p = pop(&[("a", 1), ("b", 8)]);
        let q = QuotaAssigner::new(QuotaPolicy::RelaxedAverage { tightness: 1 })
            .assign(6, &p)
            .unwrap();
        assert_eq!(q["a"], Quota::new(0, 1));
        assert_eq!(q["b"], Quota::new(2, 4));
    }

    #[test]
    fn proportional_uses_population_share() {
        let p = pop(&[("a", 60), ("b", 30), ("c", 10)]);
        let q = QuotaAssigner::new(QuotaPolicy::Proportional).assign(10, &p).unwrap();
        assert_eq!(q["a"], Quota::fixed(6));
        assert_eq!(q["b"], Quota::fixed(3));
        assert_eq!(q["c"], Quota::fixed(1));

        let q = QuotaAssigner::new(QuotaPolicy::Proportional).assign(4, &p).unwrap();
        assert_eq!(q["a"], Quota::new(2, 3));
        assert_eq!(q["b"], Quota::new(1, 2));
        assert_eq!(q["c"], Quota::new(0, 1));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn proportional_handles_products_beyond_usize() {
        // K * n = 2^65 does not fit in usize; the share itself is only 2^31.
        let p = pop(&[("a", 1 << 33), ("b", 1 << 33)]);
        let q = QuotaAssigner::new(QuotaPolicy::Proportional)
            .assign(1 << 32, &p)
            .unwrap();
        assert_eq!(q["a"], Quota::fixed(1 << 31));
        assert_eq!(q["b"], Quota::fixed(1 << 31));
    }

    #[test]
    fn proportional_is_capped_by_population_when_k_exceeds_n() {
        let p = pop(&[("a", 2), ("b", 1)]);
        let q = QuotaAssigner::new(QuotaPolicy::Proportional).assign(5, &p).unwrap();
        assert_eq!(q["a"], Quota::fixed(2));
        assert_eq!(q["b"], Quota::fixed(1));
    }

    #[test]
    fn relaxation_widens_within_population() {
        let p = pop(&[("a", 4), ("b", 20)]);
        let q = QuotaAssigner::new(QuotaPolicy::RelaxedAverage { tightness: 3 })
            .assign(8, &p)
            .unwrap();
        assert_eq!(q["a"], Quota::new(1, 4));
        assert_eq!(q["b"], Quota::new(1, 7));

        let q = QuotaAssigner::new(QuotaPolicy::RelaxedProportional { tightness: 1 })
            .assign(6, &p)
            .unwrap();
        // a: 6*4/24 = 1, b: 6*20/24 = 5.
        assert_eq!(q["a"], Quota::new(0, 2));
        assert_eq!(q["b"], Quota::new(4, 6));
    }

    #[test]
    fn small_k_picks_k_categories() {
        let p = pop(&[("a", 3), ("b", 3), ("c", 3), ("d", 3)]);
        for policy in [
            QuotaPolicy::Minimum,
            QuotaPolicy::Average,
            QuotaPolicy::Proportional,
            QuotaPolicy::RelaxedAverage { tightness: 2 },
            QuotaPolicy::RelaxedProportional { tightness: 2 },
        ] {
            let q = QuotaAssigner::with_seed(policy, 7).assign(2, &p).unwrap();
            assert_eq!(q.len(), 4);
            assert_eq!(q.values().filter(|q| **q == Quota::fixed(1)).count(), 2);
            assert_eq!(q.values().filter(|q| **q == Quota::fixed(0)).count(), 2);
        }
    }

    #[test]
    fn small_k_rejects_empty_category() {
        let p = pop(&[("a", 3), ("b", 0), ("c", 3)]);
        let err = QuotaAssigner::new(QuotaPolicy::Proportional).assign(1, &p).unwrap_err();
        assert!(matches!(err, Error::EmptyCategory { .. }));
    }

    #[test]
    fn no_categories() {
        let p = pop(&[]);
        assert_eq!(
            QuotaAssigner::new(QuotaPolicy::Average).assign(3, &p),
            Err(Error::NoCategories { k: 3 })
        );
        assert_eq!(QuotaAssigner::new(QuotaPolicy::Average).assign(0, &p), Ok(Quotas::new()));
    }

    #[test]
    fn same_seed_same_quotas() {
        let p = pop(&[("a", 9), ("b", 9), ("c", 9), ("d", 9), ("e", 9)]);
        let q1 = QuotaAssigner::with_seed(QuotaPolicy::Minimum, 42).assign(9, &p).unwrap();
        let q2 = QuotaAssigner::with_seed(QuotaPolicy::Minimum, 42).assign(9, &p).unwrap();
        assert_eq!(q1, q2);
    }

    #[test]
    fn tightness_accessor() {
        assert_eq!(QuotaPolicy::Average.tightness(), 0);
        assert_eq!(QuotaPolicy::RelaxedProportional { tightness: 4 }.tightness(), 4);
    }

    #[traced_test]
    #[test]
    fn logs_assignment_summary() {
        let p = pop(&[("a", 5), ("b", 5)]);
        QuotaAssigner::new(QuotaPolicy::Average).assign(4, &p).unwrap();
        assert!(logs_contain("assigned quotas"));
        assert!(logs_contain("floor_sum=4"));
    }
}
