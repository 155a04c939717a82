//! Measuring the online selector against the offline optimum.
//!
//! The online selector's quality depends on arrival order, so it is judged over many seeded
//! shuffles of the same pool: accuracy relative to the offline optimum, and walking distance
//! (items examined before `k` acceptances).  Plotting is left to callers.

use std::collections::BTreeMap;
use std::fmt::Debug;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::{
    diverse_top_k, online_diverse_select, sort_by_score_desc, Item, OnlineConfig, Population,
    QuotaAssigner, QuotaPolicy, Quotas, Result,
};

/// Accuracy of `candidate` relative to `optimal`, measured above `baseline`.
///
/// `Σ(candidate − baseline) / Σ(optimal − baseline)`.  With `baseline` set to the pool's
/// minimum score, 1.0 means the candidate matched the optimum.
///
/// Returns `None` when the lengths differ or the optimum has no mass above `baseline`.
///
/// ```rust
/// use diverse_topk::relative_accuracy;
///
/// let acc = relative_accuracy(&[10.0, 8.0], &[9.0, 5.0], 0.0).unwrap();
/// assert!((acc - 14.0 / 18.0).abs() < 1e-12);
/// assert_eq!(relative_accuracy(&[1.0], &[1.0, 2.0], 0.0), None);
/// ```
pub fn relative_accuracy(optimal: &[f64], candidate: &[f64], baseline: f64) -> Option<f64> {
    if optimal.len() != candidate.len() {
        return None;
    }
    let denom: f64 = optimal.iter().map(|s| s - baseline).sum();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    let num: f64 = candidate.iter().map(|s| s - baseline).sum();
    Some(num / denom)
}

/// Evaluation settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalConfig {
    /// Shuffled trials per warm-up ratio.
    pub trials: usize,
    /// Seed for shuffles (and quota assignment in [`evaluate_policies`]).
    pub seed: u64,
    /// Warm-up ratios to sweep.  The first one is used by [`evaluate_policies`].
    pub warmup_ratios: Vec<f64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            trials: 100,
            seed: 0,
            // Full (N/e), N/4e, N/16e.
            warmup_ratios: vec![1.0, 0.25, 1.0 / 16.0],
        }
    }
}

/// Results for one warm-up ratio.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarmupReport {
    pub warmup_ratio: f64,
    /// One entry per trial that selected exactly `k` items.
    pub accuracies: Vec<f64>,
    /// Walking distance for the same trials as `accuracies`.
    pub walking_distances: Vec<usize>,
    /// Trials that ended with fewer than `k` items (excluded above).
    pub short_runs: usize,
}

impl WarmupReport {
    pub fn mean_accuracy(&self) -> Option<f64> {
        mean(self.accuracies.iter().copied())
    }

    pub fn mean_walking_distance(&self) -> Option<f64> {
        mean(self.walking_distances.iter().map(|&d| d as f64))
    }
}

/// Results for one quota policy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyReport {
    pub policy: QuotaPolicy,
    pub report: WarmupReport,
}

fn mean(xs: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = xs.fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Sweep `cfg.warmup_ratios`, running `cfg.trials` shuffled online selections for each.
///
/// The offline optimum is computed once on a sorted copy; the accuracy baseline is the
/// pool's minimum score.
pub fn evaluate_online<C, I>(
    items: &[Item<C, I>],
    k: usize,
    quotas: &Quotas<C>,
    cfg: &EvalConfig,
) -> Result<Vec<WarmupReport>>
where
    C: Ord + Clone + Debug,
    I: Ord + Clone + Debug,
{
    let mut sorted = items.to_vec();
    sort_by_score_desc(&mut sorted);
    let optimal = diverse_top_k(&sorted, k, quotas)?;
    // Ids are unique (validated above), so one map serves every trial.
    let score_by_id: BTreeMap<&I, f64> = items.iter().map(|it| (&it.id, it.score)).collect();
    let optimal_scores = scores_of(&score_by_id, &optimal.chosen);
    let baseline = items
        .iter()
        .map(|it| it.score)
        .min_by(f64::total_cmp)
        .unwrap_or(0.0);

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut stream = items.to_vec();
    let mut reports = Vec::with_capacity(cfg.warmup_ratios.len());
    for &ratio in &cfg.warmup_ratios {
        let online_cfg = OnlineConfig::with_warmup_ratio(ratio);
        let mut report = WarmupReport {
            warmup_ratio: ratio,
            accuracies: Vec::with_capacity(cfg.trials),
            walking_distances: Vec::with_capacity(cfg.trials),
            short_runs: 0,
        };
        for _ in 0..cfg.trials {
            stream.shuffle(&mut rng);
            let sel = online_diverse_select(&stream, k, quotas, online_cfg)?;
            if !sel.is_complete(k) {
                report.short_runs += 1;
                continue;
            }
            let got = scores_of(&score_by_id, &sel.chosen);
            if let Some(acc) = relative_accuracy(&optimal_scores, &got, baseline) {
                report.accuracies.push(acc);
                report.walking_distances.push(sel.examined);
            }
        }
        debug!(
            warmup_ratio = ratio,
            trials = cfg.trials,
            short_runs = report.short_runs,
            mean_accuracy = report.mean_accuracy(),
            mean_walking_distance = report.mean_walking_distance(),
            "warm-up sweep point"
        );
        reports.push(report);
    }
    Ok(reports)
}

/// Compare quota policies: assign quotas for each policy, then evaluate the online selector
/// at `cfg.warmup_ratios[0]` (1.0 if empty).
pub fn evaluate_policies<C, I>(
    items: &[Item<C, I>],
    k: usize,
    policies: &[QuotaPolicy],
    cfg: &EvalConfig,
) -> Result<Vec<PolicyReport>>
where
    C: Ord + Clone + Debug,
    I: Ord + Clone + Debug,
{
    let population = Population::from_items(items);
    let single = EvalConfig {
        warmup_ratios: vec![cfg.warmup_ratios.first().copied().unwrap_or(1.0)],
        ..cfg.clone()
    };
    let mut out = Vec::with_capacity(policies.len());
    for &policy in policies {
        let quotas = QuotaAssigner::with_seed(policy, cfg.seed).assign(k, &population)?;
        let mut reports = evaluate_online(items, k, &quotas, &single)?;
        if let Some(report) = reports.pop() {
            out.push(PolicyReport { policy, report });
        }
    }
    Ok(out)
}

fn scores_of<I: Ord>(score_by_id: &BTreeMap<&I, f64>, ids: &[I]) -> Vec<f64> {
    ids.iter()
        .filter_map(|id| score_by_id.get(id).copied())
        .collect()
}
