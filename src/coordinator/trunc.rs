//! Truncation-ranking selection policy.

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::snapshot::SlotSummary;

/// Index sets of the `cutoff` lowest- and highest-valued workers.
/// `cutoff = max(1, floor(trunc * n) + 1)`.
pub fn extremes(values: &[SlotSummary], trunc: f64) -> (Vec<usize>, Vec<usize>) {
    let n = values.len();
    let cutoff = ((trunc * n as f64).floor() as usize + 1).max(1);

    let mut by_value: Vec<usize> = (0..n).collect();
    by_value.sort_by_key(|&i| values[i].value);

    let low = by_value[..cutoff.min(n)].to_vec();
    let mut high = by_value[n.saturating_sub(cutoff)..].to_vec();
    high.reverse();
    (low, high)
}

/// Samples `a` uniformly among all workers; proceeds only if `a` falls in
/// the `low` set, then samples `b` uniformly from `high`. Returns
/// `Some((winner, loser))` = `Some((b, a))` when `b` has aged past
/// `n_protected` steps, `None` otherwise (no exploit this tick).
pub fn propose(
    values: &[SlotSummary],
    trunc: f64,
    n_protected: u64,
    rng: &mut impl Rng,
) -> Option<(usize, usize)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let (low, high) = extremes(values, trunc);

    let a = rng.random_range(0..n);
    if !low.contains(&a) {
        return None;
    }
    let b = *high.choose(rng)?;
    if values[b].steps >= n_protected {
        Some((b, a))
    } else {
        None
    }
}
