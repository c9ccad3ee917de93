//! Linearly weighted moving average over most-recent-first series.
//!
//! The most recent value gets weight `n`, the oldest one used gets weight
//! `1`. Sums are accumulated in `i128` and the final division truncates
//! toward zero, so integer inputs produce the same result on every run.

use std::collections::{BTreeMap, BTreeSet};

/// Maximum number of historical values that contribute to an average.
pub const WMA_WINDOW: usize = 6;

/// Weights `[n, n-1, ..., 1]` for a window of `n` values.
pub fn weights(n: usize) -> Vec<i64> {
    (1..=n as i64).rev().collect()
}

/// Weighted average of `values`, ordered most-recent-first.
///
/// Only the first [`WMA_WINDOW`] values are used. An empty series yields `0`.
pub fn weighted_average(values: &[i64]) -> i64 {
    let window = &values[..values.len().min(WMA_WINDOW)];
    if window.is_empty() {
        return 0;
    }

    let (weighted_sum, total_weight) = window
        .iter()
        .zip(weights(window.len()))
        .fold((0i128, 0i128), |(sum, total), (&value, weight)| {
            (
                sum + i128::from(value) * i128::from(weight),
                total + i128::from(weight),
            )
        });

    (weighted_sum / total_weight) as i64
}

/// Applies [`weighted_average`] per key across a most-recent-first list of
/// periods.
///
/// A key missing from a period contributes `0` for that period rather than
/// being skipped, so keys seen rarely get a proportionally lower average.
/// Every key present in any period appears in the result.
pub fn weighted_average_by_key<K>(periods: &[&BTreeMap<K, i64>]) -> BTreeMap<K, i64>
where
    K: Ord + Clone,
{
    let keys: BTreeSet<&K> = periods.iter().flat_map(|period| period.keys()).collect();

    keys.into_iter()
        .map(|key| {
            let series: Vec<i64> = periods
                .iter()
                .map(|period| period.get(key).copied().unwrap_or(0))
                .collect();
            (key.clone(), weighted_average(&series))
        })
        .collect()
}
