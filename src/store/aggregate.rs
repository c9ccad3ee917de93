//! Aggregations from raw ledger transactions into the shapes the analytics
//! components consume.
//!
//! Every function receives the transactions of a single user. Periods are
//! computed in UTC.

use crate::core::config::RecurringConfig;
use crate::core::models::{
    CategoryPeriodStats, CategoryStats, PeriodStats, RecurringPattern, Transaction,
    TransactionType,
};
use crate::core::period::{self, TimePeriod};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Months, Utc};
use std::collections::{BTreeMap, HashMap};

/// Rows returned per requested period by [`category_period_stats`].
pub const CATEGORY_ROWS_PER_PERIOD: usize = 50;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Default)]
struct PeriodTotals {
    income: i64,
    expense: i64,
    categories: HashMap<String, i64>,
}

impl PeriodTotals {
    fn add(&mut self, tx: &Transaction, with_categories: bool) -> Result<()> {
        match tx.kind {
            TransactionType::Income => add_amount(&mut self.income, tx)?,
            TransactionType::Expense => {
                add_amount(&mut self.expense, tx)?;
                if with_categories {
                    add_amount(self.categories.entry(tx.category_id()).or_default(), tx)?;
                }
            }
            TransactionType::Transfer => {}
        }
        Ok(())
    }

    fn into_stats(self, start: DateTime<Utc>, group_by: TimePeriod) -> PeriodStats {
        let mut categories: Vec<CategoryStats> = self
            .categories
            .into_iter()
            .filter(|(_, total)| *total > 0)
            .map(|(category_id, total_amount)| CategoryStats {
                category_id,
                total_amount,
            })
            .collect();
        categories.sort_by(|a, b| {
            b.total_amount
                .cmp(&a.total_amount)
                .then_with(|| a.category_id.cmp(&b.category_id))
        });

        PeriodStats::new(
            start,
            period::period_end(&start, group_by),
            self.income,
            self.expense,
            categories,
        )
    }
}

/// Adds `tx.amount` to `total`, failing instead of wrapping past `i64::MAX`.
fn add_amount(total: &mut i64, tx: &Transaction) -> Result<()> {
    *total = total.checked_add(tx.amount).ok_or_else(|| {
        anyhow!(
            "amount overflow while adding transaction {} ({})",
            tx.id,
            tx.amount
        )
    })?;
    Ok(())
}

fn totals_by_period<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
    group_by: TimePeriod,
    with_categories: bool,
) -> Result<BTreeMap<DateTime<Utc>, PeriodTotals>> {
    let mut periods: BTreeMap<DateTime<Utc>, PeriodTotals> = BTreeMap::new();
    for tx in transactions.filter(|tx| tx.kind != TransactionType::Transfer) {
        periods
            .entry(period::truncate_to_period_start(&tx.created_at, group_by))
            .or_default()
            .add(tx, with_categories)?;
    }
    Ok(periods)
}

/// Income, expense and positive per-category expense for every period with
/// a transaction in `[start_date, end_date]`, oldest period first.
/// Categories are ordered by amount, largest first. Fails when a period
/// total does not fit in `i64`.
pub fn period_statistics(
    transactions: &[Transaction],
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    group_by: TimePeriod,
) -> Result<Vec<PeriodStats>> {
    let in_range = transactions
        .iter()
        .filter(|tx| tx.created_at >= start_date && tx.created_at <= end_date);

    Ok(totals_by_period(in_range, group_by, true)?
        .into_iter()
        .map(|(start, totals)| totals.into_stats(start, group_by))
        .collect())
}

/// Income and expense per period since `start_date`, most recent first,
/// limited to `period_count` periods.
pub fn forecast_periods(
    transactions: &[Transaction],
    start_date: DateTime<Utc>,
    period_count: usize,
    group_by: TimePeriod,
) -> Result<Vec<PeriodStats>> {
    let since = transactions.iter().filter(|tx| tx.created_at >= start_date);

    Ok(totals_by_period(since, group_by, false)?
        .into_iter()
        .rev()
        .take(period_count)
        .map(|(start, totals)| totals.into_stats(start, group_by))
        .collect())
}

/// Expense per `(period, category)` since `start_date`, most recent period
/// first. At most `period_count * CATEGORY_ROWS_PER_PERIOD` rows are kept.
pub fn category_period_stats(
    transactions: &[Transaction],
    start_date: DateTime<Utc>,
    period_count: usize,
    group_by: TimePeriod,
) -> Result<Vec<CategoryPeriodStats>> {
    let mut amounts: BTreeMap<(DateTime<Utc>, String), i64> = BTreeMap::new();
    for tx in transactions
        .iter()
        .filter(|tx| tx.kind == TransactionType::Expense && tx.created_at >= start_date)
    {
        let period_start = period::truncate_to_period_start(&tx.created_at, group_by);
        add_amount(amounts.entry((period_start, tx.category_id())).or_default(), tx)?;
    }

    let mut rows: Vec<CategoryPeriodStats> = amounts
        .into_iter()
        .map(|((period_start, category_id), amount)| CategoryPeriodStats {
            period_start,
            category_id,
            amount,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.period_start
            .cmp(&a.period_start)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    rows.truncate(period_count.saturating_mul(CATEGORY_ROWS_PER_PERIOD));
    Ok(rows)
}

/// Detects charges that repeat at a steady interval within the same merchant
/// category, most recently seen first.
///
/// Only expenses with an MCC from the last `lookback_months` up to `now`
/// count; charges dated after `now` are ignored. A category qualifies when
/// it has at least `min_occurrences` intervals, their mean lies in
/// `[interval_min_days, interval_max_days]` and no interval is further than
/// `date_deviation_days` from that mean. The amount is the median of the
/// charges that close an interval.
pub fn recurring_patterns(
    transactions: &[Transaction],
    now: DateTime<Utc>,
    config: &RecurringConfig,
) -> Vec<RecurringPattern> {
    let since = now
        .checked_sub_months(Months::new(config.lookback_months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut by_mcc: BTreeMap<i32, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| {
        tx.kind == TransactionType::Expense && tx.created_at >= since && tx.created_at <= now
    }) {
        if let Some(mcc) = tx.mcc {
            by_mcc.entry(mcc).or_default().push(tx);
        }
    }

    let mut patterns: Vec<RecurringPattern> = by_mcc
        .into_iter()
        .filter_map(|(mcc, mut charges)| {
            charges.sort_by_key(|tx| tx.created_at);
            detect_pattern(mcc, &charges, config)
        })
        .collect();

    patterns.sort_by(|a, b| {
        b.last_occurrence
            .cmp(&a.last_occurrence)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });
    patterns
}

fn detect_pattern(
    mcc: i32,
    charges: &[&Transaction],
    config: &RecurringConfig,
) -> Option<RecurringPattern> {
    let intervals: Vec<f64> = charges
        .windows(2)
        .map(|pair| {
            (pair[1].created_at - pair[0].created_at).num_milliseconds() as f64 / MILLIS_PER_DAY
        })
        .collect();
    if intervals.is_empty() || intervals.len() < config.min_occurrences {
        return None;
    }

    let avg_interval_days = intervals.iter().sum::<f64>() / intervals.len() as f64;
    if avg_interval_days < f64::from(config.interval_min_days)
        || avg_interval_days > f64::from(config.interval_max_days)
    {
        return None;
    }
    let max_deviation = f64::from(config.date_deviation_days);
    if intervals
        .iter()
        .any(|interval| (interval - avg_interval_days).abs() > max_deviation)
    {
        return None;
    }

    let amounts: Vec<i64> = charges[1..].iter().map(|tx| tx.amount).collect();
    let last_occurrence = charges.last()?.created_at;

    Some(RecurringPattern {
        category_id: mcc.to_string(),
        median_amount: median(amounts),
        avg_interval_days,
        last_occurrence,
    })
}

/// Interpolated median rounded to the nearest integer. `0` for no values.
pub fn median(mut values: Vec<i64>) -> i64 {
    if values.is_empty() {
        return 0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        values[mid]
    } else {
        ((values[mid - 1] as f64 + values[mid] as f64) / 2.0).round() as i64
    }
}
