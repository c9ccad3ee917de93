//! Category spending anomalies for the most recent period.
//!
//! The most recent period with data is compared against a weighted average
//! of the periods before it. Categories with no history are reported only
//! when their spend clears an absolute threshold.

use super::{AnalyzerService, require_user_id};
use crate::core::config::AnomalyConfig;
use crate::core::error::{AnalyzerError, Result};
use crate::core::models::{CategoryAnomaly, CategoryPeriodStats};
use crate::core::period::{self, TimePeriod};
use crate::core::wma;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, error, info, instrument};

const INSUFFICIENT_DATA: &str =
    "insufficient data for anomaly detection (need at least 2 periods)";

/// Spend per category, keyed by period start.
pub type PeriodCategoryAmounts = BTreeMap<DateTime<Utc>, BTreeMap<String, i64>>;

impl AnalyzerService {
    /// Lists categories whose spend in the latest period deviates upwards
    /// from their history, largest deviation first.
    #[instrument(skip(self))]
    pub async fn get_anomalies(
        &self,
        user_id: &str,
        period: Option<TimePeriod>,
    ) -> Result<Vec<CategoryAnomaly>> {
        require_user_id(user_id)?;
        let period = period.unwrap_or_default();

        let lookback = self.config.anomaly.lookback_periods;
        let start_date = period::add_periods(
            &self.clock.now(),
            period,
            -i32::try_from(lookback).unwrap_or(i32::MAX),
        );
        debug!(%start_date, lookback, "anomaly lookback window");

        let stats = self
            .storage
            .get_category_stats_by_periods(user_id, start_date, lookback, period)
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "failed to get category stats");
                AnalyzerError::upstream("get category stats", user_id, e)
            })?;
        debug!(stats_count = stats.len(), "category stats retrieved");

        let period_data = group_by_period(&stats).map_err(|e| {
            error!(error = %e, user_id, "failed to group category stats");
            AnalyzerError::upstream("group category stats", user_id, e)
        })?;
        if period_data.len() < 2 {
            debug!(periods = period_data.len(), "not enough periods for anomaly detection");
            return Err(AnalyzerError::failed_precondition(INSUFFICIENT_DATA));
        }

        let anomalies = detect_anomalies(&period_data, &self.config.anomaly);

        info!(
            user_id,
            %period,
            periods = period_data.len(),
            anomalies = anomalies.len(),
            "anomalies detected"
        );

        Ok(anomalies)
    }
}

/// Groups storage rows by their exact period start. Repeated
/// `(period, category)` rows are added together; a sum past `i64` fails.
pub fn group_by_period(stats: &[CategoryPeriodStats]) -> anyhow::Result<PeriodCategoryAmounts> {
    let mut period_data = PeriodCategoryAmounts::new();
    for stat in stats {
        let total = period_data
            .entry(stat.period_start)
            .or_default()
            .entry(stat.category_id.clone())
            .or_default();
        *total = total.checked_add(stat.amount).ok_or_else(|| {
            anyhow!(
                "amount overflow in category {} at {}",
                stat.category_id,
                stat.period_start
            )
        })?;
    }
    Ok(period_data)
}

/// Compares the latest period in `period_data` with up to
/// `lookback_periods - 1` periods before it.
///
/// Returns nothing when `period_data` is empty. Results are sorted by
/// `deviation_amount`, largest first; ties keep category id order.
pub fn detect_anomalies(
    period_data: &PeriodCategoryAmounts,
    config: &AnomalyConfig,
) -> Vec<CategoryAnomaly> {
    let mut periods = period_data.iter().rev();
    let Some((analyzed_period, actual_by_category)) = periods.next() else {
        return Vec::new();
    };
    let history_len = config.lookback_periods.saturating_sub(1).max(1);
    let historical: Vec<&BTreeMap<String, i64>> =
        periods.take(history_len).map(|(_, amounts)| amounts).collect();
    debug!(
        %analyzed_period,
        categories = actual_by_category.len(),
        historical_periods = historical.len(),
        "analyzed period selected"
    );

    let expected_by_category = wma::weighted_average_by_key(&historical);

    let categories: BTreeSet<&String> = actual_by_category
        .keys()
        .chain(expected_by_category.keys())
        .collect();

    let mut anomalies: Vec<CategoryAnomaly> = categories
        .into_iter()
        .filter_map(|category_id| {
            let actual = actual_by_category.get(category_id).copied().unwrap_or(0);
            let expected = expected_by_category.get(category_id).copied().unwrap_or(0);
            classify(category_id, actual, expected, config)
        })
        .collect();

    anomalies.sort_by(|a, b| b.deviation_amount.cmp(&a.deviation_amount));
    anomalies
}

/// Decides whether one category's spend is anomalous.
///
/// Without history (`expected == 0`) only spend above
/// `new_category_threshold` counts; smaller amounts are dropped. Otherwise
/// the spend must exceed the expectation by more than
/// `deviation_threshold` percent. Spending less than expected never counts.
pub fn classify(
    category_id: &str,
    actual: i64,
    expected: i64,
    config: &AnomalyConfig,
) -> Option<CategoryAnomaly> {
    if expected == 0 {
        if actual > config.new_category_threshold {
            debug!(category_id, actual, "new category anomaly");
            return Some(CategoryAnomaly {
                category_id: category_id.to_string(),
                actual_amount: actual,
                expected_amount: 0,
                deviation_amount: actual,
            });
        }
        debug!(category_id, actual, "new category below threshold");
        return None;
    }

    let deviation = actual - expected;
    let deviation_percent = deviation as f64 / expected as f64 * 100.0;
    if deviation_percent > config.deviation_threshold {
        debug!(
            category_id,
            actual, expected, deviation, deviation_percent, "spending anomaly"
        );
        return Some(CategoryAnomaly {
            category_id: category_id.to_string(),
            actual_amount: actual,
            expected_amount: expected,
            deviation_amount: deviation,
        });
    }

    None
}
