//! Upcoming recurring payments predicted from storage-detected patterns.

use super::{AnalyzerService, require_user_id};
use crate::core::error::{AnalyzerError, Result};
use crate::core::models::{RecurringPattern, RecurringPayment};
use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, error, info, instrument};

impl AnalyzerService {
    /// Payments expected within the configured prediction window, soonest
    /// first.
    #[instrument(skip(self))]
    pub async fn get_upcoming_recurring(&self, user_id: &str) -> Result<Vec<RecurringPayment>> {
        require_user_id(user_id)?;

        let patterns = self
            .storage
            .get_recurring_patterns(user_id)
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "failed to get recurring patterns");
                AnalyzerError::upstream("get recurring patterns", user_id, e)
            })?;

        let window_days = self.config.recurring.prediction_days;
        let payments = upcoming_payments(&patterns, self.clock.now(), window_days);

        info!(
            user_id,
            patterns = patterns.len(),
            upcoming = payments.len(),
            window_days,
            "recurring payments predicted"
        );

        Ok(payments)
    }
}

/// Next expected date of `pattern`: last occurrence plus the average
/// interval rounded to whole days. `None` when the interval is not a usable
/// number or the date overflows.
pub fn expected_date(pattern: &RecurringPattern) -> Option<DateTime<Utc>> {
    if !pattern.avg_interval_days.is_finite() {
        return None;
    }
    let days = pattern.avg_interval_days.round();
    if days.abs() > i64::MAX as f64 {
        return None;
    }
    let interval = TimeDelta::try_days(days as i64)?;
    pattern.last_occurrence.checked_add_signed(interval)
}

/// Keeps patterns whose next date falls in `(now, now + window_days]` and
/// sorts them by that date.
pub fn upcoming_payments(
    patterns: &[RecurringPattern],
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<RecurringPayment> {
    let Some(horizon) = TimeDelta::try_days(window_days).and_then(|d| now.checked_add_signed(d))
    else {
        return Vec::new();
    };

    let mut payments: Vec<RecurringPayment> = patterns
        .iter()
        .filter_map(|pattern| {
            let Some(expected_date) = expected_date(pattern) else {
                debug!(category_id = %pattern.category_id, "unusable recurring interval");
                return None;
            };
            if expected_date <= now || expected_date > horizon {
                debug!(
                    category_id = %pattern.category_id,
                    %expected_date,
                    "recurring payment outside window"
                );
                return None;
            }
            Some(RecurringPayment {
                category_id: pattern.category_id.clone(),
                typical_amount: pattern.median_amount,
                expected_date,
            })
        })
        .collect();

    payments.sort_by(|a, b| a.expected_date.cmp(&b.expected_date));
    payments
}
