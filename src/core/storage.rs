//! Storage provider abstraction consumed by the analytics components.

use crate::core::models::{CategoryPeriodStats, PeriodStats, RecurringPattern};
use crate::core::period::TimePeriod;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsRequest {
    pub user_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub group_by: TimePeriod,
}

/// Read-only access to a user's pre-aggregated ledger data.
///
/// Dropping a returned future cancels the call; implementations must not
/// leave partial state behind when that happens.
#[async_trait]
pub trait TransactionStorage: Send + Sync {
    /// Periods within `[start_date, end_date]`, oldest first.
    async fn get_statistics(&self, req: &StatisticsRequest) -> Result<Vec<PeriodStats>>;

    /// Periods starting at or after `start_date`, most recent first, at most
    /// `period_count` entries.
    async fn get_transactions_for_forecast(
        &self,
        user_id: &str,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    ) -> Result<Vec<PeriodStats>>;

    /// Per-category spend for each period starting at or after `start_date`.
    async fn get_category_stats_by_periods(
        &self,
        user_id: &str,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    ) -> Result<Vec<CategoryPeriodStats>>;

    /// Recurring charge candidates that already passed the provider's
    /// occurrence and interval filters.
    async fn get_recurring_patterns(&self, user_id: &str) -> Result<Vec<RecurringPattern>>;
}
