//! Transaction ledgers and the storage provider built on top of them.

pub mod aggregate;
pub mod disk;
pub mod memory;
pub mod mock;

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::RecurringConfig;
use crate::core::models::{CategoryPeriodStats, PeriodStats, RecurringPattern, Transaction};
use crate::core::period::TimePeriod;
use crate::core::storage::{StatisticsRequest, TransactionStorage};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

pub use disk::DiskLedger;
pub use memory::MemoryLedger;

/// Raw transaction persistence.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Stores `transactions`, replacing any with the same `(user_id, id)`.
    /// Returns how many were not stored before.
    async fn append(&self, transactions: &[Transaction]) -> Result<usize>;

    /// All transactions of `user_id`, oldest first.
    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>>;
}

/// [`TransactionStorage`] that aggregates a [`LedgerSource`] on every call.
pub struct LedgerStorage<S: LedgerSource> {
    source: Arc<S>,
    recurring: RecurringConfig,
    clock: Arc<dyn Clock>,
}

impl<S: LedgerSource> LedgerStorage<S> {
    pub fn new(source: Arc<S>, recurring: RecurringConfig) -> Self {
        Self {
            source,
            recurring,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }
}

#[async_trait]
impl<S: LedgerSource> TransactionStorage for LedgerStorage<S> {
    async fn get_statistics(&self, req: &StatisticsRequest) -> Result<Vec<PeriodStats>> {
        let transactions = self.source.transactions_for_user(&req.user_id).await?;
        let periods = aggregate::period_statistics(
            &transactions,
            req.start_date,
            req.end_date,
            req.group_by,
        )?;
        debug!(user_id = %req.user_id, periods = periods.len(), "statistics aggregated");
        Ok(periods)
    }

    async fn get_transactions_for_forecast(
        &self,
        user_id: &str,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    ) -> Result<Vec<PeriodStats>> {
        let transactions = self.source.transactions_for_user(user_id).await?;
        let periods =
            aggregate::forecast_periods(&transactions, start_date, period_count, group_by)?;
        debug!(user_id, periods = periods.len(), "forecast history aggregated");
        Ok(periods)
    }

    async fn get_category_stats_by_periods(
        &self,
        user_id: &str,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    ) -> Result<Vec<CategoryPeriodStats>> {
        let transactions = self.source.transactions_for_user(user_id).await?;
        let rows =
            aggregate::category_period_stats(&transactions, start_date, period_count, group_by)?;
        debug!(user_id, rows = rows.len(), "category stats aggregated");
        Ok(rows)
    }

    async fn get_recurring_patterns(&self, user_id: &str) -> Result<Vec<RecurringPattern>> {
        let transactions = self.source.transactions_for_user(user_id).await?;
        let patterns =
            aggregate::recurring_patterns(&transactions, self.clock.now(), &self.recurring);
        debug!(user_id, patterns = patterns.len(), "recurring patterns detected");
        Ok(patterns)
    }
}
