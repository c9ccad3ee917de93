//! Canned-response storage for exercising the analytics components.

use crate::core::models::{CategoryPeriodStats, PeriodStats, RecurringPattern};
use crate::core::period::TimePeriod;
use crate::core::storage::{StatisticsRequest, TransactionStorage};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageOperation {
    Statistics,
    Forecast,
    CategoryStats,
    RecurringPatterns,
}

/// One recorded call, with the arguments it was made with.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageCall {
    Statistics(StatisticsRequest),
    Forecast {
        user_id: String,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    },
    CategoryStats {
        user_id: String,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    },
    RecurringPatterns {
        user_id: String,
    },
}

/// Returns the same data for every user and records each call.
///
/// Unset responses default to empty lists. Operations registered with
/// [`MockStorage::failing`] return an error instead.
#[derive(Default)]
pub struct MockStorage {
    statistics: Vec<PeriodStats>,
    forecast_data: Vec<PeriodStats>,
    category_stats: Vec<CategoryPeriodStats>,
    recurring_patterns: Vec<RecurringPattern>,
    failures: HashMap<StorageOperation, String>,
    calls: Mutex<Vec<StorageCall>>,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statistics(mut self, periods: Vec<PeriodStats>) -> Self {
        self.statistics = periods;
        self
    }

    pub fn with_forecast_data(mut self, periods: Vec<PeriodStats>) -> Self {
        self.forecast_data = periods;
        self
    }

    pub fn with_category_stats(mut self, stats: Vec<CategoryPeriodStats>) -> Self {
        self.category_stats = stats;
        self
    }

    pub fn with_recurring_patterns(mut self, patterns: Vec<RecurringPattern>) -> Self {
        self.recurring_patterns = patterns;
        self
    }

    pub fn failing(mut self, operation: StorageOperation, message: &str) -> Self {
        self.failures.insert(operation, message.to_string());
        self
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, operation: StorageOperation, call: StorageCall) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        match self.failures.get(&operation) {
            Some(message) => Err(anyhow!("{message}")),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TransactionStorage for MockStorage {
    async fn get_statistics(&self, req: &StatisticsRequest) -> Result<Vec<PeriodStats>> {
        self.record(
            StorageOperation::Statistics,
            StorageCall::Statistics(req.clone()),
        )?;
        Ok(self.statistics.clone())
    }

    async fn get_transactions_for_forecast(
        &self,
        user_id: &str,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    ) -> Result<Vec<PeriodStats>> {
        self.record(
            StorageOperation::Forecast,
            StorageCall::Forecast {
                user_id: user_id.to_string(),
                start_date,
                period_count,
                group_by,
            },
        )?;
        Ok(self.forecast_data.clone())
    }

    async fn get_category_stats_by_periods(
        &self,
        user_id: &str,
        start_date: DateTime<Utc>,
        period_count: usize,
        group_by: TimePeriod,
    ) -> Result<Vec<CategoryPeriodStats>> {
        self.record(
            StorageOperation::CategoryStats,
            StorageCall::CategoryStats {
                user_id: user_id.to_string(),
                start_date,
                period_count,
                group_by,
            },
        )?;
        Ok(self.category_stats.clone())
    }

    async fn get_recurring_patterns(&self, user_id: &str) -> Result<Vec<RecurringPattern>> {
        self.record(
            StorageOperation::RecurringPatterns,
            StorageCall::RecurringPatterns {
                user_id: user_id.to_string(),
            },
        )?;
        Ok(self.recurring_patterns.clone())
    }
}
