//! Per-period income/expense statistics with grand totals.

use super::{AnalyzerService, require_user_id};
use crate::core::error::{AnalyzerError, Result};
use crate::core::models::{PeriodStats, StatisticsReport};
use crate::core::period::TimePeriod;
use crate::core::storage::StatisticsRequest;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

impl AnalyzerService {
    /// Returns the periods in `[start_date, end_date]` grouped by `group_by`
    /// (month when unset) together with total income and expense.
    #[instrument(skip(self))]
    pub async fn get_statistics(
        &self,
        user_id: &str,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
        group_by: Option<TimePeriod>,
    ) -> Result<StatisticsReport> {
        require_user_id(user_id)?;
        let (start_date, end_date) = validate_range(start_date, end_date)?;
        let group_by = group_by.unwrap_or_default();

        let req = StatisticsRequest {
            user_id: user_id.to_string(),
            start_date,
            end_date,
            group_by,
        };

        let periods = self.storage.get_statistics(&req).await.map_err(|e| {
            error!(error = %e, user_id, "failed to get statistics");
            AnalyzerError::upstream("get statistics", user_id, e)
        })?;

        let report = summarize(periods).map_err(|e| {
            error!(error = %e, user_id, "failed to total statistics");
            AnalyzerError::upstream("total statistics", user_id, e)
        })?;

        info!(
            user_id,
            periods = report.periods.len(),
            total_income = report.total_income,
            total_expense = report.total_expense,
            "statistics calculated"
        );

        Ok(report)
    }
}

/// Checks that both bounds are present and ordered.
pub fn validate_range(
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (Some(start_date), Some(end_date)) = (start_date, end_date) else {
        return Err(AnalyzerError::invalid_argument(
            "start_date and end_date are required",
        ));
    };
    if start_date > end_date {
        return Err(AnalyzerError::invalid_argument(
            "start_date must be before end_date",
        ));
    }
    Ok((start_date, end_date))
}

/// Sums income and expense across `periods`, keeping them in order.
/// Fails when either total does not fit in `i64`.
pub fn summarize(periods: Vec<PeriodStats>) -> anyhow::Result<StatisticsReport> {
    let mut total_income: i64 = 0;
    let mut total_expense: i64 = 0;
    for p in &periods {
        total_income = total_income
            .checked_add(p.income)
            .ok_or_else(|| anyhow!("total income overflows at period {}", p.period_start))?;
        total_expense = total_expense
            .checked_add(p.expense)
            .ok_or_else(|| anyhow!("total expense overflows at period {}", p.period_start))?;
    }
    Ok(StatisticsReport {
        periods,
        total_income,
        total_expense,
    })
}
