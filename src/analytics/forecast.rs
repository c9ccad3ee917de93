//! Income/expense projection for upcoming periods.
//!
//! The projection is a single weighted moving average repeated for every
//! future period; it does not extrapolate a trend.

use super::{AnalyzerService, require_user_id};
use crate::core::error::{AnalyzerError, Result};
use crate::core::models::PeriodStats;
use crate::core::period::{self, TimePeriod};
use crate::core::wma;
use tracing::{debug, error, info, instrument};

const INSUFFICIENT_HISTORY: &str =
    "insufficient historical data for forecast (need at least 2 periods)";

impl AnalyzerService {
    /// Projects income and expense for `periods_ahead` periods after the
    /// most recent one with history. Values `<= 0` are treated as `1`.
    #[instrument(skip(self))]
    pub async fn get_forecast(
        &self,
        user_id: &str,
        period: Option<TimePeriod>,
        periods_ahead: i32,
    ) -> Result<Vec<PeriodStats>> {
        require_user_id(user_id)?;

        let periods_ahead = if periods_ahead <= 0 {
            debug!(requested = periods_ahead, "periods_ahead coerced to 1");
            1
        } else {
            periods_ahead
        };
        let max_periods_ahead = self.config.forecast.max_periods_ahead;
        if periods_ahead > max_periods_ahead {
            return Err(AnalyzerError::invalid_argument(format!(
                "periods_ahead cannot exceed {max_periods_ahead}"
            )));
        }
        let period = period.unwrap_or_default();

        let lookback = self.config.forecast.lookback_periods;
        let current_period_start = period::truncate_to_period_start(&self.clock.now(), period);
        let start_date = period::add_periods(
            &current_period_start,
            period,
            -i32::try_from(lookback).unwrap_or(i32::MAX),
        );

        let mut historical = self
            .storage
            .get_transactions_for_forecast(user_id, start_date, lookback, period)
            .await
            .map_err(|e| {
                error!(error = %e, user_id, "failed to get historical data");
                AnalyzerError::upstream("get historical data", user_id, e)
            })?;

        historical.sort_by(|a, b| b.period_start.cmp(&a.period_start));
        historical.truncate(lookback);

        if historical.len() < 2 {
            debug!(historical_periods = historical.len(), "not enough history");
            return Err(AnalyzerError::failed_precondition(INSUFFICIENT_HISTORY));
        }

        let forecasts = project(&historical, period, periods_ahead as usize);

        info!(
            user_id,
            periods_ahead,
            historical_periods = historical.len(),
            "forecast calculated"
        );

        Ok(forecasts)
    }
}

/// Builds `periods_ahead` periods following `historical[0]`, each carrying
/// the weighted averages of the historical income and expense.
///
/// `historical` must be ordered most-recent-first; an empty slice yields no
/// periods.
pub fn project(
    historical: &[PeriodStats],
    period: TimePeriod,
    periods_ahead: usize,
) -> Vec<PeriodStats> {
    let Some(latest) = historical.first() else {
        return Vec::new();
    };

    let incomes: Vec<i64> = historical.iter().map(|p| p.income).collect();
    let expenses: Vec<i64> = historical.iter().map(|p| p.expense).collect();
    let income = wma::weighted_average(&incomes);
    let expense = wma::weighted_average(&expenses);

    (1..=periods_ahead)
        .map(|offset| {
            let start = period::add_periods(
                &latest.period_start,
                period,
                i32::try_from(offset).unwrap_or(i32::MAX),
            );
            let end = period::period_end(&start, period);
            PeriodStats::new(start, end, income, expense, Vec::new())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{service_at, utc};
    use crate::core::clock::FixedClock;
    use crate::core::config::AnalyticsConfig;
    use crate::core::error::ErrorKind;
    use crate::store::mock::{MockStorage, StorageCall, StorageOperation};
    use std::sync::Arc;

    fn month(y: i32, m: u32, income: i64, expense: i64) -> PeriodStats {
        let start = utc(y, m, 1);
        PeriodStats::new(
            start,
            period::period_end(&start, TimePeriod::Month),
            income,
            expense,
            Vec::new(),
        )
    }

    #[tokio::test]
    async fn test_get_forecast_success() {
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            month(2024, 6, 100000, 50000),
            month(2024, 5, 95000, 48000),
            month(2024, 4, 90000, 45000),
        ]));
        let service = service_at(&storage, utc(2024, 7, 15));

        let forecasts = service
            .get_forecast("user-123", Some(TimePeriod::Month), 3)
            .await
            .unwrap();

        assert_eq!(forecasts.len(), 3);
        // (100000*3 + 95000*2 + 90000) / 6 and (50000*3 + 48000*2 + 45000) / 6
        assert_eq!(forecasts[0].income, 96666);
        assert_eq!(forecasts[0].expense, 48500);
        for (i, forecast) in forecasts.iter().enumerate() {
            assert_eq!(forecast.income, forecasts[0].income);
            assert_eq!(forecast.expense, forecasts[0].expense);
            assert_eq!(forecast.balance, forecast.income - forecast.expense);
            assert!(forecast.categories.is_empty());
            assert_eq!(
                forecast.period_start,
                period::add_periods(&utc(2024, 6, 1), TimePeriod::Month, i as i32 + 1)
            );
        }
        assert_eq!(forecasts[2].period_start, utc(2024, 9, 1));
    }

    #[tokio::test]
    async fn test_get_forecast_requests_lookback_window() {
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            month(2024, 6, 100000, 50000),
            month(2024, 5, 95000, 48000),
        ]));
        let service = service_at(&storage, utc(2024, 7, 15));

        service.get_forecast("user-123", None, 1).await.unwrap();

        match &storage.calls()[0] {
            StorageCall::Forecast {
                user_id,
                start_date,
                period_count,
                group_by,
            } => {
                assert_eq!(user_id, "user-123");
                assert_eq!(*start_date, utc(2024, 1, 1));
                assert_eq!(*period_count, 6);
                assert_eq!(*group_by, TimePeriod::Month);
            }
            other => panic!("unexpected storage call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_forecast_uses_only_lookback_periods() {
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            month(2024, 3, 900000, 900000),
            month(2024, 6, 120000, 60000),
            month(2024, 4, 80000, 40000),
            month(2024, 5, 100000, 50000),
        ]));
        let mut config = AnalyticsConfig::default();
        config.forecast.lookback_periods = 3;
        let service = AnalyzerService::new(storage.clone(), config)
            .with_clock(Arc::new(FixedClock(utc(2024, 7, 2))));

        let forecasts = service.get_forecast("user-123", None, 1).await.unwrap();

        // March is beyond the three most recent periods and is dropped:
        // (120000*3 + 100000*2 + 80000) / 6 and (60000*3 + 50000*2 + 40000) / 6
        assert_eq!(forecasts[0].income, 106666);
        assert_eq!(forecasts[0].expense, 53333);
        assert_eq!(forecasts[0].period_start, utc(2024, 7, 1));
    }

    #[tokio::test]
    async fn test_get_forecast_weighted_correctly() {
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            month(2024, 6, 120000, 60000),
            month(2024, 5, 100000, 50000),
            month(2024, 4, 80000, 40000),
        ]));
        let service = service_at(&storage, utc(2024, 7, 2));

        let forecasts = service
            .get_forecast("user-123", Some(TimePeriod::Month), 2)
            .await
            .unwrap();

        // (120000*3 + 100000*2 + 80000) / 6 and (60000*3 + 50000*2 + 40000) / 6
        assert_eq!(forecasts[0].income, 103333);
        assert_eq!(forecasts[0].expense, 53333);
        assert_eq!(forecasts[1].income, 103333);
        assert_eq!(forecasts[0].balance, 50000);
    }

    #[tokio::test]
    async fn test_get_forecast_uses_at_most_six_periods() {
        let ten: Vec<PeriodStats> = (1..=10)
            .rev()
            .map(|m| month(2023, m, 70000, 30000))
            .collect();
        let six: Vec<PeriodStats> = ten[..6].to_vec();

        let storage_ten = Arc::new(MockStorage::new().with_forecast_data(ten));
        let storage_six = Arc::new(MockStorage::new().with_forecast_data(six));
        let now = utc(2023, 11, 5);

        let from_ten = service_at(&storage_ten, now)
            .get_forecast("user-123", None, 1)
            .await
            .unwrap();
        let from_six = service_at(&storage_six, now)
            .get_forecast("user-123", None, 1)
            .await
            .unwrap();

        assert_eq!(from_ten, from_six);
        assert_eq!(from_ten[0].income, 70000);
    }

    #[tokio::test]
    async fn test_get_forecast_ignores_values_beyond_window() {
        let mut history: Vec<PeriodStats> = (5..=10)
            .rev()
            .map(|m| month(2023, m, 70000, 30000))
            .collect();
        history.push(month(2023, 4, 9_000_000, 9_000_000));
        let storage = Arc::new(MockStorage::new().with_forecast_data(history));

        let forecasts = service_at(&storage, utc(2023, 11, 5))
            .get_forecast("user-123", None, 1)
            .await
            .unwrap();

        assert_eq!(forecasts[0].income, 70000);
        assert_eq!(forecasts[0].expense, 30000);
    }

    #[tokio::test]
    async fn test_get_forecast_empty_user_id() {
        let storage = Arc::new(MockStorage::new());
        let err = service_at(&storage, utc(2024, 7, 1))
            .get_forecast("", Some(TimePeriod::Month), 3)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "user_id is required");
    }

    #[tokio::test]
    async fn test_get_forecast_insufficient_data() {
        let storage =
            Arc::new(MockStorage::new().with_forecast_data(vec![month(2024, 1, 100000, 50000)]));
        let err = service_at(&storage, utc(2024, 2, 10))
            .get_forecast("user-123", Some(TimePeriod::Month), 3)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
        assert_eq!(
            err.to_string(),
            "insufficient historical data for forecast (need at least 2 periods)"
        );
    }

    #[tokio::test]
    async fn test_get_forecast_too_many_periods_ahead() {
        let storage = Arc::new(MockStorage::new());
        let err = service_at(&storage, utc(2024, 7, 1))
            .get_forecast("user-123", Some(TimePeriod::Month), 13)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.to_string(), "periods_ahead cannot exceed 12");
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_get_forecast_non_positive_periods_ahead_defaults_to_one() {
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            month(2024, 6, 100000, 50000),
            month(2024, 5, 95000, 48000),
        ]));
        let service = service_at(&storage, utc(2024, 7, 1));

        let zero = service.get_forecast("user-123", None, 0).await.unwrap();
        let negative = service.get_forecast("user-123", None, -4).await.unwrap();

        assert_eq!(zero.len(), 1);
        assert_eq!(negative.len(), 1);
        assert_eq!(zero, negative);
    }

    #[tokio::test]
    async fn test_get_forecast_quarterly() {
        let q2 = utc(2024, 4, 1);
        let q1 = utc(2024, 1, 1);
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            PeriodStats::new(q2, period::period_end(&q2, TimePeriod::Quarter), 300000, 150000, vec![]),
            PeriodStats::new(q1, period::period_end(&q1, TimePeriod::Quarter), 280000, 140000, vec![]),
        ]));

        let forecasts = service_at(&storage, utc(2024, 8, 20))
            .get_forecast("user-123", Some(TimePeriod::Quarter), 2)
            .await
            .unwrap();

        assert_eq!(forecasts[0].period_start, utc(2024, 7, 1));
        assert_eq!(forecasts[1].period_start, utc(2024, 10, 1));
        assert_eq!(
            forecasts[1].period_end,
            period::period_end(&utc(2024, 10, 1), TimePeriod::Quarter)
        );

        match &storage.calls()[0] {
            StorageCall::Forecast { start_date, .. } => assert_eq!(*start_date, utc(2023, 1, 1)),
            other => panic!("unexpected storage call: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_forecast_yearly() {
        let y2023 = utc(2023, 1, 1);
        let y2022 = utc(2022, 1, 1);
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            PeriodStats::new(y2023, period::period_end(&y2023, TimePeriod::Year), 1_200_000, 900_000, vec![]),
            PeriodStats::new(y2022, period::period_end(&y2022, TimePeriod::Year), 1_000_000, 800_000, vec![]),
        ]));

        let forecasts = service_at(&storage, utc(2024, 3, 1))
            .get_forecast("user-123", Some(TimePeriod::Year), 1)
            .await
            .unwrap();

        assert_eq!(forecasts.len(), 1);
        assert_eq!(forecasts[0].period_start, utc(2024, 1, 1));
    }

    #[tokio::test]
    async fn test_get_forecast_is_idempotent() {
        let storage = Arc::new(MockStorage::new().with_forecast_data(vec![
            month(2024, 6, 100000, 50000),
            month(2024, 5, 95000, 48000),
        ]));
        let service = service_at(&storage, utc(2024, 7, 1));

        let first = service.get_forecast("user-123", None, 4).await.unwrap();
        let second = service.get_forecast("user-123", None, 4).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_forecast_wraps_storage_failure() {
        let storage =
            Arc::new(MockStorage::new().failing(StorageOperation::Forecast, "timeout"));
        let err = service_at(&storage, utc(2024, 7, 1))
            .get_forecast("user-123", None, 1)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn test_project_empty_history() {
        assert!(project(&[], TimePeriod::Month, 3).is_empty());
    }
}
