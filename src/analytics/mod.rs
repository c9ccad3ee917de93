//! Analytics components: statistics, forecasts, anomalies and upcoming
//! recurring payments.
//!
//! Each operation validates its input, makes a single storage round trip and
//! transforms the result with pure functions. Operations share no mutable
//! state, so one service instance can serve any number of concurrent calls.

pub mod anomaly;
pub mod forecast;
pub mod recurring;
pub mod statistics;

use crate::core::clock::{Clock, SystemClock};
use crate::core::config::AnalyticsConfig;
use crate::core::error::{AnalyzerError, Result};
use crate::core::storage::TransactionStorage;
use std::sync::Arc;

pub struct AnalyzerService {
    storage: Arc<dyn TransactionStorage>,
    config: AnalyticsConfig,
    clock: Arc<dyn Clock>,
}

impl AnalyzerService {
    pub fn new(storage: Arc<dyn TransactionStorage>, config: AnalyticsConfig) -> Self {
        AnalyzerService {
            storage,
            config,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the wall clock, e.g. with a [`crate::core::FixedClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }
}

pub(crate) fn require_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(AnalyzerError::invalid_argument("user_id is required"));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AnalyzerService;
    use crate::core::clock::FixedClock;
    use crate::core::config::AnalyticsConfig;
    use crate::store::mock::MockStorage;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Arc;

    pub fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    /// Service over `storage` with the default config and a clock fixed at `now`.
    pub fn service_at(storage: &Arc<MockStorage>, now: DateTime<Utc>) -> AnalyzerService {
        AnalyzerService::new(storage.clone(), AnalyticsConfig::default())
            .with_clock(Arc::new(FixedClock(now)))
    }
}
