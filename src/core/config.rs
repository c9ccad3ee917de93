use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DATA_PATH_ENV: &str = "LEDGER_ANALYZER_DATA_PATH";
pub const PREDICTION_DAYS_ENV: &str = "LEDGER_ANALYZER_PREDICTION_DAYS";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    /// Historical periods requested from storage.
    pub lookback_periods: usize,
    pub max_periods_ahead: i32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig {
            lookback_periods: 6,
            max_periods_ahead: 12,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Periods requested from storage, including the analyzed one.
    pub lookback_periods: usize,
    /// Percent above the expected amount that counts as an anomaly.
    pub deviation_threshold: f64,
    /// Minimum spend, in minor units, for a category without history.
    pub new_category_threshold: i64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        AnomalyConfig {
            lookback_periods: 6,
            deviation_threshold: 50.0,
            new_category_threshold: 50000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RecurringConfig {
    pub lookback_months: u32,
    pub min_occurrences: usize,
    pub interval_min_days: u32,
    pub interval_max_days: u32,
    /// Largest distance, in days, of any single interval from the mean.
    pub date_deviation_days: u32,
    pub prediction_days: i64,
}

impl Default for RecurringConfig {
    fn default() -> Self {
        RecurringConfig {
            lookback_months: 6,
            min_occurrences: 3,
            interval_min_days: 25,
            interval_max_days: 35,
            date_deviation_days: 3,
            prediction_days: 30,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub forecast: ForecastConfig,
    pub anomaly: AnomalyConfig,
    pub recurring: RecurringConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the ledger database.
    pub data_path: Option<String>,
    pub analytics: AnalyticsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "fintrack", "ledger-analyzer")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("org", "fintrack", "ledger-analyzer")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("ledger"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let mut config: Self = if config_str.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&config_str).with_context(|| {
                format!("Failed to parse config file: {}", path.as_ref().display())
            })?
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Applies overrides looked up by variable name, normally from the
    /// process environment.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(path) = lookup(DATA_PATH_ENV).filter(|p| !p.is_empty()) {
            debug!(
                "Overriding data_path from {DATA_PATH_ENV}: {path} (was: {:?})",
                self.data_path
            );
            self.data_path = Some(path);
        }
        if let Some(days) = lookup(PREDICTION_DAYS_ENV).filter(|d| !d.is_empty()) {
            let days: i64 = days
                .trim()
                .parse()
                .with_context(|| format!("Invalid {PREDICTION_DAYS_ENV}: '{days}'"))?;
            debug!(
                "Overriding prediction_days from {PREDICTION_DAYS_ENV}: {days} (was: {})",
                self.analytics.recurring.prediction_days
            );
            self.analytics.recurring.prediction_days = days;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let analytics = &self.analytics;
        if analytics.forecast.lookback_periods < 2 {
            bail!("forecast.lookback_periods must be at least 2");
        }
        if analytics.forecast.max_periods_ahead < 1 {
            bail!("forecast.max_periods_ahead must be at least 1");
        }
        if analytics.anomaly.lookback_periods < 2 {
            bail!("anomaly.lookback_periods must be at least 2");
        }
        if analytics.anomaly.deviation_threshold < 0.0 {
            bail!("anomaly.deviation_threshold must not be negative");
        }
        if analytics.anomaly.new_category_threshold < 0 {
            bail!("anomaly.new_category_threshold must not be negative");
        }
        if analytics.recurring.interval_min_days > analytics.recurring.interval_max_days {
            bail!("recurring.interval_min_days must not exceed recurring.interval_max_days");
        }
        if analytics.recurring.prediction_days < 0 {
            bail!("recurring.prediction_days must not be negative");
        }
        Ok(())
    }
}
