pub mod analytics;
pub mod cli;
pub mod core;
pub mod store;

use crate::analytics::AnalyzerService;
use crate::core::config::AppConfig;
use crate::core::period::TimePeriod;
use crate::store::{DiskLedger, LedgerStorage};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Commands that need a loaded configuration and an open ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Import {
        file: PathBuf,
    },
    Stats {
        user_id: String,
        from: Option<String>,
        to: Option<String>,
        group_by: Option<String>,
    },
    Forecast {
        user_id: String,
        period: Option<String>,
        periods_ahead: i32,
    },
    Anomalies {
        user_id: String,
        period: Option<String>,
    },
    Recurring {
        user_id: String,
    },
    Report {
        user_id: String,
        period: Option<String>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Ledger analyzer starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let data_path = config.default_data_path()?;
    let ledger = Arc::new(DiskLedger::open(&data_path)?);

    if let AppCommand::Import { file } = &command {
        cli::import::run(ledger.as_ref(), file).await?;
        return Ok(());
    }

    let storage = LedgerStorage::new(ledger, config.analytics.recurring.clone());
    let service = AnalyzerService::new(Arc::new(storage), config.analytics);

    match command {
        AppCommand::Import { .. } => Ok(()),
        AppCommand::Stats {
            user_id,
            from,
            to,
            group_by,
        } => {
            let from = from.as_deref().map(|v| cli::parse_date(v, false)).transpose()?;
            let to = to.as_deref().map(|v| cli::parse_date(v, true)).transpose()?;
            let group_by = TimePeriod::parse_or_default(group_by.as_deref());
            cli::stats::run(&service, &user_id, from, to, group_by).await
        }
        AppCommand::Forecast {
            user_id,
            period,
            periods_ahead,
        } => {
            let period = TimePeriod::parse_or_default(period.as_deref());
            cli::forecast::run(&service, &user_id, period, periods_ahead).await
        }
        AppCommand::Anomalies { user_id, period } => {
            let period = TimePeriod::parse_or_default(period.as_deref());
            cli::anomalies::run(&service, &user_id, period).await
        }
        AppCommand::Recurring { user_id } => cli::recurring::run(&service, &user_id).await,
        AppCommand::Report { user_id, period } => {
            let period = TimePeriod::parse_or_default(period.as_deref());
            cli::report::run(&service, &user_id, period).await
        }
    }
}
