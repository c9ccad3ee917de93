use super::{anomalies, forecast, recurring, ui};
use crate::analytics::AnalyzerService;
use crate::core::error::ErrorKind;
use crate::core::period::TimePeriod;
use anyhow::{Result, bail};
use tracing::warn;

/// Forecast, anomalies and upcoming recurring payments in one view.
///
/// The three queries run concurrently. A section that fails because the
/// user has too little history is reported inline; any other failure
/// aborts the report.
pub async fn run(service: &AnalyzerService, user_id: &str, period: TimePeriod) -> Result<()> {
    let periods_ahead = service.config().forecast.max_periods_ahead.min(3);
    let (forecast_result, anomalies_result, recurring_result) = futures::join!(
        service.get_forecast(user_id, Some(period), periods_ahead),
        service.get_anomalies(user_id, Some(period)),
        service.get_upcoming_recurring(user_id),
    );

    println!(
        "\nReport for {}",
        ui::style_text(user_id, ui::StyleType::Title)
    );

    println!(
        "\n{}\n",
        ui::style_text("Forecast", ui::StyleType::TotalLabel)
    );
    match forecast_result {
        Ok(periods) => println!("{}", forecast::display_as_table(&periods, period)),
        Err(e) if e.kind() == ErrorKind::FailedPrecondition => {
            warn!(error = %e, "forecast section skipped");
            println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
        }
        Err(e) => bail!(e),
    }

    ui::print_separator();
    println!(
        "{}\n",
        ui::style_text("Spending anomalies", ui::StyleType::TotalLabel)
    );
    match anomalies_result {
        Ok(found) => println!("{}", anomalies::render(&found)),
        Err(e) if e.kind() == ErrorKind::FailedPrecondition => {
            warn!(error = %e, "anomalies section skipped");
            println!("{}", ui::style_text(&e.to_string(), ui::StyleType::Error));
        }
        Err(e) => bail!(e),
    }

    ui::print_separator();
    println!(
        "{}\n",
        ui::style_text("Upcoming recurring payments", ui::StyleType::TotalLabel)
    );
    let payments = recurring_result?;
    println!(
        "{}",
        recurring::render(&payments, service.config().recurring.prediction_days)
    );

    Ok(())
}
