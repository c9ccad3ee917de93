use super::{period_label, ui};
use crate::analytics::AnalyzerService;
use crate::core::models::PeriodStats;
use crate::core::period::TimePeriod;
use anyhow::Result;
use comfy_table::Cell;

pub fn display_as_table(forecast: &[PeriodStats], period: TimePeriod) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Period"),
        ui::header_cell("Expected income"),
        ui::header_cell("Expected expense"),
        ui::header_cell("Balance"),
    ]);

    for stats in forecast {
        table.add_row(vec![
            Cell::new(period_label(&stats.period_start, period)),
            ui::amount_cell(stats.income),
            ui::amount_cell(stats.expense),
            ui::balance_cell(stats.balance),
        ]);
    }

    table.to_string()
}

pub async fn run(
    service: &AnalyzerService,
    user_id: &str,
    period: TimePeriod,
    periods_ahead: i32,
) -> Result<()> {
    let forecast = service
        .get_forecast(user_id, Some(period), periods_ahead)
        .await?;

    println!(
        "\nForecast for {}\n",
        ui::style_text(user_id, ui::StyleType::Title)
    );
    println!("{}", display_as_table(&forecast, period));
    Ok(())
}
