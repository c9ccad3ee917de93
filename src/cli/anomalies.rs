use super::ui;
use crate::analytics::AnalyzerService;
use crate::core::models::CategoryAnomaly;
use crate::core::period::TimePeriod;
use anyhow::Result;
use comfy_table::Cell;

pub fn display_as_table(anomalies: &[CategoryAnomaly]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Category"),
        ui::header_cell("Actual"),
        ui::header_cell("Expected"),
        ui::header_cell("Over by"),
        ui::header_cell("Deviation"),
    ]);

    for anomaly in anomalies {
        table.add_row(vec![
            Cell::new(&anomaly.category_id),
            ui::amount_cell(anomaly.actual_amount),
            ui::amount_cell(anomaly.expected_amount),
            ui::amount_cell(anomaly.deviation_amount),
            ui::deviation_cell(anomaly.deviation_amount, anomaly.expected_amount),
        ]);
    }

    table.to_string()
}

/// Renders `anomalies`, or a note when there are none.
pub fn render(anomalies: &[CategoryAnomaly]) -> String {
    if anomalies.is_empty() {
        return ui::style_text("No unusual spending detected.", ui::StyleType::Subtle);
    }
    display_as_table(anomalies)
}

pub async fn run(service: &AnalyzerService, user_id: &str, period: TimePeriod) -> Result<()> {
    let anomalies = service.get_anomalies(user_id, Some(period)).await?;

    println!(
        "\nSpending anomalies for {}\n",
        ui::style_text(user_id, ui::StyleType::Title)
    );
    println!("{}", render(&anomalies));
    Ok(())
}
