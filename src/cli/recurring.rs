use super::ui;
use crate::analytics::AnalyzerService;
use crate::core::models::RecurringPayment;
use anyhow::Result;
use comfy_table::Cell;

pub fn display_as_table(payments: &[RecurringPayment]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Expected on"),
        ui::header_cell("Category"),
        ui::header_cell("Typical amount"),
    ]);

    for payment in payments {
        table.add_row(vec![
            Cell::new(payment.expected_date.format("%Y-%m-%d")),
            Cell::new(&payment.category_id),
            ui::amount_cell(payment.typical_amount),
        ]);
    }

    table.to_string()
}

/// Renders `payments`, or a note when there are none.
pub fn render(payments: &[RecurringPayment], window_days: i64) -> String {
    if payments.is_empty() {
        return ui::style_text(
            &format!("No recurring payments expected in the next {window_days} days."),
            ui::StyleType::Subtle,
        );
    }
    display_as_table(payments)
}

pub async fn run(service: &AnalyzerService, user_id: &str) -> Result<()> {
    let payments = service.get_upcoming_recurring(user_id).await?;

    println!(
        "\nUpcoming recurring payments for {}\n",
        ui::style_text(user_id, ui::StyleType::Title)
    );
    println!(
        "{}",
        render(&payments, service.config().recurring.prediction_days)
    );
    Ok(())
}
