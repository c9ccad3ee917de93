use super::{period_label, ui};
use crate::analytics::AnalyzerService;
use crate::core::models::StatisticsReport;
use crate::core::period::TimePeriod;
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::Cell;

/// Categories listed per period before the rest are summarized.
const TOP_CATEGORIES: usize = 3;

impl StatisticsReport {
    pub fn display_as_table(&self, group_by: TimePeriod) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Period"),
            ui::header_cell("Income"),
            ui::header_cell("Expense"),
            ui::header_cell("Balance"),
            ui::header_cell("Top categories"),
        ]);

        for period in &self.periods {
            let mut categories: Vec<String> = period
                .categories
                .iter()
                .take(TOP_CATEGORIES)
                .map(|c| format!("{} {}", c.category_id, ui::format_amount(c.total_amount)))
                .collect();
            if period.categories.len() > TOP_CATEGORIES {
                categories.push(format!("+{} more", period.categories.len() - TOP_CATEGORIES));
            }

            table.add_row(vec![
                Cell::new(period_label(&period.period_start, group_by)),
                ui::amount_cell(period.income),
                ui::amount_cell(period.expense),
                ui::balance_cell(period.balance),
                Cell::new(categories.join("\n")),
            ]);
        }

        let mut output = table.to_string();
        output.push_str(&format!(
            "\n\n{} {}  {} {}",
            ui::style_text("Total income:", ui::StyleType::TotalLabel),
            ui::style_text(&ui::format_amount(self.total_income), ui::StyleType::TotalValue),
            ui::style_text("Total expense:", ui::StyleType::TotalLabel),
            ui::style_text(&ui::format_amount(self.total_expense), ui::StyleType::TotalValue),
        ));
        output
    }
}

pub async fn run(
    service: &AnalyzerService,
    user_id: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    group_by: TimePeriod,
) -> Result<()> {
    let report = service
        .get_statistics(user_id, from, to, Some(group_by))
        .await?;

    println!(
        "\nStatistics for {}\n",
        ui::style_text(user_id, ui::StyleType::Title)
    );
    if report.periods.is_empty() {
        println!(
            "{}",
            ui::style_text("No transactions in the selected range.", ui::StyleType::Subtle)
        );
        return Ok(());
    }
    println!("{}", report.display_as_table(group_by));
    Ok(())
}
