//! Value objects exchanged between the storage layer and the analytics
//! components. All monetary amounts are integers in the smallest currency unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category id used for expenses without a merchant category code.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Income, expense and per-category spend for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub period_start: DateTime<Utc>,
    /// Last instant before the next period starts.
    pub period_end: DateTime<Utc>,
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
    /// Kept in the order the storage provider returned them.
    #[serde(default)]
    pub categories: Vec<CategoryStats>,
}

impl PeriodStats {
    /// Builds a period with `balance` derived from income and expense.
    pub fn new(
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        income: i64,
        expense: i64,
        categories: Vec<CategoryStats>,
    ) -> Self {
        PeriodStats {
            period_start,
            period_end,
            income,
            expense,
            balance: income - expense,
            categories,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category_id: String,
    pub total_amount: i64,
}

/// Spend of one category within one period, as reported by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPeriodStats {
    pub period_start: DateTime<Utc>,
    pub category_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAnomaly {
    pub category_id: String,
    pub actual_amount: i64,
    /// `0` when the category has no spending history.
    pub expected_amount: i64,
    pub deviation_amount: i64,
}

/// A recurring charge candidate detected by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringPattern {
    pub category_id: String,
    pub median_amount: i64,
    pub avg_interval_days: f64,
    pub last_occurrence: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPayment {
    pub category_id: String,
    pub typical_amount: i64,
    pub expected_date: DateTime<Utc>,
}

/// Result of a statistics query: the periods plus grand totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub periods: Vec<PeriodStats>,
    pub total_income: i64,
    pub total_expense: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

/// A single ledger entry, the raw fact storage aggregates from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub mcc: Option<i32>,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Category id for grouping: the MCC, or [`UNCATEGORIZED`].
    pub fn category_id(&self) -> String {
        self.mcc
            .map_or_else(|| UNCATEGORIZED.to_string(), |mcc| mcc.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_period_stats_balance() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let stats = PeriodStats::new(start, end, 100000, 130000, Vec::new());
        assert_eq!(stats.balance, -30000);
    }

    #[test]
    fn test_transaction_deserialization() {
        let json = r#"
        {
            "id": "tx-1",
            "account_id": "acc-1",
            "user_id": "user-123",
            "type": "EXPENSE",
            "amount": 4599,
            "currency": "RUB",
            "mcc": 5411,
            "created_at": "2024-05-14T10:00:00Z"
        }"#;

        let tx: Transaction = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(tx.kind, TransactionType::Expense);
        assert_eq!(tx.category_id(), "5411");
        assert_eq!(tx.description, "");

        let uncategorized = Transaction { mcc: None, ..tx };
        assert_eq!(uncategorized.category_id(), UNCATEGORIZED);
    }
}
