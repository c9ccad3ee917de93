use super::ui;
use crate::core::models::Transaction;
use crate::store::LedgerSource;
use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::{debug, info};

const CHUNK_SIZE: usize = 500;

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub received: usize,
    pub inserted: usize,
}

/// Reads a JSON array of transactions from `path` and appends it to `ledger`.
pub async fn run(ledger: &dyn LedgerSource, path: &Path) -> Result<ImportSummary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read transactions file: {}", path.display()))?;
    let transactions: Vec<Transaction> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse transactions file: {}", path.display()))?;

    for (index, tx) in transactions.iter().enumerate() {
        validate(tx).with_context(|| format!("Invalid transaction at index {index}"))?;
    }
    debug!(count = transactions.len(), "transactions parsed");

    let pb = ui::new_progress_bar(transactions.len() as u64, true);
    pb.set_message("Importing transactions...");
    let mut inserted = 0;
    for chunk in transactions.chunks(CHUNK_SIZE) {
        inserted += ledger.append(chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();

    let summary = ImportSummary {
        received: transactions.len(),
        inserted,
    };
    info!(
        received = summary.received,
        inserted = summary.inserted,
        "transactions imported"
    );
    println!(
        "Imported {} transactions ({} new) from {}",
        ui::style_text(&summary.received.to_string(), ui::StyleType::TotalValue),
        summary.inserted,
        path.display()
    );
    Ok(summary)
}

/// Rejects records the ledger cannot key or aggregate.
pub fn validate(tx: &Transaction) -> Result<()> {
    if tx.id.is_empty() {
        bail!("id is required");
    }
    if tx.user_id.is_empty() {
        bail!("user_id is required");
    }
    if tx.id.contains('\0') || tx.user_id.contains('\0') {
        bail!("id and user_id must not contain NUL characters");
    }
    if tx.amount < 0 {
        bail!("amount must not be negative, got {}", tx.amount);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLedger;
    use std::fs;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"[
        {
            "id": "tx-1",
            "account_id": "acc-1",
            "user_id": "user-123",
            "type": "INCOME",
            "amount": 100000,
            "currency": "RUB",
            "created_at": "2024-05-01T09:00:00Z"
        },
        {
            "id": "tx-2",
            "account_id": "acc-1",
            "user_id": "user-123",
            "type": "EXPENSE",
            "amount": 4599,
            "currency": "RUB",
            "mcc": 5411,
            "description": "groceries",
            "created_at": "2024-05-02T18:30:00Z"
        }
    ]"#;

    #[tokio::test]
    async fn test_import_appends_transactions() -> Result<()> {
        let file = NamedTempFile::new()?;
        fs::write(file.path(), SAMPLE)?;
        let ledger = MemoryLedger::new();

        let summary = run(&ledger, file.path()).await?;
        assert_eq!(
            summary,
            ImportSummary {
                received: 2,
                inserted: 2
            }
        );

        let again = run(&ledger, file.path()).await?;
        assert_eq!(again.inserted, 0);
        assert_eq!(ledger.transactions_for_user("user-123").await?.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_import_rejects_invalid_records() -> Result<()> {
        let file = NamedTempFile::new()?;
        fs::write(file.path(), SAMPLE.replace("\"amount\": 4599", "\"amount\": -1"))?;
        let ledger = MemoryLedger::new();

        let err = run(&ledger, file.path()).await.unwrap_err();
        assert!(format!("{err:#}").contains("index 1"), "{err:#}");
        assert!(ledger.transactions_for_user("user-123").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_import_rejects_malformed_json() -> Result<()> {
        let file = NamedTempFile::new()?;
        fs::write(file.path(), "{ not json")?;

        let err = run(&MemoryLedger::new(), file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
        Ok(())
    }
}
