use super::LedgerSource;
use crate::core::models::Transaction;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory ledger keyed by `(user_id, id)`.
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<BTreeMap<(String, String), Transaction>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerSource for MemoryLedger {
    async fn append(&self, transactions: &[Transaction]) -> Result<usize> {
        let mut ledger = self.inner.write().await;
        let mut inserted = 0;
        for tx in transactions {
            let key = (tx.user_id.clone(), tx.id.clone());
            if ledger.insert(key, tx.clone()).is_none() {
                inserted += 1;
            }
        }
        debug!(received = transactions.len(), inserted, "ledger APPEND");
        Ok(inserted)
    }

    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let ledger = self.inner.read().await;
        let mut transactions: Vec<Transaction> = ledger
            .values()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        debug!(user_id, count = transactions.len(), "ledger READ");
        Ok(transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::expense;

    #[tokio::test]
    async fn test_memory_ledger_append_and_read() {
        let ledger = MemoryLedger::new();

        // Initially, ledger is empty
        assert!(ledger.transactions_for_user("user-123").await.unwrap().is_empty());

        let inserted = ledger
            .append(&[
                expense("tx-2", "user-123", 200, "2024-02-01T00:00:00Z"),
                expense("tx-1", "user-123", 100, "2024-01-01T00:00:00Z"),
                expense("tx-3", "user-456", 300, "2024-01-15T00:00:00Z"),
            ])
            .await
            .unwrap();
        assert_eq!(inserted, 3);

        let txs = ledger.transactions_for_user("user-123").await.unwrap();
        let ids: Vec<&str> = txs.iter().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, vec!["tx-1", "tx-2"]);
    }

    #[tokio::test]
    async fn test_memory_ledger_replaces_duplicates() {
        let ledger = MemoryLedger::new();
        ledger
            .append(&[expense("tx-1", "user-123", 100, "2024-01-01T00:00:00Z")])
            .await
            .unwrap();

        let inserted = ledger
            .append(&[expense("tx-1", "user-123", 150, "2024-01-01T00:00:00Z")])
            .await
            .unwrap();
        assert_eq!(inserted, 0);

        let txs = ledger.transactions_for_user("user-123").await.unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].amount, 150);
    }
}
