use super::LedgerSource;
use crate::core::models::Transaction;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

const PARTITION: &str = "transactions";

/// Ledger persisted in a fjall keyspace.
///
/// Keys are `user_id \0 id`, so one user's transactions form a contiguous
/// prefix range. Values are JSON-encoded [`Transaction`]s.
pub struct DiskLedger {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskLedger {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create data directory {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open ledger at {}", path.display()))?;
        let partition = keyspace.open_partition(PARTITION, PartitionCreateOptions::default())?;
        debug!(path = %path.display(), "ledger opened");

        Ok(Self {
            keyspace,
            partition,
        })
    }

    fn user_prefix(user_id: &str) -> String {
        format!("{user_id}\0")
    }

    fn key(tx: &Transaction) -> String {
        format!("{}{}", Self::user_prefix(&tx.user_id), tx.id)
    }
}

#[async_trait]
impl LedgerSource for DiskLedger {
    async fn append(&self, transactions: &[Transaction]) -> Result<usize> {
        let mut batch = self.keyspace.batch();
        let mut new_keys = HashSet::new();
        for tx in transactions {
            let key = Self::key(tx);
            if !self.partition.contains_key(key.as_bytes())? {
                new_keys.insert(key.clone());
            }
            batch.insert(&self.partition, key.as_bytes(), serde_json::to_vec(tx)?);
        }
        batch.commit()?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        let inserted = new_keys.len();
        debug!(received = transactions.len(), inserted, "ledger APPEND");
        Ok(inserted)
    }

    async fn transactions_for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut transactions = Vec::new();
        for item in self.partition.prefix(Self::user_prefix(user_id).as_bytes()) {
            let (_, value) = item?;
            let tx: Transaction =
                serde_json::from_slice(&value).context("Corrupt transaction record")?;
            transactions.push(tx);
        }
        transactions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        debug!(user_id, count = transactions.len(), "ledger READ");
        Ok(transactions)
    }
}
