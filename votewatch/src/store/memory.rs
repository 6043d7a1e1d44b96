use async_trait::async_trait;
use chrono_tz::Tz;
use tokio::sync::RwLock;
use votewatch_core::record::record_key;
use votewatch_core::{Snapshot, SnapshotStore, StoreScan, VoteError};

use super::unique_key;

/// In-memory, append-only snapshot store.
///
/// Keys follow the directory store's naming so tests can assert on them.
pub struct MemoryStore {
    records: RwLock<Vec<(String, Snapshot)>>,
    tz: Tz,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Bangkok)
    }
}

impl MemoryStore {
    /// Empty store naming keys in `tz`.
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            tz,
        }
    }

    /// Store pre-loaded with `snapshots`, appended in the given order.
    pub async fn with_snapshots(tz: Tz, snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        let store = Self::new(tz);
        for s in snapshots {
            store.push(s).await;
        }
        store
    }

    /// Number of records held.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// True when nothing has been appended.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Keys in append order.
    pub async fn keys(&self) -> Vec<String> {
        self.records
            .read()
            .await
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    async fn push(&self, snapshot: Snapshot) -> String {
        let mut records = self.records.write().await;
        let base = record_key(snapshot.captured_at, self.tz);
        let key = unique_key(&base, |k| records.iter().any(|(taken, _)| taken == k));
        records.push((key.clone(), snapshot));
        key
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn append(&self, snapshot: &Snapshot) -> Result<String, VoteError> {
        Ok(self.push(snapshot.clone()).await)
    }

    async fn load_all(&self) -> Result<StoreScan, VoteError> {
        let records = self.records.read().await;
        Ok(StoreScan {
            snapshots: records.iter().map(|(_, s)| s.clone()).collect(),
            rejected: Vec::new(),
        })
    }
}
