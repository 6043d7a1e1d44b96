use async_trait::async_trait;

use crate::types::{Snapshot, VoteError};

/// A stored record that could not be turned into a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Store key of the record (file name for the directory store).
    pub key: String,
    /// Why it was rejected.
    pub error: VoteError,
}

/// Result of reading a whole store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreScan {
    /// Every readable snapshot, in no particular order.
    pub snapshots: Vec<Snapshot>,
    /// Records that exist but are malformed.
    pub rejected: Vec<RejectedRecord>,
}

impl StoreScan {
    /// True when the store holds no records at all, readable or not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty() && self.rejected.is_empty()
    }
}

/// Append-only, ordered-by-time snapshot persistence.
///
/// Appends are atomic per snapshot: readers see either the whole record or
/// nothing. No record is ever rewritten.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist one snapshot and return its key.
    ///
    /// # Errors
    /// Returns `Store` when the record cannot be written.
    async fn append(&self, snapshot: &Snapshot) -> Result<String, VoteError>;

    /// Read every record.
    ///
    /// Malformed records are reported in [`StoreScan::rejected`] rather than
    /// failing the whole read.
    ///
    /// # Errors
    /// Returns `Store` when the store itself cannot be read.
    async fn load_all(&self) -> Result<StoreScan, VoteError>;

    /// The most recently captured snapshot, if any.
    ///
    /// # Errors
    /// Propagates errors from [`SnapshotStore::load_all`].
    async fn latest(&self) -> Result<Option<Snapshot>, VoteError> {
        let scan = self.load_all().await?;
        Ok(scan.snapshots.into_iter().max_by_key(|s| s.captured_at))
    }
}
