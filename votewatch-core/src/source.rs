use async_trait::async_trait;

use crate::types::{Snapshot, VoteError};

/// A producer of snapshots, typically an authenticated vendor session.
///
/// Implementations own mutable session state (cookies, login phase), hence
/// `&mut self`: callers serialize invocations and never run two fetches
/// against the same source at once.
#[async_trait]
pub trait SnapshotSource: Send {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Produce one snapshot of the current percentages.
    ///
    /// # Errors
    /// Returns `Auth` when no session can be established, a network-class
    /// error for transport failures, and `Parse` when the page carried no
    /// usable data. A failure never yields a partially filled snapshot.
    async fn fetch_snapshot(&mut self) -> Result<Snapshot, VoteError>;
}
