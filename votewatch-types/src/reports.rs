//! Report envelopes produced by the poller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VoteError;

/// What a single poll cycle ended with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CycleOutcome {
    /// A snapshot was fetched and appended to the store.
    Stored {
        /// Store key of the appended record (file name for the directory store).
        key: String,
        /// Number of candidates carried by the snapshot.
        candidates: usize,
    },
    /// Another cycle still held the session; this one did nothing.
    Skipped,
    /// The cycle produced no snapshot.
    Failed(VoteError),
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// When the cycle started.
    pub started_at: DateTime<Utc>,
    /// When the cycle finished (equal to `started_at` for skipped cycles).
    pub finished_at: DateTime<Utc>,
    /// Result of the cycle.
    pub outcome: CycleOutcome,
}

impl CycleReport {
    /// True if a snapshot was appended.
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Stored { .. })
    }

    /// True if the cycle was skipped because another one was in flight.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Skipped)
    }

    /// The failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&VoteError> {
        match &self.outcome {
            CycleOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}
