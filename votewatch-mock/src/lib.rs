//! votewatch-mock
//!
//! Deterministic snapshot sources for tests and demos: a fixture replay of
//! the Y Universe Awards 2025 "The Best Couple" summary and a dynamic source
//! scripted from the outside.
#![warn(missing_docs)]

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::Utc;
use votewatch_core::{Snapshot, SnapshotSource, VoteError};

mod dynamic;
/// Fixture history of five candidate pairs over eight hours.
pub mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockSource, MockBehavior};

/// Replays fixture snapshots in order, one per fetch.
pub struct MockSource {
    pending: VecDeque<Snapshot>,
    restamp: bool,
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSource {
    /// Replay [`fixtures::history`] with its original capture times.
    #[must_use]
    pub fn new() -> Self {
        Self::replay(fixtures::history())
    }

    /// Replay the given snapshots in order.
    #[must_use]
    pub fn replay(snapshots: Vec<Snapshot>) -> Self {
        Self {
            pending: snapshots.into(),
            restamp: false,
        }
    }

    /// Stamp each replayed snapshot with the current time instead.
    #[must_use]
    pub fn live(mut self) -> Self {
        self.restamp = true;
        self
    }

    /// Snapshots not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl SnapshotSource for MockSource {
    fn name(&self) -> &'static str {
        "votewatch-mock"
    }

    async fn fetch_snapshot(&mut self) -> Result<Snapshot, VoteError> {
        let mut snapshot = self
            .pending
            .pop_front()
            .ok_or_else(|| VoteError::Data("mock history exhausted".into()))?;
        if self.restamp {
            snapshot.captured_at = Utc::now();
        }
        Ok(snapshot)
    }
}
