// Shared fixtures for the orchestrator tests: `use helpers::*;`
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use votewatch::{MemoryStore, Snapshot, SnapshotStore, VoteError, VoteWatch};
use votewatch_core::StoreScan;
use votewatch_mock::{DynamicMockController, DynamicMockSource};

pub use chrono_tz::Asia::Bangkok;

/// 2025-11-20 at `h:m` Bangkok time, as UTC.
pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Bangkok
        .with_ymd_and_hms(2025, 11, 20, h, m, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn snap(when: DateTime<Utc>, pairs: &[(&str, f64)]) -> Snapshot {
    Snapshot::from_pairs(when, pairs.iter().copied()).unwrap()
}

/// Store that can be switched into a failing mode.
pub struct FlakyStore {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(Bangkok),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, yes: bool) {
        self.failing.store(yes, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), VoteError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VoteError::store("disk unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for FlakyStore {
    async fn append(&self, snapshot: &Snapshot) -> Result<String, VoteError> {
        self.check()?;
        self.inner.append(snapshot).await
    }

    async fn load_all(&self) -> Result<StoreScan, VoteError> {
        self.check()?;
        self.inner.load_all().await
    }
}

/// Store whose appends take `delay` before landing.
pub struct SlowStore {
    pub inner: MemoryStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStore::new(Bangkok),
            delay,
        }
    }
}

#[async_trait]
impl SnapshotStore for SlowStore {
    async fn append(&self, snapshot: &Snapshot) -> Result<String, VoteError> {
        tokio::time::sleep(self.delay).await;
        self.inner.append(snapshot).await
    }

    async fn load_all(&self) -> Result<StoreScan, VoteError> {
        self.inner.load_all().await
    }
}

/// Orchestrator over a scripted source and the given store.
pub fn scripted_watch(
    store: Arc<dyn SnapshotStore>,
    interval: Duration,
    cycle_timeout: Duration,
) -> (Arc<VoteWatch>, DynamicMockController) {
    let (source, ctl) = DynamicMockSource::new_with_controller("scripted");
    let watch = VoteWatch::builder()
        .source(source)
        .store(store)
        .poll_interval(interval)
        .cycle_timeout(cycle_timeout)
        .jitter_percent(0)
        .build()
        .expect("valid orchestrator");
    (Arc::new(watch), ctl)
}
