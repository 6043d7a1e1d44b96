//! Votewatch polls a vendor's vote-share page and turns the history into money.
//!
//! Overview
//! - Polls one `SnapshotSource` (the authenticated vendor connector in
//!   production) on a jittered hourly schedule.
//! - Appends every successful snapshot to an append-only `SnapshotStore`.
//! - Rebuilds the per-candidate points/money ledger from the stored history with
//!   the monotonic cumulative-gain engine of `votewatch_core`.
//! - Serves a `LedgerView` that keeps the last good ledger when the store
//!   cannot be read and flags stale data.
//!
//! Key behaviors and trade-offs
//! - Cycle guard: at most one cycle touches the vendor session at a time; a
//!   tick that lands on a running cycle is skipped, not queued.
//! - Cycle bound: login, the single re-login retry and extraction share one
//!   `cycle_timeout`.
//! - Failure isolation: every cycle error (auth, network, parse, store) becomes
//!   a `CycleReport`; the schedule keeps running.
//! - Jitter: each interval is stretched by up to `jitter_percent` so several
//!   watchers do not hit the vendor in lockstep.
//!
//! Examples
//! Polling the vendor into a directory:
//! ```rust,ignore
//! use std::sync::Arc;
//! use votewatch::{DirStore, VoteWatch};
//! use votewatch_acm::AcmConnector;
//!
//! let settings = votewatch::load_settings("votewatch.json").await?;
//! let store = Arc::new(DirStore::open(&settings.output_dir, settings.watch.timezone).await?);
//! let watch = Arc::new(
//!     VoteWatch::builder()
//!         .source(AcmConnector::builder(settings.session.clone()).build()?)
//!         .store(store)
//!         .config(settings.watch.clone())
//!         .build()?,
//! );
//! let mut handle = watch.spawn_scheduler();
//! while let Some(report) = handle.next_report().await {
//!     println!("{:?}", report.outcome);
//! }
//! ```
//!
//! Reading the ledger:
//! ```rust,ignore
//! let view = watch.ledger_view(chrono::Utc::now()).await;
//! if let Some(ledger) = &view.ledger {
//!     for row in ledger.summary() {
//!         println!("{} {:.2}% {} pts {} THB", row.candidate, row.percentage, row.points, row.money);
//!     }
//! }
//! ```
#![warn(missing_docs)]

mod core;
mod poll;
mod scheduler;
mod settings;
/// Snapshot store implementations.
pub mod store;
mod view;

pub use core::{VoteWatch, VoteWatchBuilder};
pub use scheduler::{PollHandle, jitter_wait};
pub use settings::{load_settings, parse_settings};
pub use store::{DirStore, MemoryStore};
pub use view::{LedgerStatus, LedgerView};

pub use votewatch_core::{
    CycleOutcome, CycleReport, RateConfig, Reconstruction, Snapshot, SnapshotSource,
    SnapshotStore, VoteError, WatchConfig, WatchSettings,
};
