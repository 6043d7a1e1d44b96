//! votewatch-core
//!
//! Core types, traits, and the reconstruction engine shared across the
//! votewatch workspace.
//!
//! - `types`: snapshots and candidate display metadata.
//! - `record`: the persisted JSON record shape and timestamp recovery.
//! - `source`: the `SnapshotSource` trait implemented by vendor connectors.
//! - `store`: the append-only `SnapshotStore` trait.
//! - `reconstruct`: the single monotonic cumulative-gain engine turning a
//!   snapshot history into a per-candidate points/money ledger.
//!
//! Reconstruction is a pure function: it allocates fresh state per call and
//! may run concurrently from any number of readers.
#![warn(missing_docs)]

/// Persisted record format for snapshots.
pub mod record;
/// Monotonic cumulative-gain reconstruction and the derived ledger.
pub mod reconstruct;
/// Snapshot producers.
pub mod source;
/// Append-only snapshot persistence.
pub mod store;
pub mod types;

pub use reconstruct::{
    CandidateLedgerEntry, CandidateSummary, LedgerStep, Reconstruction, RoundedEntry, reconstruct,
};
pub use record::{SnapshotRecord, SummaryItem};
pub use source::SnapshotSource;
pub use store::{RejectedRecord, SnapshotStore, StoreScan};
pub use types::*;
