use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use votewatch_core::{Reconstruction, RejectedRecord, VoteError, reconstruct};

use crate::VoteWatch;

/// How current the ledger shown to readers is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStatus {
    /// The store holds no readable snapshot yet.
    NoData,
    /// The latest snapshot is younger than the staleness threshold.
    Fresh {
        /// Age of the latest snapshot.
        age: Duration,
    },
    /// The latest snapshot is older than the staleness threshold.
    Stale {
        /// Age of the latest snapshot.
        age: Duration,
    },
}

/// What a dashboard should display right now.
///
/// A failing store read does not blank the ledger: the last ledger computed
/// successfully is kept and `error` says why it could not be refreshed.
#[derive(Debug, Clone)]
pub struct LedgerView {
    /// Freshness of `ledger`.
    pub status: LedgerStatus,
    /// Ledger to display, if any snapshot was ever read.
    pub ledger: Option<Arc<Reconstruction>>,
    /// Capture time of the latest snapshot in `ledger`.
    pub latest_at: Option<DateTime<Utc>>,
    /// Records skipped because they were malformed.
    pub warnings: Vec<RejectedRecord>,
    /// Why the store could not be read, when `ledger` is a cached copy.
    ///
    /// `Store` for a failed read, `Parse` when every stored record was malformed.
    pub error: Option<VoteError>,
}

impl LedgerView {
    /// True when the view is missing data, stale, or built from a cached ledger.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !matches!(self.status, LedgerStatus::Fresh { .. })
            || self.error.is_some()
            || !self.warnings.is_empty()
    }
}

impl VoteWatch {
    /// Rebuild the ledger from every stored snapshot.
    ///
    /// Malformed records are skipped; use [`VoteWatch::ledger_view`] to see them.
    ///
    /// # Errors
    /// Returns `Store` when the store cannot be read.
    pub async fn ledger(&self) -> Result<Reconstruction, VoteError> {
        let scan = self.store.load_all().await?;
        Ok(reconstruct(&scan.snapshots, &self.cfg.rates))
    }

    /// Ledger plus freshness and degradation signals, as of `now`.
    ///
    /// Behavior and trade-offs:
    /// - An empty store yields `NoData` with no ledger.
    /// - A store read failure, or a store whose every record is malformed,
    ///   falls back to the last good ledger and reports the reason.
    /// - Staleness is measured from the latest capture time against
    ///   `stale_after` (twice the poll interval unless configured).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "votewatch::ledger_view", skip(self))
    )]
    pub async fn ledger_view(&self, now: DateTime<Utc>) -> LedgerView {
        let (ledger, warnings, error) = match self.store.load_all().await {
            Ok(scan) if !scan.snapshots.is_empty() => {
                let fresh = Arc::new(reconstruct(&scan.snapshots, &self.cfg.rates));
                *self.last_good.write().await = Some(Arc::clone(&fresh));
                (Some(fresh), scan.rejected, None)
            }
            Ok(scan) => {
                let cached = self.last_good.read().await.clone();
                let error = match (&cached, scan.rejected.first()) {
                    (Some(_), Some(first)) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            rejected = scan.rejected.len(),
                            "no readable records; serving last good ledger"
                        );
                        Some(VoteError::parse(format!(
                            "all {} stored records are malformed (first: {}: {})",
                            scan.rejected.len(),
                            first.key,
                            first.error
                        )))
                    }
                    _ => None,
                };
                (cached, scan.rejected, error)
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "store unreadable; serving last good ledger");
                let cached = self.last_good.read().await.clone();
                (cached, Vec::new(), Some(e))
            }
        };

        let latest_at = ledger
            .as_ref()
            .and_then(|l| l.latest())
            .map(|step| step.captured_at);
        let status = match latest_at {
            None => LedgerStatus::NoData,
            Some(at) => {
                let age = (now - at).to_std().unwrap_or_default();
                if age > self.cfg.stale_after() {
                    LedgerStatus::Stale { age }
                } else {
                    LedgerStatus::Fresh { age }
                }
            }
        };

        LedgerView {
            status,
            ledger,
            latest_at,
            warnings,
            error,
        }
    }
}
