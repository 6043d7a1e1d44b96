use chrono::Utc;
use votewatch_core::{CycleOutcome, CycleReport, SnapshotSource, VoteError};

use crate::VoteWatch;

impl VoteWatch {
    /// Run one poll cycle: fetch a snapshot, append it, report what happened.
    ///
    /// Behavior and trade-offs:
    /// - At most one cycle runs at a time. If another cycle holds the source the
    ///   call returns `Skipped` immediately instead of waiting.
    /// - Fetching (login and retry included) is bounded by `cycle_timeout`;
    ///   exceeding it reports `CycleTimeout` and drops the in-flight request.
    ///   The append runs outside that bound so a timeout never interrupts a
    ///   record half way through being written.
    /// - Every failure is folded into the report, so callers never need to
    ///   handle an error to keep a schedule alive.
    /// - Nothing is appended unless the source produced at least one candidate.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "votewatch::poll_once", skip(self))
    )]
    pub async fn poll_once(&self) -> CycleReport {
        let started_at = Utc::now();
        let Ok(mut source) = self.source.try_lock() else {
            #[cfg(feature = "tracing")]
            tracing::warn!("previous cycle still running; skipping");
            return CycleReport {
                started_at,
                finished_at: started_at,
                outcome: CycleOutcome::Skipped,
            };
        };

        let outcome = match self.run_cycle(&mut source).await {
            Ok((key, candidates)) => CycleOutcome::Stored { key, candidates },
            Err(e) => CycleOutcome::Failed(e),
        };
        drop(source);

        #[cfg(feature = "tracing")]
        match &outcome {
            CycleOutcome::Stored { key, candidates } => {
                tracing::info!(key = %key, candidates = *candidates, "snapshot stored");
            }
            CycleOutcome::Failed(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "cycle failed");
            }
            _ => {}
        }

        CycleReport {
            started_at,
            finished_at: Utc::now(),
            outcome,
        }
    }

    async fn run_cycle(
        &self,
        source: &mut Box<dyn SnapshotSource>,
    ) -> Result<(String, usize), VoteError> {
        let timeout = self.cfg.cycle_timeout;
        let snapshot = tokio::time::timeout(timeout, source.fetch_snapshot())
            .await
            .map_err(|_| VoteError::CycleTimeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })??;
        if snapshot.is_empty() {
            return Err(VoteError::parse(format!(
                "{} returned a snapshot without candidates",
                source.name()
            )));
        }
        let key = self.store.append(&snapshot).await?;
        Ok((key, snapshot.percentages.len()))
    }
}
