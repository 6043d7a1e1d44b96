use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use votewatch_core::CycleReport;

use crate::VoteWatch;

/// Reports buffered for a slow consumer before new ones are dropped.
const REPORT_BUFFER: usize = 64;

/// Base interval plus a random share of it, up to `jitter_percent` percent.
#[must_use]
pub fn jitter_wait(base: Duration, jitter_percent: u8) -> Duration {
    let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, base_ms.saturating_mul(u64::from(jitter_percent)) / 100)
    };
    let mut rng = rand::rng();
    Duration::from_millis(base_ms.saturating_add(rng.random_range(0..jitter_range)))
}

/// Handle to a running poll schedule.
///
/// Dropping the handle stops the schedule; a cycle already in flight is
/// allowed to finish and append its snapshot.
pub struct PollHandle {
    inner: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
    reports: mpsc::Receiver<CycleReport>,
}

impl PollHandle {
    /// Wait for the next cycle report.
    ///
    /// Returns `None` once the schedule has stopped and every report was consumed.
    pub async fn next_report(&mut self) -> Option<CycleReport> {
        self.reports.recv().await
    }

    /// Stop scheduling new cycles and wait for the loop to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.inner.take() {
            let _ = handle.await;
        }
    }

    /// True once the scheduling loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.inner.take()
            && !h.is_finished()
        {
            h.abort();
        }
    }
}

impl VoteWatch {
    /// Run `poll_once` immediately and then every `poll_interval` plus jitter.
    ///
    /// Behavior and trade-offs:
    /// - Each tick runs in its own task, so a slow cycle never delays the
    ///   schedule; the tick that lands on it is reported as `Skipped`.
    /// - A cycle that panics only loses that tick.
    /// - Reports are buffered; when the consumer falls behind, newer reports are
    ///   dropped rather than blocking the schedule.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn_scheduler(self: &Arc<Self>) -> PollHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (report_tx, reports) = mpsc::channel(REPORT_BUFFER);
        let watch = Arc::clone(self);

        let inner = tokio::spawn(async move {
            let mut delay = Duration::ZERO;
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    () = tokio::time::sleep(delay) => {}
                }

                let tick = Arc::clone(&watch);
                let tx = report_tx.clone();
                tokio::spawn(async move {
                    let report = tick.poll_once().await;
                    let _ = tx.try_send(report);
                });

                delay = jitter_wait(watch.cfg.poll_interval, watch.cfg.jitter_percent);
                #[cfg(feature = "tracing")]
                tracing::debug!(next_in = ?delay, "next cycle scheduled");
            }
            #[cfg(feature = "tracing")]
            tracing::info!("poll schedule stopped");
        });

        PollHandle {
            inner: Some(inner),
            stop_tx: Some(stop_tx),
            reports,
        }
    }
}
