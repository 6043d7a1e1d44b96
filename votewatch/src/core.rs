use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use tokio::sync::{Mutex, RwLock};
use votewatch_core::{
    RateConfig, Reconstruction, SnapshotSource, SnapshotStore, VoteError, WatchConfig,
};

/// Orchestrator that polls one snapshot source into one store and derives the ledger.
///
/// The source sits behind an async mutex: a cycle holds it from login to
/// extraction, and a cycle that finds it held is skipped rather than queued.
pub struct VoteWatch {
    pub(crate) source: Mutex<Box<dyn SnapshotSource>>,
    pub(crate) store: Arc<dyn SnapshotStore>,
    pub(crate) cfg: WatchConfig,
    pub(crate) last_good: RwLock<Option<Arc<Reconstruction>>>,
}

/// Builder for constructing a `VoteWatch` orchestrator.
pub struct VoteWatchBuilder {
    source: Option<Box<dyn SnapshotSource>>,
    store: Option<Arc<dyn SnapshotStore>>,
    cfg: WatchConfig,
}

impl Default for VoteWatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteWatchBuilder {
    /// Create a new builder with default watch configuration.
    ///
    /// Behavior and trade-offs:
    /// - Starts with neither source nor store; both are required by [`build`](Self::build).
    /// - Defaults poll hourly with 5% jitter, bound each cycle to 90s and
    ///   value a one-point gain at 1 000 points and 4 baht per point.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            store: None,
            cfg: WatchConfig::default(),
        }
    }

    /// Set the snapshot source polled by every cycle.
    ///
    /// The orchestrator owns the source outright; a stateful connector keeps
    /// its session across cycles.
    #[must_use]
    pub fn source(mut self, source: impl SnapshotSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Set an already boxed snapshot source.
    #[must_use]
    pub fn boxed_source(mut self, source: Box<dyn SnapshotSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the store receiving one record per successful cycle.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the whole watch configuration.
    #[must_use]
    pub fn config(mut self, cfg: WatchConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the conversion constants used by every reconstruction.
    #[must_use]
    pub const fn rates(mut self, rates: RateConfig) -> Self {
        self.cfg.rates = rates;
        self
    }

    /// Set the interval between scheduled cycles.
    ///
    /// Behavior and trade-offs:
    /// - Each tick waits this long plus up to `jitter_percent` of it.
    /// - The staleness threshold follows at twice this interval unless set explicitly.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.cfg.poll_interval = interval;
        self
    }

    /// Set the hard bound on one whole cycle.
    ///
    /// Behavior and trade-offs:
    /// - Covers login, the single re-login retry and extraction together.
    /// - A cycle exceeding it reports `CycleTimeout` and its in-flight request is dropped.
    #[must_use]
    pub const fn cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.cycle_timeout = timeout;
        self
    }

    /// Set the age after which the latest snapshot counts as stale.
    #[must_use]
    pub const fn stale_after(mut self, age: Duration) -> Self {
        self.cfg.stale_after = Some(age);
        self
    }

    /// Set the scheduler jitter as a percentage of the poll interval.
    #[must_use]
    pub const fn jitter_percent(mut self, percent: u8) -> Self {
        self.cfg.jitter_percent = percent;
        self
    }

    /// Set the timezone used for record keys and offset-less timestamps.
    #[must_use]
    pub const fn timezone(mut self, tz: Tz) -> Self {
        self.cfg.timezone = tz;
        self
    }

    /// Build the orchestrator.
    ///
    /// # Errors
    /// Returns `InvalidArg` when the source or store is missing or the
    /// configuration does not validate.
    pub fn build(self) -> Result<VoteWatch, VoteError> {
        self.cfg.validate()?;
        let Some(source) = self.source else {
            return Err(VoteError::InvalidArg(
                "no snapshot source set; add one via source(...)".to_string(),
            ));
        };
        let Some(store) = self.store else {
            return Err(VoteError::InvalidArg(
                "no snapshot store set; add one via store(...)".to_string(),
            ));
        };
        Ok(VoteWatch {
            source: Mutex::new(source),
            store,
            cfg: self.cfg,
            last_good: RwLock::new(None),
        })
    }
}

impl VoteWatch {
    /// Start building a new `VoteWatch` instance.
    ///
    /// Typical usage chains connector and store registration with configuration:
    /// `VoteWatch::builder().source(connector).store(store).poll_interval(...).build()`.
    #[must_use]
    pub fn builder() -> VoteWatchBuilder {
        VoteWatchBuilder::new()
    }

    /// Active watch configuration.
    #[must_use]
    pub const fn config(&self) -> &WatchConfig {
        &self.cfg
    }

    /// The snapshot store shared with readers.
    #[must_use]
    pub fn store(&self) -> Arc<dyn SnapshotStore> {
        Arc::clone(&self.store)
    }

    /// True while a cycle holds the source.
    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.source.try_lock().is_err()
    }
}
