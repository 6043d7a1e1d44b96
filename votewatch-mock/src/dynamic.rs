use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use votewatch_core::{Snapshot, SnapshotSource, VoteError};

/// Instruction for how the next fetch should behave.
#[derive(Clone, Debug)]
pub enum MockBehavior {
    /// Return the provided snapshot immediately.
    Return(Snapshot),
    /// Fail immediately with the provided error.
    Fail(VoteError),
    /// Return the snapshot after sleeping (simulate a slow vendor).
    Delay(Duration, Snapshot),
    /// Hang indefinitely (simulate a stalled request).
    Hang,
}

#[derive(Default)]
struct InternalState {
    queue: VecDeque<MockBehavior>,
    fallback: Option<MockBehavior>,
}

#[derive(Default)]
struct Counters {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Controller handle used by tests to drive the dynamic mock from the outside.
#[derive(Clone)]
pub struct DynamicMockController {
    state: Arc<Mutex<InternalState>>,
    counters: Arc<Counters>,
}

impl DynamicMockController {
    /// Queue behaviors consumed one per fetch, in order.
    pub async fn push<I: IntoIterator<Item = MockBehavior>>(&self, behaviors: I) {
        let mut guard = self.state.lock().await;
        guard.queue.extend(behaviors);
    }

    /// Behavior used once the queue is empty.
    pub async fn set_fallback(&self, behavior: MockBehavior) {
        let mut guard = self.state.lock().await;
        guard.fallback = Some(behavior);
    }

    /// Number of fetches started so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at the same time.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.counters.max_in_flight.load(Ordering::SeqCst)
    }

    /// Clear queued behaviors, the fallback and the counters.
    pub async fn reset(&self) {
        let mut guard = self.state.lock().await;
        guard.queue.clear();
        guard.fallback = None;
        self.counters.calls.store(0, Ordering::SeqCst);
        self.counters.max_in_flight.store(0, Ordering::SeqCst);
    }
}

/// A source that defers all behavior to an external controller.
pub struct DynamicMockSource {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
    counters: Arc<Counters>,
}

impl DynamicMockSource {
    /// Create a new dynamic mock source and its controller.
    #[must_use]
    pub fn new_with_controller(name: &'static str) -> (Self, DynamicMockController) {
        let state = Arc::new(Mutex::new(InternalState::default()));
        let counters = Arc::new(Counters::default());
        let controller = DynamicMockController {
            state: Arc::clone(&state),
            counters: Arc::clone(&counters),
        };
        (
            Self {
                name,
                state,
                counters,
            },
            controller,
        )
    }
}

struct InFlight<'a>(&'a Counters);

impl<'a> InFlight<'a> {
    fn enter(counters: &'a Counters) -> Self {
        counters.calls.fetch_add(1, Ordering::SeqCst);
        let now = counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        counters.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self(counters)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SnapshotSource for DynamicMockSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch_snapshot(&mut self) -> Result<Snapshot, VoteError> {
        let _guard = InFlight::enter(&self.counters);
        // Take the behavior without holding the lock across await points
        let behavior = {
            let mut guard = self.state.lock().await;
            guard.queue.pop_front().or_else(|| guard.fallback.clone())
        };
        match behavior {
            Some(MockBehavior::Return(s)) => Ok(s),
            Some(MockBehavior::Fail(e)) => Err(e),
            Some(MockBehavior::Delay(d, s)) => {
                tokio::time::sleep(d).await;
                Ok(s)
            }
            Some(MockBehavior::Hang) => {
                std::future::pending::<()>().await;
                Err(VoteError::Other("unreachable".into()))
            }
            None => Err(VoteError::Other(format!(
                "{}: no behavior scripted",
                self.name
            ))),
        }
    }
}
