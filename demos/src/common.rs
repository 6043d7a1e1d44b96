use std::path::PathBuf;

use votewatch_acm::AcmConnector;
use votewatch_core::{SnapshotSource, VoteError};
use votewatch_mock::MockSource;

/// Environment variable switching every demo onto fixture data.
pub const USE_MOCK_ENV: &str = "VOTEWATCH_DEMOS_USE_MOCK";

/// Return a snapshot source for demos.
///
/// With `VOTEWATCH_DEMOS_USE_MOCK` set this replays the bundled fixture
/// history; otherwise it logs into the vendor with `VOTE_USERNAME` /
/// `VOTE_PASSWORD`.
///
/// # Errors
/// Returns `InvalidArg` if the built-in vendor endpoints fail to parse.
pub fn get_source() -> Result<Box<dyn SnapshotSource>, VoteError> {
    if std::env::var(USE_MOCK_ENV).is_ok() {
        println!("--- (Using fixture replay instead of the vendor) ---");
        Ok(Box::new(MockSource::new().live()))
    } else {
        Ok(Box::new(AcmConnector::from_env()?))
    }
}

/// Directory holding the snapshot records, from the first CLI argument.
#[must_use]
pub fn data_dir() -> PathBuf {
    std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("data_yna2025"), PathBuf::from)
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
