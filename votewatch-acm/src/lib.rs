//! votewatch-acm
//!
//! Connector for the ACM online vote summary pages. Implements
//! `SnapshotSource` on top of an authenticated session that logs in with a
//! form post, detects silent expiry by redirects to the login surface, and
//! re-authenticates at most once per fetch.
#![warn(missing_docs)]

/// Transport abstraction and the production adapter backed by `reqwest`.
pub mod adapter;
mod builder;
/// Page extraction.
pub mod extract;
mod html;
mod session;
mod session_sm;

pub use adapter::{AcmTransport, HttpPage, RealTransport};
pub use builder::AcmConnectorBuilder;
pub use extract::{ChartJsExtractor, PageExtractor};
pub use session::SessionManager;
pub use session_sm::SessionState;

use async_trait::async_trait;
use votewatch_core::{SessionConfig, Snapshot, SnapshotSource, VoteError};

/// Public connector implementation backed by one [`SessionManager`].
#[derive(Debug)]
pub struct AcmConnector {
    session: SessionManager,
}

impl AcmConnector {
    /// Static connector key used in logs and reports.
    pub const KEY: &'static str = "votewatch-acm";

    /// Start building a connector for `config`.
    #[must_use]
    pub const fn builder(config: SessionConfig) -> AcmConnectorBuilder {
        AcmConnectorBuilder::new(config)
    }

    /// Connector for the built-in endpoints with credentials from the environment.
    ///
    /// # Errors
    /// Fails if the endpoints or the HTTP client cannot be set up.
    pub fn from_env() -> Result<Self, VoteError> {
        Self::builder(SessionConfig::yna2025()?).build()
    }

    /// Wrap an existing session.
    #[must_use]
    pub const fn from_session(session: SessionManager) -> Self {
        Self { session }
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Mutable access, e.g. to log in ahead of the first cycle.
    pub const fn session_mut(&mut self) -> &mut SessionManager {
        &mut self.session
    }
}

#[async_trait]
impl SnapshotSource for AcmConnector {
    fn name(&self) -> &'static str {
        Self::KEY
    }

    async fn fetch_snapshot(&mut self) -> Result<Snapshot, VoteError> {
        self.session.fetch_snapshot().await
    }
}
