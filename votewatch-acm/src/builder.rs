use std::sync::Arc;

use votewatch_core::{Credentials, SessionConfig, VoteError};

use crate::AcmConnector;
use crate::adapter::{AcmTransport, RealTransport};
use crate::extract::{ChartJsExtractor, PageExtractor};
use crate::session::SessionManager;

/// Builder for [`AcmConnector`].
///
/// Credentials default to `VOTE_USERNAME` / `VOTE_PASSWORD`, the transport to
/// a fresh [`RealTransport`] and the extractor to [`ChartJsExtractor`].
pub struct AcmConnectorBuilder {
    config: SessionConfig,
    credentials: Option<Option<Credentials>>,
    transport: Option<Arc<dyn AcmTransport>>,
    extractor: Option<Arc<dyn PageExtractor>>,
    max_relogins: u8,
}

impl AcmConnectorBuilder {
    pub(crate) const fn new(config: SessionConfig) -> Self {
        Self {
            config,
            credentials: None,
            transport: None,
            extractor: None,
            max_relogins: 1,
        }
    }

    /// Use explicit credentials instead of the environment. `None` disables login.
    #[must_use]
    pub fn credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Inject a transport (tests, proxies, shared clients).
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn AcmTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Inject a page extractor.
    #[must_use]
    pub fn extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Re-logins allowed per fetch after an expiry (default 1).
    #[must_use]
    pub const fn max_relogins(mut self, max: u8) -> Self {
        self.max_relogins = max;
        self
    }

    /// Validate the configuration and assemble the connector.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an invalid session configuration, or the
    /// transport construction error.
    pub fn build(self) -> Result<AcmConnector, VoteError> {
        self.config.validate()?;
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(RealTransport::new(&self.config)?),
        };
        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(ChartJsExtractor::default()));
        let credentials = self.credentials.unwrap_or_else(Credentials::from_env);
        let session = SessionManager::new(self.config, credentials, transport, extractor)
            .with_max_relogins(self.max_relogins);
        Ok(AcmConnector { session })
    }
}
