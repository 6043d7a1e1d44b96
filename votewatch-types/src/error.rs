use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an authentication step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum AuthFailure {
    /// No credentials were configured; login was not attempted.
    MissingCredentials,
    /// The vendor kept the client on the login surface without a session cookie.
    Rejected,
    /// The data request was redirected to login again after a fresh re-login.
    ExpiredAfterRelogin,
}

impl fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingCredentials => "credentials missing",
            Self::Rejected => "login rejected",
            Self::ExpiredAfterRelogin => "session expired again after re-login",
        };
        f.write_str(s)
    }
}

/// Coarse classification used at the poll-cycle boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Credentials missing or rejected; no data produced for the cycle.
    Auth,
    /// Timeout, connection failure or unexpected HTTP status.
    Network,
    /// The page carried no usable percentage data.
    Parse,
    /// Reading or appending snapshots failed.
    Store,
    /// Everything else (invalid arguments, internal invariants).
    Internal,
}

/// Unified error type for the votewatch workspace.
///
/// The first three variants map onto the cycle-level taxonomy: `Auth`,
/// network-class (`Network`, `HttpStatus`, `CycleTimeout`) and `Parse`.
/// Every one of them is recovered at the poll-cycle boundary.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum VoteError {
    /// Authentication could not be established for this cycle.
    #[error("authentication failed: {reason}")]
    Auth {
        /// What went wrong during authentication.
        reason: AuthFailure,
    },

    /// Transport-level failure (timeout, DNS, TLS, connection reset).
    #[error("network error: {msg}")]
    Network {
        /// Human-readable description from the transport.
        msg: String,
    },

    /// The vendor answered with a non-success HTTP status.
    #[error("unexpected http status {status} from {url}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Final URL of the failing response.
        url: String,
    },

    /// The page or a stored record did not contain usable percentage data.
    #[error("parse error: {0}")]
    Parse(String),

    /// Snapshot persistence failed.
    #[error("store error: {0}")]
    Store(String),

    /// Invalid input argument or configuration value.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with otherwise well-formed data.
    #[error("data issue: {0}")]
    Data(String),

    /// A whole poll cycle exceeded its deadline.
    #[error("poll cycle timed out after {timeout_ms} ms")]
    CycleTimeout {
        /// Configured deadline in milliseconds.
        timeout_ms: u64,
    },

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl VoteError {
    /// Helper: build an `Auth` error.
    #[must_use]
    pub const fn auth(reason: AuthFailure) -> Self {
        Self::Auth { reason }
    }

    /// Helper: build a `Network` error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network { msg: msg.into() }
    }

    /// Helper: build a `Parse` error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Helper: build a `Store` error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Collapse this error onto the cycle-level taxonomy.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Network { .. } | Self::HttpStatus { .. } | Self::CycleTimeout { .. } => {
                ErrorKind::Network
            }
            Self::Parse(_) => ErrorKind::Parse,
            Self::Store(_) => ErrorKind::Store,
            Self::InvalidArg(_) | Self::Data(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if repeating the same request later may plausibly succeed
    /// without any change in configuration.
    ///
    /// Rejected or missing credentials are not retryable; an expiry that
    /// survived a re-login is, since the vendor may simply be flapping.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Auth { reason } => matches!(reason, AuthFailure::ExpiredAfterRelogin),
            Self::Network { .. } | Self::CycleTimeout { .. } | Self::Store(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Parse(_) | Self::InvalidArg(_) | Self::Data(_) | Self::Other(_) => false,
        }
    }
}

impl From<std::io::Error> for VoteError {
    fn from(e: std::io::Error) -> Self {
        Self::Store(e.to_string())
    }
}
