//! Votewatch-specific data transfer objects, configuration primitives and the
//! shared error taxonomy.
#![warn(missing_docs)]

mod candidate;
mod config;
mod error;
mod reports;

pub use candidate::CandidateCode;
pub use config::{
    Credentials, OpeningBaseline, RateConfig, SessionConfig, WatchConfig, WatchSettings,
};
pub use error::{AuthFailure, ErrorKind, VoteError};
pub use reports::{CycleOutcome, CycleReport};
