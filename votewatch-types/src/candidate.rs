//! Candidate identifiers.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VoteError;

/// Short identifier for one voting contestant or pair (e.g. `YND06`).
///
/// Codes are trimmed on construction and may not be empty or contain
/// whitespace. Ordering is plain string ordering, which keeps ledgers keyed by
/// code in a stable, human-friendly order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CandidateCode(String);

impl CandidateCode {
    /// Validate and wrap a candidate code.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the code is empty after trimming or contains
    /// interior whitespace.
    pub fn new(code: impl AsRef<str>) -> Result<Self, VoteError> {
        let trimmed = code.as_ref().trim();
        if trimmed.is_empty() {
            return Err(VoteError::InvalidArg(
                "candidate code must not be empty".to_string(),
            ));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(VoteError::InvalidArg(format!(
                "candidate code contains whitespace: {trimmed:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CandidateCode {
    type Error = VoteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CandidateCode {
    type Error = VoteError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CandidateCode> for String {
    fn from(code: CandidateCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CandidateCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CandidateCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rejects_blank_codes() {
        assert_eq!(CandidateCode::new("  YND06 ").unwrap().as_str(), "YND06");
        assert!(CandidateCode::new("   ").is_err());
        assert!(CandidateCode::new("YND 06").is_err());
    }

    #[test]
    fn map_lookup_by_str() {
        let mut m = std::collections::BTreeMap::new();
        m.insert(CandidateCode::new("YND10").unwrap(), 1);
        assert_eq!(m.get("YND10"), Some(&1));
    }
}
