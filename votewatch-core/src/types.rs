//! Snapshot types and re-exports of the shared DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use votewatch_types::{
    AuthFailure, CandidateCode, Credentials, CycleOutcome, CycleReport, ErrorKind,
    OpeningBaseline, RateConfig, SessionConfig, VoteError, WatchConfig, WatchSettings,
};

/// Display metadata for one candidate as printed on the vendor page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInfo {
    /// Member names of the pair, as displayed.
    pub names: String,
    /// Series the pair is known from; empty when the page gives none.
    pub series: String,
}

/// One timestamped capture of every candidate's current percentage share.
///
/// Percentages need not sum to 100 and a candidate may be absent altogether.
/// `candidates`, `category` and `source_url` are display metadata only; they
/// never influence reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Capture time.
    pub captured_at: DateTime<Utc>,
    /// Candidate code to percentage in `[0, 100]`.
    pub percentages: BTreeMap<CandidateCode, f64>,
    /// Candidate display metadata, when the page carried it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub candidates: BTreeMap<CandidateCode, CandidateInfo>,
    /// Vote category heading, when the page carried it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Page the snapshot was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl Snapshot {
    /// Build a snapshot, validating every percentage.
    ///
    /// # Errors
    /// Returns `Parse` if any percentage is non-finite or outside `[0, 100]`.
    pub fn new(
        captured_at: DateTime<Utc>,
        percentages: BTreeMap<CandidateCode, f64>,
    ) -> Result<Self, VoteError> {
        for (code, pct) in &percentages {
            validate_percentage(code, *pct)?;
        }
        Ok(Self {
            captured_at,
            percentages,
            candidates: BTreeMap::new(),
            category: None,
            source_url: None,
        })
    }

    /// Convenience for tests and fixtures: build from `(code, pct)` pairs.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a bad code and `Parse` for a bad percentage.
    pub fn from_pairs<'a, I>(captured_at: DateTime<Utc>, pairs: I) -> Result<Self, VoteError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut percentages = BTreeMap::new();
        for (code, pct) in pairs {
            percentages.insert(CandidateCode::new(code)?, pct);
        }
        Self::new(captured_at, percentages)
    }

    /// Attach candidate display metadata.
    #[must_use]
    pub fn with_candidates(mut self, candidates: BTreeMap<CandidateCode, CandidateInfo>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Attach the category heading.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Record the page the snapshot was read from.
    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Percentage reported for `code`, if present.
    #[must_use]
    pub fn percentage(&self, code: &str) -> Option<f64> {
        self.percentages.get(code).copied()
    }

    /// True if the snapshot carries no percentages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.percentages.is_empty()
    }
}

/// Check a single percentage value.
///
/// # Errors
/// Returns `Parse` if the value is non-finite or outside `[0, 100]`.
pub fn validate_percentage(code: &CandidateCode, pct: f64) -> Result<(), VoteError> {
    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(VoteError::parse(format!(
            "percentage for {code} out of range: {pct}"
        )));
    }
    Ok(())
}
