//! The JSON record written once per successful poll cycle.
//!
//! Records look like
//! `{"timestamp": "...", "url": "...", "category": "...", "summary": [{"code", "percentage", "names", "series"}], "ranking": [...]}`.
//! Unknown fields are ignored so older records with extra keys still load.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::types::{CandidateCode, CandidateInfo, Snapshot, VoteError, validate_percentage};

/// Prefix of every record key.
pub const KEY_PREFIX: &str = "vote_";
const KEY_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const KEY_STAMP_LEN: usize = 15;

/// One candidate line of a persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    /// Candidate code.
    pub code: String,
    /// Percentage share at capture time.
    pub percentage: f64,
    /// Display names, possibly empty.
    #[serde(default)]
    pub names: String,
    /// Series, possibly empty.
    #[serde(default)]
    pub series: String,
}

/// Persisted form of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    /// ISO-8601 capture time; offset-less values are read in the configured timezone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Page the data was read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Vote category heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Candidates sorted by percentage, highest first.
    #[serde(default)]
    pub summary: Vec<SummaryItem>,
    /// Human-readable ranking lines, e.g. `#1 YND06: 32.10% - A & B`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ranking: Vec<String>,
}

impl SnapshotRecord {
    /// Build the persisted form, stamping the capture time in `tz`.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot, tz: Tz) -> Self {
        let mut summary: Vec<SummaryItem> = snapshot
            .percentages
            .iter()
            .map(|(code, pct)| {
                let info = snapshot.candidates.get(code).cloned().unwrap_or_default();
                SummaryItem {
                    code: code.to_string(),
                    percentage: *pct,
                    names: info.names,
                    series: info.series,
                }
            })
            .collect();
        summary.sort_by(|a, b| {
            b.percentage
                .total_cmp(&a.percentage)
                .then_with(|| a.code.cmp(&b.code))
        });

        let ranking = summary
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let mut line = format!("#{} {}: {:.2}%", i + 1, item.code, item.percentage);
                if !item.names.is_empty() {
                    line.push_str(" - ");
                    line.push_str(&item.names);
                }
                line
            })
            .collect();

        Self {
            timestamp: Some(
                snapshot
                    .captured_at
                    .with_timezone(&tz)
                    .to_rfc3339_opts(SecondsFormat::AutoSi, false),
            ),
            url: snapshot.source_url.clone(),
            category: snapshot.category.clone(),
            summary,
            ranking,
        }
    }

    /// Turn a stored record back into a snapshot.
    ///
    /// The capture time comes from `timestamp`, falling back to the
    /// `vote_YYYYMMDD_HHMMSS` stamp in `key` when the field is missing or
    /// unreadable.
    ///
    /// # Errors
    /// Returns `Parse` when no capture time can be recovered, the summary is
    /// empty, a code is invalid or repeated, or a percentage is out of range.
    pub fn into_snapshot(self, key: Option<&str>, tz: Tz) -> Result<Snapshot, VoteError> {
        let captured_at = self
            .timestamp
            .as_deref()
            .and_then(|raw| parse_timestamp(raw, tz))
            .or_else(|| key.and_then(|k| timestamp_from_key(k, tz)))
            .ok_or_else(|| {
                VoteError::parse(format!(
                    "record {} has no recoverable timestamp",
                    key.unwrap_or("<unnamed>")
                ))
            })?;

        if self.summary.is_empty() {
            return Err(VoteError::parse(format!(
                "record {} lists no candidates",
                key.unwrap_or("<unnamed>")
            )));
        }

        let mut percentages = BTreeMap::new();
        let mut candidates = BTreeMap::new();
        for item in self.summary {
            let code = CandidateCode::new(&item.code)
                .map_err(|e| VoteError::parse(format!("bad candidate code: {e}")))?;
            validate_percentage(&code, item.percentage)?;
            if percentages.insert(code.clone(), item.percentage).is_some() {
                return Err(VoteError::parse(format!("candidate {code} listed twice")));
            }
            if !(item.names.is_empty() && item.series.is_empty()) {
                candidates.insert(
                    code,
                    CandidateInfo {
                        names: item.names,
                        series: item.series,
                    },
                );
            }
        }

        Ok(Snapshot {
            captured_at,
            percentages,
            candidates,
            category: self.category,
            source_url: self.url,
        })
    }

    /// Pretty-printed JSON bytes.
    ///
    /// # Errors
    /// Returns `Store` if serialization fails.
    pub fn to_json(&self) -> Result<Vec<u8>, VoteError> {
        serde_json::to_vec_pretty(self).map_err(|e| VoteError::store(e.to_string()))
    }

    /// Parse JSON bytes.
    ///
    /// # Errors
    /// Returns `Parse` for malformed JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self, VoteError> {
        serde_json::from_slice(bytes).map_err(|e| VoteError::parse(format!("malformed record: {e}")))
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Values with an offset are taken as-is; naive values are local time in `tz`.
#[must_use]
pub fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| local_to_utc(&naive, tz))
}

/// Recover the capture time from a key such as `vote_20251120_140000` or
/// `vote_20251120_140000_2.json`.
#[must_use]
pub fn timestamp_from_key(key: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let stem = key.strip_suffix(".json").unwrap_or(key);
    let stamp = stem.strip_prefix(KEY_PREFIX)?.get(..KEY_STAMP_LEN)?;
    let naive = NaiveDateTime::parse_from_str(stamp, KEY_STAMP_FORMAT).ok()?;
    local_to_utc(&naive, tz)
}

/// Order-preserving key for a capture time, e.g. `vote_20251120_140000`.
#[must_use]
pub fn record_key(captured_at: DateTime<Utc>, tz: Tz) -> String {
    format!(
        "{KEY_PREFIX}{}",
        captured_at.with_timezone(&tz).format(KEY_STAMP_FORMAT)
    )
}

fn local_to_utc(naive: &NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
