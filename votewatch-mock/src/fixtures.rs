use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use votewatch_core::{CandidateCode, CandidateInfo, Snapshot};

const PAIRS: [(&str, &str, &str); 5] = [
    ("YND01", "Force & Book", "My Love Mix-Up"),
    ("YND03", "Jimmy & Sea", "Vampire Project"),
    ("YND06", "Pond & Phuwin", "Fourever You"),
    ("YND09", "Gemini & Fourth", "My Golden Blood"),
    ("YND12", "Joong & Dunk", "Hidden Agenda"),
];

// Hourly shares in percent, one column per pair above. The dips and the
// missing YND12 reading (None) mirror what the live page does.
const HOURLY: [[Option<f64>; 5]; 8] = [
    [Some(20.10), Some(8.40), Some(38.55), Some(11.20), Some(6.00)],
    [Some(20.35), Some(8.40), Some(38.90), Some(11.05), Some(6.10)],
    [Some(20.30), Some(8.75), Some(39.40), Some(11.05), None],
    [Some(20.80), Some(8.70), Some(39.35), Some(11.30), Some(6.25)],
    [Some(21.05), Some(8.95), Some(39.80), Some(11.30), Some(6.25)],
    [Some(21.00), Some(9.10), Some(40.05), Some(11.55), Some(6.40)],
    [Some(21.35), Some(9.10), Some(40.10), Some(11.60), Some(6.35)],
    [Some(21.60), Some(9.25), Some(40.45), Some(11.95), Some(6.50)],
];

/// Capture time of the first fixture snapshot (2025-11-20 09:00 Asia/Bangkok).
#[must_use]
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 20, 2, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Display metadata for every fixture pair.
#[must_use]
pub fn candidates() -> BTreeMap<CandidateCode, CandidateInfo> {
    PAIRS
        .iter()
        .filter_map(|(code, names, series)| {
            Some((
                CandidateCode::new(code).ok()?,
                CandidateInfo {
                    names: (*names).to_string(),
                    series: (*series).to_string(),
                },
            ))
        })
        .collect()
}

/// Eight hourly snapshots of the five fixture pairs, oldest first.
#[must_use]
pub fn history() -> Vec<Snapshot> {
    let meta = candidates();
    HOURLY
        .iter()
        .enumerate()
        .map(|(hour, row)| {
            let percentages: BTreeMap<CandidateCode, f64> = PAIRS
                .iter()
                .zip(row)
                .filter_map(|((code, _, _), pct)| Some((CandidateCode::new(code).ok()?, (*pct)?)))
                .collect();
            let mut candidates = meta.clone();
            candidates.retain(|code, _| percentages.contains_key(code));
            Snapshot {
                captured_at: start() + Duration::hours(i64::try_from(hour).unwrap_or(0)),
                percentages,
                candidates,
                category: Some("The Best Couple".to_string()),
                source_url: None,
            }
        })
        .collect()
}
