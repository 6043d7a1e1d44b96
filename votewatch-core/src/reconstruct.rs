//! Monotonic cumulative-gain reconstruction.
//!
//! The vendor only publishes percentage shares. The engine infers a points
//! and money ledger from the history of those shares:
//!
//! 1. Snapshots are stably sorted by capture time.
//! 2. The candidate universe is the union of codes over the whole history.
//! 3. For each snapshot and candidate, a positive move of the share since the
//!    previous snapshot is credited as `delta / 100 * base_total_votes`
//!    points. Drops and flat moves credit nothing; the raw share is still
//!    tracked so a later recovery only counts above the last observed value.
//! 4. A candidate missing from a snapshot keeps its previous share and earns
//!    nothing for that step.
//!
//! Accumulation happens at full `f64` precision. Integer rounding is applied
//! only by the presentation helpers ([`CandidateLedgerEntry::rounded`],
//! [`Reconstruction::summary`]).

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{CandidateCode, OpeningBaseline, RateConfig, Snapshot};

/// Ledger state of one candidate after one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateLedgerEntry {
    /// Candidate this entry belongs to.
    pub candidate: CandidateCode,
    /// Position of the snapshot in chronological order.
    pub snapshot_index: usize,
    /// Share at this snapshot; carried forward when the candidate was absent.
    pub percentage: f64,
    /// Whether the snapshot actually reported this candidate.
    pub observed: bool,
    /// Points accumulated up to and including this snapshot.
    pub cumulative_points: f64,
    /// `cumulative_points * baht_per_point`.
    pub cumulative_money: f64,
    /// Points credited by this snapshot alone.
    pub points_added: f64,
    /// Money credited by this snapshot alone.
    pub money_added: f64,
}

impl CandidateLedgerEntry {
    /// Integer view for display.
    #[must_use]
    pub fn rounded(&self) -> RoundedEntry {
        RoundedEntry {
            percentage: self.percentage,
            points: present(self.cumulative_points),
            money: present(self.cumulative_money),
            points_added: present(self.points_added),
            money_added: present(self.money_added),
        }
    }
}

/// Presentation form of a ledger entry, rounded half away from zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoundedEntry {
    /// Raw share, unrounded.
    pub percentage: f64,
    /// Cumulative points.
    pub points: i64,
    /// Cumulative money.
    pub money: i64,
    /// Points credited by this step.
    pub points_added: i64,
    /// Money credited by this step.
    pub money_added: i64,
}

/// Every candidate's ledger entry at one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerStep {
    /// Position in chronological order.
    pub snapshot_index: usize,
    /// Capture time of the snapshot.
    pub captured_at: DateTime<Utc>,
    /// One entry per candidate of the universe.
    pub entries: BTreeMap<CandidateCode, CandidateLedgerEntry>,
    /// Sum of cumulative points over all candidates.
    pub total_points: f64,
    /// Sum of cumulative money over all candidates.
    pub total_money: f64,
}

impl LedgerStep {
    /// Entry for `candidate`, if it belongs to the universe.
    #[must_use]
    pub fn entry(&self, candidate: &str) -> Option<&CandidateLedgerEntry> {
        self.entries.get(candidate)
    }
}

/// Latest standing of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSummary {
    /// Candidate code.
    pub candidate: CandidateCode,
    /// Latest share.
    pub percentage: f64,
    /// Rounded cumulative points.
    pub points: i64,
    /// Rounded cumulative money.
    pub money: i64,
}

/// Full reconstructed ledger, one step per input snapshot in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconstruction {
    rates: RateConfig,
    steps: Vec<LedgerStep>,
}

impl Reconstruction {
    /// Rates the ledger was computed with.
    #[must_use]
    pub const fn rates(&self) -> &RateConfig {
        &self.rates
    }

    /// All steps, oldest first.
    #[must_use]
    pub fn steps(&self) -> &[LedgerStep] {
        &self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True for an empty history.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Candidate universe, sorted by code.
    pub fn candidates(&self) -> impl Iterator<Item = &CandidateCode> {
        self.steps.first().into_iter().flat_map(|s| s.entries.keys())
    }

    /// Entry of `candidate` at chronological position `snapshot_index`.
    #[must_use]
    pub fn entry(&self, candidate: &str, snapshot_index: usize) -> Option<&CandidateLedgerEntry> {
        self.steps.get(snapshot_index)?.entry(candidate)
    }

    /// All entries of `candidate`, oldest first.
    pub fn history<'a>(
        &'a self,
        candidate: &'a str,
    ) -> impl Iterator<Item = &'a CandidateLedgerEntry> + 'a {
        self.steps.iter().filter_map(move |s| s.entry(candidate))
    }

    /// The last step captured at or before `at`.
    #[must_use]
    pub fn at(&self, at: DateTime<Utc>) -> Option<&LedgerStep> {
        let idx = self.steps.partition_point(|s| s.captured_at <= at);
        idx.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// The most recent step.
    #[must_use]
    pub fn latest(&self) -> Option<&LedgerStep> {
        self.steps.last()
    }

    /// Latest standings, highest cumulative points first (ties by code).
    #[must_use]
    pub fn summary(&self) -> Vec<CandidateSummary> {
        let Some(last) = self.latest() else {
            return Vec::new();
        };
        let mut entries: Vec<&CandidateLedgerEntry> = last.entries.values().collect();
        entries.sort_by(|a, b| {
            b.cumulative_points
                .total_cmp(&a.cumulative_points)
                .then_with(|| a.candidate.cmp(&b.candidate))
        });
        entries
            .into_iter()
            .map(|e| CandidateSummary {
                candidate: e.candidate.clone(),
                percentage: e.percentage,
                points: present(e.cumulative_points),
                money: present(e.cumulative_money),
            })
            .collect()
    }
}

/// Rebuild the points/money ledger from a snapshot history.
///
/// Input order does not matter beyond ties: snapshots are stably sorted by
/// capture time first. An empty input yields an empty reconstruction; a
/// snapshot without candidates is a step where nothing changes.
/// Non-finite percentages are treated as absent.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "votewatch_core::reconstruct",
        level = "debug",
        skip_all,
        fields(snapshots = snapshots.len()),
    )
)]
#[must_use]
pub fn reconstruct(snapshots: &[Snapshot], rates: &RateConfig) -> Reconstruction {
    let mut ordered: Vec<&Snapshot> = snapshots.iter().collect();
    ordered.sort_by_key(|s| s.captured_at);

    let universe: BTreeSet<&CandidateCode> =
        ordered.iter().flat_map(|s| s.percentages.keys()).collect();
    let mut last: BTreeMap<&CandidateCode, f64> = universe.iter().map(|c| (*c, 0.0)).collect();
    let mut cumulative: BTreeMap<&CandidateCode, f64> =
        universe.iter().map(|c| (*c, 0.0)).collect();

    if rates.opening_baseline == OpeningBaseline::FirstSnapshot
        && let Some(first) = ordered.first()
    {
        for (code, pct) in &first.percentages {
            if pct.is_finite() {
                last.insert(code, *pct);
            }
        }
    }

    let mut steps = Vec::with_capacity(ordered.len());
    for (snapshot_index, snapshot) in ordered.iter().enumerate() {
        let mut entries = BTreeMap::new();
        let mut total_points = 0.0;
        for code in &universe {
            let previous = last.get(*code).copied().unwrap_or(0.0);
            let reported = snapshot
                .percentages
                .get(*code)
                .copied()
                .filter(|p| p.is_finite());
            let current = reported.unwrap_or(previous);
            let delta = current - previous;
            let points_added = if delta > 0.0 {
                rates.points_for_gain(delta)
            } else {
                0.0
            };

            let points = cumulative.entry(*code).or_insert(0.0);
            *points += points_added;
            let cumulative_points = *points;
            total_points += cumulative_points;
            last.insert(*code, current);

            entries.insert(
                (*code).clone(),
                CandidateLedgerEntry {
                    candidate: (*code).clone(),
                    snapshot_index,
                    percentage: current,
                    observed: reported.is_some(),
                    cumulative_points,
                    cumulative_money: rates.money_for_points(cumulative_points),
                    points_added,
                    money_added: rates.money_for_points(points_added),
                },
            );
        }
        steps.push(LedgerStep {
            snapshot_index,
            captured_at: snapshot.captured_at,
            entries,
            total_points,
            total_money: rates.money_for_points(total_points),
        });
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(
        steps = steps.len(),
        candidates = universe.len(),
        "ledger reconstructed"
    );

    Reconstruction {
        rates: *rates,
        steps,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn present(value: f64) -> i64 {
    value.round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hour(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 20, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn series(code: &str, pcts: &[f64]) -> Vec<Snapshot> {
        pcts.iter()
            .enumerate()
            .map(|(i, p)| Snapshot::from_pairs(hour(i as i64), [(code, *p)]).unwrap())
            .collect()
    }

    fn points_of(rec: &Reconstruction, code: &str) -> Vec<i64> {
        rec.history(code).map(|e| e.rounded().points).collect()
    }

    fn money_of(rec: &Reconstruction, code: &str) -> Vec<i64> {
        rec.history(code).map(|e| e.rounded().money).collect()
    }

    #[test]
    fn drop_after_gain_credits_nothing() {
        let rec = reconstruct(&series("X", &[10.0, 12.5, 11.0]), &RateConfig::default());
        assert_eq!(points_of(&rec, "X"), vec![0, 2500, 2500]);
        assert_eq!(money_of(&rec, "X"), vec![0, 10_000, 10_000]);
        assert_eq!(rec.entry("X", 2).unwrap().points_added, 0.0);
    }

    #[test]
    fn recovery_counts_only_above_last_raw_share() {
        let rec = reconstruct(&series("X", &[10.0, 12.0, 11.0, 13.0]), &RateConfig::default());
        assert_eq!(points_of(&rec, "X"), vec![0, 2000, 2000, 4000]);
    }

    #[test]
    fn zero_baseline_credits_the_opening_share() {
        let rates = RateConfig::default().with_opening_baseline(OpeningBaseline::Zero);
        let rec = reconstruct(&series("X", &[10.0, 12.5, 11.0]), &rates);
        assert_eq!(points_of(&rec, "X"), vec![10_000, 12_500, 12_500]);
    }

    #[test]
    fn candidates_are_independent() {
        let a = [0.0, 5.0, 5.0, 8.0];
        let b = [0.0, 0.0, 3.0, 3.0];
        let snaps: Vec<Snapshot> = (0..4)
            .map(|i| Snapshot::from_pairs(hour(i as i64), [("A", a[i]), ("B", b[i])]).unwrap())
            .collect();
        let rec = reconstruct(&snaps, &RateConfig::default());
        assert_eq!(points_of(&rec, "A"), vec![0, 5000, 5000, 8000]);
        assert_eq!(points_of(&rec, "B"), vec![0, 0, 3000, 3000]);
        assert_eq!(present(rec.latest().unwrap().total_points), 11_000);
        assert_eq!(present(rec.latest().unwrap().total_money), 44_000);
    }

    #[test]
    fn late_candidate_counts_its_first_share() {
        let snaps = vec![
            Snapshot::from_pairs(hour(0), [("A", 10.0)]).unwrap(),
            Snapshot::from_pairs(hour(1), [("A", 10.0), ("B", 2.0)]).unwrap(),
        ];
        let rec = reconstruct(&snaps, &RateConfig::default());
        let b0 = rec.entry("B", 0).unwrap();
        assert!(!b0.observed);
        assert_eq!(b0.percentage, 0.0);
        assert_eq!(rec.entry("B", 1).unwrap().rounded().points, 2000);
    }

    #[test]
    fn missing_candidate_keeps_its_share_and_total() {
        let snaps = vec![
            Snapshot::from_pairs(hour(0), [("A", 1.0), ("B", 1.0)]).unwrap(),
            Snapshot::from_pairs(hour(1), [("A", 3.0), ("B", 2.0)]).unwrap(),
            Snapshot::from_pairs(hour(2), [("A", 4.0)]).unwrap(),
            Snapshot::from_pairs(hour(3), [("A", 4.0), ("B", 2.5)]).unwrap(),
        ];
        let rec = reconstruct(&snaps, &RateConfig::default());
        let gap = rec.entry("B", 2).unwrap();
        assert!(!gap.observed);
        assert_eq!(gap.percentage, 2.0);
        assert_eq!(gap.points_added, 0.0);
        assert_eq!(points_of(&rec, "B"), vec![0, 1000, 1000, 1500]);
    }

    #[test]
    fn empty_input_and_empty_snapshots() {
        let rec = reconstruct(&[], &RateConfig::default());
        assert!(rec.is_empty());
        assert!(rec.summary().is_empty());
        assert!(rec.latest().is_none());

        let snaps = vec![
            Snapshot::from_pairs(hour(0), [("A", 1.0)]).unwrap(),
            Snapshot::from_pairs(hour(1), []).unwrap(),
            Snapshot::from_pairs(hour(2), [("A", 2.0)]).unwrap(),
        ];
        let rec = reconstruct(&snaps, &RateConfig::default());
        assert_eq!(rec.len(), 3);
        assert_eq!(points_of(&rec, "A"), vec![0, 0, 1000]);
    }

    #[test]
    fn unordered_input_is_sorted_by_capture_time() {
        let mut snaps = series("X", &[10.0, 12.5, 11.0]);
        snaps.reverse();
        let rec = reconstruct(&snaps, &RateConfig::default());
        assert_eq!(points_of(&rec, "X"), vec![0, 2500, 2500]);
        assert_eq!(rec.steps()[0].captured_at, hour(0));
    }

    #[test]
    fn accumulation_keeps_full_precision() {
        // Ten gains of 0.0015%, 1.5 points each.
        let pcts: Vec<f64> = (0..=10).map(|i| 1.0 + f64::from(i) * 0.0015).collect();
        let rec = reconstruct(&series("X", &pcts), &RateConfig::default());
        let last = rec.latest().unwrap().entry("X").unwrap();
        assert!((last.cumulative_points - 15.0).abs() < 1e-6);
        assert_eq!(last.rounded().points, 15);
    }

    #[test]
    fn lookup_by_time_and_summary_order() {
        let snaps = vec![
            Snapshot::from_pairs(hour(0), [("A", 1.0), ("B", 1.0)]).unwrap(),
            Snapshot::from_pairs(hour(2), [("A", 2.0), ("B", 4.0)]).unwrap(),
        ];
        let rec = reconstruct(&snaps, &RateConfig::default());
        assert_eq!(rec.at(hour(1)).unwrap().snapshot_index, 0);
        assert_eq!(rec.at(hour(2)).unwrap().snapshot_index, 1);
        assert!(rec.at(hour(-1)).is_none());

        let summary = rec.summary();
        assert_eq!(summary[0].candidate.as_str(), "B");
        assert_eq!(summary[0].points, 3000);
        assert_eq!(summary[0].money, 12_000);
        assert_eq!(summary[1].candidate.as_str(), "A");

        let codes: Vec<&str> = rec.candidates().map(CandidateCode::as_str).collect();
        assert_eq!(codes, vec!["A", "B"]);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(present(2.5), 3);
        assert_eq!(present(1.4999), 1);
        assert_eq!(present(0.0), 0);
    }
}
