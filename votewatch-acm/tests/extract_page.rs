mod helpers;

use chrono::{TimeZone, Utc};
use helpers::CHART_PAGE;
use proptest::prelude::*;
use url::Url;
use votewatch_acm::{ChartJsExtractor, HttpPage, PageExtractor};
use votewatch_core::{ErrorKind, VoteError};

fn page(body: &str) -> HttpPage {
    HttpPage {
        final_url: Url::parse("https://vendor.test/yna2025/votesummary.php?tpid=4").unwrap(),
        status: 200,
        body: body.to_string(),
    }
}

fn at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 20, 7, 0, 0).unwrap()
}

#[test]
fn chart_page_yields_percentages_and_metadata() {
    let snap = ChartJsExtractor::default().extract(&page(CHART_PAGE), at()).unwrap();

    assert_eq!(snap.captured_at, at());
    assert_eq!(snap.percentages.len(), 3);
    assert_eq!(snap.percentage("YND01"), Some(21.35));
    assert_eq!(snap.candidates["YND01"].names, "Force & Book");
    assert_eq!(snap.candidates["YND01"].series, "My Love Mix-Up");
    assert_eq!(snap.candidates["YND09"].series, "");
    assert_eq!(
        snap.source_url.as_deref(),
        Some("https://vendor.test/yna2025/votesummary.php?tpid=4")
    );
}

#[test]
fn labels_without_numbers_are_dropped() {
    let body = r#"<script>new Chart(c, {data: {labels: ['YND01','YND02','YND03'],
        datasets: [{data: [10.5, 3]}]}});</script>"#;
    let snap = ChartJsExtractor::default().extract(&page(body), at()).unwrap();
    assert_eq!(snap.percentages.len(), 2);
    assert_eq!(snap.percentage("YND03"), None);
    assert_eq!(snap.category.as_deref(), Some("The Best Couple"));
}

#[test]
fn pages_without_chart_data_are_parse_errors() {
    let ex = ChartJsExtractor::default();
    for body in [
        "",
        "<html><body>Please log in</body></html>",
        "<script>var x = { labels: ['YND01'], data: [1] };</script>",
        "<script>new Chart(c, {labels: [], data: []})</script>",
        "<script>new Chart(c, {labels: ['YND01'], data: ['n/a']})</script>",
    ] {
        let err = ex.extract(&page(body), at()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse, "body: {body}");
    }
}

#[test]
fn out_of_range_percentages_are_rejected_not_clamped() {
    let body = "<script>new Chart(c, {labels: ['YND01','YND02'], data: [101.0, 4]})</script>";
    let err = ChartJsExtractor::default().extract(&page(body), at()).unwrap_err();
    assert!(matches!(err, VoteError::Parse(_)));
}

#[test]
fn first_usable_chart_script_wins() {
    let body = r#"
        <script>Chart.defaults.font.size = 12;</script>
        <script>new Chart(a, {labels: ['YND02'], data: [7]})</script>
        <script>new Chart(b, {labels: ['YND03'], data: [9]})</script>"#;
    let snap = ChartJsExtractor::default().extract(&page(body), at()).unwrap();
    assert_eq!(snap.percentage("YND02"), Some(7.0));
    assert_eq!(snap.percentage("YND03"), None);
}

#[test]
fn custom_prefix_and_category() {
    let body = r#"<ul><li>ABC7 : Solo</li></ul>
        <script>new Chart(c, {labels: ['ABC7'], data: [50]})</script>"#;
    let ex = ChartJsExtractor::new("ABC").with_default_category("Best Solo");
    let snap = ex.extract(&page(body), at()).unwrap();
    assert_eq!(snap.candidates["ABC7"].names, "Solo");
    assert_eq!(snap.category.as_deref(), Some("Best Solo"));
}

proptest! {
    #[test]
    fn never_panics_on_arbitrary_pages(body in ".{0,400}") {
        let _ = ChartJsExtractor::default().extract(&page(&body), at());
    }

    #[test]
    fn never_panics_on_chart_shaped_noise(
        labels in "[A-Z0-9'\", ]{0,40}",
        data in "[0-9.'\", -]{0,40}",
    ) {
        let body = format!("<script>new Chart(c, {{labels: [{labels}], data: [{data}]}})</script>");
        if let Ok(snap) = ChartJsExtractor::default().extract(&page(&body), at()) {
            prop_assert!(snap.percentages.values().all(|p| (0.0..=100.0).contains(p)));
        }
    }
}
