use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use votewatch_core::{CandidateCode, CandidateInfo, Snapshot, VoteError, validate_percentage};

use crate::adapter::HttpPage;
use crate::html;

/// Turns a fetched data page into a snapshot.
pub trait PageExtractor: Send + Sync {
    /// Extract every candidate's percentage from `page`.
    ///
    /// # Errors
    /// Returns `Parse` when the page carries no usable percentage data.
    /// Implementations never fill in missing values.
    fn extract(&self, page: &HttpPage, captured_at: DateTime<Utc>) -> Result<Snapshot, VoteError>;
}

/// Reads the Chart.js configuration embedded in the vote summary page.
///
/// The first `<script>` mentioning `Chart` that has both a `labels: [...]`
/// and a `data: [...]` array wins. Labels pair with numbers by position;
/// numbers may be quoted or bare. Labels without a number are dropped.
/// Display names come from page text lines shaped like
/// `YND06 : Name A & Name B (Series)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartJsExtractor {
    code_prefix: String,
    default_category: String,
}

impl Default for ChartJsExtractor {
    fn default() -> Self {
        Self {
            code_prefix: "YND".to_string(),
            default_category: "The Best Couple".to_string(),
        }
    }
}

impl ChartJsExtractor {
    /// Extractor for candidate codes starting with `code_prefix`.
    #[must_use]
    pub fn new(code_prefix: impl Into<String>) -> Self {
        Self {
            code_prefix: code_prefix.into(),
            ..Self::default()
        }
    }

    /// Category recorded when the page has no header.
    #[must_use]
    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    fn candidates(&self, body: &str) -> BTreeMap<CandidateCode, CandidateInfo> {
        html::text_lines(body)
            .iter()
            .filter_map(|line| parse_candidate_line(line, &self.code_prefix))
            .collect()
    }

    fn category(&self, body: &str) -> String {
        ["h1", "h2", "h3"]
            .iter()
            .flat_map(|h| html::elements(body, h))
            .find(|(tag, _)| {
                html::attr(tag, "class").is_some_and(|c| c.to_ascii_lowercase().contains("header"))
            })
            .map(|(_, inner)| html::inner_text(inner))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| self.default_category.clone())
    }
}

impl PageExtractor for ChartJsExtractor {
    fn extract(&self, page: &HttpPage, captured_at: DateTime<Utc>) -> Result<Snapshot, VoteError> {
        let (labels, data) = chart_arrays(&page.body)
            .ok_or_else(|| VoteError::parse("no chart labels/data arrays in page"))?;
        let labels = parse_labels(labels);
        let numbers = parse_numbers(data)?;
        if labels.is_empty() || numbers.is_empty() {
            return Err(VoteError::parse("chart arrays are empty"));
        }

        let mut percentages = BTreeMap::new();
        for (label, pct) in labels.iter().zip(numbers) {
            let code = CandidateCode::new(label)
                .map_err(|e| VoteError::parse(format!("bad chart label {label:?}: {e}")))?;
            validate_percentage(&code, pct)?;
            if percentages.insert(code, pct).is_some() {
                return Err(VoteError::parse(format!("chart label {label} repeated")));
            }
        }

        let mut candidates = self.candidates(&page.body);
        candidates.retain(|code, _| percentages.contains_key(code));

        Ok(Snapshot::new(captured_at, percentages)?
            .with_candidates(candidates)
            .with_category(self.category(&page.body))
            .with_source_url(page.final_url.as_str()))
    }
}

fn chart_arrays(body: &str) -> Option<(&str, &str)> {
    html::elements(body, "script")
        .into_iter()
        .filter(|(_, script)| script.contains("Chart"))
        .find_map(|(_, script)| {
            let labels = array_after(script, "labels")?;
            let data = array_after(script, "data")?;
            (!labels.trim().is_empty() && !data.trim().is_empty()).then_some((labels, data))
        })
}

/// Inner text of the first `key: [ ... ]` array in `script`.
fn array_after<'a>(script: &'a str, key: &str) -> Option<&'a str> {
    let mut from = 0;
    while let Some(rel) = script[from..].find(key) {
        let start = from + rel;
        from = start + key.len();
        let word_start = script[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        if !word_start {
            continue;
        }
        let rest = script[from..].trim_start();
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix('[') else {
            continue;
        };
        let end = rest.find(']')?;
        return Some(&rest[..end]);
    }
    None
}

fn parse_labels(inner: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '"' || c == '\'' {
            let label: String = chars.by_ref().take_while(|&n| n != c).collect();
            let label = label.trim();
            if !label.is_empty() {
                out.push(label.to_string());
            }
        }
    }
    out
}

fn parse_numbers(inner: &str) -> Result<Vec<f64>, VoteError> {
    inner
        .split(',')
        .map(|tok| tok.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| VoteError::parse(format!("chart value {tok:?} is not a number")))
        })
        .collect()
}

fn parse_candidate_line(line: &str, prefix: &str) -> Option<(CandidateCode, CandidateInfo)> {
    let start = line.find(prefix)?;
    let after_prefix = &line[start + prefix.len()..];
    let digits = after_prefix
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(after_prefix.len());
    if digits == 0 {
        return None;
    }
    let code = &line[start..start + prefix.len() + digits];
    let rest = after_prefix[digits..].trim_start().strip_prefix(':')?.trim();

    let (names, series) = match (rest.rfind('('), rest.strip_suffix(')')) {
        (Some(open), Some(_)) => (
            rest[..open].trim(),
            rest[open + 1..rest.len() - 1].trim(),
        ),
        _ => (rest, ""),
    };
    if names.is_empty() {
        return None;
    }
    let code = CandidateCode::new(code).ok()?;
    Some((
        code,
        CandidateInfo {
            names: names.to_string(),
            series: series.to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_lookup_skips_longer_keys() {
        let script = "datasets: [{ label: 'Votes', data: ['1.5', 2] }], labels: [\"A\"]";
        assert_eq!(array_after(script, "data"), Some("'1.5', 2"));
        assert_eq!(array_after(script, "labels"), Some("\"A\""));
        assert_eq!(array_after("metadata: [1]", "data"), None);
    }

    #[test]
    fn numbers_accept_quoted_and_bare_values() {
        assert_eq!(parse_numbers(" \"0.32\", 12 ,'7.5',").unwrap(), vec![0.32, 12.0, 7.5]);
        assert!(parse_numbers("1, n/a").is_err());
    }

    #[test]
    fn candidate_lines_split_names_and_series() {
        let (code, info) =
            parse_candidate_line("YND06 : Pond Naravit & Phuwin (Fourever You)", "YND").unwrap();
        assert_eq!(code.as_str(), "YND06");
        assert_eq!(info.names, "Pond Naravit & Phuwin");
        assert_eq!(info.series, "Fourever You");

        let (_, info) = parse_candidate_line("YND11: Solo Name", "YND").unwrap();
        assert_eq!(info.series, "");
        assert!(parse_candidate_line("YND : nobody", "YND").is_none());
        assert!(parse_candidate_line("Vote now", "YND").is_none());
    }
}
