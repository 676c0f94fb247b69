//! Parsing of free-text scoring responses.

use std::sync::LazyLock;

use regex::Regex;

use super::aggregate::ScoreMap;
use super::criteria::{Criterion, Track};

/// Max characters kept from the feedback trailer (or from the raw response without one).
pub const MAX_FEEDBACK_CHARS: usize = 500;

static FEEDBACK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)overall\s+feedback\**\s*:\s*\**\s*(.+?)(?:\n\s*\n|\z)")
        .expect("feedback pattern is valid")
});

static CRITERION_RES: LazyLock<Vec<(Criterion, Regex)>> = LazyLock::new(|| {
    [Track::Cv, Track::Project]
        .iter()
        .flat_map(|track| track.criteria().iter().copied())
        .map(|criterion| {
            let label = regex::escape(criterion.label()).replace(' ', r"\s+");
            let pattern = format!(
                r"(?i)\b{label}[^:\n]{{0,24}}?\**\s*:\s*\**\s*(\d+(?:\.\d+)?)"
            );
            let re = Regex::new(&pattern).expect("criterion pattern is valid");
            (criterion, re)
        })
        .collect()
});

/// What could be recovered from a scoring response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Every criterion of the track was found.
    Parsed { scores: ScoreMap, feedback: String },
    /// Some criteria were found; the rest need substitution.
    PartialParsed {
        scores: ScoreMap,
        missing: Vec<Criterion>,
        feedback: String,
    },
    /// No criterion line was found.
    Unparseable { raw: String },
}

impl ParseOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, ParseOutcome::Parsed { .. })
    }
}

/// Scores `track`'s criteria found in `response`. Values are returned as written, unclamped.
pub fn parse_response(track: Track, response: &str) -> ParseOutcome {
    let mut scores = ScoreMap::new();
    let mut missing = Vec::new();

    for criterion in track.criteria() {
        match find_score(*criterion, response) {
            Some(score) => {
                scores.insert(*criterion, score);
            }
            None => missing.push(*criterion),
        }
    }

    if scores.is_empty() {
        return ParseOutcome::Unparseable {
            raw: response.to_string(),
        };
    }

    let feedback = extract_feedback(response);
    if missing.is_empty() {
        ParseOutcome::Parsed { scores, feedback }
    } else {
        ParseOutcome::PartialParsed {
            scores,
            missing,
            feedback,
        }
    }
}

fn find_score(criterion: Criterion, response: &str) -> Option<f64> {
    let (_, re) = CRITERION_RES.iter().find(|(c, _)| *c == criterion)?;
    re.captures(response)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// The `Overall Feedback:` trailer, or the start of the response when there is none.
pub fn extract_feedback(response: &str) -> String {
    let text = FEEDBACK_RE
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| response.trim());

    truncate_chars(text, MAX_FEEDBACK_CHARS)
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
