//! Score clamping and weighted aggregation.

use std::collections::BTreeMap;

use super::criteria::{Criterion, Track};

/// Per-criterion scores of one track.
pub type ScoreMap = BTreeMap<Criterion, f64>;

pub const MIN_SCORE: f64 = 1.0;
pub const MAX_SCORE: f64 = 5.0;
pub const NEUTRAL_SCORE: f64 = 3.0;

pub const MIN_MATCH_RATE: f64 = 0.1;
pub const MAX_MATCH_RATE: f64 = 0.99;

/// Clamps a score to `[1.0, 5.0]`; absent or non-finite input yields `3.0`.
pub fn clamp_score(score: Option<f64>) -> f64 {
    match score {
        Some(value) if value.is_finite() => value.clamp(MIN_SCORE, MAX_SCORE),
        _ => NEUTRAL_SCORE,
    }
}

/// Weighted sum over `track`'s criteria. Missing criteria count as the neutral score.
pub fn weighted_score(track: Track, scores: &ScoreMap) -> f64 {
    track
        .criteria()
        .iter()
        .map(|c| clamp_score(scores.get(c).copied()) * c.weight())
        .sum()
}

/// CV match rate in `[0.1, 0.99]`.
pub fn cv_match_rate(scores: &ScoreMap) -> f64 {
    (weighted_score(Track::Cv, scores) / MAX_SCORE).clamp(MIN_MATCH_RATE, MAX_MATCH_RATE)
}

/// Project score in `[1.0, 5.0]`.
pub fn project_score(scores: &ScoreMap) -> f64 {
    clamp_score(Some(weighted_score(Track::Project, scores)))
}
