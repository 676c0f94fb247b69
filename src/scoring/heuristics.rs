//! Deterministic scoring from structural document features.
//!
//! Used per criterion when a model response omits a line, per track when generation or
//! retrieval is unusable, and for the whole job when the scoring pass itself errors.

use crate::content::DocumentContent;

use super::aggregate::{MAX_SCORE, ScoreMap, clamp_score};
use super::criteria::{Criterion, Track};
use super::types::{CvEvaluation, ProjectEvaluation};

/// Match rate reported by the CV track heuristic.
pub const FALLBACK_MATCH_RATE: f64 = 0.70;

/// Project score reported by the project track heuristic.
pub const FALLBACK_PROJECT_SCORE: f64 = 3.8;

/// Technical score bucketed from the number of extracted skills.
pub fn estimate_technical_score(skill_count: usize) -> f64 {
    match skill_count {
        n if n >= 8 => 4.5,
        n if n >= 5 => 4.0,
        n if n >= 3 => 3.5,
        _ => 3.0,
    }
}

/// Code quality bucketed from code-block and word counts.
pub fn estimate_code_quality(code_blocks: u32, word_count: u32) -> f64 {
    if code_blocks > 5 && word_count > 2000 {
        4.5
    } else if code_blocks > 3 && word_count > 1500 {
        4.0
    } else if code_blocks > 0 && word_count > 1000 {
        3.5
    } else {
        3.0
    }
}

/// Score substituted for a criterion the model response did not mention.
pub fn criterion_default(criterion: Criterion, content: &DocumentContent) -> f64 {
    let data = &content.extracted_data;
    match criterion {
        Criterion::TechnicalSkills => estimate_technical_score(data.skills.len()),
        Criterion::Experience => 3.5,
        Criterion::Achievements => 3.0,
        Criterion::CulturalFit => 3.5,
        Criterion::Correctness => 4.0,
        Criterion::CodeQuality => estimate_code_quality(data.code_blocks, content.word_count),
        Criterion::Resilience => 3.5,
        Criterion::Documentation => 4.0,
        Criterion::Creativity => 3.0,
    }
}

fn track_defaults(track: Track, content: &DocumentContent) -> ScoreMap {
    track
        .criteria()
        .iter()
        .map(|c| (*c, criterion_default(*c, content)))
        .collect()
}

/// CV track result used when generation is exhausted or there was no context.
pub fn fallback_cv(cv: &DocumentContent) -> CvEvaluation {
    let skills = cv.extracted_data.skills.len();
    let mut evaluation = CvEvaluation::from_scores(
        &track_defaults(Track::Cv, cv),
        format!("CV contains {skills} identified technical skills. Further evaluation needed."),
    );
    evaluation.match_rate = FALLBACK_MATCH_RATE;
    evaluation
}

/// Project track result used when generation is exhausted or there was no context.
pub fn fallback_project(project: &DocumentContent) -> ProjectEvaluation {
    let code_blocks = project.extracted_data.code_blocks;
    let mut evaluation = ProjectEvaluation::from_scores(
        &track_defaults(Track::Project, project),
        format!(
            "Project report contains {code_blocks} code blocks across {} words. Further evaluation needed.",
            project.word_count
        ),
    );
    evaluation.score = FALLBACK_PROJECT_SCORE;
    evaluation
}

/// Result stored when the scoring pass as a whole raised.
pub fn job_level_fallback(
    cv: &DocumentContent,
    project: &DocumentContent,
) -> (CvEvaluation, ProjectEvaluation, String) {
    let skills = cv.extracted_data.skills.len();
    let technical = clamp_score(Some(skills as f64 / 2.0));
    let match_rate = technical / MAX_SCORE * 0.8;

    let code_blocks = project.extracted_data.code_blocks;
    let words = project.word_count;
    let overall = clamp_score(Some((code_blocks as f64 + words as f64 / 500.0) / 2.0));

    let cv_evaluation = CvEvaluation {
        match_rate,
        technical_skills: technical,
        experience: 3.0,
        achievements: 3.0,
        cultural_fit: 3.0,
        feedback: format!(
            "CV contains {skills} technical skills. Fallback evaluation used due to RAG failure."
        ),
    };

    let project_evaluation = ProjectEvaluation {
        score: overall,
        correctness: overall,
        code_quality: overall,
        resilience: 3.0,
        documentation: 3.5,
        creativity: 3.0,
        feedback: format!(
            "Project report contains {code_blocks} code blocks and {words} words. Fallback evaluation used."
        ),
    };

    let summary = format!(
        "Fallback evaluation completed. CV match rate: {:.0}%, Project score: {:.1}/5. Manual review recommended.",
        match_rate * 100.0,
        overall
    );

    (cv_evaluation, project_evaluation, summary)
}

/// Coarse band used by the templated summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLevel {
    Strong,
    Good,
    Moderate,
    Weak,
}

impl SummaryLevel {
    pub fn classify(match_rate: f64, project_score: f64) -> Self {
        if match_rate >= 0.8 && project_score >= 4.0 {
            SummaryLevel::Strong
        } else if match_rate >= 0.7 && project_score >= 3.5 {
            SummaryLevel::Good
        } else if match_rate < 0.5 || project_score < 3.0 {
            SummaryLevel::Weak
        } else {
            SummaryLevel::Moderate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLevel::Strong => "strong",
            SummaryLevel::Good => "good",
            SummaryLevel::Moderate => "moderate",
            SummaryLevel::Weak => "weak",
        }
    }
}

/// Summary sentence used when the summary completion fails.
pub fn template_summary(cv: &CvEvaluation, project: &ProjectEvaluation) -> String {
    let level = SummaryLevel::classify(cv.match_rate, project.score);
    let recommendation = match level {
        SummaryLevel::Strong => "Recommended for the next interview stage.",
        SummaryLevel::Good => "Worth considering for the next interview stage.",
        SummaryLevel::Moderate => "Consider with reservations; a technical interview should probe the gaps.",
        SummaryLevel::Weak => "Not recommended at this time.",
    };

    format!(
        "The candidate shows a {} profile with a CV match rate of {:.0}% and a project score of {:.1}/5. {}",
        level.as_str(),
        cv.match_rate * 100.0,
        project.score,
        recommendation
    )
}
