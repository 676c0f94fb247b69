use serde::{Deserialize, Serialize};

use super::aggregate::{ScoreMap, clamp_score, cv_match_rate, project_score};
use super::criteria::Criterion;

/// Scores of the CV track. Every criterion score is in `[1, 5]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvEvaluation {
    #[serde(rename = "cv_match_rate")]
    pub match_rate: f64,
    #[serde(rename = "cv_technical_skills_score")]
    pub technical_skills: f64,
    #[serde(rename = "cv_experience_score")]
    pub experience: f64,
    #[serde(rename = "cv_achievements_score")]
    pub achievements: f64,
    #[serde(rename = "cv_cultural_fit_score")]
    pub cultural_fit: f64,
    #[serde(rename = "cv_feedback")]
    pub feedback: String,
}

impl CvEvaluation {
    /// Clamps every score and derives the match rate from them.
    pub fn from_scores(scores: &ScoreMap, feedback: impl Into<String>) -> Self {
        let score = |c: Criterion| clamp_score(scores.get(&c).copied());
        Self {
            match_rate: cv_match_rate(scores),
            technical_skills: score(Criterion::TechnicalSkills),
            experience: score(Criterion::Experience),
            achievements: score(Criterion::Achievements),
            cultural_fit: score(Criterion::CulturalFit),
            feedback: feedback.into(),
        }
    }
}

/// Scores of the project track. Every score, overall included, is in `[1, 5]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectEvaluation {
    #[serde(rename = "project_score")]
    pub score: f64,
    #[serde(rename = "project_correctness_score")]
    pub correctness: f64,
    #[serde(rename = "project_code_quality_score")]
    pub code_quality: f64,
    #[serde(rename = "project_resilience_score")]
    pub resilience: f64,
    #[serde(rename = "project_documentation_score")]
    pub documentation: f64,
    #[serde(rename = "project_creativity_score")]
    pub creativity: f64,
    #[serde(rename = "project_feedback")]
    pub feedback: String,
}

impl ProjectEvaluation {
    /// Clamps every score and derives the overall project score from them.
    pub fn from_scores(scores: &ScoreMap, feedback: impl Into<String>) -> Self {
        let score = |c: Criterion| clamp_score(scores.get(&c).copied());
        Self {
            score: project_score(scores),
            correctness: score(Criterion::Correctness),
            code_quality: score(Criterion::CodeQuality),
            resilience: score(Criterion::Resilience),
            documentation: score(Criterion::Documentation),
            creativity: score(Criterion::Creativity),
            feedback: feedback.into(),
        }
    }
}

/// How a scoring step produced its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagStatus {
    /// Generated from retrieved context.
    Completed,
    /// Heuristic result because retrieval was unavailable or empty.
    Fallback,
    /// Heuristic result because generation failed.
    Failed,
}

/// Degradation record attached to every evaluation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringMetadata {
    pub cv_rag_status: RagStatus,
    pub project_rag_status: RagStatus,
    pub summary_status: RagStatus,
    pub rag_status: RagStatus,
    /// Criteria whose score was substituted because the response lacked them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substituted_criteria: Vec<Criterion>,
    /// The whole scoring pass failed and the job-level fallback was stored instead.
    #[serde(default)]
    pub job_level_fallback: bool,
}

impl ScoringMetadata {
    pub fn new(cv: RagStatus, project: RagStatus, summary: RagStatus) -> Self {
        Self {
            cv_rag_status: cv,
            project_rag_status: project,
            summary_status: summary,
            rag_status: overall_status([cv, project, summary]),
            substituted_criteria: Vec::new(),
            job_level_fallback: false,
        }
    }

    pub fn job_level_fallback() -> Self {
        Self {
            job_level_fallback: true,
            ..Self::new(RagStatus::Failed, RagStatus::Failed, RagStatus::Failed)
        }
    }
}

/// `Failed` if any step failed generation, else `Fallback` if any step lacked context.
pub fn overall_status(statuses: impl IntoIterator<Item = RagStatus>) -> RagStatus {
    statuses
        .into_iter()
        .fold(RagStatus::Completed, |acc, status| match (acc, status) {
            (RagStatus::Failed, _) | (_, RagStatus::Failed) => RagStatus::Failed,
            (RagStatus::Fallback, _) | (_, RagStatus::Fallback) => RagStatus::Fallback,
            _ => RagStatus::Completed,
        })
}

/// Result of scoring one track.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackOutcome<T> {
    pub evaluation: T,
    pub status: RagStatus,
    pub substituted: Vec<Criterion>,
}

impl<T> TrackOutcome<T> {
    pub fn fallback(evaluation: T, status: RagStatus) -> Self {
        Self {
            evaluation,
            status,
            substituted: Vec::new(),
        }
    }
}

/// Output of a full scoring pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub cv: CvEvaluation,
    pub project: ProjectEvaluation,
    pub overall_summary: String,
    pub metadata: ScoringMetadata,
}
