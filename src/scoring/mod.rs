//! Retrieval-augmented scoring of a CV and project report.
//!
//! [`RagScorer`] retrieves reference chunks per track, asks the completion provider for
//! per-criterion scores in a strict line format, and aggregates them into a CV match rate and
//! a project score. Every step degrades to deterministic [`heuristics`]:
//!
//! - no reachable store or no retrieved context: track heuristic, status `fallback`
//! - generation exhausted its retries: track heuristic, status `failed`
//! - a criterion line is missing: that criterion alone is substituted
//!
//! Degradations are recorded in [`ScoringMetadata`] on the result instead of failing the job.

pub mod aggregate;
pub mod criteria;
pub mod engine;
pub mod error;
pub mod heuristics;
pub mod parser;
pub mod prompts;
pub mod retriever;
pub mod types;


pub use aggregate::{ScoreMap, clamp_score, cv_match_rate, project_score};
pub use criteria::{Criterion, Track};
pub use engine::{
    EvaluationStage, RagScorer, ResolvedScores, Scorer, ScoringConfig, StageSink, resolve_scores,
};
pub use error::{ScoringError, ScoringResult};
pub use parser::{ParseOutcome, parse_response};
pub use retriever::ContextRetriever;
pub use types::{
    CvEvaluation, EvaluationOutcome, ProjectEvaluation, RagStatus, ScoringMetadata, TrackOutcome,
};
