use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use crate::content::DocumentContent;
use crate::llm::{CompletionOptions, CompletionProvider, LlmError, RetryPolicy, complete_and_parse};
use crate::llm::{DEFAULT_SUMMARY_MAX_TOKENS, LlmConfig};
use crate::vectordb::VectorDbClient;

use super::aggregate::ScoreMap;
use super::criteria::{Criterion, Track};
use super::error::{ScoringError, ScoringResult};
use super::heuristics::{criterion_default, fallback_cv, fallback_project, template_summary};
use super::parser::{ParseOutcome, parse_response};
use super::prompts;
use super::retriever::ContextRetriever;
use super::types::{
    CvEvaluation, EvaluationOutcome, ProjectEvaluation, RagStatus, ScoringMetadata, TrackOutcome,
};

/// Points in a scoring pass reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationStage {
    RetrievalStarted,
    CvScored,
    ProjectScored,
    SummaryGenerated,
}

impl EvaluationStage {
    /// Task progress reached at this stage.
    pub fn percent(&self) -> u8 {
        match self {
            EvaluationStage::RetrievalStarted => 40,
            EvaluationStage::CvScored => 60,
            EvaluationStage::ProjectScored => 75,
            EvaluationStage::SummaryGenerated => 85,
        }
    }
}

/// Callback receiving [`EvaluationStage`]s.
pub type StageSink<'a> = &'a (dyn Fn(EvaluationStage) + Send + Sync);

/// Produces an evaluation for one CV and project pair.
#[async_trait]
pub trait Scorer: Send + Sync {
    async fn evaluate(
        &self,
        job_title: &str,
        cv: &DocumentContent,
        project: &DocumentContent,
        on_stage: StageSink<'_>,
    ) -> ScoringResult<EvaluationOutcome>;
}

#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub completion: CompletionOptions,
    pub summary_max_tokens: u32,
    pub retry: RetryPolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            completion: CompletionOptions::default(),
            summary_max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
            retry: RetryPolicy::default(),
        }
    }
}

impl ScoringConfig {
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn completion(mut self, completion: CompletionOptions) -> Self {
        self.completion = completion;
        self
    }
}

impl From<&LlmConfig> for ScoringConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            completion: CompletionOptions {
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            },
            summary_max_tokens: config.summary_max_tokens,
            retry: config.retry,
        }
    }
}

/// Scores clamped and completed with per-criterion substitutes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedScores {
    pub scores: ScoreMap,
    pub feedback: String,
    pub substituted: Vec<Criterion>,
}

/// Applies per-criterion substitution to a parsed response.
///
/// `Unparseable` is rejected so the caller can retry the completion.
pub fn resolve_scores(
    track: Track,
    outcome: ParseOutcome,
    content: &DocumentContent,
) -> Result<ResolvedScores, LlmError> {
    let (mut scores, missing, feedback) = match outcome {
        ParseOutcome::Parsed { scores, feedback } => (scores, Vec::new(), feedback),
        ParseOutcome::PartialParsed {
            scores,
            missing,
            feedback,
        } => (scores, missing, feedback),
        ParseOutcome::Unparseable { raw } => {
            return Err(LlmError::MalformedResponse {
                reason: format!(
                    "no {} criterion scores in {} chars of output",
                    track.as_str(),
                    raw.len()
                ),
            });
        }
    };

    for criterion in &missing {
        scores.insert(*criterion, criterion_default(*criterion, content));
    }

    Ok(ResolvedScores {
        scores,
        feedback,
        substituted: missing,
    })
}

/// Retrieval-augmented scorer with deterministic fallbacks.
pub struct RagScorer<V: VectorDbClient> {
    retriever: ContextRetriever<V>,
    llm: Arc<dyn CompletionProvider>,
    config: ScoringConfig,
}

impl<V: VectorDbClient> RagScorer<V> {
    pub fn new(
        retriever: ContextRetriever<V>,
        llm: Arc<dyn CompletionProvider>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            retriever,
            llm,
            config,
        }
    }

    async fn generate(
        &self,
        track: Track,
        prompt: &str,
        content: &DocumentContent,
    ) -> Result<ResolvedScores, LlmError> {
        complete_and_parse(
            self.llm.as_ref(),
            prompt,
            &self.config.completion,
            &self.config.retry,
            |response| resolve_scores(track, parse_response(track, &response), content),
        )
        .await
    }

    #[instrument(skip(self, cv), fields(document_id = %cv.document_id))]
    pub async fn evaluate_cv(&self, job_title: &str, cv: &DocumentContent) -> TrackOutcome<CvEvaluation> {
        let Some(sections) = self.retriever.retrieve_or_skip(Track::Cv, job_title).await else {
            return TrackOutcome::fallback(fallback_cv(cv), RagStatus::Fallback);
        };

        let prompt = prompts::cv_prompt(job_title, &prompts::build_context(&sections), cv);
        match self.generate(Track::Cv, &prompt, cv).await {
            Ok(resolved) => {
                log_substitutions(Track::Cv, &resolved);
                TrackOutcome {
                    evaluation: CvEvaluation::from_scores(&resolved.scores, resolved.feedback),
                    status: RagStatus::Completed,
                    substituted: resolved.substituted,
                }
            }
            Err(e) => {
                warn!(error = %e, "CV generation failed, using heuristic scores");
                TrackOutcome::fallback(fallback_cv(cv), RagStatus::Failed)
            }
        }
    }

    #[instrument(skip(self, project), fields(document_id = %project.document_id))]
    pub async fn evaluate_project(
        &self,
        job_title: &str,
        project: &DocumentContent,
    ) -> TrackOutcome<ProjectEvaluation> {
        let Some(sections) = self.retriever.retrieve_or_skip(Track::Project, job_title).await else {
            return TrackOutcome::fallback(fallback_project(project), RagStatus::Fallback);
        };

        let prompt = prompts::project_prompt(&prompts::build_context(&sections), project);
        match self.generate(Track::Project, &prompt, project).await {
            Ok(resolved) => {
                log_substitutions(Track::Project, &resolved);
                TrackOutcome {
                    evaluation: ProjectEvaluation::from_scores(&resolved.scores, resolved.feedback),
                    status: RagStatus::Completed,
                    substituted: resolved.substituted,
                }
            }
            Err(e) => {
                warn!(error = %e, "Project generation failed, using heuristic scores");
                TrackOutcome::fallback(fallback_project(project), RagStatus::Failed)
            }
        }
    }

    /// Narrative summary, or the templated sentence when generation fails.
    pub async fn summarize(
        &self,
        job_title: &str,
        cv: &CvEvaluation,
        project: &ProjectEvaluation,
    ) -> (String, RagStatus) {
        let prompt = prompts::summary_prompt(job_title, cv, project);
        let options = CompletionOptions {
            max_tokens: self.config.summary_max_tokens,
            ..self.config.completion
        };

        match complete_and_parse(self.llm.as_ref(), &prompt, &options, &self.config.retry, |text| {
            Ok(text.trim().to_string())
        })
        .await
        {
            Ok(summary) => (summary, RagStatus::Completed),
            Err(e) => {
                warn!(error = %e, "Summary generation failed, using template");
                (template_summary(cv, project), RagStatus::Failed)
            }
        }
    }
}

fn log_substitutions(track: Track, resolved: &ResolvedScores) {
    if !resolved.substituted.is_empty() {
        let missing: Vec<&str> = resolved.substituted.iter().map(|c| c.label()).collect();
        warn!(track = track.as_str(), ?missing, "Substituted missing criterion scores");
    }
}

fn ensure_extracted(content: &DocumentContent) -> ScoringResult<()> {
    if content.is_extracted() {
        Ok(())
    } else {
        Err(ScoringError::NotExtracted {
            document_id: content.document_id.clone(),
            status: format!("{:?}", content.extraction_status).to_lowercase(),
        })
    }
}

#[async_trait]
impl<V: VectorDbClient + 'static> Scorer for RagScorer<V> {
    /// Scores the CV, then the project, then writes the summary.
    async fn evaluate(
        &self,
        job_title: &str,
        cv: &DocumentContent,
        project: &DocumentContent,
        on_stage: StageSink<'_>,
    ) -> ScoringResult<EvaluationOutcome> {
        ensure_extracted(cv)?;
        ensure_extracted(project)?;

        on_stage(EvaluationStage::RetrievalStarted);
        let cv_outcome = self.evaluate_cv(job_title, cv).await;
        on_stage(EvaluationStage::CvScored);

        let project_outcome = self.evaluate_project(job_title, project).await;
        on_stage(EvaluationStage::ProjectScored);

        let (overall_summary, summary_status) = self
            .summarize(job_title, &cv_outcome.evaluation, &project_outcome.evaluation)
            .await;
        on_stage(EvaluationStage::SummaryGenerated);

        let mut metadata =
            ScoringMetadata::new(cv_outcome.status, project_outcome.status, summary_status);
        metadata.substituted_criteria = cv_outcome
            .substituted
            .into_iter()
            .chain(project_outcome.substituted)
            .collect();

        info!(
            cv_match_rate = cv_outcome.evaluation.match_rate,
            project_score = project_outcome.evaluation.score,
            rag_status = ?metadata.rag_status,
            "Evaluation scored"
        );

        Ok(EvaluationOutcome {
            cv: cv_outcome.evaluation,
            project: project_outcome.evaluation,
            overall_summary,
            metadata,
        })
    }
}
