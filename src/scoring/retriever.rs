use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::embedding::Embedder;
use crate::vectordb::{DocumentType, RubricSection, SearchFilter, VectorDbClient};

use super::criteria::Track;
use super::error::{ScoringError, ScoringResult};
use super::prompts::ContextSection;

/// Chunks fetched from the track's primary document.
pub const PRIMARY_TOP_K: u64 = 3;

/// Chunks fetched from the track's rubric section.
pub const RUBRIC_TOP_K: u64 = 2;

/// One filtered similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalQuery {
    pub title: &'static str,
    pub text: String,
    pub filter: SearchFilter,
    pub limit: u64,
}

/// The two queries issued for `track`.
pub fn retrieval_plan(track: Track, job_title: &str) -> [RetrievalQuery; 2] {
    match track {
        Track::Cv => [
            RetrievalQuery {
                title: "Job Requirements",
                text: format!("{job_title} requirements skills experience"),
                filter: SearchFilter::document(DocumentType::JobDescription),
                limit: PRIMARY_TOP_K,
            },
            RetrievalQuery {
                title: "CV Evaluation Rubric",
                text: "CV evaluation criteria technical skills experience achievements".to_string(),
                filter: SearchFilter::document(DocumentType::ScoringRubric)
                    .section(RubricSection::CvEvaluation),
                limit: RUBRIC_TOP_K,
            },
        ],
        Track::Project => [
            RetrievalQuery {
                title: "Case Study Requirements",
                text: "case study requirements implementation deliverables".to_string(),
                filter: SearchFilter::document(DocumentType::CaseStudyBrief),
                limit: PRIMARY_TOP_K,
            },
            RetrievalQuery {
                title: "Project Evaluation Rubric",
                text: "project evaluation criteria code quality correctness resilience".to_string(),
                filter: SearchFilter::document(DocumentType::ScoringRubric)
                    .section(RubricSection::ProjectEvaluation),
                limit: RUBRIC_TOP_K,
            },
        ],
    }
}

/// Runs filtered similarity queries against the reference collection.
pub struct ContextRetriever<V: VectorDbClient> {
    client: Arc<V>,
    embedder: Arc<dyn Embedder>,
    collection: String,
}

impl<V: VectorDbClient> ContextRetriever<V> {
    pub fn new(client: Arc<V>, embedder: Arc<dyn Embedder>, collection: impl Into<String>) -> Self {
        Self {
            client,
            embedder,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub async fn is_available(&self) -> bool {
        self.client.is_ready().await
    }

    /// Embeds off the async runtime; inference is CPU bound.
    async fn embed(&self, text: &str) -> ScoringResult<Vec<f32>> {
        let embedder = Arc::clone(&self.embedder);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| ScoringError::TaskFailed {
                reason: e.to_string(),
            })?
            .map_err(ScoringError::from)
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn retrieve(&self, track: Track, job_title: &str) -> ScoringResult<Vec<ContextSection>> {
        let mut sections = Vec::with_capacity(2);

        for query in retrieval_plan(track, job_title) {
            let vector = self.embed(&query.text).await?;
            let results = self
                .client
                .search(&self.collection, vector, query.limit, query.filter)
                .await?;

            debug!(
                track = track.as_str(),
                title = query.title,
                hits = results.len(),
                "Context query finished"
            );
            sections.push(ContextSection::new(query.title, results));
        }

        Ok(sections)
    }

    /// Like [`retrieve`](Self::retrieve), but `None` when there is nothing to ground a
    /// completion on: the store is unreachable, a query errored, or every query came back empty.
    pub async fn retrieve_or_skip(&self, track: Track, job_title: &str) -> Option<Vec<ContextSection>> {
        if !self.is_available().await {
            warn!(track = track.as_str(), "Vector store unavailable, skipping retrieval");
            return None;
        }

        match self.retrieve(track, job_title).await {
            Ok(sections) if sections.iter().any(|s| !s.results.is_empty()) => Some(sections),
            Ok(_) => {
                warn!(track = track.as_str(), "No reference context retrieved");
                None
            }
            Err(e) => {
                warn!(track = track.as_str(), error = %e, "Context retrieval failed");
                None
            }
        }
    }
}
