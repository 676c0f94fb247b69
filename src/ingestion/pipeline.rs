use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::constants::validate_embedding_dim;
use crate::embedding::Embedder;
use crate::hashing::reference_point_id;
use crate::vectordb::{DocumentType, ReferenceChunk, RubricSection, VectorDbClient, VectorPoint};

use super::chunker::chunk_text;
use super::config::IngestionConfig;
use super::error::{IngestionError, IngestionResult};
use super::rubric::{SplitStrategy, split_rubric};
use super::source::ReferenceSource;

pub fn describe(document_type: DocumentType) -> &'static str {
    match document_type {
        DocumentType::JobDescription => "Job description for the position",
        DocumentType::CaseStudyBrief => "Case study brief document",
        DocumentType::ScoringRubric => "Unified scoring rubric for CV and Project evaluation",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestStatus {
    Success,
    Failed,
}

/// Outcome of ingesting one reference document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub document_type: DocumentType,
    pub filename: String,
    pub status: IngestStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<RubricSection>,
    pub chunks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_strategy: Option<SplitStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    fn failed(document_type: DocumentType, error: &IngestionError) -> Self {
        Self {
            document_type,
            filename: format!("{}.txt", document_type.as_str()),
            status: IngestStatus::Failed,
            sections: Vec::new(),
            chunks: 0,
            split_strategy: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub documents: Vec<DocumentReport>,
}

impl IngestionReport {
    pub fn succeeded(&self) -> usize {
        self.documents
            .iter()
            .filter(|d| d.status == IngestStatus::Success)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }

    pub fn total_chunks(&self) -> usize {
        self.documents.iter().map(|d| d.chunks).sum()
    }
}

/// Stored chunks grouped by document and rubric section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub document_type: DocumentType,
    pub section: Option<RubricSection>,
    pub description: String,
    pub filename: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStatistics {
    pub collection: String,
    pub total_points: u64,
    pub vector_size: u64,
    pub distance: String,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestionHealth {
    pub healthy: bool,
    pub initialized: bool,
}

/// Loads the reference corpus into the vector store.
///
/// Each document is chunked, embedded and upserted on its own; one failing document does
/// not stop the others. Point ids are derived from (type, section, chunk index), so
/// re-running ingestion overwrites earlier chunks.
pub struct IngestionPipeline<V: VectorDbClient> {
    client: Arc<V>,
    embedder: Arc<dyn Embedder>,
    source: Arc<dyn ReferenceSource>,
    config: IngestionConfig,
    initialized: AtomicBool,
}

impl<V: VectorDbClient> IngestionPipeline<V> {
    pub fn new(
        client: Arc<V>,
        embedder: Arc<dyn Embedder>,
        source: Arc<dyn ReferenceSource>,
        config: IngestionConfig,
    ) -> IngestionResult<Self> {
        config.validate()?;
        if embedder.embedding_dim() as u64 != config.vector_size {
            return Err(IngestionError::Config {
                reason: format!(
                    "embedder produces {} dimensions, collection expects {}",
                    embedder.embedding_dim(),
                    config.vector_size
                ),
            });
        }

        Ok(Self {
            client,
            embedder,
            source,
            config,
            initialized: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Creates the collection if it does not exist yet.
    pub async fn initialize(&self) -> IngestionResult<()> {
        self.client
            .ensure_collection(&self.config.collection_name, self.config.vector_size)
            .await?;
        self.initialized.store(true, Ordering::SeqCst);
        info!(collection = %self.config.collection_name, "Reference collection ready");
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.config.collection_name))]
    pub async fn ingest_all(&self) -> IngestionResult<IngestionReport> {
        if !self.initialized.load(Ordering::SeqCst) {
            self.initialize().await?;
        }

        let mut report = IngestionReport::default();
        for document_type in DocumentType::ALL {
            let document = match self.ingest_document(document_type).await {
                Ok(document) => {
                    info!(
                        document_type = %document_type,
                        chunks = document.chunks,
                        "Reference document ingested"
                    );
                    document
                }
                Err(e) => {
                    warn!(document_type = %document_type, error = %e, "Reference document failed");
                    DocumentReport::failed(document_type, &e)
                }
            };
            report.documents.push(document);
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            chunks = report.total_chunks(),
            "Ingestion finished"
        );
        Ok(report)
    }

    pub async fn ingest_document(&self, document_type: DocumentType) -> IngestionResult<DocumentReport> {
        let reference = self.source.load(document_type).await?;
        if reference.text.trim().is_empty() {
            return Err(IngestionError::EmptyDocument { document_type });
        }

        let mut report = DocumentReport {
            document_type,
            filename: reference.filename.clone(),
            status: IngestStatus::Success,
            sections: Vec::new(),
            chunks: 0,
            split_strategy: None,
            error: None,
        };

        if document_type == DocumentType::ScoringRubric {
            let split = split_rubric(&reference.text);
            if split.strategy == SplitStrategy::FullText {
                warn!("Rubric sections not detected, using full text for both");
            }
            report.split_strategy = Some(split.strategy);

            for section in RubricSection::ALL {
                report.chunks += self
                    .store_text(document_type, Some(section), &reference.filename, split.section(section))
                    .await?;
                report.sections.push(section);
            }
        } else {
            report.chunks = self
                .store_text(document_type, None, &reference.filename, &reference.text)
                .await?;
        }

        Ok(report)
    }

    async fn store_text(
        &self,
        document_type: DocumentType,
        section: Option<RubricSection>,
        filename: &str,
        text: &str,
    ) -> IngestionResult<usize> {
        let chunks = chunk_text(text, self.config.window, self.config.overlap);
        let total_chunks = chunks.len();
        let vectors = self.embed_all(chunks.clone()).await?;

        let description = match section {
            Some(section) => format!("{} - {}", describe(document_type), section),
            None => describe(document_type).to_string(),
        };
        let created_at = Utc::now();

        let mut points = Vec::with_capacity(total_chunks);
        for (chunk_index, (text, vector)) in chunks.into_iter().zip(vectors).enumerate() {
            validate_embedding_dim(&vector, self.config.vector_size as usize)?;
            points.push(VectorPoint {
                id: reference_point_id(
                    document_type.as_str(),
                    section.map(|s| s.as_str()),
                    chunk_index,
                ),
                vector,
                chunk: ReferenceChunk {
                    document_type,
                    section,
                    description: description.clone(),
                    filename: filename.to_string(),
                    chunk_index,
                    total_chunks,
                    text,
                    created_at,
                },
            });
        }

        let mut remaining = points;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(self.config.batch_size));
            let batch = std::mem::replace(&mut remaining, rest);
            debug!(count = batch.len(), "Upserting batch");
            self.client
                .upsert_points(&self.config.collection_name, batch)
                .await?;
        }

        Ok(total_chunks)
    }

    /// Embeds every chunk on the blocking pool. The first failure aborts the document.
    async fn embed_all(&self, chunks: Vec<String>) -> IngestionResult<Vec<Vec<f32>>> {
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || {
            chunks
                .iter()
                .map(|chunk| embedder.embed(chunk))
                .collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(|e| IngestionError::TaskFailed {
            reason: e.to_string(),
        })?
        .map_err(IngestionError::from)
    }

    /// Drops and recreates the collection.
    pub async fn clear(&self) -> IngestionResult<()> {
        self.client
            .recreate_collection(&self.config.collection_name, self.config.vector_size)
            .await?;
        info!(collection = %self.config.collection_name, "Reference documents cleared");
        Ok(())
    }

    pub async fn statistics(&self) -> IngestionResult<CorpusStatistics> {
        let total_points = self.client.count_points(&self.config.collection_name).await?;
        let stats = self
            .client
            .collection_stats(&self.config.collection_name)
            .await?;

        Ok(CorpusStatistics {
            collection: stats.collection,
            total_points,
            vector_size: stats.vector_size,
            distance: stats.distance,
            status: stats.status,
        })
    }

    pub async fn list_documents(&self) -> IngestionResult<Vec<StoredDocument>> {
        let chunks = self
            .client
            .scroll_chunks(&self.config.collection_name)
            .await?;

        let mut grouped: BTreeMap<(&'static str, Option<RubricSection>), StoredDocument> =
            BTreeMap::new();
        for chunk in chunks {
            grouped
                .entry((chunk.document_type.as_str(), chunk.section))
                .or_insert_with(|| StoredDocument {
                    document_type: chunk.document_type,
                    section: chunk.section,
                    description: chunk.description.clone(),
                    filename: chunk.filename.clone(),
                    chunks: 0,
                })
                .chunks += 1;
        }

        Ok(grouped.into_values().collect())
    }

    pub async fn health_check(&self) -> IngestionHealth {
        IngestionHealth {
            healthy: self.client.is_ready().await,
            initialized: self.initialized.load(Ordering::SeqCst),
        }
    }
}
