use std::sync::Arc;

use super::*;
use crate::constants::DEFAULT_EMBEDDING_DIM;
use crate::embedding::{BertEmbedder, Embedder, EmbeddingError};
use crate::hashing::reference_point_id;
use crate::vectordb::{DocumentType, MockVectorDbClient, RubricSection, SearchFilter, VectorDbClient};

const COLLECTION: &str = "evaluation_docs";

fn rubric_text() -> String {
    format!(
        "Scoring Rubric\n\nCV Match Evaluation\n{}\n\nProject Deliverable Evaluation\n{}",
        "Technical skills match, experience level, achievements and cultural fit. ".repeat(4),
        "Correctness, code quality, resilience, documentation and creativity. ".repeat(4),
    )
}

fn full_source() -> Arc<InMemoryReferenceSource> {
    Arc::new(
        InMemoryReferenceSource::new()
            .with(DocumentType::JobDescription, "Backend engineer. ".repeat(150))
            .with(DocumentType::CaseStudyBrief, "Build an evaluation pipeline.")
            .with(DocumentType::ScoringRubric, rubric_text()),
    )
}

fn pipeline(
    client: Arc<MockVectorDbClient>,
    embedder: Arc<dyn Embedder>,
    source: Arc<dyn ReferenceSource>,
) -> IngestionPipeline<MockVectorDbClient> {
    IngestionPipeline::new(
        client,
        embedder,
        source,
        IngestionConfig::default().collection_name(COLLECTION),
    )
    .unwrap()
}

/// Fails on any chunk mentioning `poison`.
struct PoisonEmbedder {
    inner: BertEmbedder,
}

impl Embedder for PoisonEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.contains("poison") {
            return Err(EmbeddingError::InferenceFailed {
                reason: "poisoned chunk".to_string(),
            });
        }
        self.inner.embed(text)
    }

    fn embedding_dim(&self) -> usize {
        self.inner.embedding_dim()
    }
}

#[test]
fn test_chunk_starts_advance_by_stride() {
    let text: String = ('a'..='z').cycle().take(2400).collect();
    let chunks = chunk_text(&text, 1000, 200);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], text[0..1000]);
    assert_eq!(chunks[1], text[800..1800]);
    assert_eq!(chunks[2], text[1600..2400]);
}

#[test]
fn test_chunk_short_and_blank_text() {
    assert_eq!(chunk_text("short", 1000, 200), vec!["short".to_string()]);
    assert!(chunk_text("   ", 1000, 200).is_empty());

    // A text exactly one window long yields no overlap-only tail.
    let exact = "x".repeat(1000);
    assert_eq!(chunk_text(&exact, 1000, 200).len(), 1);
}

#[test]
fn test_chunk_counts_chars_not_bytes() {
    let text = "é".repeat(1500);
    let chunks = chunk_text(&text, 1000, 200);

    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].chars().count(), 1000);
    assert_eq!(chunks[1].chars().count(), 700);
}

#[test]
fn test_rubric_split_by_headings() {
    let split = split_rubric(&rubric_text());

    assert_eq!(split.strategy, SplitStrategy::Headings);
    assert!(split.cv_evaluation.starts_with("CV Match Evaluation"));
    assert!(!split.cv_evaluation.contains("Project Deliverable"));
    assert!(split.project_evaluation.starts_with("Project Deliverable Evaluation"));
    assert_eq!(split.section(RubricSection::CvEvaluation), split.cv_evaluation);
}

#[test]
fn test_rubric_split_by_line_keywords() {
    let text = format!(
        "Part 1: CV evaluation criteria\n{}\nPart 2: Project evaluation criteria\n{}",
        "Skills and experience are weighted heavily in this part. ".repeat(3),
        "Correctness and code quality are weighted heavily in this part. ".repeat(3),
    );
    let split = split_rubric(&text);

    assert_eq!(split.strategy, SplitStrategy::Keywords);
    assert!(split.cv_evaluation.contains("Skills and experience"));
    assert!(!split.cv_evaluation.contains("Correctness"));
    assert!(split.project_evaluation.contains("Correctness"));
}

#[test]
fn test_rubric_short_sections_use_full_text() {
    let text = "CV Match Evaluation\nshort\nProject Deliverable Evaluation\nalso short";
    let split = split_rubric(text);

    assert_eq!(split.strategy, SplitStrategy::FullText);
    assert_eq!(split.cv_evaluation, text);
    assert_eq!(split.project_evaluation, text);
}

#[test]
fn test_config_validation() {
    assert!(IngestionConfig::default().validate().is_ok());
    assert!(IngestionConfig::default().window(200, 200).validate().is_err());
    assert!(IngestionConfig::default().batch_size(0).validate().is_err());
    assert!(IngestionConfig::default().vector_size(0).validate().is_err());
}

#[test]
fn test_pipeline_rejects_dimension_mismatch() {
    let result = IngestionPipeline::new(
        Arc::new(MockVectorDbClient::new()),
        Arc::new(BertEmbedder::stub()),
        full_source(),
        IngestionConfig::default().vector_size(DEFAULT_EMBEDDING_DIM as u64 + 1),
    );
    assert!(matches!(result, Err(IngestionError::Config { .. })));
}

#[tokio::test]
async fn test_ingest_all_stores_every_document() {
    let client = Arc::new(MockVectorDbClient::new());
    let pipeline = pipeline(client.clone(), Arc::new(BertEmbedder::stub()), full_source());

    let report = pipeline.ingest_all().await.unwrap();

    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 0);
    let rubric = &report.documents[2];
    assert_eq!(rubric.document_type, DocumentType::ScoringRubric);
    assert_eq!(rubric.split_strategy, Some(SplitStrategy::Headings));
    assert_eq!(rubric.sections, RubricSection::ALL.to_vec());

    // 2700 chars of job description: windows at 0, 800, 1600 and 2400.
    assert_eq!(report.documents[0].chunks, 4);
    assert_eq!(
        client.point_count(COLLECTION),
        Some(report.total_chunks())
    );

    let rubric_hits = client
        .search(
            COLLECTION,
            vec![0.1; DEFAULT_EMBEDDING_DIM],
            10,
            SearchFilter::document(DocumentType::ScoringRubric).section(RubricSection::CvEvaluation),
        )
        .await
        .unwrap();
    assert_eq!(rubric_hits.len(), 1);
    assert_eq!(
        rubric_hits[0].id,
        reference_point_id("scoring_rubric", Some("cv_evaluation"), 0)
    );
    assert!(rubric_hits[0].chunk.description.ends_with("- cv_evaluation"));
}

#[tokio::test]
async fn test_points_upserted_in_batches_of_five() {
    let client = Arc::new(MockVectorDbClient::new());
    // 9500 chars: windows at 0, 800, ..., 8800.
    let source = Arc::new(
        InMemoryReferenceSource::new().with(DocumentType::JobDescription, "x".repeat(9500)),
    );
    let pipeline = pipeline(client.clone(), Arc::new(BertEmbedder::stub()), source);
    pipeline.initialize().await.unwrap();

    let report = pipeline
        .ingest_document(DocumentType::JobDescription)
        .await
        .unwrap();

    assert_eq!(report.chunks, 12);
    assert_eq!(client.upsert_batches(), vec![5, 5, 2]);
    assert_eq!(client.point_count(COLLECTION), Some(12));
}

#[tokio::test]
async fn test_reingestion_overwrites_points() {
    let client = Arc::new(MockVectorDbClient::new());
    let pipeline = pipeline(client.clone(), Arc::new(BertEmbedder::stub()), full_source());

    let first = pipeline.ingest_all().await.unwrap();
    pipeline.ingest_all().await.unwrap();

    assert_eq!(client.point_count(COLLECTION), Some(first.total_chunks()));
}

#[tokio::test]
async fn test_failing_document_does_not_stop_others() {
    let client = Arc::new(MockVectorDbClient::new());
    let source = Arc::new(
        InMemoryReferenceSource::new()
            .with(DocumentType::JobDescription, "Backend engineer with poison pill.")
            .with(DocumentType::ScoringRubric, rubric_text()),
    );
    let embedder = Arc::new(PoisonEmbedder {
        inner: BertEmbedder::stub(),
    });
    let pipeline = pipeline(client.clone(), embedder, source);

    let report = pipeline.ingest_all().await.unwrap();

    assert_eq!(report.documents[0].status, IngestStatus::Failed);
    assert!(report.documents[0].error.as_deref().unwrap().contains("poisoned"));
    assert_eq!(report.documents[1].status, IngestStatus::Failed);
    assert!(report.documents[1].error.as_deref().unwrap().contains("not provided"));
    assert_eq!(report.documents[2].status, IngestStatus::Success);
    assert_eq!(client.point_count(COLLECTION), Some(report.documents[2].chunks));
}

#[tokio::test]
async fn test_upsert_failure_is_reported() {
    let client = Arc::new(MockVectorDbClient::new());
    let pipeline = pipeline(client.clone(), Arc::new(BertEmbedder::stub()), full_source());
    pipeline.initialize().await.unwrap();
    client.set_fail_upserts(true);

    let report = pipeline.ingest_all().await.unwrap();

    assert_eq!(report.succeeded(), 0);
    assert!(report.documents.iter().all(|d| d.error.is_some()));
}

#[tokio::test]
async fn test_list_documents_groups_by_section() {
    let client = Arc::new(MockVectorDbClient::new());
    let pipeline = pipeline(client.clone(), Arc::new(BertEmbedder::stub()), full_source());
    let report = pipeline.ingest_all().await.unwrap();

    let documents = pipeline.list_documents().await.unwrap();

    assert_eq!(documents.len(), 4);
    let total: usize = documents.iter().map(|d| d.chunks).sum();
    assert_eq!(total, report.total_chunks());
    assert!(documents.iter().any(|d| d.document_type == DocumentType::ScoringRubric
        && d.section == Some(RubricSection::ProjectEvaluation)));
}

#[tokio::test]
async fn test_statistics_and_clear() {
    let client = Arc::new(MockVectorDbClient::new());
    let pipeline = pipeline(client.clone(), Arc::new(BertEmbedder::stub()), full_source());
    let report = pipeline.ingest_all().await.unwrap();

    let stats = pipeline.statistics().await.unwrap();
    assert_eq!(stats.collection, COLLECTION);
    assert_eq!(stats.total_points, report.total_chunks() as u64);
    assert_eq!(stats.vector_size, DEFAULT_EMBEDDING_DIM as u64);
    assert_eq!(stats.distance, "Cosine");

    pipeline.clear().await.unwrap();
    assert_eq!(pipeline.statistics().await.unwrap().total_points, 0);
}

#[tokio::test]
async fn test_health_check_tracks_backend() {
    let client = Arc::new(MockVectorDbClient::new());
    let pipeline = pipeline(client.clone(), Arc::new(BertEmbedder::stub()), full_source());

    let before = pipeline.health_check().await;
    assert!(before.healthy);
    assert!(!before.initialized);

    pipeline.initialize().await.unwrap();
    client.set_available(false);

    let after = pipeline.health_check().await;
    assert!(!after.healthy);
    assert!(after.initialized);
}

#[tokio::test]
async fn test_fs_source_reads_type_named_files() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("job_description.txt"), "Rust backend role")
        .await
        .unwrap();
    let source = FsReferenceSource::new(dir.path());

    let loaded = source.load(DocumentType::JobDescription).await.unwrap();
    assert_eq!(loaded.text, "Rust backend role");
    assert_eq!(loaded.filename, "job_description.txt");

    let missing = source.load(DocumentType::CaseStudyBrief).await;
    assert!(matches!(missing, Err(IngestionError::Source { .. })));
}
