//! Screener library crate (used by the service binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Job lifecycle
//! - [`JobOrchestrator`] - create, inspect, retry and cancel evaluation jobs
//! - [`MemoryQueue`], [`TaskQueue`] - de-duplicated task queue with retry and retention
//! - [`WorkerPool`], [`EvaluationProcessor`] - bounded-concurrency task execution
//! - [`JobStore`], [`ResultStore`] - job registry contracts with in-memory implementations
//!
//! ## Scoring
//! - [`RagScorer`], [`Scorer`] - retrieval-augmented scoring with heuristic fallbacks
//! - [`ContextRetriever`] - filtered similarity queries over the reference corpus
//!
//! ## Reference corpus
//! - [`IngestionPipeline`] - chunk, embed and upsert the reference documents
//! - [`QdrantClient`], [`VectorDbClient`] - vector store access
//! - [`BertEmbedder`], [`Embedder`] - text embeddings
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod content;
pub mod embedding;
pub mod hashing;
pub mod ingestion;
pub mod llm;
pub mod orchestrator;
pub mod queue;
pub mod registry;
pub mod scoring;
mod snapshot;
pub mod vectordb;
pub mod worker;

pub use config::{Config, ConfigError};
pub use constants::{DimValidationError, validate_embedding_dim};
pub use content::{
    ContentError, ContentProvider, DocumentContent, DocumentKind, ExtractedData,
    ExtractionStatus, InMemoryContentStore,
};
pub use embedding::{BertEmbedder, Embedder, EmbedderConfig, EmbeddingError};
pub use hashing::{hash_to_u64, reference_point_id};
pub use ingestion::{
    FsReferenceSource, IngestionConfig, IngestionError, IngestionPipeline, IngestionReport,
    ReferenceSource,
};
pub use llm::{CompletionOptions, CompletionProvider, LlmConfig, LlmError, build_provider};
#[cfg(any(test, feature = "mock"))]
pub use llm::MockCompletionProvider;
pub use orchestrator::{JobOrchestrator, JobTicket, JobView, OrchestratorError};
pub use queue::{MemoryQueue, QueueConfig, QueueError, QueueStats, TaskOptions, TaskQueue};
pub use registry::{
    EvaluationJob, EvaluationResult, InMemoryJobStore, InMemoryResultStore, JobStatus, JobStore,
    RegistryError, ResultStore,
};
pub use scoring::{
    ContextRetriever, EvaluationOutcome, RagScorer, RagStatus, Scorer, ScoringConfig,
    ScoringError,
};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockVectorDbClient;
pub use vectordb::{QdrantClient, VectorDbClient, VectorDbError};
pub use worker::{EvaluationProcessor, WorkerConfig, WorkerEvent, WorkerPool};
