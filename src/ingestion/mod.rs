//! Reference corpus ingestion.
//!
//! Reads the job description, case study brief and scoring rubric from a
//! [`ReferenceSource`], splits the rubric into its CV and project halves, chunks every text
//! into overlapping windows and upserts the embedded chunks in small batches.

mod chunker;
mod config;
mod error;
mod pipeline;
mod rubric;
mod source;

#[cfg(test)]
mod tests;

pub use chunker::chunk_text;
pub use config::{DEFAULT_BATCH_SIZE, IngestionConfig};
pub use error::{IngestionError, IngestionResult};
pub use pipeline::{
    CorpusStatistics, DocumentReport, IngestStatus, IngestionHealth, IngestionPipeline,
    IngestionReport, StoredDocument, describe,
};
pub use rubric::{MIN_SECTION_CHARS, RubricSplit, SplitStrategy, split_rubric};
pub use source::{FsReferenceSource, InMemoryReferenceSource, ReferenceSource, ReferenceText};
