//! Extracted document content consumed by the evaluation pipeline.
//!
//! Text extraction itself happens upstream; this module only models its output and looks it
//! up by document id.

mod error;
mod store;

pub use error::ContentError;
pub use store::InMemoryContentStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What an uploaded document is expected to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cv,
    ProjectReport,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Cv => "cv",
            DocumentKind::ProjectReport => "project_report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Structured signals pulled out of a document during extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedData {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub code_blocks: u32,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Extracted text and metadata for one uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub document_id: String,
    pub kind: DocumentKind,
    pub raw_text: String,
    pub cleaned_text: String,
    pub extracted_data: ExtractedData,
    pub page_count: u32,
    pub word_count: u32,
    pub character_count: u32,
    pub extraction_status: ExtractionStatus,
}

impl DocumentContent {
    /// Builds a completed extraction from cleaned text, deriving the word and character counts.
    pub fn completed(
        document_id: impl Into<String>,
        kind: DocumentKind,
        cleaned_text: impl Into<String>,
        extracted_data: ExtractedData,
    ) -> Self {
        let cleaned_text = cleaned_text.into();
        Self {
            document_id: document_id.into(),
            kind,
            raw_text: cleaned_text.clone(),
            word_count: cleaned_text.split_whitespace().count() as u32,
            character_count: cleaned_text.chars().count() as u32,
            cleaned_text,
            extracted_data,
            page_count: 1,
            extraction_status: ExtractionStatus::Completed,
        }
    }

    pub fn word_count(mut self, count: u32) -> Self {
        self.word_count = count;
        self
    }

    pub fn page_count(mut self, count: u32) -> Self {
        self.page_count = count;
        self
    }

    pub fn extraction_status(mut self, status: ExtractionStatus) -> Self {
        self.extraction_status = status;
        self
    }

    pub fn is_extracted(&self) -> bool {
        self.extraction_status == ExtractionStatus::Completed
    }

    /// Cleaned text, or raw text when cleaning produced nothing.
    pub fn text(&self) -> &str {
        if self.cleaned_text.trim().is_empty() {
            &self.raw_text
        } else {
            &self.cleaned_text
        }
    }
}

/// Looks up extracted content by document id.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Returns [`ContentError::NotFound`] when no content exists for `document_id`.
    async fn find_by_document_id(&self, document_id: &str) -> Result<DocumentContent, ContentError>;
}
