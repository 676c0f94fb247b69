use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::vectordb::DocumentType;

use super::error::{IngestionError, IngestionResult};

/// Extracted text of one reference document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceText {
    pub filename: String,
    pub text: String,
}

/// Supplies pre-extracted reference text by document type.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn load(&self, document_type: DocumentType) -> IngestionResult<ReferenceText>;
}

/// Reads `<dir>/<type>.txt`.
#[derive(Debug, Clone)]
pub struct FsReferenceSource {
    dir: PathBuf,
}

impl FsReferenceSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, document_type: DocumentType) -> PathBuf {
        self.dir.join(format!("{}.txt", document_type.as_str()))
    }
}

#[async_trait]
impl ReferenceSource for FsReferenceSource {
    async fn load(&self, document_type: DocumentType) -> IngestionResult<ReferenceText> {
        let path = self.path_for(document_type);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| IngestionError::Source {
                document_type,
                reason: format!("{}: {e}", path.display()),
            })?;

        Ok(ReferenceText {
            filename: format!("{}.txt", document_type.as_str()),
            text,
        })
    }
}

/// Reference texts held in memory.
#[derive(Debug, Default)]
pub struct InMemoryReferenceSource {
    documents: RwLock<HashMap<DocumentType, String>>,
}

impl InMemoryReferenceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document_type: DocumentType, text: impl Into<String>) {
        self.documents.write().insert(document_type, text.into());
    }

    pub fn with(self, document_type: DocumentType, text: impl Into<String>) -> Self {
        self.insert(document_type, text);
        self
    }
}

#[async_trait]
impl ReferenceSource for InMemoryReferenceSource {
    async fn load(&self, document_type: DocumentType) -> IngestionResult<ReferenceText> {
        let text = self
            .documents
            .read()
            .get(&document_type)
            .cloned()
            .ok_or_else(|| IngestionError::Source {
                document_type,
                reason: "not provided".to_string(),
            })?;

        Ok(ReferenceText {
            filename: format!("{}.txt", document_type.as_str()),
            text,
        })
    }
}
