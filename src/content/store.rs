use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::info;

use crate::snapshot::{read_records, write_records};

use super::{ContentError, ContentProvider, DocumentContent};

/// Content provider kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryContentStore {
    contents: RwLock<HashMap<String, DocumentContent>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the content for its document id.
    pub fn insert(&self, content: DocumentContent) {
        self.contents
            .write()
            .insert(content.document_id.clone(), content);
    }

    pub fn len(&self) -> usize {
        self.contents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.read().is_empty()
    }

    /// Writes every stored content unit to `path` as JSON.
    pub async fn persist(&self, path: &Path) -> Result<usize, ContentError> {
        let mut contents: Vec<DocumentContent> = self.contents.read().values().cloned().collect();
        contents.sort_by(|a, b| a.document_id.cmp(&b.document_id));

        write_records(path, &contents)
            .await
            .map_err(|e| ContentError::Unavailable {
                reason: format!("writing {}: {e}", path.display()),
            })?;
        info!(path = %path.display(), contents = contents.len(), "Content snapshot written");
        Ok(contents.len())
    }

    /// Loads a snapshot written by [`persist`](Self::persist), replacing entries with the
    /// same document id. A missing file restores nothing.
    pub async fn restore(&self, path: &Path) -> Result<usize, ContentError> {
        let contents: Vec<DocumentContent> = read_records(path)
            .await
            .map_err(|e| ContentError::Unavailable {
                reason: format!("reading {}: {e}", path.display()),
            })?
            .unwrap_or_default();

        let restored = contents.len();
        for content in contents {
            self.insert(content);
        }
        info!(path = %path.display(), restored, "Content snapshot restored");
        Ok(restored)
    }
}

#[async_trait]
impl ContentProvider for InMemoryContentStore {
    async fn find_by_document_id(&self, document_id: &str) -> Result<DocumentContent, ContentError> {
        self.contents
            .read()
            .get(document_id)
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                document_id: document_id.to_string(),
            })
    }
}
