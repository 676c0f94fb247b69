use crate::constants::{
    DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_WINDOW, DEFAULT_COLLECTION_NAME, DEFAULT_VECTOR_SIZE_U64,
};

use super::error::{IngestionError, IngestionResult};

/// Points sent per upsert request.
pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub collection_name: String,
    pub vector_size: u64,
    /// Chunk length in characters.
    pub window: usize,
    /// Characters shared by consecutive chunks.
    pub overlap: usize,
    pub batch_size: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            vector_size: DEFAULT_VECTOR_SIZE_U64,
            window: DEFAULT_CHUNK_WINDOW,
            overlap: DEFAULT_CHUNK_OVERLAP,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl IngestionConfig {
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn vector_size(mut self, size: u64) -> Self {
        self.vector_size = size;
        self
    }

    pub fn window(mut self, window: usize, overlap: usize) -> Self {
        self.window = window;
        self.overlap = overlap;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> IngestionResult<()> {
        if self.collection_name.trim().is_empty() {
            return Err(IngestionError::Config {
                reason: "collection_name must not be empty".to_string(),
            });
        }
        if self.vector_size == 0 {
            return Err(IngestionError::Config {
                reason: "vector_size must be > 0".to_string(),
            });
        }
        if self.overlap >= self.window {
            return Err(IngestionError::Config {
                reason: format!(
                    "overlap ({}) must be smaller than window ({})",
                    self.overlap, self.window
                ),
            });
        }
        if self.batch_size == 0 {
            return Err(IngestionError::Config {
                reason: "batch_size must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
