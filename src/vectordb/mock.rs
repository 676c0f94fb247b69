use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::vectordb::{
    CollectionStats, ReferenceChunk, SearchFilter, SearchResult, VectorDbClient, VectorDbError,
    VectorPoint,
};

/// In-memory stand-in for Qdrant with switchable availability.
pub struct MockVectorDbClient {
    collections: RwLock<HashMap<String, MockCollection>>,
    available: AtomicBool,
    fail_upserts: AtomicBool,
    search_calls: AtomicUsize,
    upsert_batches: Mutex<Vec<usize>>,
}

#[derive(Default, Clone)]
struct MockCollection {
    vector_size: u64,
    points: HashMap<u64, MockStoredPoint>,
}

#[derive(Clone)]
struct MockStoredPoint {
    vector: Vec<f32>,
    chunk: ReferenceChunk,
}

impl Default for MockVectorDbClient {
    fn default() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
            fail_upserts: AtomicBool::new(false),
            search_calls: AtomicUsize::new(0),
            upsert_batches: Mutex::new(Vec::new()),
        }
    }
}

impl MockVectorDbClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .get(collection)
            .map(|c| c.points.len())
    }

    /// Simulates the backend going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes every subsequent upsert fail.
    pub fn set_fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    /// Number of search requests served (including failed ones).
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Point count of every accepted upsert call, in call order.
    pub fn upsert_batches(&self) -> Vec<usize> {
        self.upsert_batches.lock().clone()
    }

    fn check_available(&self) -> Result<(), VectorDbError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(VectorDbError::ConnectionFailed {
                url: "mock://qdrant".to_string(),
                message: "mock backend unavailable".to_string(),
            })
        }
    }
}

impl VectorDbClient for MockVectorDbClient {
    async fn is_ready(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.check_available()?;
        self.collections
            .write()
            .entry(name.to_string())
            .or_insert(MockCollection {
                vector_size,
                points: HashMap::new(),
            });
        Ok(())
    }

    async fn recreate_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.check_available()?;
        self.collections.write().insert(
            name.to_string(),
            MockCollection {
                vector_size,
                points: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorDbError> {
        self.check_available()?;
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: "mock upsert failure".to_string(),
            });
        }

        let count = points.len();
        let mut collections = self.collections.write();
        let coll =
            collections
                .get_mut(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        for point in points {
            if point.vector.len() as u64 != coll.vector_size {
                return Err(VectorDbError::InvalidDimension {
                    expected: coll.vector_size as usize,
                    actual: point.vector.len(),
                });
            }

            coll.points.insert(
                point.id,
                MockStoredPoint {
                    vector: point.vector,
                    chunk: point.chunk,
                },
            );
        }

        self.upsert_batches.lock().push(count);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        filter: SearchFilter,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let collections = self.collections.read();
        let coll =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        let mut results: Vec<SearchResult> = coll
            .points
            .iter()
            .filter(|(_, p)| filter.matches(&p.chunk))
            .map(|(&id, p)| SearchResult {
                id,
                score: cosine_similarity(&query, &p.vector),
                chunk: p.chunk.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });

        results.truncate(limit as usize);
        Ok(results)
    }

    async fn count_points(&self, collection: &str) -> Result<u64, VectorDbError> {
        self.check_available()?;
        self.point_count(collection)
            .map(|n| n as u64)
            .ok_or_else(|| VectorDbError::CollectionNotFound {
                collection: collection.to_string(),
            })
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, VectorDbError> {
        self.check_available()?;
        let collections = self.collections.read();
        let coll =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        Ok(CollectionStats {
            collection: collection.to_string(),
            points_count: coll.points.len() as u64,
            vector_size: coll.vector_size,
            distance: "Cosine".to_string(),
            status: "Green".to_string(),
        })
    }

    async fn scroll_chunks(&self, collection: &str) -> Result<Vec<ReferenceChunk>, VectorDbError> {
        self.check_available()?;
        let collections = self.collections.read();
        let coll =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        Ok(coll.points.values().map(|p| p.chunk.clone()).collect())
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}
