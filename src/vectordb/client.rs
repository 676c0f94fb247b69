use qdrant_client::Qdrant;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    CollectionStatus, Condition, CountPointsBuilder, CreateCollectionBuilder, Distance, Filter,
    PointStruct, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use tracing::{debug, info};

use super::error::VectorDbError;
use super::model::{CollectionStats, ReferenceChunk, SearchFilter, SearchResult, VectorPoint};

/// Page size used when scrolling a collection.
const SCROLL_PAGE_SIZE: u32 = 256;

#[derive(Clone)]
/// Direct Qdrant client wrapper.
pub struct QdrantClient {
    client: Qdrant,
    url: String,
}

impl QdrantClient {
    /// Creates a client for `url`.
    pub async fn new(url: &str) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Creates a collection with cosine distance.
    pub async fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorDbError> {
        let vectors_config = VectorParamsBuilder::new(vector_size, Distance::Cosine);

        self.client
            .create_collection(CreateCollectionBuilder::new(name).vectors_config(vectors_config))
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            })?;

        info!(collection = name, vector_size, "Created collection");
        Ok(())
    }

    /// Ensures a collection exists (creates it if missing).
    pub async fn ensure_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorDbError> {
        let exists = self.client.collection_exists(name).await.map_err(|e| {
            VectorDbError::CreateCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            }
        })?;

        if !exists {
            self.create_collection(name, vector_size).await?;
        }

        Ok(())
    }

    /// Drops the collection (if present) and creates it empty.
    pub async fn recreate_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorDbError> {
        let exists = self.client.collection_exists(name).await.map_err(|e| {
            VectorDbError::DeleteCollectionFailed {
                collection: name.to_string(),
                message: e.to_string(),
            }
        })?;

        if exists {
            self.client.delete_collection(name).await.map_err(|e| {
                VectorDbError::DeleteCollectionFailed {
                    collection: name.to_string(),
                    message: e.to_string(),
                }
            })?;
        }

        self.create_collection(name, vector_size).await
    }

    /// Upserts points into a collection, waiting until they are searchable.
    pub async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorDbError> {
        if points.is_empty() {
            return Ok(());
        }

        let count = points.len();
        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|p| PointStruct::new(p.id, p.vector, p.chunk.to_payload()))
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        debug!(collection, count, "Upserted points");
        Ok(())
    }

    /// Searches a collection by vector similarity, restricted by `filter`.
    pub async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        filter: SearchFilter,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        let mut search_builder =
            SearchPointsBuilder::new(collection, query, limit).with_payload(true);

        if let Some(filter) = to_qdrant_filter(&filter) {
            search_builder = search_builder.filter(filter);
        }

        let search_result = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let results = search_result
            .result
            .into_iter()
            .filter_map(SearchResult::from_scored_point)
            .collect();

        Ok(results)
    }

    /// Exact number of points in a collection.
    pub async fn count_points(&self, collection: &str) -> Result<u64, VectorDbError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(|e| VectorDbError::InspectFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    /// Points count, vector size, distance and status of a collection.
    pub async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, VectorDbError> {
        let response = self
            .client
            .collection_info(collection)
            .await
            .map_err(|e| VectorDbError::InspectFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let info = response
            .result
            .ok_or_else(|| VectorDbError::CollectionNotFound {
                collection: collection.to_string(),
            })?;

        let (vector_size, distance) = info
            .config
            .as_ref()
            .and_then(|c| c.params.as_ref())
            .and_then(|p| p.vectors_config.as_ref())
            .and_then(|v| v.config.as_ref())
            .and_then(|kind| match kind {
                VectorsConfigKind::Params(params) => Some((
                    params.size,
                    Distance::try_from(params.distance)
                        .map(|d| d.as_str_name().to_string())
                        .unwrap_or_else(|_| "Unknown".to_string()),
                )),
                _ => None,
            })
            .unwrap_or_else(|| (0, "Unknown".to_string()));

        let status = CollectionStatus::try_from(info.status)
            .map(|s| s.as_str_name().to_string())
            .unwrap_or_else(|_| "Unknown".to_string());

        Ok(CollectionStats {
            collection: collection.to_string(),
            points_count: info.points_count.unwrap_or(0),
            vector_size,
            distance,
            status,
        })
    }

    /// Reads every chunk payload in a collection (vectors are not fetched).
    pub async fn scroll_chunks(&self, collection: &str) -> Result<Vec<ReferenceChunk>, VectorDbError> {
        let mut chunks = Vec::new();
        let mut offset = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(collection)
                .limit(SCROLL_PAGE_SIZE)
                .with_payload(true)
                .with_vectors(false);
            if let Some(point_id) = offset.take() {
                builder = builder.offset(point_id);
            }

            let page = self
                .client
                .scroll(builder)
                .await
                .map_err(|e| VectorDbError::InspectFailed {
                    collection: collection.to_string(),
                    message: e.to_string(),
                })?;

            chunks.extend(
                page.result
                    .iter()
                    .filter_map(|point| ReferenceChunk::from_payload(&point.payload)),
            );

            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(chunks)
    }
}

fn to_qdrant_filter(filter: &SearchFilter) -> Option<Filter> {
    let mut conditions = Vec::new();
    if let Some(document_type) = filter.document_type {
        conditions.push(Condition::matches("type", document_type.as_str().to_string()));
    }
    if let Some(section) = filter.section {
        conditions.push(Condition::matches("section", section.as_str().to_string()));
    }

    if conditions.is_empty() {
        None
    } else {
        Some(Filter::must(conditions))
    }
}

/// Async interface used by retrieval and ingestion.
pub trait VectorDbClient: Send + Sync {
    /// Returns `true` if the backend answers a health probe.
    fn is_ready(&self) -> impl std::future::Future<Output = bool> + Send;

    /// Ensures a collection exists.
    fn ensure_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;

    /// Drops and recreates a collection.
    fn recreate_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;

    /// Upserts points.
    fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> impl std::future::Future<Output = Result<(), VectorDbError>> + Send;

    /// Searches for similar points.
    fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        filter: SearchFilter,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResult>, VectorDbError>> + Send;

    /// Number of points in a collection.
    fn count_points(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<u64, VectorDbError>> + Send;

    /// Collection summary.
    fn collection_stats(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<CollectionStats, VectorDbError>> + Send;

    /// All chunk payloads in a collection.
    fn scroll_chunks(
        &self,
        collection: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ReferenceChunk>, VectorDbError>> + Send;
}

impl VectorDbClient for QdrantClient {
    async fn is_ready(&self) -> bool {
        self.health_check().await.is_ok()
    }

    async fn ensure_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.ensure_collection(name, vector_size).await
    }

    async fn recreate_collection(&self, name: &str, vector_size: u64) -> Result<(), VectorDbError> {
        self.recreate_collection(name, vector_size).await
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorDbError> {
        self.upsert_points(collection, points).await
    }

    async fn search(
        &self,
        collection: &str,
        query: Vec<f32>,
        limit: u64,
        filter: SearchFilter,
    ) -> Result<Vec<SearchResult>, VectorDbError> {
        self.search(collection, query, limit, filter).await
    }

    async fn count_points(&self, collection: &str) -> Result<u64, VectorDbError> {
        self.count_points(collection).await
    }

    async fn collection_stats(&self, collection: &str) -> Result<CollectionStats, VectorDbError> {
        self.collection_stats(collection).await
    }

    async fn scroll_chunks(&self, collection: &str) -> Result<Vec<ReferenceChunk>, VectorDbError> {
        self.scroll_chunks(collection).await
    }
}
