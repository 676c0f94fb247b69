//! Screener service entrypoint.

use std::sync::Arc;

use mimalloc::MiMalloc;
use tokio::signal;

use screener::config::Config;
use screener::content::InMemoryContentStore;
use screener::embedding::{BertEmbedder, Embedder};
use screener::ingestion::{FsReferenceSource, IngestionPipeline};
use screener::llm::build_provider;
use screener::orchestrator::JobOrchestrator;
use screener::queue::MemoryQueue;
use screener::registry::{InMemoryJobStore, InMemoryResultStore};
use screener::scoring::{ContextRetriever, RagScorer, ScoringConfig};
use screener::vectordb::{QdrantClient, VectorDbClient};
use screener::worker::{EvaluationProcessor, WorkerPool, log_event};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    let qdrant = Arc::new(QdrantClient::new(&config.qdrant_url).await?);

    if std::env::args().any(|arg| arg == "--health-check") {
        let healthy = qdrant.is_ready().await;
        tracing::info!(healthy, url = %config.qdrant_url, "Vector store health check");
        std::process::exit(if healthy { 0 } else { 1 });
    }

    let embedder: Arc<dyn Embedder> = Arc::new(BertEmbedder::load(config.embedder_config())?);

    if std::env::args().any(|arg| arg == "--ingest") {
        return run_ingestion(&config, qdrant, embedder).await;
    }

    tracing::info!(
        qdrant_url = %config.qdrant_url,
        collection = %config.collection_name,
        concurrency = config.worker_concurrency,
        "Screener starting"
    );

    // Stores come back before the queue so restored tasks find their jobs and documents.
    let state = ServiceState::default();
    state.restore(&config).await;

    let queue_config = config.queue_config();
    let snapshot_path = queue_config.snapshot_path.clone();
    let queue = MemoryQueue::shared(queue_config);
    if let Some(path) = &snapshot_path {
        match queue.restore(path).await {
            Ok(count) => tracing::info!(count, path = %path.display(), "Queue restored"),
            Err(e) => tracing::warn!(error = %e, "Failed to restore queue snapshot. Starting empty."),
        }
    }

    let orchestrator = JobOrchestrator::new(
        state.jobs.clone(),
        state.results.clone(),
        state.contents.clone(),
        queue.clone(),
    );
    let stats = orchestrator.queue_stats().await;
    tracing::info!(
        waiting = stats.waiting,
        failed = stats.failed,
        total = stats.total,
        "Queue ready"
    );

    let llm_config = config.llm_config();
    let retriever = ContextRetriever::new(qdrant, embedder, config.collection_name.clone());
    let scorer = Arc::new(RagScorer::new(
        retriever,
        build_provider(&llm_config),
        ScoringConfig::from(&llm_config),
    ));

    let processor = Arc::new(EvaluationProcessor::new(
        state.jobs.clone(),
        state.results.clone(),
        state.contents.clone(),
        scorer,
    ));

    let pool = WorkerPool::spawn(queue.clone(), processor, config.worker_config());
    let mut events = pool.subscribe();
    let observer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => log_event(&event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event observer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    shutdown_signal().await;

    pool.shutdown().await;
    queue.close();
    if let Err(e) = observer.await {
        tracing::warn!(error = %e, "Event observer ended abnormally");
    }

    if let Some(path) = &snapshot_path {
        match queue.persist(path).await {
            Ok(count) => tracing::info!(count, path = %path.display(), "Queue persisted"),
            Err(e) => tracing::error!(error = %e, "Failed to persist queue snapshot"),
        }
    }
    state.persist(&config).await;

    tracing::info!("Screener shutdown complete");
    Ok(())
}

/// In-memory registry and content stores, snapshotted next to the queue.
#[derive(Default)]
struct ServiceState {
    jobs: Arc<InMemoryJobStore>,
    results: Arc<InMemoryResultStore>,
    contents: Arc<InMemoryContentStore>,
}

impl ServiceState {
    async fn restore(&self, config: &Config) {
        if let Some(path) = config.store_snapshot_path("contents") {
            if let Err(e) = self.contents.restore(&path).await {
                tracing::warn!(error = %e, "Failed to restore content snapshot");
            }
        }
        if let Some(path) = config.store_snapshot_path("jobs") {
            if let Err(e) = self.jobs.restore(&path).await {
                tracing::warn!(error = %e, "Failed to restore job snapshot");
            }
        }
        if let Some(path) = config.store_snapshot_path("results") {
            if let Err(e) = self.results.restore(&path).await {
                tracing::warn!(error = %e, "Failed to restore result snapshot");
            }
        }
    }

    async fn persist(&self, config: &Config) {
        if let Some(path) = config.store_snapshot_path("contents") {
            if let Err(e) = self.contents.persist(&path).await {
                tracing::error!(error = %e, "Failed to persist content snapshot");
            }
        }
        if let Some(path) = config.store_snapshot_path("jobs") {
            if let Err(e) = self.jobs.persist(&path).await {
                tracing::error!(error = %e, "Failed to persist job snapshot");
            }
        }
        if let Some(path) = config.store_snapshot_path("results") {
            if let Err(e) = self.results.persist(&path).await {
                tracing::error!(error = %e, "Failed to persist result snapshot");
            }
        }
    }
}

async fn run_ingestion(
    config: &Config,
    qdrant: Arc<QdrantClient>,
    embedder: Arc<dyn Embedder>,
) -> anyhow::Result<()> {
    let source = Arc::new(FsReferenceSource::new(config.docs_dir.clone()));
    let pipeline = IngestionPipeline::new(qdrant, embedder, source, config.ingestion_config())?;

    pipeline.initialize().await?;
    let report = pipeline.ingest_all().await?;
    for document in &report.documents {
        match &document.error {
            None => tracing::info!(
                document_type = %document.document_type,
                filename = %document.filename,
                chunks = document.chunks,
                "Ingested"
            ),
            Some(error) => tracing::warn!(
                document_type = %document.document_type,
                filename = %document.filename,
                %error,
                "Not ingested"
            ),
        }
    }

    let stats = pipeline.statistics().await?;
    tracing::info!(
        collection = %stats.collection,
        total_points = stats.total_points,
        vector_size = stats.vector_size,
        distance = %stats.distance,
        status = %stats.status,
        "Vector store statistics"
    );

    if report.succeeded() == 0 {
        anyhow::bail!("no reference document was ingested");
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
