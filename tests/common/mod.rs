//! In-process service harness: orchestrator, queue and worker pool over in-memory stores,
//! a seeded mock vector store and a scriptable completion provider.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use screener::content::{DocumentContent, DocumentKind, ExtractedData, InMemoryContentStore};
use screener::embedding::BertEmbedder;
use screener::ingestion::{IngestionConfig, IngestionPipeline, InMemoryReferenceSource};
use screener::llm::{MockCompletionProvider, RetryPolicy};
use screener::orchestrator::{JobOrchestrator, JobView};
use screener::queue::{BackoffPolicy, MemoryQueue, QueueConfig, TaskOptions};
use screener::registry::{InMemoryJobStore, InMemoryResultStore, JobStatus};
use screener::scoring::{ContextRetriever, RagScorer, ScoringConfig};
use screener::vectordb::{DocumentType, MockVectorDbClient};
use screener::worker::{EvaluationProcessor, WorkerConfig, WorkerPool};
use uuid::Uuid;

pub const COLLECTION: &str = "evaluation_docs";
const WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub fn cv_content() -> DocumentContent {
    DocumentContent::completed(
        "cv-1",
        DocumentKind::Cv,
        "Backend engineer with five years of Go and Node.js experience.",
        ExtractedData {
            skills: vec!["js".into(), "go".into(), "php".into(), "node".into()],
            ..Default::default()
        },
    )
}

pub fn project_content() -> DocumentContent {
    DocumentContent::completed(
        "proj-1",
        DocumentKind::ProjectReport,
        "Async evaluation pipeline with a job queue and retrieval-augmented scoring.",
        ExtractedData {
            code_blocks: 5,
            ..Default::default()
        },
    )
    .word_count(2000)
}

fn reference_source() -> InMemoryReferenceSource {
    InMemoryReferenceSource::new()
        .with(
            DocumentType::JobDescription,
            "Backend Engineer. Build APIs in Go and Node.js, operate cloud services, mentor peers.",
        )
        .with(
            DocumentType::CaseStudyBrief,
            "Build an asynchronous CV evaluation service with a durable queue and RAG scoring.",
        )
        .with(
            DocumentType::ScoringRubric,
            format!(
                "CV Match Evaluation\n{}\nProject Deliverable Evaluation\n{}",
                "Technical skills 40%, experience 25%, achievements 20%, cultural fit 15%. ".repeat(2),
                "Correctness 30%, code quality 25%, resilience 20%, documentation 15%, creativity 10%. "
                    .repeat(2),
            ),
        )
}

pub struct TestService {
    pub orchestrator: JobOrchestrator,
    pub llm: Arc<MockCompletionProvider>,
    pub vectors: Arc<MockVectorDbClient>,
    pub queue: Arc<MemoryQueue>,
    pool: WorkerPool,
}

impl TestService {
    /// Ingests the reference corpus and starts a worker pool backed by `llm`.
    pub async fn spawn(llm: MockCompletionProvider) -> Self {
        let llm = Arc::new(llm);
        let vectors = Arc::new(MockVectorDbClient::new());
        let embedder = Arc::new(BertEmbedder::stub());

        let pipeline = IngestionPipeline::new(
            vectors.clone(),
            embedder.clone(),
            Arc::new(reference_source()),
            IngestionConfig::default().collection_name(COLLECTION),
        )
        .expect("valid ingestion config");
        let report = pipeline.ingest_all().await.expect("ingestion runs");
        assert_eq!(report.failed(), 0, "reference corpus should ingest cleanly");

        let contents = Arc::new(InMemoryContentStore::new());
        contents.insert(cv_content());
        contents.insert(project_content());

        let jobs = Arc::new(InMemoryJobStore::new());
        let results = Arc::new(InMemoryResultStore::new());
        let queue = MemoryQueue::shared(QueueConfig::default().default_options(TaskOptions {
            backoff: BackoffPolicy::Fixed {
                delay: Duration::from_millis(10),
            },
            ..TaskOptions::default()
        }));

        let scorer = Arc::new(RagScorer::new(
            ContextRetriever::new(vectors.clone(), embedder, COLLECTION),
            llm.clone(),
            ScoringConfig::default().retry(RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            }),
        ));
        let processor = Arc::new(EvaluationProcessor::new(
            jobs.clone(),
            results.clone(),
            contents.clone(),
            scorer,
        ));
        let pool = WorkerPool::spawn(queue.clone(), processor, WorkerConfig::default());

        let orchestrator = JobOrchestrator::new(jobs, results, contents, queue.clone());

        Self {
            orchestrator,
            llm,
            vectors,
            queue,
            pool,
        }
    }

    /// Polls the job until it reaches `status`.
    pub async fn wait_for(&self, id: Uuid, status: JobStatus) -> JobView {
        let poll = async {
            loop {
                let view = self
                    .orchestrator
                    .get_result(id)
                    .await
                    .expect("job exists");
                if view.status == status {
                    return view;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(WAIT_TIMEOUT, poll)
            .await
            .unwrap_or_else(|_| panic!("job {id} did not reach {status}"))
    }

    /// Polls until no task is waiting, running or delayed.
    pub async fn wait_for_idle_queue(&self) {
        let poll = async {
            loop {
                let stats = self.queue.stats();
                if stats.waiting + stats.active + stats.delayed == 0 {
                    return;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(WAIT_TIMEOUT, poll)
            .await
            .expect("queue did not drain");
    }

    pub async fn shutdown(self) {
        self.pool.shutdown().await;
        self.queue.close();
    }
}
