use uuid::Uuid;

use super::*;
use crate::scoring::heuristics::{fallback_cv, fallback_project};
use crate::scoring::{EvaluationOutcome, RagStatus, ScoringMetadata};
use crate::content::{DocumentContent, DocumentKind, ExtractedData};

fn new_job() -> NewJob {
    NewJob::new("Backend Engineer", "cv-1", "proj-1")
}

#[tokio::test]
async fn test_create_starts_queued() {
    let store = InMemoryJobStore::new();
    let job = store.create(new_job()).await.unwrap();

    assert_eq!(job.status, JobStatus::Queued);
    assert_eq!(job.retry_count, 0);
    assert!(job.started_at.is_none());
    assert_eq!(store.find_by_id(job.id).await.unwrap(), Some(job));
}

#[tokio::test]
async fn test_status_invariants() {
    let store = InMemoryJobStore::new();
    let job = store.create(new_job()).await.unwrap();

    let StatusWrite::Applied(processing) = store
        .update_status(job.id, StatusUpdate::new(JobStatus::Processing))
        .await
        .unwrap()
    else {
        panic!("processing write skipped");
    };
    let started_at = processing.started_at.expect("started_at set");

    let StatusWrite::Applied(failed) = store
        .update_status(job.id, StatusUpdate::failed("boom"))
        .await
        .unwrap()
    else {
        panic!("failed write skipped");
    };
    assert_eq!(failed.error_message.as_deref(), Some("boom"));
    assert!(failed.completed_at.is_none());

    store
        .update_status(job.id, StatusUpdate::new(JobStatus::Processing))
        .await
        .unwrap();
    let StatusWrite::Applied(completed) = store
        .update_status(job.id, StatusUpdate::new(JobStatus::Completed))
        .await
        .unwrap()
    else {
        panic!("completed write skipped");
    };
    assert!(completed.error_message.is_none());
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.started_at, Some(started_at));
}

#[tokio::test]
async fn test_failed_requires_message() {
    let store = InMemoryJobStore::new();
    let job = store.create(new_job()).await.unwrap();

    let result = store
        .update_status(job.id, StatusUpdate::new(JobStatus::Failed))
        .await;
    assert!(matches!(result, Err(RegistryError::MissingErrorMessage { .. })));

    let current = store.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(current.status, JobStatus::Queued);
}

#[tokio::test]
async fn test_conditional_update_skips_on_mismatch() {
    let store = InMemoryJobStore::new();
    let job = store.create(new_job()).await.unwrap();
    store
        .update_status(job.id, StatusUpdate::failed("Job cancelled by user"))
        .await
        .unwrap();

    let write = store
        .update_status(
            job.id,
            StatusUpdate::new(JobStatus::Completed).expecting(&[JobStatus::Processing]),
        )
        .await
        .unwrap();

    assert_eq!(
        write,
        StatusWrite::Skipped {
            current: JobStatus::Failed
        }
    );
    let current = store.find_by_id(job.id).await.unwrap().unwrap();
    assert_eq!(current.error_message.as_deref(), Some("Job cancelled by user"));
}

#[tokio::test]
async fn test_retry_count_and_missing_job() {
    let store = InMemoryJobStore::new();
    let job = store.create(new_job()).await.unwrap();

    assert_eq!(store.increment_retry_count(job.id).await.unwrap(), 1);
    assert_eq!(store.increment_retry_count(job.id).await.unwrap(), 2);

    let missing = Uuid::new_v4();
    assert!(matches!(
        store.increment_retry_count(missing).await,
        Err(RegistryError::JobNotFound { id }) if id == missing
    ));
    assert!(store.find_by_id(missing).await.unwrap().is_none());
}

fn outcome() -> EvaluationOutcome {
    let cv = DocumentContent::completed("cv-1", DocumentKind::Cv, "text", ExtractedData::default());
    let project = DocumentContent::completed(
        "proj-1",
        DocumentKind::ProjectReport,
        "text",
        ExtractedData::default(),
    );
    EvaluationOutcome {
        cv: fallback_cv(&cv),
        project: fallback_project(&project),
        overall_summary: "summary".to_string(),
        metadata: ScoringMetadata::new(RagStatus::Fallback, RagStatus::Fallback, RagStatus::Completed),
    }
}

#[tokio::test]
async fn test_result_upsert_replaces() {
    let store = InMemoryResultStore::new();
    let job_id = Uuid::new_v4();

    store
        .upsert(EvaluationResult::from_outcome(job_id, outcome()))
        .await
        .unwrap();
    let mut second = EvaluationResult::from_outcome(job_id, outcome());
    second.overall_summary = "replaced".to_string();
    store.upsert(second).await.unwrap();

    let stored = store.find_by_job_id(job_id).await.unwrap().unwrap();
    assert_eq!(stored.overall_summary, "replaced");
}

#[test]
fn test_result_serializes_flat() {
    let result = EvaluationResult::from_outcome(Uuid::new_v4(), outcome());
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["cv_match_rate"], 0.7);
    assert_eq!(value["project_score"], 3.8);
    assert_eq!(value["rag_status"], "fallback");
    assert_eq!(value["overall_summary"], "summary");
}

#[tokio::test]
async fn test_result_remove() {
    let store = InMemoryResultStore::new();
    let job_id = Uuid::new_v4();
    store
        .upsert(EvaluationResult::from_outcome(job_id, outcome()))
        .await
        .unwrap();

    assert!(store.remove(job_id).await.unwrap());
    assert!(store.find_by_job_id(job_id).await.unwrap().is_none());
    assert!(!store.remove(job_id).await.unwrap());
}

#[tokio::test]
async fn test_snapshots_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let jobs_path = dir.path().join("jobs.json");
    let results_path = dir.path().join("results.json");

    let jobs = InMemoryJobStore::new();
    let queued = jobs.create(new_job()).await.unwrap();
    let failed = jobs.create(new_job()).await.unwrap();
    jobs.update_status(failed.id, StatusUpdate::failed("boom"))
        .await
        .unwrap();
    jobs.increment_retry_count(failed.id).await.unwrap();

    let results = InMemoryResultStore::new();
    results
        .upsert(EvaluationResult::from_outcome(queued.id, outcome()))
        .await
        .unwrap();

    assert_eq!(jobs.persist(&jobs_path).await.unwrap(), 2);
    assert_eq!(results.persist(&results_path).await.unwrap(), 1);

    let jobs = InMemoryJobStore::new();
    let results = InMemoryResultStore::new();
    assert_eq!(jobs.restore(&jobs_path).await.unwrap(), 2);
    assert_eq!(results.restore(&results_path).await.unwrap(), 1);

    let restored = jobs.find_by_id(failed.id).await.unwrap().unwrap();
    assert_eq!(restored.status, JobStatus::Failed);
    assert_eq!(restored.error_message.as_deref(), Some("boom"));
    assert_eq!(restored.retry_count, 1);
    assert_eq!(
        jobs.find_by_id(queued.id).await.unwrap().unwrap().status,
        JobStatus::Queued
    );

    let result = results.find_by_job_id(queued.id).await.unwrap().unwrap();
    assert_eq!(result.cv.match_rate, 0.7);
    assert_eq!(result.project.score, 3.8);
    assert_eq!(result.metadata.rag_status, RagStatus::Fallback);
}

#[tokio::test]
async fn test_restore_missing_snapshot_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = InMemoryJobStore::new();
    assert_eq!(store.restore(&dir.path().join("absent.json")).await.unwrap(), 0);
    assert!(store.is_empty());
}
