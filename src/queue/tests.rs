use std::time::Duration;

use uuid::Uuid;

use super::*;

fn payload(job_id: Uuid) -> EvaluationPayload {
    EvaluationPayload {
        job_id,
        job_title: "Backend Engineer".to_string(),
        cv_document_id: "cv-1".to_string(),
        project_document_id: "proj-1".to_string(),
    }
}

fn queue() -> MemoryQueue {
    MemoryQueue::new(QueueConfig::default().default_options(TaskOptions {
        attempts: 3,
        backoff: BackoffPolicy::Exponential {
            base: Duration::from_secs(2),
        },
        ..TaskOptions::default()
    }))
}

fn enqueue(queue: &MemoryQueue, options: Option<TaskOptions>) -> Uuid {
    let id = Uuid::new_v4();
    queue.enqueue(id, payload(id), options).unwrap();
    id
}

#[test]
fn test_backoff_delays() {
    let exponential = BackoffPolicy::Exponential {
        base: Duration::from_millis(2000),
    };
    assert_eq!(exponential.delay_for(1), Duration::from_secs(2));
    assert_eq!(exponential.delay_for(2), Duration::from_secs(4));
    assert_eq!(exponential.delay_for(3), Duration::from_secs(8));

    let fixed = BackoffPolicy::Fixed {
        delay: Duration::from_secs(1),
    };
    assert_eq!(fixed.delay_for(5), Duration::from_secs(1));
}

#[test]
fn test_default_retention() {
    let config = QueueConfig::default();
    assert_eq!(config.completed_retention.max_count, 100);
    assert_eq!(
        config.completed_retention.max_age,
        Some(Duration::from_secs(86_400))
    );
    assert_eq!(config.failed_retention.max_count, 1000);
    assert!(config.failed_retention.max_age.is_none());
}

#[tokio::test]
async fn test_enqueue_is_idempotent() {
    let queue = queue();
    let id = Uuid::new_v4();

    assert_eq!(
        queue.enqueue(id, payload(id), None).unwrap(),
        EnqueueOutcome::Enqueued
    );
    assert_eq!(
        queue.enqueue(id, payload(id), None).unwrap(),
        EnqueueOutcome::Duplicate
    );

    let stats = queue.stats();
    assert_eq!(stats.waiting, 1);
    assert_eq!(stats.total, 1);
}

#[tokio::test]
async fn test_priority_then_fifo() {
    let queue = queue();
    let low = enqueue(&queue, Some(TaskOptions::default().priority(5)));
    let first = enqueue(&queue, None);
    let second = enqueue(&queue, None);
    let urgent = enqueue(&queue, Some(TaskOptions::default().priority(0)));

    let mut order = Vec::new();
    for _ in 0..4 {
        order.push(queue.next_task().await.unwrap().id);
    }

    assert_eq!(order, vec![urgent, first, second, low]);
}

#[tokio::test]
async fn test_next_task_marks_active() {
    let queue = queue();
    let id = enqueue(&queue, None);

    let task = queue.next_task().await.unwrap();
    assert_eq!(task.id, id);
    assert_eq!(task.state, TaskState::Active);
    assert!(task.processed_at.is_some());
    assert_eq!(queue.get_task(id).unwrap().state, TaskState::Active);

    queue.update_progress(id, 150).unwrap();
    assert_eq!(queue.get_task(id).unwrap().progress, 100);
}

#[tokio::test]
async fn test_complete_moves_to_retention() {
    let queue = queue();
    let id = enqueue(&queue, None);
    queue.next_task().await.unwrap();

    queue.complete(id).unwrap();

    let view = queue.get_task(id).unwrap();
    assert_eq!(view.state, TaskState::Completed);
    assert_eq!(view.progress, 100);

    let stats = queue.stats();
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.active, 0);
    assert!(matches!(
        queue.complete(id),
        Err(QueueError::TaskNotFound { .. })
    ));
}

#[tokio::test]
async fn test_complete_requires_active() {
    let queue = queue();
    let id = enqueue(&queue, None);

    assert!(matches!(
        queue.complete(id),
        Err(QueueError::NotActive {
            state: TaskState::Waiting,
            ..
        })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_failed_task_retried_with_backoff_then_exhausted() {
    let queue = queue();
    let id = enqueue(&queue, None);
    let started = tokio::time::Instant::now();

    queue.next_task().await.unwrap();
    assert_eq!(
        queue.fail(id, "boom").unwrap(),
        FailOutcome::Retrying {
            delay: Duration::from_secs(2),
            attempt: 2
        }
    );
    assert_eq!(queue.get_task(id).unwrap().state, TaskState::Delayed);
    assert_eq!(queue.stats().delayed, 1);

    let task = queue.next_task().await.unwrap();
    assert_eq!(task.attempts_made, 1);
    assert_eq!(started.elapsed(), Duration::from_secs(2));

    assert_eq!(
        queue.fail(id, "boom again").unwrap(),
        FailOutcome::Retrying {
            delay: Duration::from_secs(4),
            attempt: 3
        }
    );
    queue.next_task().await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_secs(6));

    assert_eq!(queue.fail(id, "still broken").unwrap(), FailOutcome::Exhausted);
    let view = queue.get_task(id).unwrap();
    assert_eq!(view.state, TaskState::Failed);
    assert_eq!(view.attempts_made, 3);
    assert_eq!(view.last_error.as_deref(), Some("still broken"));
}

#[tokio::test]
async fn test_single_attempt_fails_immediately() {
    let queue = queue();
    let options = TaskOptions {
        attempts: 1,
        ..TaskOptions::default()
    };
    let id = enqueue(&queue, Some(options));
    queue.next_task().await.unwrap();

    assert_eq!(queue.fail(id, "boom").unwrap(), FailOutcome::Exhausted);
    assert_eq!(queue.stats().failed, 1);
}

#[tokio::test]
async fn test_remove_waiting_task() {
    let queue = queue();
    let id = enqueue(&queue, None);

    assert_eq!(queue.remove_task(id), RemoveOutcome::Removed);
    assert!(queue.get_task(id).is_none());
    assert_eq!(queue.stats().total, 0);
    assert_eq!(queue.remove_task(id), RemoveOutcome::NotFound);
}

#[tokio::test]
async fn test_remove_active_task_discards_it() {
    let queue = queue();
    let id = enqueue(&queue, None);
    queue.next_task().await.unwrap();

    assert_eq!(queue.remove_task(id), RemoveOutcome::Discarded);
    assert_eq!(queue.get_task(id).unwrap().state, TaskState::Active);

    assert_eq!(queue.fail(id, "boom").unwrap(), FailOutcome::Discarded);
    assert_eq!(queue.get_task(id).unwrap().state, TaskState::Failed);
}

#[tokio::test]
async fn test_finished_task_can_be_enqueued_again() {
    let queue = queue();
    let options = TaskOptions {
        attempts: 1,
        ..TaskOptions::default()
    };
    let id = enqueue(&queue, Some(options));
    queue.next_task().await.unwrap();
    queue.fail(id, "boom").unwrap();

    assert_eq!(
        queue.enqueue(id, payload(id), None).unwrap(),
        EnqueueOutcome::Enqueued
    );
    let view = queue.get_task(id).unwrap();
    assert_eq!(view.state, TaskState::Waiting);
    assert_eq!(view.attempts_made, 0);
}

#[tokio::test]
async fn test_paused_queue_holds_tasks() {
    let queue = std::sync::Arc::new(queue());
    queue.pause();
    let id = enqueue(&queue, None);

    let consumer = {
        let queue = std::sync::Arc::clone(&queue);
        tokio::spawn(async move { queue.next_task().await })
    };
    tokio::task::yield_now().await;
    assert!(!consumer.is_finished());
    assert_eq!(queue.stats().waiting, 1);

    queue.resume();
    let task = consumer.await.unwrap().unwrap();
    assert_eq!(task.id, id);
}

#[tokio::test]
async fn test_close_wakes_consumers() {
    let queue = std::sync::Arc::new(queue());
    let consumer = {
        let queue = std::sync::Arc::clone(&queue);
        tokio::spawn(async move { queue.next_task().await })
    };
    tokio::task::yield_now().await;

    queue.close();

    assert!(consumer.await.unwrap().is_none());
    assert!(matches!(
        queue.enqueue(Uuid::new_v4(), payload(Uuid::new_v4()), None),
        Err(QueueError::Closed)
    ));
}

#[tokio::test]
async fn test_clean_finished_tasks() {
    let queue = queue();
    for _ in 0..3 {
        let id = enqueue(&queue, None);
        queue.next_task().await.unwrap();
        queue.complete(id).unwrap();
    }

    assert!(
        queue
            .clean(Duration::from_secs(3600), 10, TaskState::Completed)
            .unwrap()
            .is_empty()
    );

    let removed = queue.clean(Duration::ZERO, 2, TaskState::Completed).unwrap();
    assert_eq!(removed.len(), 2);
    assert_eq!(queue.stats().completed, 1);

    assert!(matches!(
        queue.clean(Duration::ZERO, 10, TaskState::Waiting),
        Err(QueueError::NotTerminal { .. })
    ));
}

#[tokio::test]
async fn test_completed_retention_is_bounded() {
    let queue = MemoryQueue::new(
        QueueConfig::default().completed_retention(Retention::count(2)),
    );
    for _ in 0..5 {
        let id = enqueue(&queue, None);
        queue.next_task().await.unwrap();
        queue.complete(id).unwrap();
    }

    assert!(queue.stats().completed <= 2);
}

#[tokio::test]
async fn test_snapshot_round_trip_restores_waiting() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("queue.json");

    let queue = queue();
    let active = enqueue(&queue, None);
    let waiting = enqueue(&queue, None);
    queue.next_task().await.unwrap();
    let done = enqueue(&queue, Some(TaskOptions::default().priority(0)));
    queue.next_task().await.unwrap();
    queue.complete(done).unwrap();

    assert_eq!(queue.persist(&path).await.unwrap(), 2);

    let restored = self::queue();
    assert_eq!(restored.restore(&path).await.unwrap(), 2);
    assert_eq!(restored.get_task(active).unwrap().state, TaskState::Waiting);
    assert_eq!(restored.get_task(waiting).unwrap().state, TaskState::Waiting);
    assert!(restored.get_task(done).is_none());

    assert_eq!(restored.next_task().await.unwrap().id, active);
}

#[tokio::test]
async fn test_restore_missing_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let queue = queue();
    assert_eq!(queue.restore(&dir.path().join("absent.json")).await.unwrap(), 0);
}
