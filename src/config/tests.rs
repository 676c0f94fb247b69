use super::*;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_screener_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        for (key, _) in env::vars() {
            if key.starts_with("SCREENER_") {
                env::remove_var(key);
            }
        }
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.qdrant_url, "http://localhost:6334");
    assert_eq!(config.collection_name, "evaluation_docs");
    assert_eq!(config.docs_dir, PathBuf::from("./docs"));
    assert!(config.queue_snapshot_path.is_none());
    assert!(config.embedding_model_path.is_none());
    assert_eq!(config.embedding_dim, 384);
    assert_eq!(config.llm_max_tokens, 2000);
    assert_eq!(config.worker_concurrency, 5);
    assert_eq!(config.worker_rate_limit, 10);
    assert_eq!(config.queue_attempts, 3);
    assert_eq!(config.queue_backoff, Duration::from_secs(2));
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_screener_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.qdrant_url, DEFAULT_QDRANT_URL);
    assert_eq!(config.llm_model, DEFAULT_LLM_MODEL);
    assert!(!config.mock_provider);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_screener_env();

    let config = with_env_vars(
        &[
            ("SCREENER_QDRANT_URL", "http://qdrant:6334"),
            ("SCREENER_COLLECTION", "docs_v2"),
            ("SCREENER_WORKER_CONCURRENCY", "2"),
            ("SCREENER_WORKER_RATE_LIMIT", "4"),
            ("SCREENER_QUEUE_ATTEMPTS", "5"),
            ("SCREENER_QUEUE_BACKOFF_MS", "250"),
            ("SCREENER_LLM_TEMPERATURE", "0.7"),
            ("SCREENER_MOCK_PROVIDER", "true"),
        ],
        Config::from_env,
    )
    .expect("should parse overrides");

    assert_eq!(config.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.collection_name, "docs_v2");
    assert_eq!(config.worker_concurrency, 2);
    assert_eq!(config.worker_rate_limit, 4);
    assert_eq!(config.queue_attempts, 5);
    assert_eq!(config.queue_backoff, Duration::from_millis(250));
    assert!((config.llm_temperature - 0.7).abs() < f64::EPSILON);
    assert!(config.mock_provider);
}

#[test]
#[serial]
fn test_invalid_number_is_reported() {
    clear_screener_env();

    let result = with_env_vars(&[("SCREENER_WORKER_CONCURRENCY", "many")], Config::from_env);

    match result {
        Err(ConfigError::InvalidNumber { name, value, .. }) => {
            assert_eq!(name, "SCREENER_WORKER_CONCURRENCY");
            assert_eq!(value, "many");
        }
        other => panic!("expected InvalidNumber, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_empty_optional_path_is_none() {
    clear_screener_env();

    let config = with_env_vars(&[("SCREENER_EMBEDDING_MODEL_PATH", "  ")], Config::from_env)
        .expect("should parse");

    assert!(config.embedding_model_path.is_none());
}

#[test]
fn test_validate_rejects_zero_concurrency() {
    let config = Config {
        worker_concurrency: 0,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::OutOfRange {
            name: "SCREENER_WORKER_CONCURRENCY",
            ..
        })
    ));
}

#[test]
fn test_validate_rejects_temperature_out_of_range() {
    let config = Config {
        llm_temperature: 3.5,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::OutOfRange { .. })
    ));
}

#[test]
fn test_validate_missing_model_dir() {
    let config = Config {
        embedding_model_path: Some(PathBuf::from("/nonexistent/bge-small")),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));
}

#[test]
fn test_validate_docs_dir_must_be_directory() {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    let config = Config {
        docs_dir: file.path().to_path_buf(),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotADirectory { .. })
    ));
}

#[test]
fn test_component_configs_follow_settings() {
    let config = Config {
        worker_concurrency: 3,
        queue_attempts: 4,
        queue_backoff: Duration::from_millis(100),
        embedding_dim: 768,
        collection_name: "custom".to_string(),
        ..Default::default()
    };

    assert_eq!(config.worker_config().concurrency, 3);
    assert_eq!(config.queue_config().default_options.attempts, 4);
    assert_eq!(
        config.queue_config().default_options.backoff,
        crate::queue::BackoffPolicy::Exponential {
            base: Duration::from_millis(100)
        }
    );
    assert_eq!(config.ingestion_config().collection_name, "custom");
    assert_eq!(config.ingestion_config().vector_size, 768);
    assert!(config.embedder_config().testing_stub);
    assert_eq!(config.embedder_config().embedding_dim, 768);
}

#[test]
fn test_store_snapshots_sit_next_to_queue_snapshot() {
    let config = Config {
        queue_snapshot_path: Some(PathBuf::from("/var/lib/screener/queue.json")),
        ..Default::default()
    };
    assert_eq!(
        config.store_snapshot_path("jobs"),
        Some(PathBuf::from("/var/lib/screener/queue.jobs.json"))
    );
    assert_eq!(
        config.store_snapshot_path("results"),
        Some(PathBuf::from("/var/lib/screener/queue.results.json"))
    );

    assert!(Config::default().store_snapshot_path("jobs").is_none());
}
