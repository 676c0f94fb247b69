//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SCREENER_*` environment variables.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{DEFAULT_COLLECTION_NAME, DEFAULT_EMBEDDING_DIM};
use crate::embedding::EmbedderConfig;
use crate::ingestion::IngestionConfig;
use crate::llm::LlmConfig;
use crate::queue::{BackoffPolicy, QueueConfig, TaskOptions};
use crate::worker::WorkerConfig;

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SCREENER_*` overrides on top of defaults, then derive
/// per-component configs with the `*_config` accessors.
#[derive(Debug, Clone)]
pub struct Config {
    /// Qdrant endpoint URL. Default: `http://localhost:6334`.
    pub qdrant_url: String,

    /// Collection holding reference chunks. Default: `evaluation_docs`.
    pub collection_name: String,

    /// Directory with the reference documents (`<type>.txt`). Default: `./docs`.
    pub docs_dir: PathBuf,

    /// Where the queue snapshot is written on shutdown. `None` disables persistence.
    pub queue_snapshot_path: Option<PathBuf>,

    /// Directory with `config.json`, `model.safetensors` and `tokenizer.json`.
    /// `None` runs the embedder in stub mode.
    pub embedding_model_path: Option<PathBuf>,

    /// Embedding dimension. Default: `384`.
    pub embedding_dim: usize,

    /// Model name passed to the completion provider. Default: `gpt-4o-mini`.
    pub llm_model: String,

    /// Sampling temperature. Default: `0.3`.
    pub llm_temperature: f64,

    /// Max tokens per scoring completion. Default: `2000`.
    pub llm_max_tokens: u32,

    /// Serve canned completions instead of calling a provider.
    pub mock_provider: bool,

    /// Max tasks processed concurrently. Default: `5`.
    pub worker_concurrency: usize,

    /// Max task starts per second. Default: `10`.
    pub worker_rate_limit: u32,

    /// Transport-level attempts per task. Default: `3`.
    pub queue_attempts: u32,

    /// Base delay for exponential task backoff. Default: `2s`.
    pub queue_backoff: Duration,
}

/// Default Qdrant URL used when `SCREENER_QDRANT_URL` is not set.
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";

/// Default completion model used when `SCREENER_LLM_MODEL` is not set.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

impl Default for Config {
    fn default() -> Self {
        Self {
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            docs_dir: PathBuf::from("./docs"),
            queue_snapshot_path: None,
            embedding_model_path: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 2000,
            mock_provider: false,
            worker_concurrency: 5,
            worker_rate_limit: 10,
            queue_attempts: 3,
            queue_backoff: Duration::from_millis(2000),
        }
    }
}

impl Config {
    const ENV_QDRANT_URL: &'static str = "SCREENER_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "SCREENER_COLLECTION";
    const ENV_DOCS_DIR: &'static str = "SCREENER_DOCS_DIR";
    const ENV_QUEUE_SNAPSHOT_PATH: &'static str = "SCREENER_QUEUE_SNAPSHOT_PATH";
    const ENV_EMBEDDING_MODEL_PATH: &'static str = "SCREENER_EMBEDDING_MODEL_PATH";
    const ENV_EMBEDDING_DIM: &'static str = "SCREENER_EMBEDDING_DIM";
    const ENV_LLM_MODEL: &'static str = "SCREENER_LLM_MODEL";
    const ENV_LLM_TEMPERATURE: &'static str = "SCREENER_LLM_TEMPERATURE";
    const ENV_LLM_MAX_TOKENS: &'static str = "SCREENER_LLM_MAX_TOKENS";
    const ENV_MOCK_PROVIDER: &'static str = "SCREENER_MOCK_PROVIDER";
    const ENV_WORKER_CONCURRENCY: &'static str = "SCREENER_WORKER_CONCURRENCY";
    const ENV_WORKER_RATE_LIMIT: &'static str = "SCREENER_WORKER_RATE_LIMIT";
    const ENV_QUEUE_ATTEMPTS: &'static str = "SCREENER_QUEUE_ATTEMPTS";
    const ENV_QUEUE_BACKOFF_MS: &'static str = "SCREENER_QUEUE_BACKOFF_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let qdrant_url = Self::parse_string_from_env(Self::ENV_QDRANT_URL, defaults.qdrant_url);
        let collection_name =
            Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection_name);
        let docs_dir = Self::parse_path_from_env(Self::ENV_DOCS_DIR, defaults.docs_dir);
        let queue_snapshot_path = Self::parse_optional_path_from_env(Self::ENV_QUEUE_SNAPSHOT_PATH);
        let embedding_model_path =
            Self::parse_optional_path_from_env(Self::ENV_EMBEDDING_MODEL_PATH);
        let embedding_dim =
            Self::parse_number_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?;
        let llm_model = Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model);
        let llm_temperature =
            Self::parse_number_from_env(Self::ENV_LLM_TEMPERATURE, defaults.llm_temperature)?;
        let llm_max_tokens =
            Self::parse_number_from_env(Self::ENV_LLM_MAX_TOKENS, defaults.llm_max_tokens)?;
        let mock_provider = Self::parse_bool_from_env(Self::ENV_MOCK_PROVIDER, false);
        let worker_concurrency =
            Self::parse_number_from_env(Self::ENV_WORKER_CONCURRENCY, defaults.worker_concurrency)?;
        let worker_rate_limit =
            Self::parse_number_from_env(Self::ENV_WORKER_RATE_LIMIT, defaults.worker_rate_limit)?;
        let queue_attempts =
            Self::parse_number_from_env(Self::ENV_QUEUE_ATTEMPTS, defaults.queue_attempts)?;
        let backoff_ms: u64 = Self::parse_number_from_env(
            Self::ENV_QUEUE_BACKOFF_MS,
            defaults.queue_backoff.as_millis() as u64,
        )?;

        Ok(Self {
            qdrant_url,
            collection_name,
            docs_dir,
            queue_snapshot_path,
            embedding_model_path,
            embedding_dim,
            llm_model,
            llm_temperature,
            llm_max_tokens,
            mock_provider,
            worker_concurrency,
            worker_rate_limit,
            queue_attempts,
            queue_backoff: Duration::from_millis(backoff_ms),
        })
    }

    /// Validates ranges and paths (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dim == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_EMBEDDING_DIM,
                value: self.embedding_dim.to_string(),
                reason: "must be greater than zero",
            });
        }

        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_LLM_TEMPERATURE,
                value: self.llm_temperature.to_string(),
                reason: "must be between 0.0 and 2.0",
            });
        }

        if self.worker_concurrency == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_WORKER_CONCURRENCY,
                value: self.worker_concurrency.to_string(),
                reason: "must be at least 1",
            });
        }

        if self.worker_rate_limit == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_WORKER_RATE_LIMIT,
                value: self.worker_rate_limit.to_string(),
                reason: "must be at least 1",
            });
        }

        if self.queue_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_QUEUE_ATTEMPTS,
                value: self.queue_attempts.to_string(),
                reason: "must be at least 1",
            });
        }

        if self.docs_dir.exists() && !self.docs_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.docs_dir.clone(),
            });
        }

        if let Some(ref path) = self.embedding_model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Embedder settings (stub mode when no model path is configured).
    pub fn embedder_config(&self) -> EmbedderConfig {
        let config = match &self.embedding_model_path {
            Some(path) => EmbedderConfig::new(path.clone()),
            None => EmbedderConfig::stub(),
        };
        config.embedding_dim(self.embedding_dim)
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig::default()
            .model(self.llm_model.clone())
            .temperature(self.llm_temperature)
            .max_tokens(self.llm_max_tokens)
            .mock_provider(self.mock_provider)
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::default()
            .default_options(TaskOptions {
                attempts: self.queue_attempts,
                backoff: BackoffPolicy::Exponential {
                    base: self.queue_backoff,
                },
                ..TaskOptions::default()
            })
            .snapshot_path(self.queue_snapshot_path.clone())
    }

    /// Snapshot file of an in-memory store, kept next to the queue snapshot:
    /// `state/queue.json` gives `state/queue.jobs.json` for `store = "jobs"`.
    pub fn store_snapshot_path(&self, store: &str) -> Option<PathBuf> {
        let queue_path = self.queue_snapshot_path.as_ref()?;
        let stem = queue_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("queue");
        Some(queue_path.with_file_name(format!("{stem}.{store}.json")))
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::default()
            .concurrency(self.worker_concurrency)
            .max_starts_per_window(self.worker_rate_limit)
    }

    pub fn ingestion_config(&self) -> IngestionConfig {
        IngestionConfig::default()
            .collection_name(self.collection_name.clone())
            .vector_size(self.embedding_dim as u64)
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_bool_from_env(var_name: &str, default: bool) -> bool {
        match env::var(var_name) {
            Ok(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            Err(_) => default,
        }
    }

    fn parse_number_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidNumber {
                    name: var_name,
                    value,
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }
}
