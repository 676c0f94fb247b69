//! Text completion providers.
//!
//! [`GenaiCompletionProvider`] talks to a hosted model; [`CannedCompletionProvider`] serves
//! fixed answers for offline runs. Wrap calls in [`complete_with_retry`] for bounded retries.

mod canned;
mod config;
mod error;
mod hosted;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod retry;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

pub use canned::{
    CANNED_CV_RESPONSE, CANNED_PROJECT_RESPONSE, CANNED_SUMMARY_RESPONSE, CannedCompletionProvider,
};
pub use config::{DEFAULT_MAX_TOKENS, DEFAULT_SUMMARY_MAX_TOKENS, DEFAULT_TEMPERATURE, LlmConfig};
pub use error::LlmError;
pub use hosted::GenaiCompletionProvider;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockCompletionProvider;
pub use retry::{RetryPolicy, complete_and_parse, complete_with_retry};

use std::sync::Arc;

/// Sampling options for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
    -> Result<String, LlmError>;
}

/// Builds the provider selected by `config`.
pub fn build_provider(config: &LlmConfig) -> Arc<dyn CompletionProvider> {
    if config.mock_provider {
        tracing::warn!("Using canned completion provider (SCREENER_MOCK_PROVIDER)");
        Arc::new(CannedCompletionProvider)
    } else {
        Arc::new(GenaiCompletionProvider::new(config))
    }
}
