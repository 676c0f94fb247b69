use std::time::Duration;

use super::retry::RetryPolicy;

/// Max tokens for scoring completions.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Max tokens for the overall summary completion.
pub const DEFAULT_SUMMARY_MAX_TOKENS: u32 = 300;

pub const DEFAULT_TEMPERATURE: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub summary_max_tokens: u32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Serve canned completions instead of calling a provider.
    pub mock_provider: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            summary_max_tokens: DEFAULT_SUMMARY_MAX_TOKENS,
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            mock_provider: false,
        }
    }
}

impl LlmConfig {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn mock_provider(mut self, enabled: bool) -> Self {
        self.mock_provider = enabled;
        self
    }
}
