use std::time::Duration;

use tracing::warn;

use super::error::LlmError;
use super::{CompletionOptions, CompletionProvider};

/// Bounded retry with exponential backoff: `base_delay * 2^(attempt - 1)` between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Calls `provider` until it yields a non-blank completion or `policy` is exhausted.
pub async fn complete_with_retry(
    provider: &dyn CompletionProvider,
    prompt: &str,
    options: &CompletionOptions,
    policy: &RetryPolicy,
) -> Result<String, LlmError> {
    complete_and_parse(provider, prompt, options, policy, Ok).await
}

/// Calls `provider` until `parse` accepts the completion or `policy` is exhausted.
///
/// Blank completions and `parse` errors count as failed attempts.
pub async fn complete_and_parse<T, F>(
    provider: &dyn CompletionProvider,
    prompt: &str,
    options: &CompletionOptions,
    policy: &RetryPolicy,
    mut parse: F,
) -> Result<T, LlmError>
where
    F: FnMut(String) -> Result<T, LlmError> + Send,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match provider.complete(prompt, options).await {
            Ok(text) if text.trim().is_empty() => LlmError::EmptyResponse,
            Ok(text) => match parse(text) {
                Ok(value) => return Ok(value),
                Err(e) => e,
            },
            Err(e) => e,
        };

        if attempt >= max_attempts {
            return Err(LlmError::RetriesExhausted {
                attempts: attempt,
                reason: error.to_string(),
            });
        }

        let delay = policy.delay_for(attempt);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Completion failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
