use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::{debug, instrument};

use super::config::LlmConfig;
use super::error::LlmError;
use super::{CompletionOptions, CompletionProvider};

/// Completion provider backed by [`genai`] (provider picked from the model name).
pub struct GenaiCompletionProvider {
    client: Client,
    model: String,
    request_timeout: std::time::Duration,
}

impl std::fmt::Debug for GenaiCompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiCompletionProvider")
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl GenaiCompletionProvider {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::default(),
            model: config.model.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

#[async_trait]
impl CompletionProvider for GenaiCompletionProvider {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        let chat_options = ChatOptions::default()
            .with_temperature(options.temperature)
            .with_max_tokens(options.max_tokens);

        let response = tokio::time::timeout(
            self.request_timeout,
            self.client.exec_chat(&self.model, request, Some(&chat_options)),
        )
        .await
        .map_err(|_| LlmError::Timeout {
            seconds: self.request_timeout.as_secs(),
        })?
        .map_err(|e| LlmError::RequestFailed {
            reason: e.to_string(),
        })?;

        let text = response.first_text().unwrap_or_default().to_string();
        debug!(response_len = text.len(), "Completion received");

        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}
