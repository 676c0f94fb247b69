use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::canned::canned_response;
use super::error::LlmError;
use super::{CompletionOptions, CompletionProvider};

type Responder = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

/// Scriptable provider for tests.
///
/// Scripted results are served first (in order); afterwards every call goes to the responder.
pub struct MockCompletionProvider {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    responder: Responder,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Answers every prompt with the same text.
    pub fn responding(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_| Ok(text.clone()))
    }

    /// Fails every call.
    pub fn failing() -> Self {
        Self::new(|_| {
            Err(LlmError::RequestFailed {
                reason: "mock provider failure".to_string(),
            })
        })
    }

    /// Answers like [`CannedCompletionProvider`](super::CannedCompletionProvider).
    pub fn canned() -> Self {
        Self::new(|prompt| Ok(canned_response(prompt).to_string()))
    }

    /// Queues results served before the responder.
    pub fn with_script(self, script: Vec<Result<String, LlmError>>) -> Self {
        self.script.lock().extend(script);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Default for MockCompletionProvider {
    fn default() -> Self {
        Self::canned()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(result) => result,
            None => (self.responder)(prompt),
        }
    }
}
