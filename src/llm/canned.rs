use async_trait::async_trait;
use tracing::debug;

use super::error::LlmError;
use super::{CompletionOptions, CompletionProvider};

pub const CANNED_CV_RESPONSE: &str = "\
Technical Skills: 4/5 - Solid backend fundamentals with relevant frameworks.
Experience: 3.5/5 - Several years on comparable projects.
Achievements: 3/5 - Some measurable impact described.
Cultural Fit: 4/5 - Communicates clearly and works well in teams.
Overall Feedback: Strong technical base with room to show more quantified impact.";

pub const CANNED_PROJECT_RESPONSE: &str = "\
Correctness: 4/5 - Implements the requested pipeline end to end.
Code Quality: 4/5 - Clean modules with reasonable tests.
Resilience: 3.5/5 - Retries present, limited failure-path coverage.
Documentation: 4/5 - README explains setup and trade-offs.
Creativity: 3/5 - Few features beyond the brief.
Overall Feedback: A working, well-structured submission that meets the brief.";

pub const CANNED_SUMMARY_RESPONSE: &str = "\
The candidate shows a solid technical foundation and delivered a working project. \
Main gaps are limited evidence of measurable impact and thin failure handling. \
Recommended to proceed to a technical interview.";

/// Offline provider returning fixed, well-formed completions.
///
/// Picks the response from the labels the prompt asks for, so every prompt built by
/// [`crate::scoring`] gets a parseable answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedCompletionProvider;

#[async_trait]
impl CompletionProvider for CannedCompletionProvider {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        debug!(prompt_len = prompt.len(), "Serving canned completion");
        Ok(canned_response(prompt).to_string())
    }
}

pub(crate) fn canned_response(prompt: &str) -> &'static str {
    if prompt.contains("Correctness:") {
        CANNED_PROJECT_RESPONSE
    } else if prompt.contains("Technical Skills:") {
        CANNED_CV_RESPONSE
    } else {
        CANNED_SUMMARY_RESPONSE
    }
}
