use thiserror::Error;

/// Errors returned by completion providers.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("completion request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("completion provider returned an empty response")]
    EmptyResponse,

    #[error("malformed completion: {reason}")]
    MalformedResponse { reason: String },

    #[error("completion failed after {attempts} attempts: {reason}")]
    RetriesExhausted { attempts: u32, reason: String },
}
