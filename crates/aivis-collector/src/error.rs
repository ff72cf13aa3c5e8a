use thiserror::Error;

/// A collector failure, carrying enough context for the orchestrator to
/// record it against the right prompt and engine.
#[derive(Debug, Error)]
#[error("collector '{engine}' failed for prompt '{prompt_id}' after {retry_count} retries: {kind}")]
pub struct CollectorError {
    pub engine: String,
    pub prompt_id: String,
    /// Retries actually performed before giving up (0 when the first
    /// attempt failed terminally or the overall timeout fired early).
    pub retry_count: u32,
    pub kind: CollectorErrorKind,
}

impl CollectorError {
    /// True when the overall collection deadline fired.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, CollectorErrorKind::Timeout { .. })
    }
}

#[derive(Debug, Error)]
pub enum CollectorErrorKind {
    #[error("timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus { status: u16 },

    #[error("engine payload is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("no extraction strategy produced answer text")]
    EmptyExtraction,
}
