//! The collector contract and the reference HTTP implementation.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use aivis_core::EngineAnswer;

use crate::error::{CollectorError, CollectorErrorKind};
use crate::extract::{extract_answer_text, extract_cited_links};
use crate::retry::retry_with_backoff;

/// One answer engine, queried one prompt at a time.
///
/// The orchestrator is agnostic to how the engine is reached: HTTP API,
/// headless browser, anything able to produce an [`EngineAnswer`].
#[async_trait]
pub trait AnswerEngineCollector: Send + Sync {
    fn engine_id(&self) -> &str;

    /// Query the engine and return a normalized answer.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError`] when the engine is unreachable, returns a
    /// terminal status, exceeds the overall deadline, or produces no
    /// extractable answer text after all retries.
    async fn collect(
        &self,
        prompt_text: &str,
        prompt_id: &str,
        locale: &str,
    ) -> Result<EngineAnswer, CollectorError>;
}

/// Per-attempt session handle.
///
/// Browser-driven collectors hold a real browsing context here; the HTTP
/// reference keeps the same shape so the invariant is uniform: one session
/// per attempt, torn down on every exit path, nothing leaks across retries.
struct AttemptSession {
    engine: String,
    attempt: u32,
}

impl AttemptSession {
    fn open(engine: &str, attempt: u32) -> Self {
        tracing::trace!(engine, attempt, "opening collector session");
        Self {
            engine: engine.to_string(),
            attempt,
        }
    }
}

impl Drop for AttemptSession {
    fn drop(&mut self) {
        tracing::trace!(
            engine = %self.engine,
            attempt = self.attempt,
            "tearing down collector session"
        );
    }
}

/// Reference collector for engines exposing an HTTP answer endpoint.
///
/// Sends `{"prompt": ..., "locale": ...}` to the configured URL and
/// normalizes the JSON response through the extraction strategies.
/// Transient failures are retried with linear backoff; the whole call is
/// bounded by an overall deadline independent of retry count.
pub struct HttpAnswerCollector {
    engine_id: String,
    answer_url: String,
    client: Client,
    /// Overall deadline for one `collect` call, retries included.
    overall_timeout_secs: u64,
    /// Additional attempts after the first failure.
    max_retries: u32,
    /// Base delay for linear backoff: `backoff_base_secs × retry_number`.
    backoff_base_secs: u64,
}

impl HttpAnswerCollector {
    /// Creates a collector with configured deadline, `User-Agent`, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorErrorKind::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        engine_id: impl Into<String>,
        answer_url: impl Into<String>,
        overall_timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, CollectorErrorKind> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            engine_id: engine_id.into(),
            answer_url: answer_url.into(),
            client,
            overall_timeout_secs,
            max_retries,
            backoff_base_secs,
        })
    }

    /// One request/extract attempt inside its own session.
    async fn attempt(
        &self,
        prompt_text: &str,
        prompt_id: &str,
        locale: &str,
        attempt_no: u32,
    ) -> Result<EngineAnswer, CollectorErrorKind> {
        let _session = AttemptSession::open(&self.engine_id, attempt_no);

        let response = self
            .client
            .post(&self.answer_url)
            .json(&serde_json::json!({
                "prompt": prompt_text,
                "locale": locale,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollectorErrorKind::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body).map_err(CollectorErrorKind::Malformed)?;

        let answer_text =
            extract_answer_text(&payload).ok_or(CollectorErrorKind::EmptyExtraction)?;
        let cited_links = extract_cited_links(&payload);

        Ok(EngineAnswer::new(
            self.engine_id.clone(),
            prompt_id,
            prompt_text,
            locale,
            answer_text,
            cited_links,
            payload,
        ))
    }
}

#[async_trait]
impl AnswerEngineCollector for HttpAnswerCollector {
    fn engine_id(&self) -> &str {
        &self.engine_id
    }

    async fn collect(
        &self,
        prompt_text: &str,
        prompt_id: &str,
        locale: &str,
    ) -> Result<EngineAnswer, CollectorError> {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let work = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let attempt_no = counter.fetch_add(1, Ordering::SeqCst) + 1;
            self.attempt(prompt_text, prompt_id, locale, attempt_no)
        });

        let overall = Duration::from_secs(self.overall_timeout_secs);
        match tokio::time::timeout(overall, work).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err((kind, retry_count))) => Err(CollectorError {
                engine: self.engine_id.clone(),
                prompt_id: prompt_id.to_string(),
                retry_count,
                kind,
            }),
            Err(_elapsed) => Err(CollectorError {
                engine: self.engine_id.clone(),
                prompt_id: prompt_id.to_string(),
                retry_count: attempts.load(Ordering::SeqCst).saturating_sub(1),
                kind: CollectorErrorKind::Timeout {
                    timeout_secs: self.overall_timeout_secs,
                },
            }),
        }
    }
}
