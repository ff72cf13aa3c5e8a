use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One source link reported by an answer engine.
///
/// `rank` is the 1-based position as the link appeared in the answer; ranks
/// within an [`EngineAnswer`] are unique and strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitedLink {
    pub url: String,
    pub title: Option<String>,
    pub rank: u32,
}

/// The normalized result of one collector invocation against one engine.
///
/// Immutable after creation; the detector and scorer only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineAnswer {
    pub id: Uuid,
    pub engine_id: String,
    pub prompt_id: String,
    pub query_text: String,
    pub locale: String,
    pub collected_at: DateTime<Utc>,
    pub answer_text: String,
    pub cited_links: Vec<CitedLink>,
    /// Raw engine payload kept for audit and re-extraction.
    pub raw_payload: serde_json::Value,
}

impl EngineAnswer {
    /// Construct an answer with a fresh id and `collected_at = now`.
    #[must_use]
    pub fn new(
        engine_id: impl Into<String>,
        prompt_id: impl Into<String>,
        query_text: impl Into<String>,
        locale: impl Into<String>,
        answer_text: impl Into<String>,
        cited_links: Vec<CitedLink>,
        raw_payload: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            engine_id: engine_id.into(),
            prompt_id: prompt_id.into(),
            query_text: query_text.into(),
            locale: locale.into(),
            collected_at: Utc::now(),
            answer_text: answer_text.into(),
            cited_links,
            raw_payload,
        }
    }
}
