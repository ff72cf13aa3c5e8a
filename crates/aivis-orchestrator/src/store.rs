//! External collaborator seams: the record store and the brand/prompt
//! configuration source.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use aivis_core::{
    load_brands, load_prompts, AIVisibilityScore, BrandConfig, BrandMention, CitationRecord,
    ConfigError, EngineAnswer, PromptConfig,
};

use crate::job::{JobCounters, JobScope};

/// Everything derived from one answer, written together or not at all.
#[derive(Debug, Clone)]
pub struct AnswerBundle {
    pub answer: EngineAnswer,
    pub mentions: Vec<BrandMention>,
    pub citations: Vec<CitationRecord>,
    pub scores: Vec<AIVisibilityScore>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Systemic outage — the job should fail fast instead of retrying
    /// every remaining prompt against a dead store.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A single write failed; surfaced as a per-prompt error.
    #[error("record store write failed: {0}")]
    Write(String),
}

/// Persistence seam for the orchestrator.
///
/// `persist_answer_bundle` must be transactional: the answer, its
/// mentions, citations, and scores land together or the whole write fails.
/// Run rows mirror the in-memory job board for durable history.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn persist_answer_bundle(&self, bundle: &AnswerBundle) -> Result<(), StoreError>;

    async fn create_run(&self, run_id: Uuid, kind: &str) -> Result<(), StoreError>;

    async fn start_run(&self, run_id: Uuid) -> Result<(), StoreError>;

    async fn complete_run(
        &self,
        run_id: Uuid,
        counters: &JobCounters,
        errors: &[String],
    ) -> Result<(), StoreError>;

    async fn fail_run(
        &self,
        run_id: Uuid,
        error: &str,
        counters: &JobCounters,
    ) -> Result<(), StoreError>;

    /// Scores calculated within the trailing window, optionally filtered
    /// to one brand. Feeds the visibility index.
    async fn scores_in_window(
        &self,
        brand_id: Option<&str>,
        window_days: u32,
    ) -> Result<Vec<AIVisibilityScore>, StoreError>;
}

/// Read-only brand/prompt lookup for a job. No core logic mutates this.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn brands(&self) -> Result<Vec<BrandConfig>, ConfigError>;

    /// The prompt batch for a job, already narrowed to `scope`.
    async fn prompts(&self, scope: &JobScope) -> Result<Vec<PromptConfig>, ConfigError>;
}

/// Configuration source backed by the YAML files under `config/`.
pub struct YamlConfigSource {
    brands_path: PathBuf,
    prompts_path: PathBuf,
}

impl YamlConfigSource {
    #[must_use]
    pub fn new(brands_path: PathBuf, prompts_path: PathBuf) -> Self {
        Self {
            brands_path,
            prompts_path,
        }
    }
}

#[async_trait]
impl ConfigSource for YamlConfigSource {
    async fn brands(&self) -> Result<Vec<BrandConfig>, ConfigError> {
        Ok(load_brands(&self.brands_path)?.brands)
    }

    async fn prompts(&self, scope: &JobScope) -> Result<Vec<PromptConfig>, ConfigError> {
        let all = load_prompts(&self.prompts_path)?.prompts;
        Ok(filter_prompts(all, scope))
    }
}

/// Narrow the full prompt batch to a job scope.
///
/// Explicit prompt ids win; a brand scope selects prompts tagged with the
/// brand slug; a locale scope keeps matching locales. Filters compose.
#[must_use]
pub fn filter_prompts(prompts: Vec<PromptConfig>, scope: &JobScope) -> Vec<PromptConfig> {
    prompts
        .into_iter()
        .filter(|p| {
            if let Some(ids) = &scope.prompt_ids {
                if !ids.contains(&p.id) {
                    return false;
                }
            }
            if let Some(brand) = &scope.brand_id {
                if !p.tags.contains(brand) {
                    return false;
                }
            }
            if let Some(locale) = &scope.locale {
                if &p.locale != locale {
                    return false;
                }
            }
            true
        })
        .collect()
}

/// In-memory record store for tests and offline CLI runs.
#[derive(Default)]
pub struct InMemoryRecordStore {
    inner: Mutex<InMemoryState>,
}

#[derive(Default)]
struct InMemoryState {
    bundles: Vec<AnswerBundle>,
    runs: Vec<(Uuid, String)>,
}

impl InMemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn bundles(&self) -> Vec<AnswerBundle> {
        self.inner.lock().await.bundles.clone()
    }

    pub async fn run_states(&self) -> Vec<(Uuid, String)> {
        self.inner.lock().await.runs.clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn persist_answer_bundle(&self, bundle: &AnswerBundle) -> Result<(), StoreError> {
        self.inner.lock().await.bundles.push(bundle.clone());
        Ok(())
    }

    async fn create_run(&self, run_id: Uuid, _kind: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .await
            .runs
            .push((run_id, "queued".to_string()));
        Ok(())
    }

    async fn start_run(&self, run_id: Uuid) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        set_run_state(&mut state, run_id, "running");
        Ok(())
    }

    async fn complete_run(
        &self,
        run_id: Uuid,
        _counters: &JobCounters,
        _errors: &[String],
    ) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        set_run_state(&mut state, run_id, "succeeded");
        Ok(())
    }

    async fn fail_run(
        &self,
        run_id: Uuid,
        _error: &str,
        _counters: &JobCounters,
    ) -> Result<(), StoreError> {
        let mut state = self.inner.lock().await;
        set_run_state(&mut state, run_id, "failed");
        Ok(())
    }

    async fn scores_in_window(
        &self,
        brand_id: Option<&str>,
        window_days: u32,
    ) -> Result<Vec<AIVisibilityScore>, StoreError> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(i64::from(window_days));
        let state = self.inner.lock().await;
        Ok(state
            .bundles
            .iter()
            .flat_map(|b| b.scores.iter())
            .filter(|s| s.calculated_at >= cutoff)
            .filter(|s| brand_id.is_none_or(|b| s.brand_id == b))
            .cloned()
            .collect())
    }
}

fn set_run_state(state: &mut InMemoryState, run_id: Uuid, status: &str) {
    if let Some(entry) = state.runs.iter_mut().find(|(id, _)| *id == run_id) {
        entry.1 = status.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(id: &str, locale: &str, tags: &[&str]) -> PromptConfig {
        PromptConfig {
            id: id.to_string(),
            text: format!("prompt {id}"),
            locale: locale.to_string(),
            tags: tags.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn empty_scope_keeps_all_prompts() {
        let prompts = vec![prompt("a", "en", &[]), prompt("b", "en", &[])];
        let out = filter_prompts(prompts, &JobScope::default());
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn prompt_id_scope_filters() {
        let prompts = vec![prompt("a", "en", &[]), prompt("b", "en", &[])];
        let scope = JobScope {
            prompt_ids: Some(vec!["b".to_string()]),
            ..JobScope::default()
        };
        let out = filter_prompts(prompts, &scope);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");
    }

    #[test]
    fn brand_scope_selects_tagged_prompts() {
        let prompts = vec![prompt("a", "en", &["acme"]), prompt("b", "en", &["zen"])];
        let scope = JobScope {
            brand_id: Some("acme".to_string()),
            ..JobScope::default()
        };
        let out = filter_prompts(prompts, &scope);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "a");
    }

    #[test]
    fn locale_scope_filters() {
        let prompts = vec![prompt("a", "en", &[]), prompt("b", "de", &[])];
        let scope = JobScope {
            locale: Some("de".to_string()),
            ..JobScope::default()
        };
        let out = filter_prompts(prompts, &scope);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "b");
    }

    #[tokio::test]
    async fn in_memory_store_tracks_run_states() {
        let store = InMemoryRecordStore::new();
        let id = Uuid::new_v4();
        store.create_run(id, "triggered").await.unwrap();
        store.start_run(id).await.unwrap();
        store
            .complete_run(id, &JobCounters::default(), &[])
            .await
            .unwrap();
        let runs = store.run_states().await;
        assert_eq!(runs, vec![(id, "succeeded".to_string())]);
    }
}
