//! The job board: a minimal internal queue interface.
//!
//! The orchestrator only ever talks to [`JobQueue`]; the in-memory
//! implementation backs it with a concurrent map. Swapping in an external
//! broker means implementing this trait, nothing else changes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::job::{CollectionJob, JobCounters, JobStatus};

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Register a new job in `Queued` state.
    async fn enqueue(&self, job: CollectionJob);

    async fn get_status(&self, id: Uuid) -> Option<CollectionJob>;

    /// Record batch progress: percentage, cumulative counters, and any new
    /// per-prompt error strings.
    async fn update_progress(
        &self,
        id: Uuid,
        progress: u8,
        counters: JobCounters,
        new_errors: Vec<String>,
    );

    /// Move the job through its state machine. Illegal transitions are
    /// ignored (and logged) so racing finalizers cannot corrupt a terminal
    /// state. `error` is recorded for `Failed`.
    async fn transition(&self, id: Uuid, status: JobStatus, error: Option<String>);

    /// Ask a running job to stop dispatching new batches. Returns false
    /// when the job is unknown or already terminal.
    async fn request_cancel(&self, id: Uuid) -> bool;

    async fn is_cancel_requested(&self, id: Uuid) -> bool;
}

struct JobEntry {
    job: CollectionJob,
    cancel: AtomicBool,
}

/// Channel-free in-memory job board; all state behind one `RwLock` map.
#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: RwLock<HashMap<Uuid, JobEntry>>,
}

impl InMemoryJobQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: CollectionJob) {
        let mut jobs = self.jobs.write().await;
        jobs.insert(
            job.id,
            JobEntry {
                job,
                cancel: AtomicBool::new(false),
            },
        );
    }

    async fn get_status(&self, id: Uuid) -> Option<CollectionJob> {
        self.jobs.read().await.get(&id).map(|e| e.job.clone())
    }

    async fn update_progress(
        &self,
        id: Uuid,
        progress: u8,
        counters: JobCounters,
        new_errors: Vec<String>,
    ) {
        let mut jobs = self.jobs.write().await;
        if let Some(entry) = jobs.get_mut(&id) {
            entry.job.progress = progress.min(100);
            entry.job.counters = counters;
            entry.job.errors.extend(new_errors);
        }
    }

    async fn transition(&self, id: Uuid, status: JobStatus, error: Option<String>) {
        let mut jobs = self.jobs.write().await;
        let Some(entry) = jobs.get_mut(&id) else {
            tracing::warn!(job_id = %id, "transition for unknown job");
            return;
        };
        if !entry.job.status.can_transition_to(status) {
            tracing::warn!(
                job_id = %id,
                from = %entry.job.status,
                to = %status,
                "ignoring illegal job transition"
            );
            return;
        }
        entry.job.status = status;
        match status {
            JobStatus::Running => entry.job.started_at = Some(Utc::now()),
            JobStatus::Succeeded | JobStatus::Failed => {
                entry.job.completed_at = Some(Utc::now());
                entry.job.error = error;
            }
            JobStatus::Queued => {}
        }
    }

    async fn request_cancel(&self, id: Uuid) -> bool {
        let jobs = self.jobs.read().await;
        match jobs.get(&id) {
            Some(entry) if !entry.job.status.is_terminal() => {
                entry.cancel.store(true, Ordering::SeqCst);
                true
            }
            _ => false,
        }
    }

    async fn is_cancel_requested(&self, id: Uuid) -> bool {
        self.jobs
            .read()
            .await
            .get(&id)
            .is_some_and(|e| e.cancel.load(Ordering::SeqCst))
    }
}
