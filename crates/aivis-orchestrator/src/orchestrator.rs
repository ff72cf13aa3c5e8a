//! The orchestrator facade: job triggering, status polling, scheduling.

use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use aivis_collector::AnswerEngineCollector;

use crate::error::OrchestratorError;
use crate::job::{CollectionJob, JobKind, JobScope};
use crate::queue::{InMemoryJobQueue, JobQueue};
use crate::runner::{self, RunnerContext};
use crate::store::{ConfigSource, RecordStore};

#[derive(Debug, Clone, Copy)]
pub struct OrchestratorSettings {
    /// Prompts per batch within a job.
    pub batch_size: usize,
    /// Engine fan-out bound per prompt.
    pub max_concurrent_collectors: usize,
    /// Jobs allowed to run at the same time.
    pub max_concurrent_jobs: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            max_concurrent_collectors: 2,
            max_concurrent_jobs: 4,
        }
    }
}

struct Inner {
    collectors: Vec<Arc<dyn AnswerEngineCollector>>,
    store: Arc<dyn RecordStore>,
    config: Arc<dyn ConfigSource>,
    queue: Arc<dyn JobQueue>,
    settings: OrchestratorSettings,
    job_slots: Arc<Semaphore>,
    scheduler: Mutex<Option<JobScheduler>>,
}

/// Schedules and executes collection jobs.
///
/// All collaborators are injected: collectors per engine, the record
/// store, and the brand/prompt configuration source. Cloning is cheap and
/// shares the job board, so a clone handed to the HTTP layer polls the
/// same jobs the scheduler creates.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        collectors: Vec<Arc<dyn AnswerEngineCollector>>,
        store: Arc<dyn RecordStore>,
        config: Arc<dyn ConfigSource>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                collectors,
                store,
                config,
                queue: Arc::new(InMemoryJobQueue::new()),
                settings,
                job_slots: Arc::new(Semaphore::new(settings.max_concurrent_jobs.max(1))),
                scheduler: Mutex::new(None),
            }),
        }
    }

    /// Enqueue a one-off collection run and return its job id for polling.
    ///
    /// The job starts as soon as a worker slot frees up; this returns
    /// immediately.
    pub async fn trigger_once(&self, kind: JobKind, scope: JobScope) -> Uuid {
        let job = CollectionJob::new(kind, scope.clone());
        let job_id = job.id;
        self.inner.queue.enqueue(job).await;
        tracing::info!(job_id = %job_id, %kind, "orchestrator: job queued");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let Ok(_permit) = Arc::clone(&inner.job_slots).acquire_owned().await else {
                tracing::error!(job_id = %job_id, "orchestrator: worker pool closed; job abandoned");
                return;
            };
            let ctx = RunnerContext {
                collectors: inner.collectors.clone(),
                store: Arc::clone(&inner.store),
                config: Arc::clone(&inner.config),
                queue: Arc::clone(&inner.queue),
                batch_size: inner.settings.batch_size,
                max_concurrent_collectors: inner.settings.max_concurrent_collectors,
            };
            runner::run_job(&ctx, job_id, kind, &scope).await;
        });

        job_id
    }

    /// Current snapshot of a job, or `None` for unknown ids.
    pub async fn job_status(&self, job_id: Uuid) -> Option<CollectionJob> {
        self.inner.queue.get_status(job_id).await
    }

    /// Stop a job dispatching further batches. In-flight work finishes
    /// naturally. Returns false for unknown or already-terminal jobs.
    pub async fn cancel_job(&self, job_id: Uuid) -> bool {
        self.inner.queue.request_cancel(job_id).await
    }

    /// Register a recurring full collection run.
    ///
    /// Starts the cron scheduler on first use; the handle lives as long as
    /// the orchestrator. Returns the schedule's id.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::Scheduler`] for an invalid cron
    /// expression or a scheduler that fails to initialise.
    pub async fn schedule_recurring(&self, cron_expr: &str) -> Result<Uuid, OrchestratorError> {
        let orchestrator = self.clone();
        let cron_job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let orchestrator = orchestrator.clone();
            Box::pin(async move {
                tracing::info!("scheduler: starting scheduled collection run");
                let job_id = orchestrator
                    .trigger_once(JobKind::Scheduled, JobScope::default())
                    .await;
                tracing::info!(job_id = %job_id, "scheduler: collection run dispatched");
            })
        })?;

        let mut guard = self.inner.scheduler.lock().await;
        let scheduler = match guard.take() {
            Some(existing) => existing,
            None => {
                let scheduler = JobScheduler::new().await?;
                scheduler.start().await?;
                scheduler
            }
        };
        let schedule_id = scheduler.add(cron_job).await?;
        *guard = Some(scheduler);

        tracing::info!(cron = cron_expr, schedule_id = %schedule_id, "scheduler: registered recurring collection job");
        Ok(schedule_id)
    }
}
