use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to load configuration at job start: {0}")]
    ConfigLoad(#[from] aivis_core::ConfigError),

    #[error("no prompts selected for the requested scope")]
    EmptyScope,

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("no collectors configured")]
    NoCollectors,
}
