//! Collection job orchestration.
//!
//! The orchestrator schedules collection runs, fans work out across a
//! bounded pool of jobs, and drives each answer through collect → detect →
//! score → persist. Collectors, the record store, and the configuration
//! source are all injected as trait objects so tests run against in-memory
//! fakes and nothing in here assumes a specific backing technology.

pub mod error;
pub mod job;
pub mod orchestrator;
pub mod queue;
pub mod runner;
pub mod store;

pub use error::OrchestratorError;
pub use job::{CollectionJob, JobCounters, JobKind, JobScope, JobStatus};
pub use orchestrator::{Orchestrator, OrchestratorSettings};
pub use queue::{InMemoryJobQueue, JobQueue};
pub use store::{
    AnswerBundle, ConfigSource, InMemoryRecordStore, RecordStore, StoreError, YamlConfigSource,
};
