//! Collection job domain types and their state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a job came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Scheduled,
    Triggered,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobKind::Scheduled => write!(f, "scheduled"),
            JobKind::Triggered => write!(f, "triggered"),
        }
    }
}

/// Job lifecycle: `Queued → Running → Succeeded | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Legal transitions only move forward; terminal states accept none.
    #[must_use]
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Succeeded | JobStatus::Failed)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a triggered run covers. An empty scope means the full prompt batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobScope {
    pub brand_id: Option<String>,
    pub prompt_ids: Option<Vec<String>>,
    pub locale: Option<String>,
}

/// Cumulative per-run counters. Preserved even when the job fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCounters {
    pub prompts_processed: u64,
    pub answers_collected: u64,
    pub mentions_found: u64,
    pub scores_calculated: u64,
}

/// Snapshot of one collection job as exposed to status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    /// `(completed_batches / total_batches) * 100`, updated after each batch.
    pub progress: u8,
    pub scope: JobScope,
    pub counters: JobCounters,
    /// Non-fatal per-prompt errors. Populated even for succeeded jobs so
    /// degraded runs are visible.
    pub errors: Vec<String>,
    /// Job-fatal error message, set only when `status == Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl CollectionJob {
    #[must_use]
    pub fn new(kind: JobKind, scope: JobScope) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            status: JobStatus::Queued,
            progress: 0,
            scope,
            counters: JobCounters::default(),
            errors: Vec::new(),
            error: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }
}

/// Progress percentage after completing `completed` of `total` batches.
#[must_use]
pub fn batch_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let pct = ((completed as f64 / total as f64) * 100.0).round() as u8;
    pct.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_can_only_start_running() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Running));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Succeeded));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Queued));
    }

    #[test]
    fn running_can_finish_either_way() {
        assert!(JobStatus::Running.can_transition_to(JobStatus::Succeeded));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Running.can_transition_to(JobStatus::Queued));
    }

    #[test]
    fn terminal_states_accept_no_transitions() {
        for terminal in [JobStatus::Succeeded, JobStatus::Failed] {
            assert!(terminal.is_terminal());
            for next in [
                JobStatus::Queued,
                JobStatus::Running,
                JobStatus::Succeeded,
                JobStatus::Failed,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn new_job_starts_queued_with_zero_progress() {
        let job = CollectionJob::new(JobKind::Triggered, JobScope::default());
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert_eq!(job.counters, JobCounters::default());
        assert!(job.errors.is_empty());
        assert!(job.error.is_none());
    }

    #[test]
    fn batch_progress_rounds_and_caps() {
        assert_eq!(batch_progress(0, 3), 0);
        assert_eq!(batch_progress(1, 3), 33);
        assert_eq!(batch_progress(2, 3), 67);
        assert_eq!(batch_progress(3, 3), 100);
        assert_eq!(batch_progress(0, 0), 100);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Succeeded).unwrap(),
            "\"succeeded\""
        );
        assert_eq!(JobStatus::Running.to_string(), "running");
    }
}
