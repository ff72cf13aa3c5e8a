//! Job execution: collect → detect → score → persist.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use uuid::Uuid;

use aivis_collector::AnswerEngineCollector;
use aivis_core::{BrandConfig, PromptConfig};
use aivis_detector::detect_answer;
use aivis_scorer::{score, ScoreInputs};

use crate::error::OrchestratorError;
use crate::job::{batch_progress, JobCounters, JobKind, JobScope, JobStatus};
use crate::queue::JobQueue;
use crate::store::{AnswerBundle, ConfigSource, RecordStore, StoreError};

pub(crate) struct RunnerContext {
    pub collectors: Vec<Arc<dyn AnswerEngineCollector>>,
    pub store: Arc<dyn RecordStore>,
    pub config: Arc<dyn ConfigSource>,
    pub queue: Arc<dyn JobQueue>,
    pub batch_size: usize,
    pub max_concurrent_collectors: usize,
}

/// Drive one job to a terminal state.
///
/// Everything inside the per-prompt boundary is non-fatal: collector
/// failures and single write failures append to the job's error list and
/// the batch continues. Failures outside it — config load, empty scope, a
/// systemic store outage — fail the job with accumulated counters kept.
pub(crate) async fn run_job(ctx: &RunnerContext, job_id: Uuid, kind: JobKind, scope: &JobScope) {
    ctx.queue.transition(job_id, JobStatus::Running, None).await;

    // Run-row history is best effort; the job board stays authoritative.
    if let Err(e) = ctx.store.create_run(job_id, &kind.to_string()).await {
        tracing::warn!(job_id = %job_id, error = %e, "orchestrator: failed to create run row");
    }
    if let Err(e) = ctx.store.start_run(job_id).await {
        tracing::warn!(job_id = %job_id, error = %e, "orchestrator: failed to mark run started");
    }

    let mut counters = JobCounters::default();
    let mut all_errors: Vec<String> = Vec::new();

    match run_batches(ctx, job_id, scope, &mut counters, &mut all_errors).await {
        Ok(()) => {
            ctx.queue
                .transition(job_id, JobStatus::Succeeded, None)
                .await;
            if let Err(e) = ctx.store.complete_run(job_id, &counters, &all_errors).await {
                tracing::warn!(job_id = %job_id, error = %e, "orchestrator: failed to complete run row");
            }
            tracing::info!(
                job_id = %job_id,
                prompts = counters.prompts_processed,
                answers = counters.answers_collected,
                errors = all_errors.len(),
                "orchestrator: job succeeded"
            );
        }
        Err(e) => {
            // Keep whatever was accumulated before the fatal error.
            let progress = ctx
                .queue
                .get_status(job_id)
                .await
                .map_or(0, |j| j.progress);
            ctx.queue
                .update_progress(job_id, progress, counters, Vec::new())
                .await;
            ctx.queue
                .transition(job_id, JobStatus::Failed, Some(e.to_string()))
                .await;
            if let Err(store_err) = ctx.store.fail_run(job_id, &e.to_string(), &counters).await {
                tracing::warn!(job_id = %job_id, error = %store_err, "orchestrator: failed to mark run failed");
            }
            tracing::error!(job_id = %job_id, error = %e, "orchestrator: job failed");
        }
    }
}

async fn run_batches(
    ctx: &RunnerContext,
    job_id: Uuid,
    scope: &JobScope,
    counters: &mut JobCounters,
    all_errors: &mut Vec<String>,
) -> Result<(), OrchestratorError> {
    if ctx.collectors.is_empty() {
        return Err(OrchestratorError::NoCollectors);
    }

    let brands = ctx.config.brands().await?;
    let prompts = ctx.config.prompts(scope).await?;
    if prompts.is_empty() {
        return Err(OrchestratorError::EmptyScope);
    }

    let total_batches = prompts.len().div_ceil(ctx.batch_size);
    tracing::info!(
        job_id = %job_id,
        prompts = prompts.len(),
        total_batches,
        engines = ctx.collectors.len(),
        "orchestrator: starting collection job"
    );

    for (batch_index, batch) in prompts.chunks(ctx.batch_size).enumerate() {
        if ctx.queue.is_cancel_requested(job_id).await {
            tracing::info!(
                job_id = %job_id,
                completed_batches = batch_index,
                "orchestrator: cancellation requested; not dispatching further batches"
            );
            break;
        }

        let mut batch_errors: Vec<String> = Vec::new();
        for prompt in batch {
            let outcome = process_prompt(ctx, &brands, prompt).await?;
            counters.answers_collected += outcome.answers;
            counters.mentions_found += outcome.mentions;
            counters.scores_calculated += outcome.scores;
            if outcome.answers > 0 {
                counters.prompts_processed += 1;
            }
            batch_errors.extend(outcome.errors);
        }

        let progress = batch_progress(batch_index + 1, total_batches);
        all_errors.extend(batch_errors.iter().cloned());
        ctx.queue
            .update_progress(job_id, progress, *counters, batch_errors)
            .await;
    }

    Ok(())
}

/// Query one collector for one prompt. All arguments are owned so the
/// returned future carries no borrowed lifetime, keeping it `Send` and
/// `'static` for use inside a spawned task.
async fn collect_one(
    collector: Arc<dyn AnswerEngineCollector>,
    text: String,
    prompt_id: String,
    locale: String,
) -> Result<aivis_core::EngineAnswer, aivis_collector::CollectorError> {
    collector.collect(&text, &prompt_id, &locale).await
}

#[derive(Default)]
struct PromptOutcome {
    answers: u64,
    mentions: u64,
    scores: u64,
    errors: Vec<String>,
}

/// Query every engine for one prompt with bounded concurrency, then run
/// detection and scoring over each answer and persist the bundle.
///
/// Only a systemic store outage propagates as `Err`; everything else is
/// folded into the outcome.
async fn process_prompt(
    ctx: &RunnerContext,
    brands: &[BrandConfig],
    prompt: &PromptConfig,
) -> Result<PromptOutcome, OrchestratorError> {
    let mut outcome = PromptOutcome::default();

    let collectors: Vec<Arc<dyn AnswerEngineCollector>> = ctx.collectors.clone();
    let mut collect_futures = Vec::with_capacity(collectors.len());
    for collector in collectors {
        collect_futures.push(collect_one(
            collector,
            prompt.text.clone(),
            prompt.id.clone(),
            prompt.locale.clone(),
        ));
    }
    let results: Vec<_> = stream::iter(collect_futures)
        .buffer_unordered(ctx.max_concurrent_collectors)
        .collect()
        .await;

    for result in results {
        match result {
            Ok(answer) => {
                let detection = detect_answer(&answer, brands);
                let scores: Vec<_> = brands
                    .iter()
                    .map(|brand| {
                        let slug = brand.slug();
                        score(ScoreInputs {
                            answer_id: answer.id,
                            brand_id: &slug,
                            parsed: &detection.parsed,
                            citations: &detection.citations,
                            owned_domain: brand.owned_domain.as_deref(),
                        })
                    })
                    .collect();

                outcome.mentions += detection.mentions.len() as u64;
                outcome.scores += scores.len() as u64;

                let bundle = AnswerBundle {
                    answer,
                    mentions: detection.mentions,
                    citations: detection.citations,
                    scores,
                };
                match ctx.store.persist_answer_bundle(&bundle).await {
                    Ok(()) => outcome.answers += 1,
                    Err(StoreError::Unavailable(msg)) => {
                        return Err(OrchestratorError::StoreUnavailable(msg));
                    }
                    Err(StoreError::Write(msg)) => {
                        outcome.errors.push(format!(
                            "prompt '{}': persist failed: {msg}",
                            prompt.id
                        ));
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    prompt_id = %prompt.id,
                    engine = %e.engine,
                    is_timeout = e.is_timeout(),
                    "orchestrator: collector failed for prompt"
                );
                outcome.errors.push(e.to_string());
            }
        }
    }

    Ok(outcome)
}
