//! `aivis-cli run` — drive one collection job end to end.

use std::sync::Arc;
use std::time::Duration;

use aivis_collector::{AnswerEngineCollector, HttpAnswerCollector};
use aivis_orchestrator::{
    JobKind, JobScope, Orchestrator, OrchestratorSettings, YamlConfigSource,
};

const USER_AGENT: &str = "aivis/0.1 (answer-engine-visibility)";

pub(crate) async fn execute(
    brand: Option<String>,
    prompt_ids: Vec<String>,
    locale: Option<String>,
) -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;

    if config.engines.is_empty() {
        anyhow::bail!("no engines configured; set AIVIS_ENGINES (id=url, comma-separated)");
    }

    let pool_config = aivis_db::PoolConfig::from_app_config(&config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config).await?;
    aivis_db::run_migrations(&pool).await?;

    let collectors: Vec<Arc<dyn AnswerEngineCollector>> = config
        .engines
        .iter()
        .map(|engine| {
            let collector = HttpAnswerCollector::new(
                engine.id.clone(),
                engine.base_url.clone(),
                config.collector_timeout_secs,
                USER_AGENT,
                config.collector_max_retries,
                config.collector_backoff_base_secs,
            )
            .map_err(|e| anyhow::anyhow!("failed to build collector '{}': {e}", engine.id))?;
            Ok(Arc::new(collector) as Arc<dyn AnswerEngineCollector>)
        })
        .collect::<anyhow::Result<_>>()?;

    let orchestrator = Orchestrator::new(
        collectors,
        Arc::new(aivis_db::PgRecordStore::new(pool)),
        Arc::new(YamlConfigSource::new(
            config.brands_path.clone(),
            config.prompts_path.clone(),
        )),
        OrchestratorSettings {
            batch_size: config.job_batch_size,
            max_concurrent_collectors: config.max_concurrent_collectors,
            max_concurrent_jobs: 1,
        },
    );

    let scope = JobScope {
        brand_id: brand,
        prompt_ids: (!prompt_ids.is_empty()).then_some(prompt_ids),
        locale,
    };

    let job_id = orchestrator.trigger_once(JobKind::Triggered, scope).await;
    println!("job {job_id} queued");

    loop {
        tokio::time::sleep(Duration::from_millis(500)).await;
        let Some(job) = orchestrator.job_status(job_id).await else {
            anyhow::bail!("job {job_id} disappeared from the job board");
        };
        if job.status.is_terminal() {
            println!("{}", serde_json::to_string_pretty(&job)?);
            if !job.errors.is_empty() {
                tracing::warn!(
                    errors = job.errors.len(),
                    "run completed with per-prompt errors"
                );
            }
            break;
        }
        println!("status={} progress={}%", job.status, job.progress);
    }

    Ok(())
}
