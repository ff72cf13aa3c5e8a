mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use aivis_collector::{AnswerEngineCollector, HttpAnswerCollector};
use aivis_orchestrator::{Orchestrator, OrchestratorSettings, YamlConfigSource};

use crate::api::{build_app, AppState};

const USER_AGENT: &str = "aivis/0.1 (answer-engine-visibility)";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(aivis_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

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
            )?;
            Ok(Arc::new(collector) as Arc<dyn AnswerEngineCollector>)
        })
        .collect::<Result<_, aivis_collector::CollectorErrorKind>>()?;

    if collectors.is_empty() {
        tracing::warn!("no engines configured (AIVIS_ENGINES empty); jobs will fail at start");
    }

    let store = Arc::new(aivis_db::PgRecordStore::new(pool.clone()));
    let config_source = Arc::new(YamlConfigSource::new(
        config.brands_path.clone(),
        config.prompts_path.clone(),
    ));
    let orchestrator = Orchestrator::new(
        collectors,
        store,
        config_source,
        OrchestratorSettings {
            batch_size: config.job_batch_size,
            max_concurrent_collectors: config.max_concurrent_collectors,
            max_concurrent_jobs: config.max_concurrent_jobs,
        },
    );

    orchestrator
        .schedule_recurring(&config.collection_cron)
        .await?;

    let app = build_app(AppState {
        pool,
        orchestrator,
        config: Arc::clone(&config),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "aivis-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
