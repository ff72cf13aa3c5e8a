use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// One configured answer engine reachable over HTTP.
///
/// Engines behind browser automation register their own collector
/// implementations; this only covers endpoints the reference HTTP
/// collector can drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEndpoint {
    pub id: String,
    pub base_url: String,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub prompts_path: PathBuf,
    pub engines: Vec<EngineEndpoint>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub collector_timeout_secs: u64,
    pub collector_max_retries: u32,
    pub collector_backoff_base_secs: u64,
    pub max_concurrent_collectors: usize,
    pub job_batch_size: usize,
    pub max_concurrent_jobs: usize,
    pub collection_cron: String,
    pub index_window_days: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("prompts_path", &self.prompts_path)
            .field("engines", &self.engines)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("collector_timeout_secs", &self.collector_timeout_secs)
            .field("collector_max_retries", &self.collector_max_retries)
            .field(
                "collector_backoff_base_secs",
                &self.collector_backoff_base_secs,
            )
            .field("max_concurrent_collectors", &self.max_concurrent_collectors)
            .field("job_batch_size", &self.job_batch_size)
            .field("max_concurrent_jobs", &self.max_concurrent_jobs)
            .field("collection_cron", &self.collection_cron)
            .field("index_window_days", &self.index_window_days)
            .finish()
    }
}
