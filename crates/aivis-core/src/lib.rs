use thiserror::Error;

pub mod answer;
pub mod app_config;
pub mod brands;
pub mod config;
pub mod detection;
pub mod prompts;
pub mod score;

pub use answer::{CitedLink, EngineAnswer};
pub use app_config::{AppConfig, EngineEndpoint, Environment};
pub use brands::{load_brands, BrandConfig, BrandsFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use detection::{BrandMention, CitationRecord, MatchType, ParsedAnswer};
pub use prompts::{load_prompts, PromptConfig, PromptsFile};
pub use score::{AIVisibilityScore, ComponentScores, Penalties, ScoreMetrics};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read brands file {path}: {source}")]
    BrandsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse brands file: {0}")]
    BrandsFileParse(#[source] serde_yaml::Error),

    #[error("failed to read prompts file {path}: {source}")]
    PromptsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse prompts file: {0}")]
    PromptsFileParse(#[source] serde_yaml::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
