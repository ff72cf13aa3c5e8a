mod detect;
mod index;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "aivis-cli")]
#[command(about = "AI visibility tracking command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a one-off collection job against the configured engines.
    Run {
        /// Restrict the run to prompts tagged with this brand slug.
        #[arg(long)]
        brand: Option<String>,
        /// Restrict the run to these prompt ids.
        #[arg(long = "prompt-id")]
        prompt_ids: Vec<String>,
        /// Restrict the run to prompts in this locale.
        #[arg(long)]
        locale: Option<String>,
    },
    /// Detect brand mentions in a local text file and print JSON.
    Detect {
        /// Path to a file containing answer text.
        #[arg(long)]
        file: PathBuf,
        /// Citation URLs reported alongside the answer.
        #[arg(long = "url")]
        urls: Vec<String>,
    },
    /// Compute the visibility index from stored scores.
    Index {
        /// Restrict the index to one brand slug.
        #[arg(long)]
        brand: Option<String>,
        /// Trailing window in days; defaults to the configured window.
        #[arg(long)]
        window_days: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            brand,
            prompt_ids,
            locale,
        } => run::execute(brand, prompt_ids, locale).await,
        Commands::Detect { file, urls } => detect::execute(&file, urls),
        Commands::Index { brand, window_days } => index::execute(brand, window_days).await,
    }
}
