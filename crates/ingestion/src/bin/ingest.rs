use anyhow::Result;
use clap::Parser;
use ingestion::IngestionPipeline;
use rag_core::{ApiKeys, Config};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Extract, embed and store documents for retrieval", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (defaults to CONFIG_PATH or ./config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of .pdf, .txt and .md files (overrides data.document_dir)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Delete every stored chunk before ingesting
    #[arg(long)]
    reset: bool,
}

fn load_config(path: Option<&Path>) -> Config {
    let loaded = match path {
        Some(path) => Config::load(path),
        None => Config::load_from_env(),
    };

    loaded
        .unwrap_or_else(|e| {
            warn!("Could not load config ({}), using development defaults", e);
            Config::development()
        })
        .with_env_overrides()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    let keys = ApiKeys::from_env();
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| PathBuf::from(&config.data.document_dir));

    info!("Ingesting documents from {}", data_dir.display());
    let pipeline = IngestionPipeline::from_config(&config, &keys).await?;
    let report = pipeline.run(&data_dir, cli.reset).await?;

    info!(
        "Ingestion complete: {} documents, {} chunks, {} stored",
        report.documents, report.chunks, report.stored
    );
    Ok(())
}
