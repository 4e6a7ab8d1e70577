use anyhow::Context;
use log::{info, warn};
use rag_core::{ApiKeys, Config};
use server::{create_app, RagService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    // Set default log level if not already set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting RAG chat server");

    let config = Config::load_from_env()
        .unwrap_or_else(|e| {
            warn!("Could not load config ({}), using development defaults", e);
            Config::development()
        })
        .with_env_overrides();
    let keys = ApiKeys::from_env();
    info!("API keys: {:?}", keys);

    let service = Arc::new(
        RagService::new(&config, &keys)
            .await
            .context("Failed to initialize RAG service")?,
    );
    info!("RAG service initialized with {:?}", service);

    let app = create_app(service);

    let bind_address = &config.server.bind_address;
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;

    info!("Server running on http://{}", bind_address);

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
