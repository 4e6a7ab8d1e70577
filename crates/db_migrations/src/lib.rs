use anyhow::{Context, Result};
use std::time::Duration;
use tokio_postgres::NoTls;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("./migrations");
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Names of the embedded migrations in version order, e.g. `V1__create_documents`.
pub fn schema_migrations() -> Vec<String> {
    embedded::migrations::runner()
        .get_migrations()
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Brings the `documents` schema (pgvector extension, table and indexes) up to
/// date and returns the migrations applied by this call. Already-applied
/// migrations are skipped, so a migrated database yields an empty list.
pub async fn run_migrations(database_url: &str) -> Result<Vec<String>> {
    let (mut client, connection) =
        tokio::time::timeout(CONNECT_TIMEOUT, tokio_postgres::connect(database_url, NoTls))
            .await
            .context("Timed out connecting to the documents database")?
            .context("Failed to connect to the documents database")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Migration connection error: {}", e);
        }
    });

    let report = embedded::migrations::runner()
        .run_async(&mut client)
        .await
        .context("Failed to migrate the documents schema")?;

    let applied: Vec<String> = report
        .applied_migrations()
        .iter()
        .map(ToString::to_string)
        .collect();

    if applied.is_empty() {
        info!("Documents schema already up to date");
    }
    for name in &applied {
        info!("Applied migration {}", name);
    }

    Ok(applied)
}
