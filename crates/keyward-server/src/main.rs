//! Keyward Server — process entry point.
//!
//! Connects the configured backend, brings its schema up to date and
//! then idles until interrupted. Request routing is mounted elsewhere.

mod config;

use anyhow::{Context, Result};
use keyward_core::repository::ApplicationRepository;
use keyward_db::{DocumentStore, RelationalStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{Backend, KeywardConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("keyward=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .init();

    info!("Starting keyward server...");

    let config = KeywardConfig::from_env().context("load configuration")?;

    match config.backend {
        Backend::Postgres(pg) => {
            let store = tokio::time::timeout(config.startup_timeout, async {
                let store = RelationalStore::connect(&pg).await?;
                store.applications().ensure_schema().await?;
                anyhow::Ok(store)
            })
            .await
            .context("postgres startup timed out")??;
            info!(database = %pg.database, "PostgreSQL backend ready");
            shutdown_signal().await?;
            store.pool().close().await;
        }
        Backend::Surreal(doc) => {
            let _store = tokio::time::timeout(config.startup_timeout, DocumentStore::connect(&doc))
                .await
                .context("surrealdb startup timed out")??;
            info!(namespace = %doc.namespace, database = %doc.database, "SurrealDB backend ready");
            shutdown_signal().await?;
        }
    }

    info!("keyward server stopped.");
    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("listen for shutdown signal")?;
    info!("Shutdown signal received");
    Ok(())
}
