//! cmsync-ingest - CMS content synchronization service
//!
//! Receives CMS webhooks, mirrors locations, tenants and translations into
//! the document store, reconciles the full catalog on demand and refreshes
//! stale popular-times data.

use anyhow::{Context, Result};
use clap::Parser;
use cmsync_common::config::{load_config, TomlConfig};
use cmsync_common::db::{MemoryDocumentStore, SqliteDocumentStore};
use cmsync_common::DocumentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cmsync_ingest::clients::{aggregation, SanityContentClient, SanityImageResolver};
use cmsync_ingest::{AppState, Collaborators};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "cmsync-ingest")]
#[command(about = "CMS content synchronization service")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Socket address to listen on (overrides config)
    #[arg(short, long, env = "CMSYNC_BIND")]
    bind: Option<String>,

    /// SQLite database file (overrides config)
    #[arg(short, long, env = "CMSYNC_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(database) = args.database {
        config.database.path = Some(database);
        config.database.in_memory = false;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "Starting cmsync-ingest v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let store = open_store(&config).await?;
    let collaborators = build_collaborators(&config, store)?;
    let state = AppState::new(collaborators, &config.sync);
    let app = cmsync_ingest::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on http://{}", config.server.bind);
    info!("Health check: http://{}/health", config.server.bind);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn open_store(config: &TomlConfig) -> Result<Arc<dyn DocumentStore>> {
    if config.database.in_memory {
        info!("Database: in-memory (documents are lost on exit)");
        return Ok(Arc::new(MemoryDocumentStore::new()));
    }

    let db_path = config.database.resolved_path();
    info!("Database: {}", db_path.display());
    let store = SqliteDocumentStore::open(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open database {}: {}", db_path.display(), e))?;
    Ok(Arc::new(store))
}

fn build_collaborators(config: &TomlConfig, store: Arc<dyn DocumentStore>) -> Result<Collaborators> {
    let content = SanityContentClient::new(&config.cms)
        .map_err(|e| anyhow::anyhow!("Failed to build CMS client: {}", e))?;
    info!("CMS query endpoint: {}", content.query_url());
    if config.cms.token.is_none() {
        info!("No CMS token configured, querying public dataset");
    }

    let images = SanityImageResolver::new(
        config.images.base_url.as_str(),
        config.cms.project_id.as_str(),
        config.cms.dataset.as_str(),
    );

    let aggregation = aggregation::from_config(&config.aggregation)
        .map_err(|e| anyhow::anyhow!("Failed to build aggregation client: {}", e))?;

    Ok(Collaborators {
        store,
        content: Arc::new(content),
        images: Arc::new(images),
        aggregation,
    })
}
