mod analytics;
mod config;
mod dal;
mod db;
mod errors;
mod identity;
mod models;
mod profile;
mod recency;
mod repository;
mod resumes;
mod routes;
mod sharing;
mod state;
mod store;
mod templates;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::{AnalyticsSink, RedisAnalyticsSink, StoreAnalyticsSink, ANALYTICS_STREAM};
use crate::config::{Config, StoreBackend};
use crate::dal::DataAccess;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{DocumentStore, MemoryDocumentStore, PgDocumentStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;
    let analytics = build_analytics_sink(&config, store.clone())?;

    let state = AppState {
        data: DataAccess::new(store, analytics, config.public_base_url.clone()),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let pool = create_pool(url).await?;
            info!("Document store: PostgreSQL");
            Ok(Arc::new(PgDocumentStore::new(pool)))
        }
        StoreBackend::Memory => {
            info!("Document store: in-memory (data is lost on restart)");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
    }
}

/// Redis stream when `REDIS_URL` is set, otherwise the document store.
fn build_analytics_sink(
    config: &Config,
    store: Arc<dyn DocumentStore>,
) -> Result<Arc<dyn AnalyticsSink>> {
    match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            info!("Analytics sink: Redis stream '{ANALYTICS_STREAM}'");
            Ok(Arc::new(RedisAnalyticsSink::new(client, ANALYTICS_STREAM)))
        }
        None => {
            info!("Analytics sink: document store");
            Ok(Arc::new(StoreAnalyticsSink::new(store)))
        }
    }
}
