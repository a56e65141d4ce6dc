//! Folio Server - keyset-paginated record collections over HTTP.
//!
//! Every collection declared by the schema is served at
//! `GET /collections/{collection}/records`, backed either by PostgreSQL or
//! by an in-process store seeded from a snapshot file.

mod config;
mod db;
mod error;
mod handlers;
mod routes;

use crate::config::{Config, StoreBackend};
use crate::db::PgExecutor;
use axum::Router;
use folio_engine::{MemoryStore, Paginator, Schema, SortPolicy};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Record source behind the collection endpoints.
#[derive(Clone)]
pub enum Backend {
    Postgres(PgExecutor),
    Memory(Arc<MemoryStore>),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Postgres(_) => "postgres",
            Backend::Memory(_) => "memory",
        }
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Backend,
    pub schema: Arc<Schema>,
    pub paginator: Arc<Paginator>,
    pub sort_policy: SortPolicy,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(backend: Backend, schema: Schema, config: Config) -> Self {
        Self {
            backend,
            schema: Arc::new(schema),
            paginator: Arc::new(Paginator::new(config.paginator.clone())),
            sort_policy: config.sort_policy(),
            config: Arc::new(config),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let schema = config.load_schema()?;
    let seed = config.load_seed()?;

    tracing::info!(
        "Starting Folio Server on {}:{} ({} collections)",
        config.host,
        config.port,
        schema.collections.len()
    );

    // Seeds are validated against the schema before anything is served
    let mut store = MemoryStore::new(schema.clone());
    if let Some(snapshot) = seed.clone() {
        store.import_state(snapshot)?;
    }

    let backend = match &config.backend {
        StoreBackend::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = db::create_pool(database_url, *max_connections).await?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await?;

            if let Some(snapshot) = &seed {
                let written = db::upsert_snapshot(&pool, snapshot).await?;
                tracing::info!("Seeded {} records", written);
            }
            Backend::Postgres(PgExecutor::new(pool))
        }
        StoreBackend::Memory => {
            tracing::info!(
                "Serving {} records from memory",
                seed.as_ref().map_or(0, |s| s.record_count())
            );
            Backend::Memory(Arc::new(store))
        }
    };

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(backend, schema, config);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
