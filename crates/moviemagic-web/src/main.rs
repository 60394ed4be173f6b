mod error;
mod routes;
mod session;

use std::sync::Arc;

use anyhow::{Context, Result};
use moviemagic_core::backend::WeaviateClient;
use moviemagic_core::config::{MovieConfig, Secrets};

use crate::session::SessionStore;

pub struct AppState<B> {
    pub backend: B,
    pub config: MovieConfig,
    pub sessions: SessionStore,
}

impl<B> AppState<B> {
    pub fn new(backend: B, config: MovieConfig) -> Self {
        let sessions = SessionStore::from_config(&config.web);
        Self {
            backend,
            config,
            sessions,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("moviemagic_web=info,tower_http=info")
                }),
        )
        .init();

    let config = MovieConfig::load(Some(&std::env::current_dir()?)).unwrap_or_else(|e| {
        tracing::warn!("failed to load config, using defaults: {e}");
        MovieConfig::default_config()
    });

    // Secrets are checked before any client exists.
    let secrets = match Secrets::from_env() {
        Ok(secrets) => secrets,
        Err(e) => {
            eprintln!("🚨 {e}");
            std::process::exit(1);
        }
    };

    let backend =
        WeaviateClient::new(&secrets, &config.weaviate).context("failed to build Weaviate client")?;
    tracing::info!(
        endpoint = %backend.graphql_url(),
        collection = %config.search.collection,
        "weaviate client ready"
    );

    let state = Arc::new(AppState::new(backend, config.clone()));

    let app = routes::router::<WeaviateClient>()
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.web.host, config.web.port);
    tracing::info!("moviemagic-web listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
