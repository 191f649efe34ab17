use anyhow::Result;
use beacon_live::LocationEngine;
use beacon_server::{ServerConfig, StaticTokenVerifier, create_app};
use beacon_store::InMemoryStore;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run_serve(port: u16, database_url: Option<String>) -> Result<()> {
    if let Err(e) = beacon_telemetry::init_telemetry("beacon-server") {
        eprintln!("Failed to initialize telemetry: {}", e);
    }

    let verifier = match std::env::var("BEACON_API_TOKENS") {
        Ok(spec) => Arc::new(StaticTokenVerifier::from_pairs(&spec)?),
        Err(_) => {
            warn!("BEACON_API_TOKENS not set; every request will be rejected");
            Arc::new(StaticTokenVerifier::new())
        }
    };

    let config = match database_url {
        Some(url) => build_postgres_config(&url, verifier).await?,
        None => {
            info!("no database url configured, using the in-memory store");
            let store = Arc::new(InMemoryStore::new());
            let engine = Arc::new(LocationEngine::new(store.clone(), store.clone()));
            ServerConfig::new(engine, store.clone(), store, verifier)
        }
    };

    let app = create_app(config);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Beacon server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_postgres_config(
    url: &str,
    verifier: Arc<StaticTokenVerifier>,
) -> Result<ServerConfig> {
    let store = Arc::new(beacon_store::PostgresStore::connect(url).await?);
    let engine = Arc::new(LocationEngine::new(store.clone(), store.clone()));
    Ok(ServerConfig::new(engine, store.clone(), store, verifier))
}

#[cfg(not(feature = "postgres"))]
async fn build_postgres_config(
    _url: &str,
    _verifier: Arc<StaticTokenVerifier>,
) -> Result<ServerConfig> {
    anyhow::bail!("built without the postgres feature; rebuild with --features postgres")
}
