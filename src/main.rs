use std::error::Error;
use std::sync::Arc;

use search_gateway::{http, SearchConfig, SearchService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Usage: search-gateway [config.json]
    let config = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!("Loading config from {}", path);
            SearchConfig::from_file(&path)?
        }
        None => SearchConfig::default(),
    };

    let bind_addr = config.bind_addr.clone();
    let service = Arc::new(SearchService::from_config(config));
    tracing::info!(collections = ?service.registry().collections(), "Search registry loaded");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Search gateway listening on {}", bind_addr);
    axum::serve(listener, http::router(service)).await?;

    Ok(())
}
