mod auth;
mod config;
mod error;
mod extract;
#[cfg(test)]
mod fixture;
mod kpis;
mod me;
mod proxy;
mod server;
mod utils;

use std::error::Error;
use std::sync::Arc;

use backend::BackendClient;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::GatewayConfig;
use crate::server::{Handler, router};

const SERVICE_NAME: &str = "gateway";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = GatewayConfig::from_env();
    let port = config.port;
    let backend = BackendClient::new(config.backend_api_url.clone())?;
    let handler = Handler::new(Arc::new(backend), config);

    let router = router(handler)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive());

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(service = SERVICE_NAME, "listening on {}", listener.local_addr()?);

    axum::serve(listener, router).await?;

    Ok(())
}
