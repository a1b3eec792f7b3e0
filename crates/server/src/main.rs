//! cinedex server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use cinedex_core::AppConfig;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod services;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        log_db = %config.log_db_path.display(),
        poster_cache = %config.poster_cache_path.display(),
        "Starting cinedex server on stdio transport"
    );

    let services = services::Services::from_config(&config);
    if !services.log.ping().await {
        tracing::warn!("search log unavailable at startup; analytics will retry on demand");
    }

    let handler = handler::CinedexServer::new(services);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
