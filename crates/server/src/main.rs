//! ficrecs MCP server entry point.
//!
//! Boots the scraping admin server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

use ficrecs_core::{AppConfig, StoryDb};

mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let db = StoryDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open story database at {}", config.db_path.display()))?;

    let state = state::AppState::new(config, Arc::new(db)).context("failed to build source adapters")?;
    tracing::info!(sources = ?state.service.available_sources(), "Starting ficrecs server on stdio transport");

    let handler = handler::FicRecsServer::new(state);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
