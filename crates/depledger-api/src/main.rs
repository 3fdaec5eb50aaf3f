//! # depledger-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Reads `PORT` (default 8080) and an
//! optional `GENESIS_CONFIG` path from the environment.

use depledger_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let port = config.port;
    let state = AppState::bootstrap(config).map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    depledger_api::serve(state, port).await?;
    Ok(())
}
