//! # depledger-api: HTTP Service for the Dependency Ledger
//!
//! Exposes the ledger's boundary operations as JSON endpoints over one
//! shared, serialized ledger.
//!
//! ## API Surface
//!
//! | Prefix | Module | Operations |
//! |---|---|---|
//! | `/v1/developers` | [`routes::developers`] | register, lookup |
//! | `/v1/accounts` | [`routes::accounts`] | deposit, balance, licenses |
//! | `/v1/software` | [`routes::software`] | mint |
//! | `/v1/repositories` | [`routes::repositories`] | tokens, owner, metadata, referring, referred |
//! | `/v1/listings` | [`routes::listings`] | list, status, delist |
//! | `/v1/purchases` | [`routes::purchases`] | buy a license |
//! | `/v1/journal` | [`routes::journal`] | receipts and verification |
//!
//! ## Middleware
//!
//! ```text
//! TraceLayer → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::developers::router())
        .merge(routes::accounts::router())
        .merge(routes::software::router())
        .merge(routes::repositories::router())
        .merge(routes::listings::router())
        .merge(routes::purchases::router())
        .merge(routes::journal::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Bind `0.0.0.0:port` and serve the application until the process exits.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("depledger API listening on {}", addr);
    axum::serve(listener, app(state)).await
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: returns 200 when the application is ready to serve.
async fn readiness() -> &'static str {
    "ready"
}
