//! HTTP adapters - REST API implementations.

pub mod middleware;
pub mod payments;

use axum::{routing::get, Router};

pub use middleware::AuthState;
pub use payments::{payments_router, PaymentsAppState};

/// The complete API: payment routes plus `GET /health`.
///
/// Cross-cutting layers (tracing, timeouts, CORS) are added by the binary.
pub fn api_router(state: PaymentsAppState, auth: AuthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(payments_router(auth))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
