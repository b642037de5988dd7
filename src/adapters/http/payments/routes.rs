//! Axum router configuration for payment endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{auth_middleware, AuthState};

use super::handlers::{
    confirm_transaction, create_transaction, get_transaction, list_pse_banks, prepare_transaction,
    receive_webhook, tokenize_card, PaymentsAppState,
};

/// Customer endpoints. Every route requires a Bearer token.
///
/// - `POST /prepare` - Sign a payment intent for a cart
/// - `POST /confirm` - Verify a client-reported transaction
/// - `POST /transactions` - Charge a prepared reference
/// - `GET /transactions/:id` - Gateway status of a transaction
/// - `POST /cards/tokenize` - Tokenize a card
pub fn checkout_routes(auth: AuthState) -> Router<PaymentsAppState> {
    Router::new()
        .route("/prepare", post(prepare_transaction))
        .route("/confirm", post(confirm_transaction))
        .route("/transactions", post(create_transaction))
        .route("/transactions/:id", get(get_transaction))
        .route("/cards/tokenize", post(tokenize_card))
        .route_layer(middleware::from_fn_with_state(auth, auth_middleware))
}

/// Public endpoints.
///
/// - `POST /webhook` - Gateway notifications, authenticated by checksum
/// - `GET /pse/banks` - PSE bank list
pub fn public_routes() -> Router<PaymentsAppState> {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/pse/banks", get(list_pse_banks))
}

/// All payment routes, mounted at `/payments`.
pub fn payments_router(auth: AuthState) -> Router<PaymentsAppState> {
    Router::new().nest("/payments", checkout_routes(auth).merge(public_routes()))
}
