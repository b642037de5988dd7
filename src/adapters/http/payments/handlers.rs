//! HTTP handlers for payment endpoints.
//!
//! These handlers connect axum routes to the application layer handlers.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::forwarding::CHECKSUM_HEADER;
use crate::adapters::http::middleware::RequireAuth;
use crate::application::handlers::{
    ConfirmTransactionCommand, ConfirmTransactionHandler, CreateTransactionCommand,
    CreateTransactionHandler, GatewayQueryHandler, IngestSettings, IngestWebhookCommand,
    IngestWebhookHandler, PrepareSettings, PrepareTransactionCommand, PrepareTransactionHandler,
};
use crate::domain::payment::{PaymentError, PaymentReference};
use crate::domain::webhook::IngressOutcome;
use crate::ports::{
    CardDetails, Clock, IntentStore, OrderRepository, PaymentGateway, ReconciliationQueue,
};

use super::dto::{
    BankListResponse, CardTokenResponse, ConfirmTransactionRequest, ConfirmationResponse,
    CreateTransactionRequest, ErrorResponse, PaymentIntentResponse, PrepareTransactionRequest,
    TransactionResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the payment routes.
///
/// Cloned per request; handlers are built on demand from the shared ports.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub intents: Arc<dyn IntentStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub queue: Arc<dyn ReconciliationQueue>,
    pub clock: Arc<dyn Clock>,
    pub checkout: PrepareSettings,
    pub ingest: IngestSettings,
}

impl PaymentsAppState {
    pub fn prepare_handler(&self) -> PrepareTransactionHandler {
        PrepareTransactionHandler::new(
            self.orders.clone(),
            self.intents.clone(),
            self.gateway.clone(),
            self.clock.clone(),
            self.checkout.clone(),
        )
    }

    pub fn confirm_handler(&self) -> ConfirmTransactionHandler {
        ConfirmTransactionHandler::new(
            self.intents.clone(),
            self.gateway.clone(),
            self.checkout.integrity_secret.clone(),
        )
    }

    pub fn create_handler(&self) -> CreateTransactionHandler {
        CreateTransactionHandler::new(
            self.intents.clone(),
            self.gateway.clone(),
            self.checkout.integrity_secret.clone(),
            self.checkout.redirect_url.clone(),
        )
    }

    pub fn query_handler(&self) -> GatewayQueryHandler {
        GatewayQueryHandler::new(self.gateway.clone())
    }

    pub fn ingest_handler(&self) -> IngestWebhookHandler {
        IngestWebhookHandler::new(self.queue.clone(), self.clock.clone(), self.ingest.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout (authenticated)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payments/prepare - Sign a payment intent for the cart
pub async fn prepare_transaction(
    State(state): State<PaymentsAppState>,
    RequireAuth(customer): RequireAuth,
    Json(request): Json<PrepareTransactionRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let cmd = PrepareTransactionCommand {
        lines: request.items,
        customer_email: request
            .customer
            .map(|c| c.email)
            .unwrap_or(customer.email),
        shipping_address: request.shipping_address,
        payment_method: request.payment_method,
    };

    let intent = state.prepare_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(PaymentIntentResponse::from(intent))))
}

/// POST /payments/confirm - Verify a client-reported transaction
pub async fn confirm_transaction(
    State(state): State<PaymentsAppState>,
    RequireAuth(_customer): RequireAuth,
    Json(request): Json<ConfirmTransactionRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let cmd = ConfirmTransactionCommand {
        reference: PaymentReference::parse(&request.reference).map_err(PaymentError::from)?,
        transaction_id: request.transaction_id,
        amount_in_cents: request.amount_in_cents,
        currency: request.currency,
        integrity_signature: request.integrity_signature,
    };

    let result = state.confirm_handler().handle(cmd).await?;

    Ok(Json(ConfirmationResponse::from(result)))
}

/// POST /payments/transactions - Charge a prepared reference
pub async fn create_transaction(
    State(state): State<PaymentsAppState>,
    RequireAuth(_customer): RequireAuth,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let cmd = CreateTransactionCommand {
        reference: PaymentReference::parse(&request.reference).map_err(PaymentError::from)?,
        payment_method: request.payment_method,
    };

    let transaction = state.create_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(TransactionResponse::from(transaction))))
}

/// GET /payments/transactions/:id - Authoritative gateway status
pub async fn get_transaction(
    State(state): State<PaymentsAppState>,
    RequireAuth(_customer): RequireAuth,
    Path(transaction_id): Path<String>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let transaction = state.query_handler().transaction(&transaction_id).await?;
    Ok(Json(TransactionResponse::from(transaction)))
}

/// POST /payments/cards/tokenize - Exchange card details for a gateway token
pub async fn tokenize_card(
    State(state): State<PaymentsAppState>,
    RequireAuth(_customer): RequireAuth,
    Json(card): Json<CardDetails>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let token = state.query_handler().tokenize_card(card).await?;
    Ok((StatusCode::CREATED, Json(CardTokenResponse::from(token))))
}

// ════════════════════════════════════════════════════════════════════════════════
// Public endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /payments/pse/banks - Banks available for PSE transfers
pub async fn list_pse_banks(
    State(state): State<PaymentsAppState>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let banks = state.query_handler().pse_banks().await?;
    Ok(Json(BankListResponse {
        banks: banks.into_iter().map(Into::into).collect(),
    }))
}

/// Largest webhook body read into memory.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 1024 * 1024;

/// POST /payments/webhook - Gateway event notifications
///
/// Always 200. The body is a status token; failures are logged, never
/// surfaced, so the gateway does not retry into a broken handler. Bodies
/// over [`MAX_WEBHOOK_BODY_BYTES`] get `ERROR_LOGGED`.
pub async fn receive_webhook(
    State(state): State<PaymentsAppState>,
    headers: HeaderMap,
    body: Body,
) -> impl IntoResponse {
    let source_ip = client_ip(&headers);
    let body = match to_bytes(body, MAX_WEBHOOK_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                source_ip = source_ip.as_deref().unwrap_or("unknown"),
                limit = MAX_WEBHOOK_BODY_BYTES,
                error = %e,
                "Webhook body rejected"
            );
            return (StatusCode::OK, IngressOutcome::ErrorLogged.as_str());
        }
    };

    let cmd = IngestWebhookCommand {
        body: body.to_vec(),
        checksum_header: header_value(&headers, CHECKSUM_HEADER),
        source_ip,
    };

    let outcome = state.ingest_handler().handle(cmd);

    (StatusCode::OK, outcome.as_str())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
}

/// First hop in `X-Forwarded-For`, else `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    header_value(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .or_else(|| header_value(headers, "x-real-ip"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
#[derive(Debug)]
pub struct PaymentApiError(PaymentError);

impl From<PaymentError> for PaymentApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl PaymentApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PaymentError::Validation(_)
            | PaymentError::InvalidAmount(_)
            | PaymentError::AmountMismatch { .. }
            | PaymentError::InvalidSignature
            | PaymentError::DataMismatch { .. }
            | PaymentError::StaleEvent { .. } => StatusCode::BAD_REQUEST,
            PaymentError::NotFound { .. } => StatusCode::NOT_FOUND,
            PaymentError::UnauthorizedWebhook(_) => StatusCode::UNAUTHORIZED,
            PaymentError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            PaymentError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Payment request failed");
        }

        let code = self.0.code();
        let message = self.0.client_message();
        let body = if self.0.is_retryable() {
            ErrorResponse::with_details(
                code.as_str(),
                message,
                serde_json::json!({ "retryable": true }),
            )
        } else {
            ErrorResponse::new(code.as_str(), message)
        };
        (status, Json(body)).into_response()
    }
}
