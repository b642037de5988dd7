//! Authentication middleware and extractors for axum.
//!
//! - `auth_middleware` - validates Bearer tokens and injects the customer into extensions
//! - `RequireAuth` - extractor that rejects requests without a validated customer
//!
//! ```text
//! Request → auth_middleware → injects AuthenticatedCustomer into extensions
//!                                      ↓
//!                              Handler → RequireAuth extractor reads from extensions
//! ```
//!
//! # Example
//!
//! ```ignore
//! let validator: AuthState = Arc::new(MockSessionValidator::new());
//!
//! let app = Router::new()
//!     .route("/payments/prepare", post(prepare_transaction))
//!     .route_layer(middleware::from_fn_with_state(validator, auth_middleware));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::payments::ErrorResponse;
use crate::domain::foundation::{AuthError, AuthenticatedCustomer};
use crate::ports::SessionValidator;

/// Auth middleware state - wraps the session validator.
pub type AuthState = Arc<dyn SessionValidator>;

/// Validates a Bearer token when one is present.
///
/// A missing header passes through untouched so `RequireAuth` can answer
/// with 401; a present but invalid token is rejected here.
pub async fn auth_middleware(
    State(validator): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    let Some(token) = token else {
        return next.run(request).await;
    };

    match validator.validate(token).await {
        Ok(customer) => {
            request.extensions_mut().insert(customer);
            next.run(request).await
        }
        Err(e) => auth_error_response(&e),
    }
}

fn auth_error_response(error: &AuthError) -> Response {
    let (status, message) = match error {
        AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
        AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
        AuthError::ServiceUnavailable(msg) => {
            tracing::error!(error = %msg, "Auth service unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "Authentication service unavailable")
        }
    };
    (status, Json(ErrorResponse::new("UNAUTHORIZED", message))).into_response()
}

/// Extractor that requires an authenticated customer.
#[derive(Debug, Clone)]
pub struct RequireAuth(pub AuthenticatedCustomer);

impl<S> axum::extract::FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<AuthenticatedCustomer>()
                .cloned()
                .map(RequireAuth)
                .ok_or(AuthRejection::Unauthenticated)
        })
    }
}

/// Rejection type for authentication failures.
#[derive(Debug, Clone)]
pub enum AuthRejection {
    Unauthenticated,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("UNAUTHORIZED", "Authentication required")),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth::MockSessionValidator;
    use axum::body::Body;
    use axum::extract::FromRequestParts;
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    fn test_customer() -> AuthenticatedCustomer {
        AuthenticatedCustomer::new("cust-123", "buyer@example.com", true)
    }

    async fn whoami(RequireAuth(customer): RequireAuth) -> String {
        customer.email
    }

    fn app(validator: MockSessionValidator) -> Router {
        let state: AuthState = Arc::new(validator);
        Router::new()
            .route("/me", get(whoami))
            .layer(middleware::from_fn_with_state(state, auth_middleware))
    }

    fn request(token: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri("/me");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Middleware
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn valid_token_reaches_handler() {
        let app = app(MockSessionValidator::new().with_customer("good", test_customer()));
        let response = app.oneshot(request(Some("good"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_rejected_by_extractor() {
        let app = app(MockSessionValidator::new());
        let response = app.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_token_is_rejected_by_middleware() {
        let app = app(MockSessionValidator::new());
        let response = app.oneshot(request(Some("forged"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unavailable_validator_answers_503() {
        let app = app(
            MockSessionValidator::new().with_error(AuthError::service_unavailable("jwks down")),
        );
        let response = app.oneshot(request(Some("any"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // RequireAuth
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn require_auth_reads_customer_from_extensions() {
        let mut request: HttpRequest<()> = HttpRequest::builder().uri("/test").body(()).unwrap();
        request.extensions_mut().insert(test_customer());
        let (mut parts, _body) = request.into_parts();

        let RequireAuth(customer) = RequireAuth::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(customer.id, "cust-123");
    }

    #[test]
    fn rejection_is_401() {
        let response = AuthRejection::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
