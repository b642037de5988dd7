//! REST client for the payment gateway.
//!
//! Implements [`PaymentGateway`] over the gateway's public API. The sandbox
//! or production host is chosen from the key prefix unless a base URL is
//! configured explicitly.
//!
//! # Keys
//!
//! - public key: merchant lookup, card tokenization, PSE banks
//! - private key: transaction creation and lookup
//!
//! # Configuration
//!
//! ```ignore
//! let gateway = HttpPaymentGateway::from_config(&app_config.payment)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::PaymentConfig;
use crate::domain::payment::GatewayTransaction;
use crate::ports::{
    AcceptanceToken, CardDetails, CardToken, CreateTransactionRequest, FinancialInstitution,
    GatewayError, GatewayErrorCode, PaymentGateway,
};

use super::wire_types::{
    CreateTransactionBody, DataEnvelope, ErrorEnvelope, Merchant, TokenizeCardBody, TokenizedCard,
};

/// Gateway client configuration.
#[derive(Clone)]
pub struct GatewayClientConfig {
    base_url: String,
    public_key: String,
    private_key: SecretString,
    timeout: Duration,
}

impl GatewayClientConfig {
    pub fn new(base_url: impl Into<String>, public_key: impl Into<String>, private_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            public_key: public_key.into(),
            private_key,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl From<&PaymentConfig> for GatewayClientConfig {
    fn from(config: &PaymentConfig) -> Self {
        GatewayClientConfig::new(
            config.base_url(),
            config.public_key.clone(),
            config.private_key.clone(),
        )
        .with_timeout(config.gateway_timeout())
    }
}

pub struct HttpPaymentGateway {
    config: GatewayClientConfig,
    http_client: reqwest::Client,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayClientConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn from_config(config: &PaymentConfig) -> Result<Self, GatewayError> {
        Self::new(GatewayClientConfig::from(config))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    fn with_public_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.config.public_key)
    }

    fn with_private_key(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(self.config.private_key.expose_secret())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(operation, error = %e, "Gateway request failed");
            GatewayError::network(e.to_string())
        })?;
        read_data(operation, response).await
    }
}

async fn read_data<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|env| env.error.describe())
            .unwrap_or(body);
        tracing::error!(operation, status = status.as_u16(), error = %message, "Gateway API error");
        return Err(GatewayError::new(error_code_for(status), message).with_status(status.as_u16()));
    }

    let envelope: DataEnvelope<T> = response.json().await.map_err(|e| {
        GatewayError::new(
            GatewayErrorCode::ProviderError,
            format!("Failed to parse gateway response: {}", e),
        )
    })?;
    Ok(envelope.data)
}

fn error_code_for(status: StatusCode) -> GatewayErrorCode {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayErrorCode::AuthenticationError,
        StatusCode::NOT_FOUND => GatewayErrorCode::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => GatewayErrorCode::InvalidRequest,
        StatusCode::TOO_MANY_REQUESTS => GatewayErrorCode::RateLimitExceeded,
        _ => GatewayErrorCode::ProviderError,
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn acceptance_token(&self) -> Result<AcceptanceToken, GatewayError> {
        let url = self.url(&format!("merchants/{}", self.config.public_key));
        let merchant: Merchant = self
            .send("acceptance_token", self.http_client.get(&url))
            .await?;
        Ok(merchant.presigned_acceptance.into())
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<GatewayTransaction, GatewayError> {
        let url = self.url(&format!("transactions/{}", transaction_id));
        self.send(
            "get_transaction",
            self.with_private_key(self.http_client.get(&url)),
        )
        .await
    }

    async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> Result<GatewayTransaction, GatewayError> {
        let body = CreateTransactionBody {
            acceptance_token: &request.acceptance_token,
            amount_in_cents: request.amount_in_cents,
            currency: &request.currency,
            signature: &request.signature,
            customer_email: &request.customer_email,
            reference: &request.reference,
            payment_method: &request.payment_method,
            redirect_url: request.redirect_url.as_deref(),
        };
        let url = self.url("transactions");
        self.send(
            "create_transaction",
            self.with_private_key(self.http_client.post(&url)).json(&body),
        )
        .await
        .map_err(GatewayError::non_retryable)
    }

    async fn tokenize_card(&self, card: CardDetails) -> Result<CardToken, GatewayError> {
        let body = TokenizeCardBody {
            number: &card.number,
            cvc: &card.cvc,
            exp_month: &card.exp_month,
            exp_year: &card.exp_year,
            card_holder: &card.card_holder,
        };
        let url = self.url("tokens/cards");
        let token: TokenizedCard = self
            .send(
                "tokenize_card",
                self.with_public_key(self.http_client.post(&url)).json(&body),
            )
            .await?;
        Ok(token.into())
    }

    async fn list_pse_banks(&self) -> Result<Vec<FinancialInstitution>, GatewayError> {
        let url = self.url("pse/financial_institutions");
        self.send(
            "list_pse_banks",
            self.with_public_key(self.http_client.get(&url)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sandbox_config;

    fn gateway() -> HttpPaymentGateway {
        HttpPaymentGateway::new(GatewayClientConfig::new(
            "https://sandbox.gateway.test/v1/",
            "pub_test_abc",
            SecretString::new("prv_test_xyz".to_string()),
        ))
        .unwrap()
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let gateway = gateway();
        assert_eq!(gateway.url("transactions"), "https://sandbox.gateway.test/v1/transactions");
        assert_eq!(gateway.url("/pse/financial_institutions"), "https://sandbox.gateway.test/v1/pse/financial_institutions");
    }

    #[test]
    fn sandbox_keys_select_sandbox_host() {
        let config = GatewayClientConfig::from(&sandbox_config());
        assert_eq!(config.base_url(), "https://sandbox.wompi.co/v1");
    }

    #[test]
    fn status_codes_map_to_error_codes() {
        assert_eq!(error_code_for(StatusCode::UNAUTHORIZED), GatewayErrorCode::AuthenticationError);
        assert_eq!(error_code_for(StatusCode::NOT_FOUND), GatewayErrorCode::NotFound);
        assert_eq!(error_code_for(StatusCode::UNPROCESSABLE_ENTITY), GatewayErrorCode::InvalidRequest);
        assert_eq!(error_code_for(StatusCode::TOO_MANY_REQUESTS), GatewayErrorCode::RateLimitExceeded);
        assert_eq!(error_code_for(StatusCode::BAD_GATEWAY), GatewayErrorCode::ProviderError);
    }

    #[test]
    fn only_transient_statuses_are_retryable() {
        assert!(error_code_for(StatusCode::SERVICE_UNAVAILABLE).is_retryable());
        assert!(!error_code_for(StatusCode::UNPROCESSABLE_ENTITY).is_retryable());
    }
}
