//! Payment gateway adapters.
//!
//! - `HttpPaymentGateway` - REST client for sandbox and production
//! - `MockPaymentGateway` - scripted gateway for tests

mod http_gateway;
mod mock_gateway;
mod wire_types;

pub use http_gateway::{GatewayClientConfig, HttpPaymentGateway};
pub use mock_gateway::{MethodCall, MockPaymentGateway};
