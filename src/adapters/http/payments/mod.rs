//! HTTP adapter for payment endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::*;
pub use handlers::{PaymentApiError, PaymentsAppState};
pub use routes::{checkout_routes, payments_router, public_routes};
