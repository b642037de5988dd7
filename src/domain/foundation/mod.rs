//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the storefront payment domain.

mod auth;
mod commission_rate;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use auth::{AuthError, AuthenticatedCustomer};
pub use commission_rate::CommissionRate;
pub use errors::{ErrorCode, ValidationError};
pub use ids::{CommissionId, OrderId, ProductId, TeamMemberId, VariantId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
