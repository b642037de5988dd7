//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `payment` - Signature Engine, amounts, references and prepared intents
//! - `order` - Order aggregate, status machines and commissions
//! - `webhook` - Gateway notification envelope and ingress outcomes

pub mod foundation;
pub mod order;
pub mod payment;
pub mod webhook;
