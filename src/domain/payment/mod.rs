//! Payment domain module.
//!
//! Pure building blocks for taking a payment safely: amounts in minor units,
//! payment references, prepared intents and the Signature Engine.
//!
//! # Module Structure
//!
//! - `signature` - integrity signatures and webhook checksums
//! - `payload_path` - dotted-path resolution over webhook payloads
//! - `money` - minor-unit amounts, currencies and cart totals
//! - `reference` - payment reference minting and tenant prefixes
//! - `intent` - short-lived prepared payment intents
//! - `transaction` - the gateway's transaction record and statuses
//! - `errors` - payment error taxonomy

mod errors;
mod intent;
mod money;
mod payload_path;
mod reference;
pub mod signature;
mod transaction;

pub use errors::{NotFoundKind, PaymentError};
pub use intent::{PaymentMethod, PreparedIntent};
pub use money::{amount_from_lines, CartLine, Currency, MinorUnits};
pub use payload_path::{resolve_path, resolve_scalar, PathError};
pub use reference::PaymentReference;
pub use signature::ChecksumError;
pub use transaction::{GatewayTransaction, TransactionStatus};
