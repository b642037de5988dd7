//! Order domain module.
//!
//! Orders are created `pending/pending` before the gateway is contacted and
//! are only ever transitioned, never deleted.
//!
//! # Module Structure
//!
//! - `aggregate` - Order aggregate and its lines
//! - `status` - PaymentStatus and OrderStatus state machines
//! - `transition` - reconciliation actions and their guarded transitions
//! - `commission` - staff commission rows

mod aggregate;
mod commission;
mod status;
mod transition;

pub use aggregate::{Order, OrderLine, ShippingAddress};
pub use commission::{Commission, CommissionStatus, CommissionedStaff};
pub use status::{OrderStatus, PaymentStatus};
pub use transition::{PaymentTransition, ReconciliationAction};
