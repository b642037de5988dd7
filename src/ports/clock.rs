//! Time source port.

use crate::domain::foundation::Timestamp;

/// Supplies the current time. Injected so tests can move time explicitly.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}
