//! Error shared by persistence ports.

use thiserror::Error;

use crate::domain::payment::PaymentError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// A stored row could not be mapped back into the domain.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for PaymentError {
    fn from(err: StoreError) -> Self {
        PaymentError::Infrastructure(err.to_string())
    }
}
