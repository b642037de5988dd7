//! Prepared intent store port.
//!
//! A short-lived key-value store keyed by payment reference. Expired
//! intents are invisible to `get` even before a sweep removes them.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::foundation::Timestamp;
use crate::domain::payment::{PaymentReference, PreparedIntent};

#[async_trait]
pub trait IntentStore: Send + Sync {
    /// Store a new intent.
    ///
    /// # Errors
    ///
    /// - `Duplicate` if a live intent already exists for the reference
    async fn insert(&self, intent: PreparedIntent) -> Result<(), StoreError>;

    /// Live intent for `reference`, `None` if absent or expired.
    async fn get(&self, reference: &PaymentReference) -> Result<Option<PreparedIntent>, StoreError>;

    /// Atomically remove and return the live intent.
    ///
    /// Of several concurrent callers for one reference, at most one gets
    /// `Some`. An expired intent is removed and reported as `None`.
    async fn take(&self, reference: &PaymentReference) -> Result<Option<PreparedIntent>, StoreError>;

    /// Delete every intent expired at `now`. Returns how many were deleted.
    async fn sweep_expired(&self, now: Timestamp) -> Result<usize, StoreError>;
}
