//! In-memory prepared intent store.
//!
//! Expiry is checked against the injected clock on every read; the
//! [`IntentSweeper`](crate::adapters::IntentSweeper) reclaims the memory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::payment::{PaymentReference, PreparedIntent};
use crate::ports::{Clock, IntentStore, StoreError};

#[derive(Clone)]
pub struct InMemoryIntentStore {
    intents: Arc<RwLock<HashMap<PaymentReference, PreparedIntent>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryIntentStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            intents: Arc::default(),
            clock,
        }
    }

    /// Number of stored intents, expired ones included.
    pub async fn len(&self) -> usize {
        self.intents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.intents.read().await.is_empty()
    }
}

#[async_trait]
impl IntentStore for InMemoryIntentStore {
    async fn insert(&self, intent: PreparedIntent) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut intents = self.intents.write().await;
        if let Some(existing) = intents.get(intent.reference()) {
            if !existing.is_expired(now) {
                return Err(StoreError::Duplicate(intent.reference().to_string()));
            }
        }
        intents.insert(intent.reference().clone(), intent);
        Ok(())
    }

    async fn get(&self, reference: &PaymentReference) -> Result<Option<PreparedIntent>, StoreError> {
        let now = self.clock.now();
        let intents = self.intents.read().await;
        Ok(intents.get(reference).filter(|i| !i.is_expired(now)).cloned())
    }

    async fn take(&self, reference: &PaymentReference) -> Result<Option<PreparedIntent>, StoreError> {
        let now = self.clock.now();
        let removed = self.intents.write().await.remove(reference);
        Ok(removed.filter(|i| !i.is_expired(now)))
    }

    async fn sweep_expired(&self, now: Timestamp) -> Result<usize, StoreError> {
        let mut intents = self.intents.write().await;
        let before = intents.len();
        intents.retain(|_, intent| !intent.is_expired(now));
        Ok(before - intents.len())
    }
}
