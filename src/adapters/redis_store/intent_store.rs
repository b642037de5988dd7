//! Redis-backed prepared-intent store for multi-instance deployments.
//!
//! Each intent is one JSON value under `{key_prefix}:{reference}`, written
//! with `SET NX EX` so Redis expires it on its own, and consumed with
//! `GETDEL`. Reads still check `expires_at` against the injected clock.

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::domain::foundation::Timestamp;
use crate::domain::payment::{PaymentReference, PreparedIntent};
use crate::ports::{Clock, IntentStore, StoreError};

#[derive(Clone)]
pub struct RedisIntentStore {
    conn: MultiplexedConnection,
    clock: Arc<dyn Clock>,
    key_prefix: String,
}

impl RedisIntentStore {
    pub fn new(conn: MultiplexedConnection, clock: Arc<dyn Clock>, key_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            clock,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, reference: &PaymentReference) -> String {
        intent_key(&self.key_prefix, reference)
    }
}

fn intent_key(prefix: &str, reference: &PaymentReference) -> String {
    format!("{}:{}", prefix, reference.as_str())
}

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl IntentStore for RedisIntentStore {
    async fn insert(&self, intent: PreparedIntent) -> Result<(), StoreError> {
        let key = self.key(intent.reference());
        let ttl = intent.remaining_secs(self.clock.now()).max(1);
        let json = serde_json::to_string(&intent).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let mut conn = self.conn.clone();
        let written: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(json)
            .arg("NX")
            .arg("EX")
            .arg(ttl)
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        match written {
            Some(_) => Ok(()),
            None => Err(StoreError::Duplicate(intent.reference().to_string())),
        }
    }

    async fn get(&self, reference: &PaymentReference) -> Result<Option<PreparedIntent>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.key(reference)).await.map_err(unavailable)?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let intent: PreparedIntent =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if intent.is_expired(self.clock.now()) {
            return Ok(None);
        }
        Ok(Some(intent))
    }

    async fn take(&self, reference: &PaymentReference) -> Result<Option<PreparedIntent>, StoreError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GETDEL")
            .arg(self.key(reference))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;

        let Some(raw) = raw else {
            return Ok(None);
        };
        let intent: PreparedIntent =
            serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if intent.is_expired(self.clock.now()) {
            return Ok(None);
        }
        Ok(Some(intent))
    }

    /// Redis expires keys itself.
    async fn sweep_expired(&self, _now: Timestamp) -> Result<usize, StoreError> {
        Ok(0)
    }
}
