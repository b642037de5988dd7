//! IntentSweeper - background removal of expired prepared intents.
//!
//! Expired intents are already invisible to lookups; the sweep only bounds
//! the store's size. Stores with native expiry report zero removals.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing::{debug, warn};

use crate::ports::{Clock, IntentStore, StoreError};

pub struct IntentSweeper {
    intents: Arc<dyn IntentStore>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl IntentSweeper {
    pub fn new(intents: Arc<dyn IntentStore>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            intents,
            clock,
            interval,
        }
    }

    /// Sweep on every tick until shutdown is signalled.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("Intent sweeper stopping");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        warn!(error = %e, "Intent sweep failed");
                    }
                }
            }
        }
    }

    /// Run exactly one sweep. Returns how many intents were removed.
    pub async fn sweep_once(&self) -> Result<usize, StoreError> {
        let removed = self.intents.sweep_expired(self.clock.now()).await?;
        if removed > 0 {
            debug!(removed, "Expired payment intents swept");
        }
        Ok(removed)
    }
}
