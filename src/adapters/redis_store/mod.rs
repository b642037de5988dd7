//! Redis adapters.

mod intent_store;

pub use intent_store::RedisIntentStore;
