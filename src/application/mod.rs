//! Application layer - command handlers.
//!
//! Handlers orchestrate domain operations over ports. They own no I/O of
//! their own and are wired to adapters in `main.rs` and the test harnesses.

pub mod handlers;

pub use handlers::*;
