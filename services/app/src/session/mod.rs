//! services/app/src/session/mod.rs
//!
//! Synchronizes the store's user with the external auth service.

pub mod retry;
pub mod synchronizer;

pub use retry::{RetryPolicy, Sleeper, TokioSleeper};
pub use synchronizer::SessionSynchronizer;
