//! Resilience patterns for backend clients
//!
//! Each invocation handles a single event and keeps no state between runs,
//! so the only patterns needed are bounded retries and per-call timeouts.

mod retry;

pub use retry::{with_timeout, RetryConfig, RetryExecutor};
