//! # Crash Notifier
//!
//! Real-time path of the ECS crash monitor. One task state change event is
//! normalized into a failure record, its logs are located across the
//! configured log backends, service context is attached and a single alert
//! is delivered.

pub mod dispatcher;
pub mod enricher;
pub mod error;
pub mod renderer;
pub mod resolver;

pub use dispatcher::{CrashNotifier, DispatchOutcome};
pub use enricher::{ContextEnricher, Enrichment};
pub use error::DispatchError;
pub use renderer::AlertRenderer;
pub use resolver::LogSourceResolver;

#[cfg(test)]
mod tests;
