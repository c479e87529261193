// crash-notifier-rs/src/error.rs

use backend_sdk::ServiceError;
use thiserror::Error;

/// Errors that fail a real-time invocation.
///
/// Backend and platform lookups degrade to placeholders instead of
/// surfacing here; only delivery is fatal.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to deliver notification via {sink}: {source}")]
    Delivery {
        sink: String,
        #[source]
        source: ServiceError,
    },
}

pub type Result<T> = std::result::Result<T, DispatchError>;
