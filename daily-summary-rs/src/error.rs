// daily-summary-rs/src/error.rs

use backend_sdk::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to deliver daily summary via {sink}: {source}")]
    Delivery {
        sink: String,
        #[source]
        source: ServiceError,
    },

    #[error("Invalid summary schedule '{expression}': {message}")]
    Schedule { expression: String, message: String },
}

pub type Result<T> = std::result::Result<T, ReportError>;
