//! Service-specific client implementations
//!
//! This module contains client implementations for the log, orchestration
//! and notification backends.

pub mod aws;
pub mod common;
pub mod coralogix;
pub mod elasticsearch;
pub mod notify;
pub mod slack;

pub use common::{HttpSettings, UserAgent};
