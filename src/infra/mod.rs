//! Runtime bootstrap: logging, metrics descriptions, startup errors.

pub mod error;
pub mod telemetry;
