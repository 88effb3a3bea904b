//! # Observability
//!
//! Structured logging via `tracing`. Secrets are never logged: passwords are
//! carried in [`crate::secrets::SecretString`] and flyway invocations are
//! logged with their `-password=` argument masked.

pub mod logging;

pub use logging::{init_logging, LoggingOptions};
