//! # Flyway Migrator
//!
//! Runs [Flyway](https://flywaydb.org) migrations for a list of PostgreSQL
//! schemas, resolving each schema's database credentials from one of several
//! sources first.
//!
//! ## Architecture
//!
//! ```text
//! YAML config(s) → Migrator → Schema → flyway migrate
//!                      ↓          ↓
//!                Credentials  Placeholders
//!                      ↓
//!          text | env | aws_sm → SecretsProvider
//! ```
//!
//! ## Core Components
//!
//! - **Credentials**: provider selection and memoized resolution
//!   ([`credentials`])
//! - **Secrets**: secret references, fetch caching and the AWS Secrets
//!   Manager client ([`secrets`])
//! - **Migrator**: argument merging, command construction and sequential
//!   execution ([`migrator`])
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use flyway_migrator::{Migrator, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut migrator = Migrator::from_files(&["migrator.yaml"])?;
//!     migrator.migrate().await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod migrator;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::RunnerSettings;
pub use credentials::{Credentials, DatabaseCredentials};
pub use errors::{Error, Result};
pub use migrator::{CommandExecutor, Migrator, Placeholder, Schema};
pub use secrets::{SecretsError, SecretsProvider};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
