//! Secret store abstraction used by the `aws_sm` credentials provider.
//!
//! A secret store is anything implementing [`SecretsProvider`]: given a secret
//! name it returns the decoded JSON object stored under that name. Credentials
//! point into those objects with [`SecretRef`]s, and all references resolved
//! in one pass share a [`SecretCache`] so each secret is fetched at most once.
//!
//! # Supported Stores
//!
//! - **AWS Secrets Manager**: `AwsSecretsManager` (feature `aws`, on by
//!   default), used when nothing is injected
//! - **In-memory**: `InMemorySecretsProvider` (feature `test-util`), fixed
//!   secrets with fetch counting
//!
//! # Example
//!
//! ```rust,ignore
//! use flyway_migrator::secrets::{InMemorySecretsProvider, SecretCache, SecretRef};
//! use std::time::Duration;
//!
//! let store = InMemorySecretsProvider::new()
//!     .with_secret("prod/db", serde_json::json!({"user": "app", "pass": "s3cret"}));
//!
//! let mut cache = SecretCache::new();
//! let user = SecretRef::new("prod/db", "user")
//!     .resolve(&mut cache, &store, Duration::from_secs(10))
//!     .await?;
//! // Second key in the same secret is served from `cache`
//! let pass = SecretRef::new("prod/db", "pass")
//!     .resolve(&mut cache, &store, Duration::from_secs(10))
//!     .await?;
//! ```

#[cfg(feature = "aws")]
pub mod aws;
pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod reference;
pub mod types;

use std::time::Duration;

#[cfg(feature = "aws")]
pub use aws::AwsSecretsManager;
pub use client::{decode_secret_payload, SecretBlob, SecretPayload, SecretsProvider};
pub use error::{Result, SecretsError};
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemorySecretsProvider;
pub use reference::{SecretCache, SecretRef};
pub use types::SecretString;

/// Default bound on a single secret store call.
pub const DEFAULT_SECRETS_TIMEOUT: Duration = Duration::from_secs(10);
