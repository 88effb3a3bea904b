//! Error types for secret store operations.

use thiserror::Error;

/// Result type for secrets operations.
pub type Result<T> = std::result::Result<T, SecretsError>;

/// Errors that can occur while resolving secret references.
#[derive(Error, Debug)]
pub enum SecretsError {
    /// A secret reference is missing its name or key.
    #[error("{reason}")]
    InvalidReference { reason: String },

    /// The key is absent from the fetched secret.
    #[error("key '{key}' not present in secret {secret}")]
    NotFound { secret: String, key: String },

    /// The key is present in the fetched secret but its value is null.
    #[error("key '{key}' in secret {secret} is nil")]
    NilValue { secret: String, key: String },

    /// The value has the wrong shape for the field it is assigned to.
    #[error("Invalid secret value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// The secret store client could not be constructed.
    #[error("unable to initialise secret store: {message}")]
    ProviderInit { message: String },

    /// The secret store did not answer in time.
    #[error("fetching secret {secret} timed out after {timeout_ms}ms")]
    Timeout { secret: String, timeout_ms: u64 },

    /// Backend-specific fetch failure.
    #[error("failed to get secret {secret}: {message}")]
    Backend { secret: String, message: String },

    /// The secret payload is not a JSON object.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SecretsError {
    /// Create an invalid reference error.
    pub fn invalid_reference(reason: impl Into<String>) -> Self {
        Self::InvalidReference { reason: reason.into() }
    }

    /// Create a not found error.
    pub fn not_found(secret: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound { secret: secret.into(), key: key.into() }
    }

    /// Create a nil value error.
    pub fn nil_value(secret: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NilValue { secret: secret.into(), key: key.into() }
    }

    /// Create an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue { field: field.into(), reason: reason.into() }
    }

    /// Create a provider initialisation error.
    pub fn provider_init(message: impl Into<String>) -> Self {
        Self::ProviderInit { message: message.into() }
    }

    /// Create a backend error.
    pub fn backend(secret: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend { secret: secret.into(), message: message.into() }
    }
}
