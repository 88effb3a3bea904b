//! # Error Handling
//!
//! Error types for credential resolution and migration orchestration, defined
//! with `thiserror`. Every component fails fast and returns the first error it
//! encounters; secret store failures are wrapped in [`Error::Secrets`] so the
//! original [`SecretsError`] kind stays inspectable.

use crate::secrets::SecretsError;
use std::path::PathBuf;

/// Custom result type for migrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the migrator
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A configuration field is missing or malformed
    #[error("Validation error: {message}")]
    Validation { message: String, field: Option<String> },

    /// Credentials block without a `provider` discriminator
    #[error("missing 'provider' key for database credentials")]
    MissingProvider,

    /// Discriminator names a provider that does not exist
    #[error("{provider} is not a valid credentials provider type")]
    UnknownProvider { provider: String },

    /// Discriminator names a provider whose configuration block is absent
    #[error("could not find credentials configuration for provider {provider}")]
    MissingConfig { provider: String },

    /// Environment variable referenced by the env provider is not set
    #[error("environment variable {key} specified in env credentials not set")]
    MissingEnv { key: String },

    /// Environment variable referenced by the env provider is empty
    #[error("environment variable {key} specified in env credentials has empty value")]
    EmptyEnv { key: String },

    /// Environment variable value could not be parsed
    #[error("environment variable {key} could not be parsed as {expected}: {message}")]
    Parse { key: String, expected: &'static str, message: String },

    /// Secret store errors, kept with their original kind
    #[error(transparent)]
    Secrets(#[from] SecretsError),

    /// Malformed migration tool argument
    #[error("flyway argument '{arg}' cannot be interpreted: {reason}")]
    ArgFormat { arg: String, reason: &'static str },

    /// Placeholder file could not be read
    #[error("could not read placeholder file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Placeholder file was read but is not UTF-8 text
    #[error("placeholder file {} is not valid UTF-8: {source}", path.display())]
    FileEncoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Placeholder file was read but is empty
    #[error("value empty after loading from file {}", path.display())]
    EmptyFile { path: PathBuf },

    /// The migration tool could not be invoked
    #[error("{command} not installed, please install before trying again: {message}")]
    ToolNotInstalled { command: String, message: String },

    /// The migration tool ran and failed
    #[error("flyway migration failed for schema {schema}: {message}")]
    ExecutionFailed { schema: String, message: String },

    /// Neither the schema nor the migrator carries credentials
    #[error("missing 'credentials' field in migrator config for schema {schema}")]
    MissingCredentials { schema: String },

    /// Configuration loading errors (file format, merging, settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into(), field: None }
    }

    /// Create a validation error with field information
    pub fn validation_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Validation { message: message.into(), field: Some(field.into()) }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an argument format error
    pub fn arg_format<S: Into<String>>(arg: S, reason: &'static str) -> Self {
        Self::ArgFormat { arg: arg.into(), reason }
    }

    /// Create a tool-not-installed error
    pub fn tool_not_installed<C: Into<String>, M: Into<String>>(command: C, message: M) -> Self {
        Self::ToolNotInstalled { command: command.into(), message: message.into() }
    }

    /// Create an execution failure error
    pub fn execution_failed<S: Into<String>, M: Into<String>>(schema: S, message: M) -> Self {
        Self::ExecutionFailed { schema: schema.into(), message: message.into() }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Self::config_with_source("YAML parsing failed", Box::new(error))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("Invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::config(format!("Invalid settings: {}", message))
    }
}
