//! # Migrator
//!
//! Validates a migration configuration and runs `flyway migrate` once per
//! schema, strictly in declaration order.
//!
//! Global `flywayArgs` are merged under every schema's own arguments and the
//! global `credentials` are used by schemas that declare none. Validation
//! resolves all credentials before the first migration starts, so a bad
//! secret reference or missing environment variable fails the run up front.
//!
//! ```yaml
//! flywayArgs:
//!   - -connectRetries=3
//! credentials:
//!   provider: env
//!   env: { usernameKey: DB_USER, passwordKey: DB_PASSWORD, hostKey: DB_HOST, portKey: DB_PORT, databaseKey: DB_NAME }
//! schemas:
//!   - name: billing
//!     migrationsPath: ./migrations/billing
//!     placeholders:
//!       - { name: owner, value: billing_svc }
//! ```

pub mod args;
pub mod executor;
pub mod placeholder;
pub mod schema;

use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, Instrument};

use crate::config::{self, RunnerSettings};
use crate::credentials::Credentials;
use crate::errors::{Error, Result};
use crate::schema_span;
use crate::secrets::SecretsProvider;

pub use args::{merge_default_args, parse_flyway_arg};
pub use executor::{CommandExecutor, ExitOutcome, Invocation, OutputMode, SystemExecutor};
#[cfg(any(test, feature = "test-util"))]
pub use executor::RecordingExecutor;
pub use placeholder::Placeholder;
pub use schema::Schema;

fn default_executor() -> Arc<dyn CommandExecutor> {
    Arc::new(SystemExecutor)
}

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Migrator {
    #[serde(default)]
    pub flyway_args: Vec<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub schemas: Vec<Schema>,
    #[serde(skip, default = "default_executor")]
    executor: Arc<dyn CommandExecutor>,
    #[serde(skip)]
    secrets_provider: Option<Arc<dyn SecretsProvider>>,
    #[serde(skip)]
    settings: RunnerSettings,
}

impl Default for Migrator {
    fn default() -> Self {
        Self {
            flyway_args: Vec::new(),
            credentials: None,
            schemas: Vec::new(),
            executor: default_executor(),
            secrets_provider: None,
            settings: RunnerSettings::default(),
        }
    }
}

impl fmt::Debug for Migrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrator")
            .field("flyway_args", &self.flyway_args)
            .field("credentials", &self.credentials)
            .field("schemas", &self.schemas)
            .field("settings", &self.settings)
            .field("secrets_provider", &self.secrets_provider.as_ref().map(|_| "<dyn SecretsProvider>"))
            .finish()
    }
}

impl Migrator {
    pub fn new(schemas: Vec<Schema>) -> Self {
        Self { schemas, ..Self::default() }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        Self::from_value(config::parse_yaml(contents)?)
    }

    pub fn from_value(value: serde_yaml::Value) -> Result<Self> {
        Ok(serde_yaml::from_value(value)?)
    }

    /// Load and deep-merge one or more YAML files.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        Self::from_value(config::load_merged(paths)?)
    }

    pub fn with_flyway_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flyway_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Secret store for every `aws_sm` block that has none of its own.
    pub fn with_secrets_provider(mut self, provider: Arc<dyn SecretsProvider>) -> Self {
        self.secrets_provider = Some(provider);
        self
    }

    pub fn with_settings(mut self, settings: RunnerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    fn configure_secrets(&mut self) {
        let timeout = self.settings.secrets_timeout();
        let provider = self.secrets_provider.clone();

        let blocks = self
            .credentials
            .iter_mut()
            .chain(self.schemas.iter_mut().filter_map(|schema| schema.credentials.as_mut()));
        for credentials in blocks {
            credentials.configure_secrets(timeout, provider.clone());
        }
    }

    /// Validate the whole configuration, resolving every schema's credentials.
    pub async fn validate(&mut self) -> Result<()> {
        self.settings.validate()?;
        self.configure_secrets();

        if let Some(credentials) = self.credentials.as_mut() {
            credentials.fetch_credentials().await?;
        }

        for schema in &mut self.schemas {
            if schema.credentials.is_none() {
                let inherited = self
                    .credentials
                    .clone()
                    .ok_or_else(|| Error::MissingCredentials { schema: schema.name.clone() })?;
                schema.credentials = Some(inherited);
            }

            if !self.flyway_args.is_empty() {
                schema.set_default_args(&self.flyway_args)?;
            }

            schema.validate().await?;
        }
        Ok(())
    }

    /// Validate, then migrate every schema in order, stopping at the first failure.
    pub async fn migrate(&mut self) -> Result<()> {
        self.validate().await?;

        let total = self.schemas.len();
        let command = self.settings.flyway_command.clone();
        let executor = self.executor.clone();

        for (index, schema) in self.schemas.iter_mut().enumerate() {
            let span = schema_span!(schema.name, schema.migrations_path, position = index + 1, total = total);
            async {
                info!("Migrating schema");
                schema.migrate(executor.as_ref(), &command).await
            }
            .instrument(span)
            .await?;
        }

        info!(schemas = total, "All schemas migrated");
        Ok(())
    }
}
