//! One migration unit: a PostgreSQL schema and its migration files.

use serde::Deserialize;
use tracing::{debug, info};

use super::args::{merge_default_args, validate_flyway_args};
use super::executor::{CommandExecutor, Invocation, OutputMode};
use super::placeholder::Placeholder;
use crate::credentials::{Credentials, DatabaseCredentials};
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub migrations_path: String,
    #[serde(default)]
    pub flyway_args: Vec<String>,
    #[serde(default)]
    pub placeholders: Vec<Placeholder>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl Schema {
    pub fn new(name: impl Into<String>, migrations_path: impl Into<String>) -> Self {
        Self { name: name.into(), migrations_path: migrations_path.into(), ..Self::default() }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_flyway_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flyway_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholders.push(placeholder);
        self
    }

    /// Validate the schema, resolving its credentials up front.
    pub async fn validate(&mut self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation_field("missing 'name' in schema", "name"));
        }
        if self.migrations_path.is_empty() {
            return Err(Error::validation_field(
                format!("missing 'migrationsPath' in schema {}", self.name),
                "migrationsPath",
            ));
        }

        let credentials = self
            .credentials
            .as_mut()
            .ok_or_else(|| Error::MissingCredentials { schema: self.name.clone() })?;
        credentials.fetch_credentials().await?;

        validate_flyway_args(&self.flyway_args)?;
        self.placeholders.iter().try_for_each(Placeholder::validate)
    }

    /// Merge `defaults` under this schema's own arguments.
    pub fn set_default_args(&mut self, defaults: &[String]) -> Result<()> {
        self.flyway_args = merge_default_args(defaults, &self.flyway_args)?;
        Ok(())
    }

    /// Resolved credentials. Only valid after [`Schema::validate`].
    async fn credentials(&mut self) -> Result<DatabaseCredentials> {
        let credentials = self
            .credentials
            .as_mut()
            .ok_or_else(|| Error::MissingCredentials { schema: self.name.clone() })?;
        credentials.fetch_credentials().await
    }

    /// Full argument list for `flyway migrate`.
    pub async fn migrate_args(&mut self) -> Result<Vec<String>> {
        let creds = self.credentials().await?;

        let mut args = self.flyway_args.clone();
        for placeholder in &self.placeholders {
            args.push(placeholder.to_argument().await?);
        }
        args.extend([
            format!("-user={}", creds.username),
            format!("-password={}", creds.password.expose_secret()),
            format!("-url={}", creds.jdbc_url()),
            format!("-schemas={}", self.name),
            format!("-locations=filesystem:{}", self.migrations_path),
            "migrate".to_string(),
        ]);
        Ok(args)
    }

    async fn ensure_tool(&self, executor: &dyn CommandExecutor, command: &str) -> Result<()> {
        let check = Invocation::new(command, Vec::new(), OutputMode::Discard);
        match executor.execute(&check).await {
            Ok(outcome) if outcome.success() => Ok(()),
            Ok(outcome) => Err(Error::tool_not_installed(command, outcome.to_string())),
            Err(e) => Err(Error::tool_not_installed(command, e.to_string())),
        }
    }

    /// Run `flyway migrate` for this schema with output streamed to the console.
    pub async fn migrate(&mut self, executor: &dyn CommandExecutor, command: &str) -> Result<()> {
        self.validate().await?;
        self.ensure_tool(executor, command).await?;

        let invocation = Invocation::new(command, self.migrate_args().await?, OutputMode::Stream);
        debug!(command = %invocation, "Running migration");

        match executor.execute(&invocation).await {
            Ok(outcome) if outcome.success() => {
                info!(schema = %self.name, "Schema migrated");
                Ok(())
            }
            Ok(outcome) => Err(Error::execution_failed(&self.name, outcome.to_string())),
            Err(e) => Err(Error::execution_failed(&self.name, e.to_string())),
        }
    }
}
