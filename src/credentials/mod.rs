//! # Database Credentials
//!
//! Resolves the connection credentials a schema migrates with. A
//! [`Credentials`] block names its provider with the `provider` key and
//! carries the matching configuration block next to it:
//!
//! - `text`: literal [`DatabaseCredentials`]
//! - `env`: [`EnvCredentials`], variable names read from the process environment
//! - `aws_sm`: [`AwsSmCredentials`], references into AWS Secrets Manager secrets
//!
//! Whatever the provider, resolution ends in one [`DatabaseCredentials`]
//! record which the selector memoizes for the rest of the run.

pub mod aws_sm;
pub mod database;
pub mod env;

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{Error, Result};
use crate::secrets::SecretsProvider;

pub use aws_sm::AwsSmCredentials;
pub use database::DatabaseCredentials;
pub use env::EnvCredentials;

/// Credential provider selected by the `provider` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Credentials embedded in the configuration
    Text,
    /// Environment variables
    Env,
    /// AWS Secrets Manager
    AwsSm,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Env => "env",
            Self::AwsSm => "aws_sm",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "env" => Ok(Self::Env),
            "aws_sm" => Ok(Self::AwsSm),
            _ => Err(Error::UnknownProvider { provider: s.to_string() }),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The provider block chosen by the discriminator.
enum ActiveProvider<'a> {
    Text(&'a DatabaseCredentials),
    Env(&'a mut EnvCredentials),
    AwsSm(&'a mut AwsSmCredentials),
}

impl ActiveProvider<'_> {
    async fn validate(&mut self) -> Result<()> {
        match self {
            Self::Text(creds) => creds.validate(),
            Self::Env(creds) => creds.validate(),
            Self::AwsSm(creds) => creds.validate().await,
        }
    }

    async fn get_credentials(self) -> Result<DatabaseCredentials> {
        match self {
            Self::Text(creds) => creds.get_credentials(),
            Self::Env(creds) => creds.get_credentials(),
            Self::AwsSm(creds) => creds.get_credentials().await,
        }
    }
}

/// Credentials selector as it appears in configuration.
///
/// Cloning keeps any resolved value, so a clone of already fetched
/// credentials never hits the provider again.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub text: Option<DatabaseCredentials>,
    #[serde(default)]
    pub env: Option<EnvCredentials>,
    #[serde(default)]
    pub aws_sm: Option<AwsSmCredentials>,
    #[serde(skip)]
    resolved: Option<DatabaseCredentials>,
}

impl Credentials {
    pub fn text(credentials: DatabaseCredentials) -> Self {
        Self { provider: ProviderKind::Text.to_string(), text: Some(credentials), ..Self::default() }
    }

    pub fn env(credentials: EnvCredentials) -> Self {
        Self { provider: ProviderKind::Env.to_string(), env: Some(credentials), ..Self::default() }
    }

    pub fn aws_sm(credentials: AwsSmCredentials) -> Self {
        Self { provider: ProviderKind::AwsSm.to_string(), aws_sm: Some(credentials), ..Self::default() }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Parsed provider kind.
    pub fn kind(&self) -> Result<ProviderKind> {
        if self.provider.is_empty() {
            return Err(Error::MissingProvider);
        }
        self.provider.parse()
    }

    /// Apply secret store settings to an `aws_sm` block.
    ///
    /// The timeout always applies; `provider` is only installed where no
    /// store was injected already.
    pub fn configure_secrets(&mut self, timeout: Duration, provider: Option<Arc<dyn SecretsProvider>>) {
        if let Some(aws_sm) = self.aws_sm.as_mut() {
            aws_sm.set_timeout(timeout);
            if let Some(provider) = provider {
                aws_sm.set_provider_if_absent(provider);
            }
        }
    }

    fn active(&mut self) -> Result<ActiveProvider<'_>> {
        let kind = self.kind()?;
        let missing = || Error::MissingConfig { provider: kind.to_string() };

        match kind {
            ProviderKind::Text => self.text.as_ref().map(ActiveProvider::Text).ok_or_else(missing),
            ProviderKind::Env => self.env.as_mut().map(ActiveProvider::Env).ok_or_else(missing),
            ProviderKind::AwsSm => self.aws_sm.as_mut().map(ActiveProvider::AwsSm).ok_or_else(missing),
        }
    }

    /// Check the selector and the active provider block.
    pub async fn validate(&mut self) -> Result<()> {
        self.active()?.validate().await
    }

    async fn resolve(&mut self) -> Result<DatabaseCredentials> {
        if let Some(resolved) = &self.resolved {
            debug!(provider = %self.provider, "Using memoized credentials");
            return Ok(resolved.clone());
        }

        let credentials = self.active()?.get_credentials().await?;
        self.resolved = Some(credentials.clone());
        Ok(credentials)
    }

    /// Validate, then return the credentials, resolving them on first use.
    pub async fn fetch_credentials(&mut self) -> Result<DatabaseCredentials> {
        self.validate().await?;
        self.resolve().await
    }
}
