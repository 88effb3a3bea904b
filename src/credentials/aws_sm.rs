//! Credentials stored in AWS Secrets Manager.
//!
//! Every field points at one key inside one secret:
//!
//! ```yaml
//! credentials:
//!   provider: aws_sm
//!   aws_sm:
//!     username: { secretName: prod/db, secretKey: username }
//!     password: { secretName: prod/db, secretKey: password }
//!     host:     { secretName: prod/net, secretKey: host }
//!     port:     { secretName: prod/net, secretKey: port }
//!     database: { secretName: prod/db, secretKey: dbname }
//! ```
//!
//! Fields that share a secret name cause a single fetch.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::database::DatabaseCredentials;
use crate::errors::{Error, Result};
use crate::secrets::{
    client::json_type_name, SecretCache, SecretRef, SecretsError, SecretsProvider,
    DEFAULT_SECRETS_TIMEOUT,
};

#[derive(Clone, Deserialize)]
pub struct AwsSmCredentials {
    #[serde(default)]
    pub username: Option<SecretRef>,
    #[serde(default)]
    pub password: Option<SecretRef>,
    #[serde(default)]
    pub host: Option<SecretRef>,
    #[serde(default)]
    pub port: Option<SecretRef>,
    #[serde(default)]
    pub database: Option<SecretRef>,
    #[serde(skip)]
    provider: Option<Arc<dyn SecretsProvider>>,
    #[serde(skip, default = "default_timeout")]
    timeout: Duration,
    #[serde(skip)]
    resolved: Option<DatabaseCredentials>,
}

fn default_timeout() -> Duration {
    DEFAULT_SECRETS_TIMEOUT
}

impl Default for AwsSmCredentials {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            host: None,
            port: None,
            database: None,
            provider: None,
            timeout: DEFAULT_SECRETS_TIMEOUT,
            resolved: None,
        }
    }
}

impl fmt::Debug for AwsSmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSmCredentials")
            .field("username", &self.username)
            .field("password", &self.password)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn SecretsProvider>"))
            .field("timeout", &self.timeout)
            .field("resolved", &self.resolved.is_some())
            .finish()
    }
}

impl AwsSmCredentials {
    pub fn new(
        username: SecretRef,
        password: SecretRef,
        host: SecretRef,
        port: SecretRef,
        database: SecretRef,
    ) -> Self {
        Self {
            username: Some(username),
            password: Some(password),
            host: Some(host),
            port: Some(port),
            database: Some(database),
            ..Self::default()
        }
    }

    /// Use `provider` instead of building an AWS client from the environment.
    pub fn with_provider(mut self, provider: Arc<dyn SecretsProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Install `provider` unless one was already injected.
    pub fn set_provider_if_absent(&mut self, provider: Arc<dyn SecretsProvider>) {
        if self.provider.is_none() {
            self.provider = Some(provider);
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    fn fields(&self) -> [(&'static str, &Option<SecretRef>); 5] {
        [
            ("username", &self.username),
            ("password", &self.password),
            ("host", &self.host),
            ("port", &self.port),
            ("database", &self.database),
        ]
    }

    /// Check every reference and make sure a secret store is available.
    ///
    /// Builds an AWS Secrets Manager client from the default AWS provider
    /// chain on first use when no store was injected.
    pub async fn validate(&mut self) -> Result<()> {
        for (field, reference) in self.fields() {
            let reference = reference.as_ref().ok_or_else(|| {
                Error::validation_field(format!("missing '{}' key in aws_sm credentials", field), field)
            })?;
            reference.validate()?;
        }

        if self.provider.is_none() {
            self.provider = Some(default_provider(self.timeout).await?);
        }
        Ok(())
    }

    /// Resolve all five references, fetching each distinct secret once.
    ///
    /// The assembled record is memoized; later calls return it without
    /// touching the secret store.
    pub async fn get_credentials(&mut self) -> Result<DatabaseCredentials> {
        self.validate().await?;

        if let Some(resolved) = &self.resolved {
            return Ok(resolved.clone());
        }

        let provider = self
            .provider
            .clone()
            .ok_or_else(|| SecretsError::provider_init("no secret store configured"))?;
        let mut cache = SecretCache::new();

        let username = self.resolve_string("username", &mut cache, provider.as_ref()).await?;
        let password = self.resolve_string("password", &mut cache, provider.as_ref()).await?;
        let host = self.resolve_string("host", &mut cache, provider.as_ref()).await?;
        let port = port_from_value(&self.resolve("port", &mut cache, provider.as_ref()).await?)?;
        let database = self.resolve_string("database", &mut cache, provider.as_ref()).await?;

        let credentials = DatabaseCredentials::new(username, password, host, port, database);
        credentials.validate()?;

        info!(secrets_fetched = cache.len(), host = %credentials.host, "Resolved aws_sm credentials");
        self.resolved = Some(credentials.clone());
        Ok(credentials)
    }

    async fn resolve(
        &self,
        field: &'static str,
        cache: &mut SecretCache,
        provider: &dyn SecretsProvider,
    ) -> Result<Value> {
        let reference = self
            .fields()
            .into_iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, reference)| reference.clone())
            .ok_or_else(|| {
                Error::validation_field(format!("missing '{}' key in aws_sm credentials", field), field)
            })?;
        Ok(reference.resolve(cache, provider, self.timeout).await?)
    }

    async fn resolve_string(
        &self,
        field: &'static str,
        cache: &mut SecretCache,
        provider: &dyn SecretsProvider,
    ) -> Result<String> {
        match self.resolve(field, cache, provider).await? {
            Value::String(value) => Ok(value),
            other => Err(SecretsError::invalid_value(
                field,
                format!("expected a string, got {}", json_type_name(&other)),
            )
            .into()),
        }
    }
}

#[cfg(feature = "aws")]
async fn default_provider(timeout: Duration) -> Result<Arc<dyn SecretsProvider>> {
    tracing::debug!("No secret store injected, initialising AWS Secrets Manager client");
    let client = crate::secrets::AwsSecretsManager::from_env(timeout).await?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "aws"))]
async fn default_provider(_timeout: Duration) -> Result<Arc<dyn SecretsProvider>> {
    Err(SecretsError::provider_init(
        "built without the 'aws' feature and no secret store was injected",
    )
    .into())
}

/// Ports may be stored as a JSON number or a numeric string.
fn port_from_value(value: &Value) -> Result<u16> {
    let port = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.parse::<u64>().ok(),
        _ => None,
    };

    match port {
        Some(port) if (1..=u64::from(u16::MAX)).contains(&port) => Ok(port as u16),
        _ => Err(SecretsError::invalid_value(
            "port",
            format!("expected a port number between 1 and 65535, got {}", value),
        )
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::InMemorySecretsProvider;
    use serde_json::json;

    fn refs() -> AwsSmCredentials {
        AwsSmCredentials::new(
            SecretRef::new("prod/db", "username"),
            SecretRef::new("prod/db", "password"),
            SecretRef::new("prod/net", "host"),
            SecretRef::new("prod/net", "port"),
            SecretRef::new("prod/db", "dbname"),
        )
    }

    fn store() -> Arc<InMemorySecretsProvider> {
        Arc::new(
            InMemorySecretsProvider::new()
                .with_secret(
                    "prod/db",
                    json!({"username": "app", "password": "s3cret", "dbname": "orders"}),
                )
                .with_secret("prod/net", json!({"host": "db.internal", "port": 5432})),
        )
    }

    #[tokio::test]
    async fn test_fetches_each_secret_once() {
        let store = store();
        let mut creds = refs().with_provider(store.clone());

        let resolved = creds.get_credentials().await.unwrap();

        assert_eq!(
            resolved,
            DatabaseCredentials::new("app", "s3cret", "db.internal", 5432, "orders")
        );
        assert_eq!(store.fetch_count("prod/db"), 1);
        assert_eq!(store.fetch_count("prod/net"), 1);
    }

    #[tokio::test]
    async fn test_memoized_after_first_resolution() {
        let store = store();
        let mut creds = refs().with_provider(store.clone());

        creds.get_credentials().await.unwrap();
        creds.get_credentials().await.unwrap();
        let mut cloned = creds.clone();
        cloned.get_credentials().await.unwrap();

        assert!(creds.is_resolved());
        assert_eq!(store.total_fetches(), 2);
    }

    #[tokio::test]
    async fn test_port_as_string() {
        let store = Arc::new(
            InMemorySecretsProvider::new()
                .with_secret(
                    "prod/db",
                    json!({"username": "app", "password": "s3cret", "dbname": "orders"}),
                )
                .with_secret("prod/net", json!({"host": "db.internal", "port": "6432"})),
        );
        let mut creds = refs().with_provider(store);

        assert_eq!(creds.get_credentials().await.unwrap().port, 6432);
    }

    #[tokio::test]
    async fn test_non_string_username_rejected() {
        let store = Arc::new(
            InMemorySecretsProvider::new()
                .with_secret("prod/db", json!({"username": 42, "password": "p", "dbname": "d"}))
                .with_secret("prod/net", json!({"host": "h", "port": 5432})),
        );
        let mut creds = refs().with_provider(store);

        let err = creds.get_credentials().await.unwrap_err();
        assert!(matches!(err, Error::Secrets(SecretsError::InvalidValue { ref field, .. }) if field == "username"));
    }

    #[tokio::test]
    async fn test_missing_key_in_secret() {
        let store = Arc::new(
            InMemorySecretsProvider::new()
                .with_secret("prod/db", json!({"username": "app", "dbname": "orders"}))
                .with_secret("prod/net", json!({"host": "h", "port": 5432})),
        );
        let mut creds = refs().with_provider(store);

        let err = creds.get_credentials().await.unwrap_err();
        assert_eq!(err.to_string(), "key 'password' not present in secret prod/db");
        assert!(!creds.is_resolved());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(InMemorySecretsProvider::new().with_failure("prod/db", "access denied"));
        let mut creds = refs().with_provider(store);

        let err = creds.get_credentials().await.unwrap_err();
        assert_eq!(err.to_string(), "failed to get secret prod/db: access denied");
    }

    #[tokio::test]
    async fn test_missing_reference_fails_validation() {
        let mut creds = refs().with_provider(store());
        creds.host = None;

        let err = creds.validate().await.unwrap_err();
        assert_eq!(err.to_string(), "Validation error: missing 'host' key in aws_sm credentials");
    }

    #[tokio::test]
    async fn test_invalid_reference_fails_validation() {
        let mut creds = refs().with_provider(store());
        creds.port = Some(SecretRef::new("prod/net", ""));

        let err = creds.validate().await.unwrap_err();
        assert!(matches!(err, Error::Secrets(SecretsError::InvalidReference { .. })));
    }

    #[tokio::test]
    async fn test_store_initialisation_failure() {
        let _guard = crate::test_support::env_lock();
        let _scope = crate::test_support::AwsEnvScope::isolated();

        let mut creds = refs();
        let result = creds.validate().await;

        assert!(matches!(result, Err(Error::Secrets(SecretsError::ProviderInit { .. }))));
        assert!(creds.provider.is_none());
    }

    #[tokio::test]
    async fn test_injected_store_skips_initialisation() {
        let _guard = crate::test_support::env_lock();
        let _scope = crate::test_support::AwsEnvScope::isolated();

        let mut creds = refs().with_provider(store());
        assert!(creds.validate().await.is_ok());
    }

    #[test]
    fn test_port_from_value() {
        assert_eq!(port_from_value(&json!(5432)).unwrap(), 5432);
        assert_eq!(port_from_value(&json!("5432")).unwrap(), 5432);
        assert!(port_from_value(&json!(0)).is_err());
        assert!(port_from_value(&json!(70000)).is_err());
        assert!(port_from_value(&json!(-1)).is_err());
        assert!(port_from_value(&json!("pg")).is_err());
        assert!(port_from_value(&json!(true)).is_err());
    }

    #[test]
    fn test_from_yaml() {
        let creds: AwsSmCredentials = serde_yaml::from_str(
            r#"
username: { secretName: a, secretKey: u }
password: { secretName: a, secretKey: p }
host: { secretName: b, secretKey: h }
port: { secretName: b, secretKey: port }
database: { secretName: a, secretKey: d }
"#,
        )
        .unwrap();

        assert_eq!(creds.port, Some(SecretRef::new("b", "port")));
        assert_eq!(creds.timeout, DEFAULT_SECRETS_TIMEOUT);
        assert!(creds.provider.is_none());
    }

    #[test]
    fn test_debug_hides_provider_internals() {
        let creds = refs().with_provider(store());
        let output = format!("{:?}", creds);
        assert!(output.contains("<dyn SecretsProvider>"));
        assert!(output.contains("resolved: false"));
    }
}
