//! In-memory secret store.
//!
//! Serves secrets from a fixed map and records how often each secret was
//! fetched, so tests can observe caching behaviour. Compiled for the crate's
//! own tests and behind the `test-util` feature.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::client::{json_type_name, SecretBlob, SecretsProvider};
use super::error::{Result, SecretsError};

#[derive(Debug, Default)]
pub struct InMemorySecretsProvider {
    secrets: HashMap<String, Value>,
    failures: HashMap<String, String>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl InMemorySecretsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret. `value` should be a JSON object.
    pub fn with_secret(mut self, name: impl Into<String>, value: Value) -> Self {
        self.secrets.insert(name.into(), value);
        self
    }

    /// Make every fetch of `name` fail with a backend error.
    pub fn with_failure(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(name.into(), message.into());
        self
    }

    /// Number of `get_secret` calls made for `name`.
    pub fn fetch_count(&self, name: &str) -> usize {
        self.fetches.lock().map(|f| f.get(name).copied().unwrap_or(0)).unwrap_or(0)
    }

    /// Number of `get_secret` calls made for any secret.
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().map(|f| f.values().sum()).unwrap_or(0)
    }

    fn record_fetch(&self, name: &str) {
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(name.to_string()).or_insert(0) += 1;
        }
    }
}

#[async_trait]
impl SecretsProvider for InMemorySecretsProvider {
    async fn get_secret(&self, name: &str) -> Result<SecretBlob> {
        self.record_fetch(name);

        if let Some(message) = self.failures.get(name) {
            return Err(SecretsError::backend(name, message.clone()));
        }

        match self.secrets.get(name) {
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(SecretsError::invalid_value(
                name,
                format!("expected a JSON object, got {}", json_type_name(other)),
            )),
            None => Err(SecretsError::backend(name, "secret does not exist")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_counts_fetches_per_secret() {
        let provider = InMemorySecretsProvider::new().with_secret("a", json!({"k": "v"}));

        provider.get_secret("a").await.unwrap();
        provider.get_secret("a").await.unwrap();
        let _ = provider.get_secret("b").await;

        assert_eq!(provider.fetch_count("a"), 2);
        assert_eq!(provider.fetch_count("b"), 1);
        assert_eq!(provider.total_fetches(), 3);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let provider = InMemorySecretsProvider::new()
            .with_secret("a", json!({"k": "v"}))
            .with_failure("a", "access denied");

        let err = provider.get_secret("a").await.unwrap_err();
        assert_eq!(err.to_string(), "failed to get secret a: access denied");
    }

    #[tokio::test]
    async fn test_non_object_secret_is_rejected() {
        let provider = InMemorySecretsProvider::new().with_secret("a", json!("plain"));
        let err = provider.get_secret("a").await.unwrap_err();
        assert!(matches!(err, SecretsError::InvalidValue { .. }));
    }
}
