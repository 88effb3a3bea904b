//! Secret references and their resolution against a shared fetch cache.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::client::{get_secret_with_timeout, SecretBlob, SecretsProvider};
use super::error::{Result, SecretsError};

/// Secrets fetched during one resolution pass, keyed by secret name.
///
/// Owned by the caller so that several references into the same secret
/// trigger a single fetch.
pub type SecretCache = HashMap<String, SecretBlob>;

/// Identifies one key inside one named secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    #[serde(default)]
    pub secret_name: String,
    #[serde(default)]
    pub secret_key: String,
}

impl SecretRef {
    pub fn new(secret_name: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self { secret_name: secret_name.into(), secret_key: secret_key.into() }
    }

    /// Both the name and the key must be non-empty.
    pub fn validate(&self) -> Result<()> {
        if self.secret_name.is_empty() {
            return Err(SecretsError::invalid_reference("secretRef missing 'secretName' attribute"));
        }
        if self.secret_key.is_empty() {
            return Err(SecretsError::invalid_reference(format!(
                "secretRef '{}' missing 'secretKey' attribute",
                self.secret_name
            )));
        }
        Ok(())
    }

    /// Resolve this reference to its value.
    ///
    /// On a cache miss the secret is fetched (bounded by `timeout`) and stored
    /// in `cache`. The cache is only written after a successful fetch.
    pub async fn resolve(
        &self,
        cache: &mut SecretCache,
        provider: &dyn SecretsProvider,
        timeout: Duration,
    ) -> Result<Value> {
        self.validate()?;

        if !cache.contains_key(&self.secret_name) {
            debug!(secret = %self.secret_name, "Secret not cached, fetching from store");
            let blob = get_secret_with_timeout(provider, &self.secret_name, timeout).await?;
            cache.insert(self.secret_name.clone(), blob);
        }

        let blob = cache
            .get(&self.secret_name)
            .ok_or_else(|| SecretsError::not_found(&self.secret_name, &self.secret_key))?;

        match blob.get(&self.secret_key) {
            None => Err(SecretsError::not_found(&self.secret_name, &self.secret_key)),
            Some(Value::Null) => Err(SecretsError::nil_value(&self.secret_name, &self.secret_key)),
            Some(value) => Ok(value.clone()),
        }
    }
}
