//! Core secret store trait and payload decoding.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;

use super::error::{Result, SecretsError};

/// Decoded key/value contents of one named secret.
pub type SecretBlob = Map<String, Value>;

/// Trait for remote secret stores.
///
/// A secret is addressed by name and always decodes to a JSON object. Values
/// inside the object may be strings, numbers or nested structures.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret values
/// - Network communication MUST use TLS
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Fetch and decode the secret called `name`.
    ///
    /// # Errors
    ///
    /// - [`SecretsError::Backend`] if the store rejects the request
    /// - [`SecretsError::Timeout`] if the store does not answer in time
    /// - [`SecretsError::Serialization`] if the payload is not a JSON object
    async fn get_secret(&self, name: &str) -> Result<SecretBlob>;
}

/// Raw secret payload as returned by a store.
#[derive(Debug, Clone, Copy)]
pub enum SecretPayload<'a> {
    Text(&'a str),
    Binary(&'a [u8]),
}

/// Decode a secret payload that must contain a JSON object.
pub fn decode_secret_payload(payload: SecretPayload<'_>) -> Result<SecretBlob> {
    let value: Value = match payload {
        SecretPayload::Text(text) => serde_json::from_str(text)?,
        SecretPayload::Binary(bytes) => serde_json::from_slice(bytes)?,
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(SecretsError::invalid_value(
            "secret",
            format!("expected a JSON object, got {}", json_type_name(&other)),
        )),
    }
}

/// Run `get_secret` bounded by `timeout`.
pub async fn get_secret_with_timeout(
    provider: &dyn SecretsProvider,
    name: &str,
    timeout: Duration,
) -> Result<SecretBlob> {
    match tokio::time::timeout(timeout, provider.get_secret(name)).await {
        Ok(result) => result,
        Err(_) => Err(SecretsError::Timeout {
            secret: name.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct SlowProvider;

    #[async_trait]
    impl SecretsProvider for SlowProvider {
        async fn get_secret(&self, _name: &str) -> Result<SecretBlob> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(SecretBlob::new())
        }
    }

    #[test]
    fn test_decode_text_payload() {
        let blob =
            decode_secret_payload(SecretPayload::Text(r#"{"user":"bob","port":5432}"#)).unwrap();
        assert_eq!(blob.get("user"), Some(&json!("bob")));
        assert_eq!(blob.get("port"), Some(&json!(5432)));
    }

    #[test]
    fn test_decode_binary_payload() {
        let blob = decode_secret_payload(SecretPayload::Binary(br#"{"nested":{"a":1}}"#)).unwrap();
        assert_eq!(blob.get("nested"), Some(&json!({"a": 1})));
    }

    #[test]
    fn test_decode_rejects_non_object() {
        let err = decode_secret_payload(SecretPayload::Text("[1, 2]")).unwrap_err();
        assert!(matches!(err, SecretsError::InvalidValue { .. }));

        let err = decode_secret_payload(SecretPayload::Text("not json")).unwrap_err();
        assert!(matches!(err, SecretsError::Serialization(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_secret_times_out() {
        let err = get_secret_with_timeout(&SlowProvider, "slow", Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, SecretsError::Timeout { timeout_ms: 10_000, .. }));
    }
}
