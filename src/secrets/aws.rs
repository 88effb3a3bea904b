//! AWS Secrets Manager client.
//!
//! Region and credentials come from the standard AWS provider chain loaded by
//! `aws-config`: environment variables, shared config and credentials files
//! (profiles and SSO included), web identity tokens and container or
//! instance roles.
//!
//! ## Configuration
//!
//! - `AWS_REGION`, `AWS_DEFAULT_REGION` or a profile `region` - Required
//! - `AWS_PROFILE` - Optional, selects a named profile
//! - `AWS_ENDPOINT_URL_SECRETS_MANAGER` or `AWS_ENDPOINT_URL` - Optional endpoint override
//!
//! ## Secret Format
//!
//! The secret must hold a JSON object, either as `SecretString` or as
//! `SecretBinary`:
//!
//! ```json
//! { "username": "app", "password": "...", "host": "db.internal", "port": 5432 }
//! ```

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_secretsmanager::config::timeout::TimeoutConfig;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::{
    GetSecretValueError, GetSecretValueOutput,
};
use aws_sdk_secretsmanager::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::client::{decode_secret_payload, SecretBlob, SecretPayload, SecretsProvider};
use super::error::{Result, SecretsError};

/// AWS Secrets Manager backed [`SecretsProvider`].
pub struct AwsSecretsManager {
    client: Client,
    region: String,
    timeout: Duration,
}

impl std::fmt::Debug for AwsSecretsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsSecretsManager")
            .field("region", &self.region)
            .field("timeout", &self.timeout)
            .field("client", &"[SecretsManagerClient]")
            .finish()
    }
}

impl AwsSecretsManager {
    /// Load shared configuration from the default AWS provider chain and
    /// build a client whose calls are bounded by `timeout`.
    pub async fn from_env(timeout: Duration) -> Result<Self> {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::from_sdk_config(&shared, timeout)
    }

    /// Build a client from already loaded shared configuration.
    ///
    /// Fails with [`SecretsError::ProviderInit`] when no region is configured.
    pub fn from_sdk_config(shared: &SdkConfig, timeout: Duration) -> Result<Self> {
        let region = shared.region().map(ToString::to_string).ok_or_else(|| {
            SecretsError::provider_init(
                "no AWS region configured (set AWS_REGION or a profile region)",
            )
        })?;

        let config = aws_sdk_secretsmanager::config::Builder::from(shared)
            .timeout_config(TimeoutConfig::builder().operation_timeout(timeout).build())
            .build();

        info!(region = %region, timeout_ms = timeout.as_millis() as u64, "Initialized AWS Secrets Manager client");

        Ok(Self { client: Client::from_conf(config), region, timeout })
    }

    fn map_error(&self, name: &str, err: SdkError<GetSecretValueError>) -> SecretsError {
        match err {
            SdkError::TimeoutError(_) => SecretsError::Timeout {
                secret: name.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            },
            SdkError::ServiceError(service) => {
                let err = service.into_err();
                SecretsError::backend(
                    name,
                    format!(
                        "{}: {}",
                        err.code().unwrap_or("UnknownError"),
                        err.message().unwrap_or_default()
                    ),
                )
            }
            other => SecretsError::backend(name, DisplayErrorContext(&other).to_string()),
        }
    }
}

fn decode_output(name: &str, output: &GetSecretValueOutput) -> Result<SecretBlob> {
    match (output.secret_string(), output.secret_binary()) {
        (Some(text), _) => decode_secret_payload(SecretPayload::Text(text)),
        (None, Some(binary)) => decode_secret_payload(SecretPayload::Binary(binary.as_ref())),
        (None, None) => Err(SecretsError::backend(
            name,
            "response contained neither SecretString nor SecretBinary",
        )),
    }
}

#[async_trait]
impl SecretsProvider for AwsSecretsManager {
    async fn get_secret(&self, name: &str) -> Result<SecretBlob> {
        debug!(secret = %name, region = %self.region, "Requesting secret from AWS Secrets Manager");

        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| self.map_error(name, e))?;

        decode_output(name, &output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_secretsmanager::config::{Credentials, Region, SharedCredentialsProvider};
    use serde_json::json;
    use std::env;
    use wiremock::matchers::{body_json, header, header_exists, header_regex, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::test_support::{env_lock, AwsEnvScope};

    const TARGET: &str = "secretsmanager.GetSecretValue";
    const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

    fn static_config(endpoint: &str) -> SdkConfig {
        SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("eu-west-1"))
            .credentials_provider(SharedCredentialsProvider::new(Credentials::new(
                "AKIDEXAMPLE",
                "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
                None,
                None,
                "static",
            )))
            .endpoint_url(endpoint)
            .build()
    }

    fn client(server: &MockServer, timeout: Duration) -> AwsSecretsManager {
        AwsSecretsManager::from_sdk_config(&static_config(&server.uri()), timeout).unwrap()
    }

    fn json_response(status: u16, body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body.to_string(), CONTENT_TYPE)
    }

    #[test]
    fn test_missing_region_fails_initialisation() {
        let shared = SdkConfig::builder().behavior_version(BehaviorVersion::latest()).build();
        let err = AwsSecretsManager::from_sdk_config(&shared, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, SecretsError::ProviderInit { .. }));
    }

    #[tokio::test]
    async fn test_get_secret_string() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", TARGET))
            .and(header_exists("authorization"))
            .and(body_json(json!({"SecretId": "prod/db"})))
            .respond_with(json_response(
                200,
                json!({
                    "Name": "prod/db",
                    "SecretString": "{\"username\":\"app\",\"port\":5432}"
                }),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let blob = client(&server, Duration::from_secs(5)).get_secret("prod/db").await.unwrap();

        assert_eq!(blob.get("username"), Some(&json!("app")));
        assert_eq!(blob.get("port"), Some(&json!(5432)));
    }

    #[tokio::test]
    async fn test_get_secret_binary() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            // {"host":"db"}
            .respond_with(json_response(200, json!({ "SecretBinary": "eyJob3N0IjoiZGIifQ==" })))
            .mount(&server)
            .await;

        let blob = client(&server, Duration::from_secs(5)).get_secret("bin").await.unwrap();
        assert_eq!(blob.get("host"), Some(&json!("db")));
    }

    #[tokio::test]
    async fn test_service_error_is_backend_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(json_response(
                400,
                json!({
                    "__type": "ResourceNotFoundException",
                    "Message": "Secrets Manager can't find the specified secret."
                }),
            ))
            .mount(&server)
            .await;

        let err = client(&server, Duration::from_secs(5)).get_secret("missing").await.unwrap_err();

        assert!(matches!(err, SecretsError::Backend { .. }));
        assert!(err.to_string().contains("ResourceNotFoundException"));
    }

    #[tokio::test]
    async fn test_slow_store_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                json_response(200, json!({ "SecretString": "{}" }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err =
            client(&server, Duration::from_millis(100)).get_secret("slow").await.unwrap_err();
        assert!(matches!(err, SecretsError::Timeout { timeout_ms: 100, .. }));
    }

    #[tokio::test]
    async fn test_credentials_from_shared_profile() {
        let _guard = env_lock();
        let _scope = AwsEnvScope::isolated();

        let dir = tempfile::tempdir().unwrap();
        let credentials_file = dir.path().join("credentials");
        std::fs::write(
            &credentials_file,
            "[default]\naws_access_key_id = AKIDPROFILE\naws_secret_access_key = profile-secret\n",
        )
        .unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header_regex("authorization", "Credential=AKIDPROFILE/"))
            .respond_with(json_response(200, json!({ "SecretString": "{\"username\":\"app\"}" })))
            .expect(1)
            .mount(&server)
            .await;

        env::set_var("AWS_SHARED_CREDENTIALS_FILE", &credentials_file);
        env::set_var("AWS_CONFIG_FILE", dir.path().join("config"));
        env::set_var("AWS_REGION", "eu-west-1");
        env::set_var("AWS_ENDPOINT_URL", server.uri());

        let store = AwsSecretsManager::from_env(Duration::from_secs(5)).await.unwrap();
        let blob = store.get_secret("prod/db").await.unwrap();

        assert_eq!(blob.get("username"), Some(&json!("app")));
    }
}
