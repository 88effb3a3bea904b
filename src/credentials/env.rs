//! Credentials read from process environment variables.
//!
//! The configuration names the variables, not the values:
//!
//! ```yaml
//! credentials:
//!   provider: env
//!   env:
//!     usernameKey: DB_USER
//!     passwordKey: DB_PASSWORD
//!     hostKey: DB_HOST
//!     portKey: DB_PORT
//!     databaseKey: DB_NAME
//! ```
//!
//! Variables are read eagerly during validation so a misconfigured
//! environment is reported before any migration runs.

use serde::Deserialize;
use std::env::{self, VarError};

use super::database::DatabaseCredentials;
use crate::errors::{Error, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvCredentials {
    #[serde(default)]
    pub username_key: String,
    #[serde(default)]
    pub password_key: String,
    #[serde(default)]
    pub host_key: String,
    #[serde(default)]
    pub port_key: String,
    #[serde(default)]
    pub database_key: String,
    #[serde(skip)]
    resolved: Option<DatabaseCredentials>,
}

impl EnvCredentials {
    pub fn new(
        username_key: impl Into<String>,
        password_key: impl Into<String>,
        host_key: impl Into<String>,
        port_key: impl Into<String>,
        database_key: impl Into<String>,
    ) -> Self {
        Self {
            username_key: username_key.into(),
            password_key: password_key.into(),
            host_key: host_key.into(),
            port_key: port_key.into(),
            database_key: database_key.into(),
            resolved: None,
        }
    }

    /// Check that every variable name is set, then read the variables.
    pub fn validate(&mut self) -> Result<()> {
        let keys = [
            ("usernameKey", &self.username_key),
            ("passwordKey", &self.password_key),
            ("hostKey", &self.host_key),
            ("portKey", &self.port_key),
            ("databaseKey", &self.database_key),
        ];
        for (field, key) in keys {
            if key.is_empty() {
                return Err(Error::validation_field(
                    format!("missing '{}' key in env credentials", field),
                    field,
                ));
            }
        }

        let username = read_var(&self.username_key)?;
        let password = read_var(&self.password_key)?;
        let host = read_var(&self.host_key)?;
        let database = read_var(&self.database_key)?;
        let port = parse_port(&self.port_key, &read_var(&self.port_key)?)?;

        self.resolved = Some(DatabaseCredentials::new(username, password, host, port, database));
        Ok(())
    }

    /// Credentials assembled from the environment during validation.
    pub fn get_credentials(&mut self) -> Result<DatabaseCredentials> {
        self.validate()?;
        self.resolved.clone().ok_or_else(|| Error::validation("env credentials were not resolved"))
    }
}

fn read_var(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if value.is_empty() => Err(Error::EmptyEnv { key: key.to_string() }),
        Ok(value) => Ok(value),
        Err(VarError::NotPresent) => Err(Error::MissingEnv { key: key.to_string() }),
        Err(VarError::NotUnicode(_)) => Err(Error::Parse {
            key: key.to_string(),
            expected: "UTF-8 text",
            message: "value is not valid unicode".to_string(),
        }),
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16> {
    let port: u16 = raw.parse().map_err(|e: std::num::ParseIntError| Error::Parse {
        key: key.to_string(),
        expected: "a port number",
        message: e.to_string(),
    })?;
    if port == 0 {
        return Err(Error::Parse {
            key: key.to_string(),
            expected: "a port number",
            message: "port must be between 1 and 65535".to_string(),
        });
    }
    Ok(port)
}
