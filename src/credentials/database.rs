//! The normalized credentials record every provider produces.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{Error, Result};
use crate::secrets::SecretString;

/// Connection credentials for one PostgreSQL database.
///
/// Doubles as the `text` provider: a literal record embedded in the
/// configuration is returned unchanged once it validates.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: SecretString,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub database: String,
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}

impl DatabaseCredentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<SecretString>,
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            host: host.into(),
            port,
            database: database.into(),
        }
    }

    /// Every field must be non-empty and the port non-zero.
    pub fn validate(&self) -> Result<()> {
        let missing = |field: &str| {
            Error::validation_field(format!("missing '{}' key in database credentials", field), field)
        };

        if self.username.is_empty() {
            return Err(missing("username"));
        }
        if self.password.is_empty() {
            return Err(missing("password"));
        }
        if self.host.is_empty() {
            return Err(missing("host"));
        }
        if self.port == 0 {
            return Err(missing("port"));
        }
        if self.database.is_empty() {
            return Err(missing("database"));
        }
        Ok(())
    }

    /// Literal credentials resolve to themselves.
    pub fn get_credentials(&self) -> Result<DatabaseCredentials> {
        self.validate()?;
        Ok(self.clone())
    }

    /// JDBC URL understood by Flyway.
    pub fn jdbc_url(&self) -> String {
        format!("jdbc:postgresql://{}:{}/{}", self.host, self.port, self.database)
    }
}
