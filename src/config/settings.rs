//! Runner settings read from the environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

use crate::errors::{Error, Result};

pub const FLYWAY_COMMAND_ENV: &str = "FLYWAY_MIGRATOR_FLYWAY_COMMAND";
pub const SECRETS_TIMEOUT_ENV: &str = "FLYWAY_MIGRATOR_SECRETS_TIMEOUT_SECS";

/// How the migrator talks to the outside world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RunnerSettings {
    /// Executable used for the presence check and for `migrate`
    #[validate(length(min = 1, message = "Flyway command cannot be empty"))]
    pub flyway_command: String,

    /// Upper bound on one secret store call
    #[validate(range(min = 1, max = 300, message = "Secrets timeout must be between 1 and 300 seconds"))]
    pub secrets_timeout_secs: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self { flyway_command: "flyway".to_string(), secrets_timeout_secs: 10 }
    }
}

impl RunnerSettings {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let flyway_command =
            std::env::var(FLYWAY_COMMAND_ENV).unwrap_or(defaults.flyway_command);

        let secrets_timeout_secs = match std::env::var(SECRETS_TIMEOUT_ENV) {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                Error::config(format!("Invalid {}: {}", SECRETS_TIMEOUT_ENV, e))
            })?,
            Err(_) => defaults.secrets_timeout_secs,
        };

        let settings = Self { flyway_command, secrets_timeout_secs };
        settings.validate()?;
        Ok(settings)
    }

    /// Replace values with the ones given explicitly, e.g. on the command line.
    pub fn with_overrides(
        mut self,
        flyway_command: Option<String>,
        secrets_timeout_secs: Option<u64>,
    ) -> Result<Self> {
        if let Some(command) = flyway_command {
            self.flyway_command = command;
        }
        if let Some(timeout) = secrets_timeout_secs {
            self.secrets_timeout_secs = timeout;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)
    }

    pub fn secrets_timeout(&self) -> Duration {
        Duration::from_secs(self.secrets_timeout_secs)
    }
}
