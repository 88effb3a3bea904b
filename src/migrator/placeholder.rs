//! Flyway placeholders.

use serde::Deserialize;
use std::path::PathBuf;

use crate::errors::{Error, Result};

/// A named placeholder, given literally or loaded from a file.
///
/// File contents are used verbatim; trailing newlines are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placeholder {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub value_from_file: String,
}

impl Placeholder {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), value_from_file: String::new() }
    }

    pub fn from_file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), value: String::new(), value_from_file: path.into() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::validation_field("missing 'name' field in placeholder", "name"));
        }
        if self.value.is_empty() && self.value_from_file.is_empty() {
            return Err(Error::validation_field(
                format!("placeholder '{}' needs either 'value' or 'valueFromFile'", self.name),
                "value",
            ));
        }
        Ok(())
    }

    /// Render as `-placeholders.<name>=<value>`, reading the file if one is set.
    pub async fn to_argument(&self) -> Result<String> {
        self.validate()?;

        let value = if self.value_from_file.is_empty() {
            self.value.clone()
        } else {
            let path = PathBuf::from(&self.value_from_file);
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| Error::FileRead { path: path.clone(), source })?;
            if bytes.is_empty() {
                return Err(Error::EmptyFile { path });
            }
            String::from_utf8(bytes).map_err(|source| Error::FileEncoding { path, source })?
        };

        Ok(format!("-placeholders.{}={}", self.name, value))
    }
}
