//! # Configuration
//!
//! Migration configuration is YAML, optionally split across several files
//! that are deep-merged in order:
//!
//! - mappings merge recursively, later files winning per key
//! - sequences and scalars from a later file replace earlier ones wholesale
//!
//! Runner settings (the flyway executable, the secret store timeout) come
//! from the environment, see [`RunnerSettings`].

pub mod settings;

use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{Error, Result};

pub use settings::RunnerSettings;

/// Merge `overlay` into `base`.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Parse a YAML document. An empty document yields an empty mapping.
pub fn parse_yaml(contents: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(contents)?;
    Ok(match value {
        Value::Null => Value::Mapping(Default::default()),
        other => other,
    })
}

/// Read and deep-merge configuration files in the given order.
pub fn load_merged<P: AsRef<Path>>(paths: &[P]) -> Result<Value> {
    if paths.is_empty() {
        return Err(Error::config("At least one configuration file is required"));
    }

    let mut merged = Value::Mapping(Default::default());
    for path in paths {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading migrator configuration");

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config_with_source(
                format!("Failed to read configuration file {}", path.display()),
                Box::new(e),
            )
        })?;
        let value = parse_yaml(&contents).map_err(|e| match e {
            Error::Config { source, .. } => Error::Config {
                message: format!("Failed to parse configuration file {}", path.display()),
                source,
            },
            other => other,
        })?;
        deep_merge(&mut merged, value);
    }
    Ok(merged)
}

/// Paths as given on the command line, for log output.
pub fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}
