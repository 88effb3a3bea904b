//! Flyway command line argument handling.

use crate::errors::{Error, Result};

/// Split a `-key=value` argument into its key and value.
///
/// The argument must contain exactly one `=`, the key must start with `-`
/// and be at least two characters long, and the value must be non-empty.
pub fn parse_flyway_arg(arg: &str) -> Result<(&str, &str)> {
    let mut parts = arg.split('=');
    let (key, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) => (key, value),
        _ => return Err(Error::arg_format(arg, "expected exactly one '='")),
    };

    if key.len() < 2 {
        return Err(Error::arg_format(arg, "key is too short"));
    }
    if value.is_empty() {
        return Err(Error::arg_format(arg, "value is empty"));
    }
    if !key.starts_with('-') {
        return Err(Error::arg_format(arg, "key must start with '-'"));
    }
    Ok((key, value))
}

/// Check every argument against [`parse_flyway_arg`].
pub fn validate_flyway_args(args: &[String]) -> Result<()> {
    args.iter().try_for_each(|arg| parse_flyway_arg(arg).map(|_| ()))
}

/// Merge `defaults` into `args`, keyed by argument name.
///
/// Keys present in `args` keep their value. The result lists the defaults in
/// their original order (overridden in place), followed by keys only `args`
/// defines. A key repeated within one list keeps its last value.
pub fn merge_default_args(defaults: &[String], args: &[String]) -> Result<Vec<String>> {
    let mut merged: Vec<(String, String)> = Vec::with_capacity(defaults.len() + args.len());

    for arg in defaults.iter().chain(args) {
        let (key, value) = parse_flyway_arg(arg)?;
        match merged.iter_mut().find(|(existing, _)| existing == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => merged.push((key.to_string(), value.to_string())),
        }
    }

    Ok(merged.into_iter().map(|(key, value)| format!("{}={}", key, value)).collect())
}
