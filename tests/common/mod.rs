//! Common test utilities for all integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

use flyway_migrator::{Credentials, DatabaseCredentials};

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Serialise tests that modify environment variables.
pub fn env_guard() -> MutexGuard<'static, ()> {
    ENV_MUTEX.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write `contents` to a fresh temporary file.
pub fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

pub fn text_credentials() -> Credentials {
    Credentials::text(DatabaseCredentials::new("app", "s3cret", "localhost", 5432, "orders"))
}

pub const TEXT_CREDENTIALS_YAML: &str = r#"
credentials:
  provider: text
  text:
    username: app
    password: s3cret
    host: localhost
    port: 5432
    database: orders
"#;
