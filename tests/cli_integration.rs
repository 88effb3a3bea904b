//! CLI Integration Tests
//!
//! Drives `cli::run` against configuration files on disk. On Unix the
//! `true` and `false` utilities stand in for the flyway executable.

mod common;

use clap::Parser;
use flyway_migrator::cli::{run, Cli};

use common::{temp_file, TEXT_CREDENTIALS_YAML};

fn config_file() -> tempfile::NamedTempFile {
    temp_file(&format!(
        "{}schemas:\n  - name: accounts\n    migrationsPath: /m/accounts\n  - name: billing\n    migrationsPath: /m/billing\n",
        TEXT_CREDENTIALS_YAML
    ))
}

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("flyway-migrator").chain(args.iter().copied())).unwrap()
}

#[tokio::test]
async fn test_validate_only_does_not_need_flyway() {
    let config = config_file();
    let path = config.path().to_string_lossy().to_string();

    let result = run(cli(&[
        "--config",
        &path,
        "--validate-only",
        "--flyway-command",
        "definitely-not-a-real-binary-7f3a",
    ]))
    .await;

    assert!(result.is_ok(), "{:?}", result.err());
}

#[tokio::test]
async fn test_invalid_configuration_fails() {
    let config = temp_file("schemas:\n  - name: orphan\n    migrationsPath: /m/orphan\n");
    let path = config.path().to_string_lossy().to_string();

    let err = run(cli(&["--config", &path, "--validate-only"])).await.unwrap_err();

    assert!(err.to_string().contains("missing 'credentials' field"));
}

#[tokio::test]
async fn test_out_of_range_timeout_flag_fails() {
    let config = config_file();
    let path = config.path().to_string_lossy().to_string();

    let result = run(cli(&["--config", &path, "--secrets-timeout-secs", "0"])).await;

    assert!(result.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_migrate_with_succeeding_command() {
    let config = config_file();
    let path = config.path().to_string_lossy().to_string();

    let result = run(cli(&["--config", &path, "--flyway-command", "true"])).await;

    assert!(result.is_ok(), "{:?}", result.err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_migrate_with_failing_command() {
    let config = config_file();
    let path = config.path().to_string_lossy().to_string();

    let err = run(cli(&["--config", &path, "--flyway-command", "false"])).await.unwrap_err();

    let err = err.downcast::<flyway_migrator::Error>().unwrap();
    assert!(matches!(err, flyway_migrator::Error::ToolNotInstalled { .. }));
}
