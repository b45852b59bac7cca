//! Configuration resolution tests
//!
//! Uses serial_test because these tests mutate process environment variables.

use cmsync_common::config::{
    load_config, resolve_config_path, TomlConfig, AGGREGATION_URL_ENV_VAR, CMS_TOKEN_ENV_VAR,
    CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(CMS_TOKEN_ENV_VAR);
    env::remove_var(AGGREGATION_URL_ENV_VAR);
}

#[test]
#[serial]
fn test_cli_argument_has_priority_over_env() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolved = resolve_config_path(Some(PathBuf::from("/tmp/from-cli.toml").as_path()));
    assert_eq!(resolved, Some(PathBuf::from("/tmp/from-cli.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_env_variable_used_without_cli() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    assert_eq!(resolve_config_path(None), Some(PathBuf::from("/tmp/from-env.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");

    let config = load_config(Some(&missing)).expect("missing config must not be fatal");
    assert_eq!(config, TomlConfig::default());
}

#[test]
#[serial]
fn test_file_values_and_env_secrets_combine() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        [server]
        bind = "0.0.0.0:8080"

        [sync]
        stale_after_days = 3

        [aggregation]
        url = "http://file.example/aggregate"
        "#,
    )
    .unwrap();

    env::set_var(CMS_TOKEN_ENV_VAR, "secret-token");
    env::set_var(AGGREGATION_URL_ENV_VAR, "http://env.example/aggregate");

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:8080");
    assert_eq!(config.sync.stale_after_days, 3);
    assert_eq!(config.cms.token.as_deref(), Some("secret-token"));
    assert_eq!(
        config.aggregation.url.as_deref(),
        Some("http://env.example/aggregate")
    );

    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_rejected_on_load() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sync]\nmax_concurrency = 0\n").unwrap();

    assert!(load_config(Some(&path)).is_err());
}
