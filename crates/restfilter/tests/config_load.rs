//! Tests for loading filter configuration from disk.

use std::fs;

use restfilter_rs::{Clause, Config, ConfigError, ErrorKind};

#[test]
fn test_load_missing_file_uses_defaults() {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let config = Config::load(temp_dir.path().join("filters.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_and_build_from_file() {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = temp_dir.path().join("filters.toml");
    fs::write(
        &path,
        r#"
version = 1

[scopes.users]
allowed_keys = ["id", "name"]
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let filter = config.filter("users").unwrap();

    let mut clauses: Vec<Clause> = Vec::new();
    filter.build(&mut clauses, "name sw 'jo' and id gt 10").unwrap();
    assert_eq!(clauses.len(), 1);

    let err = filter.build(&mut clauses, "email eq 'a'").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownKey);
    assert_eq!(clauses.len(), 1);
}

#[test]
fn test_load_invalid_file() {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = temp_dir.path().join("filters.toml");
    fs::write(&path, "[scopes.users]\nallowed_keys = 5\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_load_unreadable_path() {
    let temp_dir = tempfile::tempdir().expect("failed to create temp dir");

    // A directory exists but cannot be read as a file
    let err = Config::load(temp_dir.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
