//! Tests for match configuration loading.

use std::io::Write;
use std::time::Duration;
use strictly_match::MatchConfig;

#[test]
fn test_missing_keys_take_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "hit_settle_ms = 100").unwrap();
    writeln!(file, "authority_url = \"http://localhost:9000\"").unwrap();

    let config = MatchConfig::from_file(file.path()).unwrap();
    assert_eq!(config.hit_settle(), Duration::from_millis(100));
    assert_eq!(*config.initial_clock_secs(), 600);
    assert_eq!(*config.blocked_grace_ms(), 1_000);
    assert_eq!(*config.persist_retries(), 3);
    assert_eq!(config.authority_url().as_deref(), Some("http://localhost:9000"));
}

#[test]
fn test_empty_file_is_the_default() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = MatchConfig::from_file(file.path()).unwrap();
    assert_eq!(config, MatchConfig::default());
}

#[test]
fn test_rendered_config_loads_back() {
    let config = MatchConfig::default()
        .with_initial_clock_secs(300)
        .with_persist_retries(5);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", config.to_toml().unwrap()).unwrap();
    assert_eq!(MatchConfig::from_file(file.path()).unwrap(), config);
}

#[test]
fn test_bad_toml_reports_location() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "hit_settle_ms = \"soon\"").unwrap();
    let err = MatchConfig::from_file(file.path()).unwrap_err();
    assert!(err.message.contains("Failed to parse config"));
    assert!(err.file.ends_with("config.rs"));
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(MatchConfig::from_file("/nonexistent/strictly_backgammon.toml").is_err());
}
