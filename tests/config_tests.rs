use std::{io::Write, path::PathBuf};

use nl2sql_eval::config::{Config, PathsConfig};
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.llm.api_key.is_none());
    assert!(config.llm.provider.is_none());
    assert!(config.llm.schema.is_none());
    assert_eq!(
        config.llm.ollama_url.as_deref(),
        Some("http://localhost:11434")
    );
}

#[test]
fn test_default_retry_config() {
    let config = Config::default();

    assert_eq!(config.retry.max_retries, 3);
    assert_eq!(config.retry.initial_delay_ms, 1000);
    assert_eq!(config.retry.max_delay_ms, 30000);
    assert_eq!(config.retry.backoff_factor, 2.0);
}

#[test]
fn test_default_paths() {
    let paths = PathsConfig::default();

    assert_eq!(paths.dataset, PathBuf::from("data/training_data.csv"));
    assert_eq!(paths.results, PathBuf::from("data/evaluation_results.csv"));
    assert_eq!(paths.interaction_log, PathBuf::from("logs/interaction_log.csv"));
}

#[test]
fn test_from_toml_partial_sections() {
    let config = Config::from_toml(
        r#"
        [llm]
        provider = "anthropic"
        model = "claude-sonnet-4-20250514"

        [retry]
        max_retries = 5
        "#
    )
    .unwrap();

    assert_eq!(config.llm.provider.as_deref(), Some("anthropic"));
    assert_eq!(config.llm.model.as_deref(), Some("claude-sonnet-4-20250514"));
    assert_eq!(config.retry.max_retries, 5);
    assert_eq!(config.retry.initial_delay_ms, 1000);
    assert_eq!(config.paths.results, PathBuf::from("data/evaluation_results.csv"));
}

#[test]
fn test_from_toml_paths_and_schema() {
    let config = Config::from_toml(
        r#"
        [llm]
        schema = "data/schema.sql"

        [paths]
        results = "out/results.csv"
        "#
    )
    .unwrap();

    assert_eq!(config.llm.schema, Some(PathBuf::from("data/schema.sql")));
    assert_eq!(config.paths.results, PathBuf::from("out/results.csv"));
    assert_eq!(config.paths.dataset, PathBuf::from("data/training_data.csv"));
}

#[test]
fn test_from_toml_empty() {
    let config = Config::from_toml("").unwrap();
    assert!(config.llm.model.is_none());
    assert_eq!(config.retry.max_retries, 3);
}

#[test]
fn test_from_toml_invalid() {
    assert!(Config::from_toml("[llm\nprovider = ").is_err());
}

#[test]
fn test_from_toml_wrong_type() {
    assert!(Config::from_toml("[retry]\nmax_retries = \"three\"").is_err());
}

#[test]
fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "[llm]\nprovider = \"ollama\"\nmodel = \"sqlcoder\"").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.llm.model.as_deref(), Some("sqlcoder"));
}

#[test]
fn test_from_file_missing() {
    assert!(Config::from_file(std::path::Path::new("/nonexistent/config.toml")).is_err());
}
