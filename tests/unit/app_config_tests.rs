/*!
 * Tests for configuration loading, saving and validation
 */

use anyhow::Result;
use reelingo::Method;
use reelingo::app_config::{Config, ProviderKind};
use tempfile::TempDir;

#[test]
fn test_default_config_should_match_documented_defaults() {
    let config = Config::default();
    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "hi-IN");
    assert_eq!(config.translation.default_method, Method::Regional);
    assert_eq!(config.chunking.max_chunk_size, 1500);
    assert_eq!(config.chunking.overlap_size, 200);
    assert_eq!(config.jobs.max_concurrent_jobs, 5);
    assert_eq!(config.jobs.cleanup_interval_secs, 3600);
    assert_eq!(config.jobs.retention_secs, 86_400);
    assert_eq!(config.translation.common.retry_count, 3);
}

#[test]
fn test_save_then_load_should_preserve_values() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("conf.json");

    let mut config = Config::default();
    config.target_language = "ta-IN".to_string();
    config.jobs.max_concurrent_jobs = 2;
    config.save(&path)?;

    let loaded = Config::load(&path)?;
    assert_eq!(loaded.target_language, "ta-IN");
    assert_eq!(loaded.jobs.max_concurrent_jobs, 2);
    assert_eq!(loaded.translation.available_providers.len(), 4);
    Ok(())
}

#[test]
fn test_partial_file_should_fill_defaults() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("conf.json");
    std::fs::write(&path, r#"{ "target_language": "fr", "jobs": { "queue_capacity": 7 } }"#)?;

    let config = Config::load(&path)?;
    assert_eq!(config.target_language, "fr");
    assert_eq!(config.source_language, "en");
    assert_eq!(config.jobs.queue_capacity, 7);
    assert_eq!(config.jobs.max_concurrent_jobs, 5);
    Ok(())
}

#[test]
fn test_load_missing_file_should_fail_with_path() {
    let error = Config::load("/nonexistent/reelingo/conf.json").unwrap_err();
    assert!(error.to_string().contains("/nonexistent/reelingo/conf.json"));
}

#[test]
fn test_validate_should_require_keys_for_enabled_remote_providers() {
    let mut config = Config::default();
    for provider in &mut config.translation.available_providers {
        provider.api_key.clear();
    }
    assert!(config.validate().is_err());

    for provider in &mut config.translation.available_providers {
        provider.enabled = provider.provider_type == ProviderKind::Ollama;
    }
    assert!(config.validate().is_ok());
}

#[test]
fn test_validate_should_reject_overlap_not_smaller_than_chunk() {
    let mut config = Config::default();
    for provider in &mut config.translation.available_providers {
        provider.api_key = "key".to_string();
    }
    config.chunking.overlap_size = config.chunking.max_chunk_size;
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_should_reject_unknown_language() {
    let mut config = Config::default();
    for provider in &mut config.translation.available_providers {
        provider.api_key = "key".to_string();
    }
    config.target_language = "zz-ZZ".to_string();
    assert!(config.validate().is_err());
}
