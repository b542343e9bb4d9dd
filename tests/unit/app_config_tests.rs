/*!
 * Tests for configuration loading, validation and overrides
 */

use std::collections::HashMap;

use mdxlate::app_config::{Config, LogLevel, ProviderConfig, ENV_API_KEY, ENV_API_URL};
use mdxlate::translation::DEFAULT_PENDING_MARKER;
use crate::common;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_default_config_should_translate_english_to_arabic() {
    let config = Config::default();
    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "ar");
    assert_eq!(config.validation.arabic_threshold, 0.15);
    assert_eq!(config.validation.pending_marker, DEFAULT_PENDING_MARKER);
    assert_eq!(config.segmenter.custom_tags, vec!["Cite".to_string(), "Footnote".to_string()]);
    assert_eq!(config.translation.timeout_secs, 15);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_with_partial_json_should_fill_defaults() {
    let config: Config = serde_json::from_str(r#"{"target_language": "ara", "log_level": "debug"}"#).unwrap();
    assert_eq!(config.source_language, "en");
    assert_eq!(config.target_language, "ara");
    assert_eq!(config.log_level, LogLevel::Debug);
    assert!(!config.translation.fallback_providers.is_empty());
    assert!(config.validate().is_ok());
}

#[test]
fn test_provider_chain_should_put_custom_endpoint_first() {
    let mut config = Config::default();
    config.translation.custom_endpoint = Some(ProviderConfig::new("mine", "https://mt.example.org"));

    let chain = config.translation.provider_chain();
    assert_eq!(chain[0].name, "mine");
    assert_eq!(chain.len(), config.translation.fallback_providers.len() + 1);
    // the keyed public mirror has no key by default
    assert!(chain.iter().any(|p| p.is_skipped()));
}

#[test]
fn test_validate_with_bad_values_should_fail() {
    let mut config = Config::default();
    config.target_language = "klingon".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.validation.arabic_threshold = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.jitter_min_ms = 900;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.fallback_providers.push(ProviderConfig::new("ftp", "ftp://mirror.test"));
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.segmenter.custom_tags.push("1Bad".to_string());
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.validation.pending_marker = "PENDING".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.translation.fallback_providers.clear();
    assert!(config.validate().is_err());
}

#[test]
fn test_env_overrides_with_url_and_key_should_set_custom_endpoint() {
    let mut config = Config::default();
    config.apply_overrides_from(lookup(&[(ENV_API_URL, "https://mt.example.org/translate"), (ENV_API_KEY, "secret")]));

    let custom = config.translation.custom_endpoint.clone().unwrap();
    assert_eq!(custom.endpoint, "https://mt.example.org/translate");
    assert_eq!(custom.api_key, "secret");
    assert_eq!(config.translation.provider_chain()[0].api_key.as_deref(), Some("secret"));
}

#[test]
fn test_env_overrides_with_key_only_should_fill_keyed_fallbacks() {
    let mut config = Config::default();
    config.apply_overrides_from(lookup(&[(ENV_API_KEY, "secret")]));

    assert!(config.translation.custom_endpoint.is_none());
    assert!(config.translation.provider_chain().iter().all(|p| !p.is_skipped()));
}

#[test]
fn test_env_overrides_with_blank_values_should_change_nothing() {
    let mut config = Config::default();
    config.apply_overrides_from(lookup(&[(ENV_API_URL, "  "), (ENV_API_KEY, "")]));
    assert_eq!(config, Config::default());
}

#[test]
fn test_load_or_default_with_missing_file_should_create_it() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_default(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config, Config::default());

    let reloaded = Config::load_or_default(&path).unwrap();
    assert_eq!(reloaded, config);
}

#[test]
fn test_load_or_default_with_broken_file_should_fail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "conf.json", "{ not json").unwrap();
    assert!(Config::load_or_default(&path).is_err());
}
