use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, warn};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::providers::{ProviderEndpoint, Transport};
use crate::segmenter::Segmenter;
use crate::tag_scanner::{default_custom_tags, is_valid_tag_name};
use crate::translation::{DEFAULT_PENDING_MARKER, FixedWindowRateLimiter, Orchestrator, TranslationClient};
use crate::validation::{ArabicValidator, DEFAULT_ARABIC_THRESHOLD};

/// Environment variable overriding the custom endpoint URL
pub const ENV_API_URL: &str = "TRANSLATE_API_URL";

/// Environment variable overriding the custom endpoint API key
pub const ENV_API_KEY: &str = "TRANSLATE_API_KEY";

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language code (ISO)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Output validation config
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Segmenter config
    #[serde(default)]
    pub segmenter: SegmenterConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// One LibreTranslate-compatible provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Display name for logs
    #[serde(default = "default_provider_name")]
    pub name: String,

    // @field: Service URL
    pub endpoint: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Whether requests without a key are refused
    #[serde(default)]
    pub requires_key: bool,
}

impl ProviderConfig {
    /// Create a keyless provider
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            api_key: String::new(),
            requires_key: false,
        }
    }

    /// Convert to the client-side endpoint
    pub fn to_endpoint(&self) -> ProviderEndpoint {
        let endpoint = ProviderEndpoint::new(&self.name, &self.endpoint).requires_key(self.requires_key);
        if self.api_key.trim().is_empty() {
            endpoint
        } else {
            endpoint.with_api_key(self.api_key.trim())
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// User-configured endpoint, tried before the public fallbacks
    #[serde(default)]
    pub custom_endpoint: Option<ProviderConfig>,

    /// Public fallback providers, in order
    #[serde(default = "default_fallback_providers")]
    pub fallback_providers: Vec<ProviderConfig>,

    /// Deadline for one provider call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Lower jitter bound between providers
    #[serde(default = "default_jitter_min_ms")]
    pub jitter_min_ms: u64,

    /// Upper jitter bound between providers
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,

    /// Requests per minute; unlimited when absent
    #[serde(default)]
    pub rate_limit_per_minute: Option<u32>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            custom_endpoint: None,
            fallback_providers: default_fallback_providers(),
            timeout_secs: default_timeout_secs(),
            jitter_min_ms: default_jitter_min_ms(),
            jitter_max_ms: default_jitter_max_ms(),
            rate_limit_per_minute: None,
        }
    }
}

impl TranslationConfig {
    /// Providers in fallback order: the custom endpoint first
    pub fn provider_chain(&self) -> Vec<ProviderEndpoint> {
        self.custom_endpoint
            .iter()
            .chain(self.fallback_providers.iter())
            .map(ProviderConfig::to_endpoint)
            .collect()
    }

    /// Deadline for one provider call
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Output validation settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Minimum Arabic coverage for accepted output
    #[serde(default = "default_arabic_threshold")]
    pub arabic_threshold: f64,

    /// MDX comment prepended to bodies that failed validation
    #[serde(default = "default_pending_marker")]
    pub pending_marker: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            arabic_threshold: default_arabic_threshold(),
            pending_marker: default_pending_marker(),
        }
    }
}

/// Segmenter settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SegmenterConfig {
    /// Custom MDX elements protected from translation
    #[serde(default = "default_custom_tags")]
    pub custom_tags: Vec<String>,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            custom_tags: default_custom_tags(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::validate_language_code(&self.source_language)
            .context("Invalid source language")?;
        crate::language_utils::validate_language_code(&self.target_language)
            .context("Invalid target language")?;

        let threshold = self.validation.arabic_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(anyhow!("Arabic threshold must be in (0, 1], got {}", threshold));
        }

        let marker = self.validation.pending_marker.trim();
        if !(marker.starts_with("{/*") && marker.ends_with("*/}")) {
            return Err(anyhow!("Pending marker must be an MDX comment: {}", marker));
        }

        let translation = &self.translation;
        if translation.timeout_secs == 0 {
            return Err(anyhow!("Translation timeout must be at least one second"));
        }
        if translation.jitter_min_ms > translation.jitter_max_ms {
            return Err(anyhow!(
                "Jitter bounds are reversed: {} ms > {} ms",
                translation.jitter_min_ms,
                translation.jitter_max_ms
            ));
        }

        let providers: Vec<&ProviderConfig> = translation
            .custom_endpoint
            .iter()
            .chain(translation.fallback_providers.iter())
            .collect();
        if providers.is_empty() {
            return Err(anyhow!("At least one translation provider must be configured"));
        }
        for provider in providers {
            validate_endpoint_url(&provider.endpoint)
                .with_context(|| format!("Invalid endpoint for provider '{}'", provider.name))?;
        }

        if let Some(tag) = self.segmenter.custom_tags.iter().find(|t| !is_valid_tag_name(t)) {
            return Err(anyhow!("Invalid custom tag name: '{}'", tag));
        }

        Ok(())
    }

    /// Read a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the config as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Load the config at `path`, writing the defaults there first if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Apply `TRANSLATE_API_URL` / `TRANSLATE_API_KEY` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply endpoint overrides from a variable lookup.
    ///
    /// The URL replaces the custom endpoint. The key goes to the custom
    /// endpoint when there is one, otherwise to every keyed fallback that
    /// has none.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let url = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty());
        let key = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty());

        if let Some(url) = url {
            let custom = self
                .translation
                .custom_endpoint
                .get_or_insert_with(|| ProviderConfig::new("custom", ""));
            custom.endpoint = url.trim().to_string();
        }

        let Some(key) = key else {
            return;
        };

        match self.translation.custom_endpoint.as_mut() {
            Some(custom) => custom.api_key = key.trim().to_string(),
            None => {
                for provider in self
                    .translation
                    .fallback_providers
                    .iter_mut()
                    .filter(|p| p.requires_key && p.api_key.trim().is_empty())
                {
                    provider.api_key = key.trim().to_string();
                }
            }
        }
    }

    /// Build the translation pipeline described by this config
    pub fn build_orchestrator(&self, transport: Arc<dyn Transport>) -> Orchestrator {
        let translation = &self.translation;
        let client = TranslationClient::new(translation.provider_chain(), transport)
            .with_timeout(translation.timeout())
            .with_jitter(translation.jitter_min_ms, translation.jitter_max_ms);

        let orchestrator = Orchestrator::new(client)
            .with_segmenter(Segmenter::new(self.segmenter.custom_tags.clone()))
            .with_validator(ArabicValidator::new(self.validation.arabic_threshold))
            .with_pending_marker(self.validation.pending_marker.clone());

        match translation.rate_limit_per_minute {
            Some(limit) => orchestrator.with_rate_limiter(Arc::new(FixedWindowRateLimiter::per_minute(limit))),
            None => orchestrator,
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            validation: ValidationConfig::default(),
            segmenter: SegmenterConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

fn validate_endpoint_url(endpoint: &str) -> Result<()> {
    let url = Url::parse(endpoint.trim()).with_context(|| format!("Malformed URL: '{}'", endpoint))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(anyhow!("Unsupported URL scheme '{}' in {}", other, endpoint)),
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "ar".to_string()
}

fn default_provider_name() -> String {
    "custom".to_string()
}

fn default_fallback_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("libretranslate.de", "https://libretranslate.de"),
        ProviderConfig::new("argosopentech", "https://translate.argosopentech.com"),
        ProviderConfig {
            requires_key: true,
            ..ProviderConfig::new("libretranslate.com", "https://libretranslate.com")
        },
    ]
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_jitter_min_ms() -> u64 {
    150
}

fn default_jitter_max_ms() -> u64 {
    600
}

fn default_arabic_threshold() -> f64 {
    DEFAULT_ARABIC_THRESHOLD
}

fn default_pending_marker() -> String {
    DEFAULT_PENDING_MARKER.to_string()
}
