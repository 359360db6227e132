use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::providers::Method;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default source language tag (used when a request does not name one)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Default target language tag
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Chunking config
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Job orchestrator config
    #[serde(default)]
    pub jobs: JobsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    // @provider: Regional translation API (structured, length-capped)
    Regional,
    // @provider: OpenAI or any OpenAI-compatible chat endpoint
    OpenAI,
    // @provider: Anthropic
    Anthropic,
    // @provider: Ollama (local, free)
    Ollama,
}

impl ProviderKind {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Regional => "Regional",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Ollama => "Ollama",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Regional => "regional".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
            Self::Ollama => "ollama".to_string(),
        }
    }

    // @returns: Method family served by this provider
    pub fn method(&self) -> Method {
        match self {
            Self::Regional => Method::Regional,
            Self::OpenAI | Self::Anthropic | Self::Ollama => Method::LanguageModel,
        }
    }

    // @returns: Whether a key is needed to talk to the service
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    // @returns: Environment variable consulted for an empty api_key
    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Self::Regional => Some("REGIONAL_API_KEY"),
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Ollama => None,
        }
    }
}

// Implement Display trait for ProviderKind
impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for ProviderKind
impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "regional" => Ok(Self::Regional),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Provider configuration wrapper
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    // @field: Unique name used by the registry
    pub name: String,

    // @field: Provider type identifier
    #[serde(rename = "type")]
    pub provider_type: ProviderKind,

    // @field: Whether the provider is registered at startup
    #[serde(default = "default_true")]
    pub enabled: bool,

    // @field: Model name
    #[serde(default = "String::new")]
    pub model: String,

    // @field: API key
    #[serde(default = "String::new")]
    pub api_key: String,

    // @field: Service URL
    #[serde(default = "String::new")]
    pub endpoint: String,

    // @field: Timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Free/default fallback capability (preferred by selectors)
    #[serde(default)]
    pub free: bool,
}

impl ProviderConfig {
    // @param provider_type: Provider enum
    // @returns: Provider config with defaults
    pub fn new(provider_type: ProviderKind) -> Self {
        let (model, endpoint, enabled, free) = match provider_type {
            ProviderKind::Regional => (default_regional_model(), default_regional_endpoint(), true, false),
            ProviderKind::OpenAI => (default_openai_model(), default_openai_endpoint(), true, false),
            ProviderKind::Anthropic => (default_anthropic_model(), default_anthropic_endpoint(), false, false),
            ProviderKind::Ollama => (default_ollama_model(), default_ollama_endpoint(), false, true),
        };

        Self {
            name: provider_type.to_lowercase_string(),
            provider_type,
            enabled,
            model,
            api_key: String::new(),
            endpoint,
            timeout_secs: default_timeout_secs(),
            free,
        }
    }

    /// Model to use, falling back to the provider default
    pub fn effective_model(&self) -> String {
        if self.model.is_empty() {
            match self.provider_type {
                ProviderKind::Regional => default_regional_model(),
                ProviderKind::OpenAI => default_openai_model(),
                ProviderKind::Anthropic => default_anthropic_model(),
                ProviderKind::Ollama => default_ollama_model(),
            }
        } else {
            self.model.clone()
        }
    }

    /// Endpoint to use, falling back to the provider default
    pub fn effective_endpoint(&self) -> String {
        if self.endpoint.is_empty() {
            match self.provider_type {
                ProviderKind::Regional => default_regional_endpoint(),
                ProviderKind::OpenAI => default_openai_endpoint(),
                ProviderKind::Anthropic => default_anthropic_endpoint(),
                ProviderKind::Ollama => default_ollama_endpoint(),
            }
        } else {
            self.endpoint.clone()
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Method family used when a request does not name one
    #[serde(default)]
    pub default_method: Method,

    /// Provider picked for the LLM family when no free provider is available
    #[serde(default = "default_llm_provider")]
    pub default_llm_provider: String,

    /// Available translation providers
    #[serde(default)]
    pub available_providers: Vec<ProviderConfig>,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to all providers
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// System prompt template for LLM translation
    /// Placeholders: {source_language}, {target_language}
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Total attempts per provider call (including the first)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff delay in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Backoff multiplier applied per attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    /// Lower values make output more deterministic, higher values more creative
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Whether successful translations are cached in memory
    #[serde(default = "default_true")]
    pub enable_cache: bool,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            backoff_factor: default_backoff_factor(),
            temperature: default_temperature(),
            enable_cache: true,
        }
    }
}

/// Chunking and merging settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Texts longer than this many characters are split
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,

    /// Minimum character-match ratio for an overlap to be removed on merge
    #[serde(default = "default_overlap_threshold")]
    pub overlap_threshold: f32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            overlap_size: default_overlap_size(),
            overlap_threshold: default_overlap_threshold(),
        }
    }
}

/// Job orchestrator settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobsConfig {
    /// Maximum jobs in Processing at once (worker count)
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Maximum queued job ids
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Interval between expiry sweeps
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// How long terminal jobs stay queryable
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            queue_capacity: default_queue_capacity(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            retention_secs: default_retention_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
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
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_target_language() -> String {
    "hi-IN".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_temperature() -> f32 {
    0.3
}

fn default_true() -> bool {
    true
}

fn default_max_chunk_size() -> usize {
    1500
}

fn default_overlap_size() -> usize {
    200
}

fn default_overlap_threshold() -> f32 {
    0.5
}

fn default_max_concurrent_jobs() -> usize {
    5
}

fn default_queue_capacity() -> usize {
    100
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

fn default_retention_secs() -> u64 {
    24 * 3600
}

fn default_llm_provider() -> String {
    "openai".to_string()
}

fn default_regional_endpoint() -> String {
    "https://api.sarvam.ai".to_string()
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_regional_model() -> String {
    "mayura:v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_ollama_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_system_prompt() -> String {
    "You are a professional translator. Translate the following text from {source_language} to {target_language}. \
     Preserve all formatting, line breaks, and special characters. \
     Only respond with the translated text, without any explanations or notes."
        .to_string()
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create config file: {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Fill empty API keys from the environment
    pub fn apply_env_overrides(&mut self) {
        for provider in &mut self.translation.available_providers {
            if !provider.api_key.is_empty() {
                continue;
            }
            if let Some(var) = provider.provider_type.api_key_env_var() {
                if let Ok(value) = std::env::var(var) {
                    provider.api_key = value;
                }
            }
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_tag(&self.source_language)?;
        crate::language_utils::validate_language_tag(&self.target_language)?;

        for provider in self.translation.enabled_providers() {
            if provider.provider_type.requires_api_key() && provider.api_key.is_empty() {
                return Err(anyhow!(
                    "API key is required for {} provider '{}'",
                    provider.provider_type.display_name(),
                    provider.name
                ));
            }
        }

        if self.chunking.max_chunk_size == 0 {
            return Err(anyhow!("chunking.max_chunk_size must be greater than zero"));
        }
        if self.chunking.overlap_size >= self.chunking.max_chunk_size {
            return Err(anyhow!(
                "chunking.overlap_size ({}) must be smaller than max_chunk_size ({})",
                self.chunking.overlap_size,
                self.chunking.max_chunk_size
            ));
        }
        if !(0.0..=1.0).contains(&self.chunking.overlap_threshold) {
            return Err(anyhow!("chunking.overlap_threshold must be between 0 and 1"));
        }
        if self.jobs.max_concurrent_jobs == 0 {
            return Err(anyhow!("jobs.max_concurrent_jobs must be greater than zero"));
        }
        if self.translation.common.retry_count == 0 {
            return Err(anyhow!("translation.common.retry_count must be at least 1"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            translation: TranslationConfig::default(),
            chunking: ChunkingConfig::default(),
            jobs: JobsConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl TranslationConfig {
    /// Providers registered at startup
    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderConfig> {
        self.available_providers.iter().filter(|p| p.enabled)
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            default_method: Method::default(),
            default_llm_provider: default_llm_provider(),
            available_providers: vec![
                ProviderConfig::new(ProviderKind::Regional),
                ProviderConfig::new(ProviderKind::OpenAI),
                ProviderConfig::new(ProviderKind::Anthropic),
                ProviderConfig::new(ProviderKind::Ollama),
            ],
            common: TranslationCommonConfig::default(),
        }
    }
}
