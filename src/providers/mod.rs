/*!
 * Provider implementations for different translation services.
 *
 * This module contains the uniform translate-text contract and its
 * implementations:
 * - Regional: structured regional-translation API (length-capped)
 * - OpenAI: OpenAI API and OpenAI-compatible servers
 * - Anthropic: Anthropic API integration
 * - Ollama: Local LLM server
 * - Mock: scripted provider for tests and dry runs
 *
 * Providers are grouped into two method families (`Method`). The
 * `registry` submodule maps names to instances and picks one per family.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;

use crate::errors::ProviderError;
use crate::language_utils::Language;

/// Characters per token assumed when a backend does not report usage
pub const CHARS_PER_TOKEN: usize = 4;

/// Share of tokens attributed to the prompt when the split is unknown
pub const PROMPT_TOKEN_SHARE: f64 = 0.7;

/// Provider family used to produce a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Specialized regional-translation backend
    #[default]
    Regional,
    /// Prompt-based large language model backend
    #[serde(alias = "llm")]
    LanguageModel,
}

impl Method {
    /// The alternate family tried once when this one fails
    pub fn fallback(&self) -> Method {
        match self {
            Method::Regional => Method::LanguageModel,
            Method::LanguageModel => Method::Regional,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Regional => "regional",
            Method::LanguageModel => "language_model",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "regional" => Ok(Method::Regional),
            "llm" | "language_model" | "languagemodel" => Ok(Method::LanguageModel),
            _ => Err(anyhow::anyhow!("Invalid translation method: {}", s)),
        }
    }
}

/// Per-model prices in USD per 1K tokens
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPricing {
    pub model: String,
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl ModelPricing {
    pub fn new(model: impl Into<String>, prompt_per_1k: f64, completion_per_1k: f64) -> Self {
        Self {
            model: model.into(),
            prompt_per_1k,
            completion_per_1k,
        }
    }

    /// Cost of `total_tokens` with the assumed 70/30 prompt/completion split
    pub fn estimate(&self, total_tokens: u64) -> f64 {
        let prompt = total_tokens as f64 * PROMPT_TOKEN_SHARE;
        let completion = total_tokens as f64 - prompt;
        self.exact(prompt, completion)
    }

    /// Cost when the backend reported the split
    pub fn exact(&self, prompt_tokens: f64, completion_tokens: f64) -> f64 {
        (prompt_tokens / 1000.0) * self.prompt_per_1k + (completion_tokens / 1000.0) * self.completion_per_1k
    }
}

/// Static description of a provider instance
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    /// Registry name
    pub name: String,
    /// Family this provider belongs to
    pub method: Method,
    /// Model identifiers the provider accepts
    pub models: Vec<String>,
    /// Model used when a request does not pick one
    pub default_model: String,
    /// Free/default fallback capability
    pub free: bool,
    /// Per-call input cap in characters, if the backend enforces one
    pub max_input_chars: Option<usize>,
    /// Price table; unknown models cost nothing
    pub pricing: Vec<ModelPricing>,
}

impl ProviderDescriptor {
    pub fn pricing_for(&self, model: &str) -> Option<&ModelPricing> {
        self.pricing.iter().find(|p| p.model == model)
    }
}

/// Read-only neighbouring text supplied with a chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkContext {
    /// Already-translated text of the previous chunk
    pub previous_translation: Option<String>,
    /// Untranslated text of the next chunk
    pub next_source: Option<String>,
}

impl ChunkContext {
    pub fn is_empty(&self) -> bool {
        self.previous_translation.is_none() && self.next_source.is_none()
    }
}

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Model override
    pub model: Option<String>,
    /// Register/tone hint ("formal", "modern-colloquial", ...)
    pub tone: Option<String>,
    /// Temperature for LLM backends
    pub temperature: Option<f32>,
    /// Neighbouring chunk context
    pub context: Option<ChunkContext>,
}

/// Token counts reported by a backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Output of a single provider call
#[derive(Debug, Clone, Default)]
pub struct ProviderTranslation {
    pub translated_text: String,
    pub token_usage: Option<TokenUsage>,
    pub model_used: String,
    pub confidence_score: Option<f32>,
    pub request_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

/// Heuristic token count: one token per four characters, rounded up
pub fn estimate_tokens_by_chars(text: &str) -> u64 {
    let chars = text.chars().count();
    chars.div_ceil(CHARS_PER_TOKEN) as u64
}

/// Common trait for all translation providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Static description of this provider
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Translate `text` into `target_language`
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `target_language` - Target language tag
    /// * `source_language` - Source language tag, `None` for auto-detection
    /// * `options` - Model, tone and chunk-context options
    async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        options: &TranslateOptions,
    ) -> Result<ProviderTranslation, ProviderError>;

    /// Languages this provider can produce
    fn supported_languages(&self) -> Vec<Language>;

    /// Check the configured credentials against the service
    async fn validate_credentials(&self) -> bool;

    /// Registry name
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Method family
    fn method(&self) -> Method {
        self.descriptor().method
    }

    /// Models this provider accepts
    fn supported_models(&self) -> Vec<String> {
        self.descriptor().models.clone()
    }

    /// Token estimate for `text` under `model`
    fn estimate_tokens(&self, text: &str, _model: &str) -> u64 {
        estimate_tokens_by_chars(text)
    }

    /// Cost estimate in USD for `token_count` tokens under `model`
    fn estimate_cost(&self, token_count: u64, model: &str) -> f64 {
        self.descriptor()
            .pricing_for(model)
            .map(|p| p.estimate(token_count))
            .unwrap_or(0.0)
    }
}

/// Languages the LLM backends are offered for
pub(crate) fn common_llm_languages() -> Vec<Language> {
    [
        "ar", "bn-IN", "de", "en", "es", "fr", "gu-IN", "hi-IN", "it", "ja", "kn-IN", "ko", "ml-IN", "mr-IN",
        "nl", "pa-IN", "pl", "pt", "ru", "ta-IN", "te-IN", "tr", "uk", "ur", "vi", "zh",
    ]
    .iter()
    .filter_map(|tag| Language::from_tag(tag).ok())
    .collect()
}

/// Build the system prompt shared by the LLM backends
pub(crate) fn build_system_prompt(template: &str, source_language: Option<&str>, target_language: &str) -> String {
    let source_name = source_language
        .map(crate::language_utils::display_name)
        .unwrap_or_else(|| "the detected source language".to_string());
    let target_name = crate::language_utils::display_name(target_language);
    template
        .replace("{source_language}", &source_name)
        .replace("{target_language}", &format!("{} ({})", target_name, target_language))
}

/// Build the user prompt, wrapping neighbouring chunks as read-only context
pub(crate) fn build_user_prompt(text: &str, context: Option<&ChunkContext>) -> String {
    let Some(context) = context.filter(|c| !c.is_empty()) else {
        return text.to_string();
    };

    let mut prompt = String::new();
    prompt.push_str("Translate ONLY the text between <current> tags. The surrounding context is for consistency and must not be translated or repeated.\n\n");
    if let Some(previous) = &context.previous_translation {
        prompt.push_str("<previous_translation>\n");
        prompt.push_str(previous);
        prompt.push_str("\n</previous_translation>\n\n");
    }
    prompt.push_str("<current>\n");
    prompt.push_str(text);
    prompt.push_str("\n</current>\n");
    if let Some(next) = &context.next_source {
        prompt.push_str("\n<next_source>\n");
        prompt.push_str(next);
        prompt.push_str("\n</next_source>\n");
    }
    prompt
}

/// Strip wrapper tags a model sometimes echoes back
pub(crate) fn clean_completion(text: &str) -> String {
    text.trim()
        .trim_start_matches("<current>")
        .trim_end_matches("</current>")
        .trim()
        .to_string()
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod regional;
pub mod registry;

pub use registry::{ProviderRegistry, ProviderSelector};
