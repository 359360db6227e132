use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::app_config::{ProviderConfig, TranslationCommonConfig};
use crate::errors::ProviderError;
use crate::language_utils::Language;

use super::{
    Method, ModelPricing, Provider, ProviderDescriptor, ProviderTranslation, TokenUsage as ProviderTokenUsage,
    TranslateOptions, build_system_prompt, build_user_prompt, clean_completion,
};

/// Anthropic client for interacting with Anthropic API
#[derive(Debug)]
pub struct Anthropic {
    descriptor: ProviderDescriptor,
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// System prompt template
    system_prompt: String,
    /// Default sampling temperature
    temperature: f32,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
pub struct AnthropicRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<AnthropicMessage>,

    /// System prompt to guide the AI
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    max_tokens: u32,
}

/// Anthropic message format
#[derive(Debug, Serialize, Deserialize)]
pub struct AnthropicMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
}

/// Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicResponse {
    /// Message id
    #[serde(default)]
    pub id: Option<String>,
    /// The content of the response
    pub content: Vec<AnthropicContent>,
    /// Token usage information
    pub usage: TokenUsage,
}

/// Individual content block in an Anthropic response
#[derive(Debug, Deserialize)]
pub struct AnthropicContent {
    /// The type of content
    #[serde(rename = "type")]
    pub content_type: String,

    /// The actual text content
    #[serde(default)]
    pub text: String,
}

impl AnthropicRequest {
    /// Create a new Anthropic request
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            temperature: None,
            max_tokens,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(AnthropicMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

impl Anthropic {
    /// Create a new Anthropic client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        let pricing = vec![
            ModelPricing::new("claude-3-haiku-20240307", 0.00025, 0.00125),
            ModelPricing::new("claude-3-5-haiku-20241022", 0.0008, 0.004),
            ModelPricing::new("claude-3-5-sonnet-20241022", 0.003, 0.015),
        ];
        let mut models: Vec<String> = pricing.iter().map(|p| p.model.clone()).collect();
        if !models.contains(&model) {
            models.insert(0, model.clone());
        }

        Self {
            descriptor: ProviderDescriptor {
                name: "anthropic".to_string(),
                method: Method::LanguageModel,
                models,
                default_model: model,
                free: false,
                max_input_chars: None,
                pricing,
            },
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            system_prompt: TranslationCommonConfig::default().system_prompt,
            temperature: TranslationCommonConfig::default().temperature,
        }
    }

    /// Create a client from a provider config entry
    pub fn from_config(config: &ProviderConfig, common: &TranslationCommonConfig, timeout: Duration) -> Self {
        let mut client = Self::new(
            config.api_key.clone(),
            config.effective_endpoint(),
            config.effective_model(),
            timeout,
        );
        client.descriptor.name = config.name.clone();
        client.descriptor.free = config.free;
        client.system_prompt = common.system_prompt.clone();
        client.temperature = common.temperature;
        client
    }

    /// Complete a messages request
    pub async fn complete(&self, request: AnthropicRequest) -> Result<AnthropicResponse, ProviderError> {
        let api_url = if self.endpoint.is_empty() {
            "https://api.anthropic.com/v1/messages".to_string()
        } else {
            format!("{}/v1/messages", self.endpoint.trim_end_matches('/'))
        };

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Anthropic API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response
            .json::<AnthropicResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Anthropic API response: {}", e)))
    }

    /// Extract text from Anthropic response
    pub fn extract_text_from_response(response: &AnthropicResponse) -> String {
        response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[async_trait]
impl Provider for Anthropic {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn translate_text(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        options: &TranslateOptions,
    ) -> Result<ProviderTranslation, ProviderError> {
        let model = options.model.clone().unwrap_or_else(|| self.descriptor.default_model.clone());
        let request = AnthropicRequest::new(&model, 4096)
            .system(build_system_prompt(&self.system_prompt, source_language, target_language))
            .add_message("user", build_user_prompt(text, options.context.as_ref()))
            .temperature(options.temperature.unwrap_or(self.temperature));

        let start = Instant::now();
        let response = self.complete(request).await?;
        let elapsed = start.elapsed();
        debug!("Anthropic response received in {:?}", elapsed);

        let translated_text = clean_completion(&Self::extract_text_from_response(&response));
        if translated_text.is_empty() {
            return Err(ProviderError::ParseError("Anthropic returned no text content".to_string()));
        }

        let mut metadata = HashMap::new();
        metadata.insert("latency_ms".to_string(), elapsed.as_millis().to_string());

        Ok(ProviderTranslation {
            translated_text,
            token_usage: Some(ProviderTokenUsage {
                prompt_tokens: response.usage.input_tokens as u64,
                completion_tokens: response.usage.output_tokens as u64,
            }),
            model_used: model,
            confidence_score: None,
            request_id: response.id,
            metadata,
        })
    }

    fn supported_languages(&self) -> Vec<Language> {
        super::common_llm_languages()
    }

    async fn validate_credentials(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        let request = AnthropicRequest::new(&self.descriptor.default_model, 10).add_message("user", "Hello");
        match self.complete(request).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Anthropic credential check failed: {}", e);
                false
            }
        }
    }
}
