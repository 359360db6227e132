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

/// OpenAI client for the chat completions API (and compatible servers)
#[derive(Debug)]
pub struct OpenAI {
    descriptor: ProviderDescriptor,
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, including the version segment
    endpoint: String,
    /// System prompt template
    system_prompt: String,
    /// Default sampling temperature
    temperature: f32,
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI message format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// A single completion choice
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    #[serde(default)]
    pub id: Option<String>,
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

impl OpenAIRequest {
    /// Create a new OpenAI request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

fn openai_pricing() -> Vec<ModelPricing> {
    vec![
        ModelPricing::new("gpt-4o-mini", 0.00015, 0.0006),
        ModelPricing::new("gpt-4o", 0.0025, 0.01),
        ModelPricing::new("gpt-4-turbo", 0.01, 0.03),
        ModelPricing::new("gpt-3.5-turbo", 0.0005, 0.0015),
    ]
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        let pricing = openai_pricing();
        let mut models: Vec<String> = pricing.iter().map(|p| p.model.clone()).collect();
        if !models.contains(&model) {
            models.insert(0, model.clone());
        }

        Self {
            descriptor: ProviderDescriptor {
                name: "openai".to_string(),
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

    fn api_url(&self, path: &str) -> String {
        let base = if self.endpoint.is_empty() {
            "https://api.openai.com/v1"
        } else {
            self.endpoint.trim_end_matches('/')
        };
        format!("{}/{}", base, path)
    }

    /// Complete a chat request
    pub async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let mut builder = self
            .client
            .post(self.api_url("chat/completions"))
            .header("Content-Type", "application/json");
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
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
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse OpenAI API response: {}", e)))
    }

    /// Extract text from the first completion choice
    pub fn extract_text_from_response(response: &OpenAIResponse) -> Option<String> {
        response.choices.first().map(|choice| choice.message.content.clone())
    }

    /// Maximum completion tokens to request for a model
    fn max_tokens_for_model(model: &str) -> u32 {
        match model {
            "gpt-4o" | "gpt-4o-mini" => 16384,
            "gpt-4-turbo" | "gpt-3.5-turbo" => 4096,
            _ => 2048,
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
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
        let system_prompt = build_system_prompt(&self.system_prompt, source_language, target_language);
        let user_prompt = build_user_prompt(text, options.context.as_ref());

        let request = OpenAIRequest::new(&model)
            .add_message("system", system_prompt)
            .add_message("user", user_prompt)
            .temperature(options.temperature.unwrap_or(self.temperature))
            .max_tokens(Self::max_tokens_for_model(&model));

        let start = Instant::now();
        let response = self.complete(request).await?;
        let elapsed = start.elapsed();
        debug!("OpenAI-compatible response received in {:?}", elapsed);

        let translated_text = Self::extract_text_from_response(&response)
            .map(|t| clean_completion(&t))
            .ok_or_else(|| ProviderError::ParseError("OpenAI-compatible provider returned no choices".to_string()))?;

        let token_usage = response.usage.as_ref().map(|usage| ProviderTokenUsage {
            prompt_tokens: usage.prompt_tokens as u64,
            completion_tokens: usage.completion_tokens as u64,
        });

        let mut metadata = HashMap::new();
        metadata.insert("latency_ms".to_string(), elapsed.as_millis().to_string());

        Ok(ProviderTranslation {
            translated_text,
            token_usage,
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
        let request = OpenAIRequest::new(&self.descriptor.default_model)
            .add_message("user", "Hello")
            .max_tokens(1);
        match self.complete(request).await {
            Ok(_) => true,
            Err(e) => {
                debug!("OpenAI credential check failed: {}", e);
                false
            }
        }
    }
}
