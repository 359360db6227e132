use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{ProviderConfig, TranslationCommonConfig};
use crate::errors::ProviderError;
use crate::language_utils::Language;
use crate::translation::{RetryPolicy, execute_with_retry};

use super::{
    Method, Provider, ProviderDescriptor, ProviderTranslation, TokenUsage, TranslateOptions, build_system_prompt,
    build_user_prompt, clean_completion,
};

/// Ollama client for interacting with a local Ollama server
#[derive(Debug)]
pub struct Ollama {
    descriptor: ProviderDescriptor,
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// System prompt template
    system_prompt: String,
    /// Default sampling temperature
    temperature: f32,
}

/// Generation options for the Ollama API
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Temperature for generation (default: 0.8)
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

/// Chat request for the Ollama API
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// Model name to use for generation
    model: String,
    /// Messages of the conversation
    messages: Vec<ChatMessage>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
    /// How long to keep the model loaded in memory
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_alive: Option<String>,
}

/// Chat response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Model name
    #[serde(default)]
    pub model: String,
    /// Response message
    pub message: ChatMessage,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
    /// Number of prompt tokens
    #[serde(default)]
    pub prompt_eval_count: Option<u64>,
    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl ChatRequest {
    /// Create a new chat request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            options: None,
            stream: false,
            keep_alive: None,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role: role.into(),
            content: content.into(),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).temperature = Some(temperature);
        self
    }

    /// Cap the number of generated tokens
    pub fn num_predict(mut self, num_predict: u32) -> Self {
        self.options.get_or_insert_with(GenerationOptions::default).num_predict = Some(num_predict);
        self
    }

    /// Set the keep-alive duration
    pub fn keep_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.keep_alive = Some(keep_alive.into());
        self
    }
}

/// Normalise a configured endpoint into a base URL with scheme and port
fn normalize_base_url(endpoint: &str) -> Result<String> {
    let with_scheme = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    };
    let mut url = Url::parse(&with_scheme).with_context(|| format!("Invalid Ollama endpoint: {}", endpoint))?;
    if url.port().is_none() && url.scheme() == "http" {
        url.set_port(Some(11434))
            .map_err(|_| anyhow::anyhow!("Cannot set port on Ollama endpoint: {}", endpoint))?;
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Join the message pieces of a streamed (JSONL) chat response
fn parse_streamed_chat(body: &str) -> Option<ChatResponse> {
    let mut content = String::new();
    let mut last: Option<serde_json::Value> = None;
    for line in body.lines().filter(|l| !l.trim().is_empty()) {
        let value: serde_json::Value = serde_json::from_str(line).ok()?;
        if let Some(part) = value.get("message").and_then(|m| m.get("content")).and_then(|c| c.as_str()) {
            content.push_str(part);
        }
        last = Some(value);
    }
    let last = last?;
    Some(ChatResponse {
        model: last.get("model").and_then(|v| v.as_str()).unwrap_or("unknown").to_string(),
        message: ChatMessage {
            role: "assistant".to_string(),
            content,
        },
        done: true,
        prompt_eval_count: last.get("prompt_eval_count").and_then(|v| v.as_u64()),
        eval_count: last.get("eval_count").and_then(|v| v.as_u64()),
    })
}

impl Ollama {
    /// Create a new Ollama client from a complete base URL
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        Self {
            descriptor: ProviderDescriptor {
                name: "ollama".to_string(),
                method: Method::LanguageModel,
                models: vec![model.clone()],
                default_model: model,
                free: true,
                max_input_chars: None,
                pricing: Vec::new(),
            },
            base_url: base_url.into(),
            // Ollama speaks HTTP/1.1
            client: Client::builder()
                .timeout(timeout)
                .http1_only()
                .pool_idle_timeout(Duration::from_secs(90))
                .tcp_keepalive(Duration::from_secs(60))
                .build()
                .unwrap_or_default(),
            system_prompt: TranslationCommonConfig::default().system_prompt,
            temperature: TranslationCommonConfig::default().temperature,
        }
    }

    /// Create a client from a provider config entry
    pub fn from_config(config: &ProviderConfig, common: &TranslationCommonConfig, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(&config.effective_endpoint())?;
        let mut client = Self::new(base_url, config.effective_model(), timeout);
        client.descriptor.name = config.name.clone();
        client.descriptor.free = config.free;
        client.system_prompt = common.system_prompt.clone();
        client.temperature = common.temperature;
        Ok(client)
    }

    /// Chat with the Ollama API
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
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
            error!("Ollama API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response.text().await.map_err(ProviderError::from_transport)?;
        match serde_json::from_str::<ChatResponse>(&body) {
            Ok(chat_response) => Ok(chat_response),
            Err(e) => {
                // The server may answer in JSONL even with stream=false
                parse_streamed_chat(&body).ok_or_else(|| {
                    error!(
                        "Failed to parse Ollama chat response: {}. Raw response (first 500 chars): {}",
                        e,
                        body.chars().take(500).collect::<String>()
                    );
                    ProviderError::ParseError(format!("Failed to parse Ollama chat response: {}", e))
                })
            }
        }
    }

    /// Get the Ollama server version
    pub async fn version(&self) -> Result<String, ProviderError> {
        let url = format!("{}/api/version", self.base_url);
        let response: serde_json::Value = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProviderError::from_transport)?
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse Ollama version response: {}", e)))?;

        response["version"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::ParseError("Invalid version format in response".to_string()))
    }
}

#[async_trait]
impl Provider for Ollama {
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
        let request = ChatRequest::new(&model)
            .add_message("system", build_system_prompt(&self.system_prompt, source_language, target_language))
            .add_message("user", build_user_prompt(text, options.context.as_ref()))
            .temperature(options.temperature.unwrap_or(self.temperature))
            .keep_alive("10m");

        let start = Instant::now();
        let response = self.chat(request).await?;
        let elapsed = start.elapsed();
        debug!("Ollama response received in {:?}", elapsed);

        let token_usage = match (response.prompt_eval_count, response.eval_count) {
            (None, None) => None,
            (prompt, completion) => Some(TokenUsage {
                prompt_tokens: prompt.unwrap_or(0),
                completion_tokens: completion.unwrap_or(0),
            }),
        };

        let mut metadata = HashMap::new();
        metadata.insert("latency_ms".to_string(), elapsed.as_millis().to_string());

        Ok(ProviderTranslation {
            translated_text: clean_completion(&response.message.content),
            token_usage,
            model_used: model,
            confidence_score: None,
            request_id: None,
            metadata,
        })
    }

    fn supported_languages(&self) -> Vec<Language> {
        super::common_llm_languages()
    }

    async fn validate_credentials(&self) -> bool {
        let policy = RetryPolicy::network().with_max_attempts(2);
        match execute_with_retry(&policy, || self.version()).await {
            Ok(version) => {
                debug!("Ollama server version {}", version);
                true
            }
            Err(e) => {
                debug!("Ollama server unreachable: {}", e);
                false
            }
        }
    }
}
