use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::app_config::ProviderConfig;
use crate::errors::ProviderError;
use crate::language_utils::Language;

use super::{Method, ModelPricing, Provider, ProviderDescriptor, ProviderTranslation, TranslateOptions};

/// Hard per-call input cap of the regional API
pub const REGIONAL_MAX_INPUT_CHARS: usize = 2000;

/// Tags accepted by the regional API, with display names
const REGIONAL_LANGUAGES: &[(&str, &str)] = &[
    ("bn-IN", "Bengali"),
    ("en-IN", "English"),
    ("gu-IN", "Gujarati"),
    ("hi-IN", "Hindi"),
    ("kn-IN", "Kannada"),
    ("ml-IN", "Malayalam"),
    ("mr-IN", "Marathi"),
    ("od-IN", "Odia"),
    ("pa-IN", "Punjabi"),
    ("ta-IN", "Tamil"),
    ("te-IN", "Telugu"),
];

/// Client for the structured regional-translation API
#[derive(Debug)]
pub struct RegionalTranslator {
    descriptor: ProviderDescriptor,
    /// HTTP client for API requests
    client: Client,
    /// API key sent as `api-subscription-key`
    api_key: String,
    /// API base URL
    endpoint: String,
}

/// Translate request body
#[derive(Debug, Serialize)]
pub struct RegionalRequest {
    /// Text to translate
    pub input: String,
    /// Source tag or "auto"
    pub source_language_code: String,
    /// Target tag
    pub target_language_code: String,
    /// Register: "formal", "modern-colloquial", "classic-colloquial", "code-mixed"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Speaker gender used for agreement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_gender: Option<String>,
    /// Let the service normalise the input first
    pub enable_preprocessing: bool,
    /// Model identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Translate response body
#[derive(Debug, Deserialize)]
pub struct RegionalResponse {
    /// Service request id
    #[serde(default)]
    pub request_id: Option<String>,
    /// Translation
    pub translated_text: String,
    /// Detected or echoed source language
    #[serde(default)]
    pub source_language_code: Option<String>,
}

impl RegionalRequest {
    /// Create a new request for `text`
    pub fn new(text: impl Into<String>, source_language: Option<&str>, target_language: impl Into<String>) -> Self {
        Self {
            input: text.into(),
            source_language_code: source_language.unwrap_or("auto").to_string(),
            target_language_code: target_language.into(),
            mode: Some("formal".to_string()),
            speaker_gender: None,
            enable_preprocessing: false,
            model: None,
        }
    }

    /// Set the register/tone
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl RegionalTranslator {
    /// Create a new regional client
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let model = model.into();
        Self {
            descriptor: ProviderDescriptor {
                name: "regional".to_string(),
                method: Method::Regional,
                models: vec![model.clone()],
                default_model: model.clone(),
                free: false,
                max_input_chars: Some(REGIONAL_MAX_INPUT_CHARS),
                // Billed per character; expressed per 1K tokens at four characters per token
                pricing: vec![ModelPricing::new(model, 0.08, 0.08)],
            },
            client: Client::builder().timeout(timeout).build().unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a client from a provider config entry
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> Self {
        let mut client = Self::new(
            config.api_key.clone(),
            config.effective_endpoint(),
            config.effective_model(),
            timeout,
        );
        client.descriptor.name = config.name.clone();
        client.descriptor.free = config.free;
        client
    }

    fn api_url(&self) -> String {
        format!("{}/translate", self.endpoint.trim_end_matches('/'))
    }

    /// Send one translate request
    pub async fn complete(&self, request: &RegionalRequest) -> Result<RegionalResponse, ProviderError> {
        let response = self
            .client
            .post(self.api_url())
            .header("Content-Type", "application/json")
            .header("api-subscription-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Regional API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        response
            .json::<RegionalResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse regional API response: {}", e)))
    }
}

#[async_trait]
impl Provider for RegionalTranslator {
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
        let chars = text.chars().count();
        if chars > REGIONAL_MAX_INPUT_CHARS {
            return Err(ProviderError::InvalidRequest(format!(
                "Input of {} characters exceeds the regional limit of {}",
                chars, REGIONAL_MAX_INPUT_CHARS
            )));
        }

        let model = options.model.clone().unwrap_or_else(|| self.descriptor.default_model.clone());
        let mut request = RegionalRequest::new(text, source_language, target_language).model(model.clone());
        if let Some(tone) = &options.tone {
            request = request.mode(tone.clone());
        }

        let start = Instant::now();
        let response = self.complete(&request).await?;
        debug!("Regional response received in {:?}", start.elapsed());

        let mut metadata = HashMap::new();
        if let Some(detected) = response.source_language_code {
            metadata.insert("source_language_code".to_string(), detected);
        }

        Ok(ProviderTranslation {
            translated_text: response.translated_text,
            token_usage: None,
            model_used: model,
            confidence_score: None,
            request_id: response.request_id,
            metadata,
        })
    }

    fn supported_languages(&self) -> Vec<Language> {
        REGIONAL_LANGUAGES
            .iter()
            .map(|(code, name)| Language::new(*code, *name))
            .collect()
    }

    async fn validate_credentials(&self) -> bool {
        if self.api_key.is_empty() {
            return false;
        }
        let request = RegionalRequest::new("Hello", Some("en-IN"), "hi-IN");
        match self.complete(&request).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Regional credential check failed: {}", e);
                false
            }
        }
    }
}
