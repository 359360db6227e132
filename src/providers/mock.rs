/*!
 * Mock provider implementation for testing.
 *
 * This module provides a scripted provider that simulates different behaviors:
 * - `MockBehavior::Working` - Always succeeds with a tagged translation
 * - `MockBehavior::Identity` - Echoes the input (useful for merge checks)
 * - `MockBehavior::Fixed` - Always returns the same text
 * - `MockBehavior::FailTimes` - Fails N times, then succeeds
 * - `MockBehavior::Failing` - Always fails with an HTTP status
 * - `MockBehavior::Slow` - Succeeds after a delay
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils::Language;

use super::{
    ChunkContext, Method, ModelPricing, Provider, ProviderDescriptor, ProviderTranslation, TokenUsage,
    TranslateOptions, estimate_tokens_by_chars,
};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with "[target] text"
    Working,
    /// Returns the input unchanged
    Identity,
    /// Always returns the given text
    Fixed(String),
    /// Fails `times` times with `status_code`, then behaves like `Working`
    FailTimes { times: usize, status_code: u16 },
    /// Always fails with `status_code`
    Failing { status_code: u16 },
    /// Echoes the input after `delay_ms`
    Slow { delay_ms: u64 },
}

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    pub text: String,
    pub target_language: String,
    pub source_language: Option<String>,
    pub context: Option<ChunkContext>,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    descriptor: ProviderDescriptor,
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter
    request_count: Arc<AtomicUsize>,
    /// Recorded calls
    calls: Arc<Mutex<Vec<MockCall>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str) -> String>,
    credentials_valid: bool,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(name: impl Into<String>, method: Method, behavior: MockBehavior) -> Self {
        let name = name.into();
        Self {
            descriptor: ProviderDescriptor {
                name: name.clone(),
                method,
                models: vec!["mock-model".to_string()],
                default_model: "mock-model".to_string(),
                free: false,
                max_input_chars: None,
                pricing: vec![ModelPricing::new("mock-model", 0.001, 0.002)],
            },
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            credentials_valid: true,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working(name: impl Into<String>, method: Method) -> Self {
        Self::new(name, method, MockBehavior::Working)
    }

    /// Create a mock that echoes its input
    pub fn identity(name: impl Into<String>, method: Method) -> Self {
        Self::new(name, method, MockBehavior::Identity)
    }

    /// Create a mock that always returns `text`
    pub fn fixed(name: impl Into<String>, method: Method, text: impl Into<String>) -> Self {
        Self::new(name, method, MockBehavior::Fixed(text.into()))
    }

    /// Create a failing mock provider that always errors
    pub fn failing(name: impl Into<String>, method: Method, status_code: u16) -> Self {
        Self::new(name, method, MockBehavior::Failing { status_code })
    }

    /// Create a mock that fails `times` times before succeeding
    pub fn fail_times(name: impl Into<String>, method: Method, times: usize, status_code: u16) -> Self {
        Self::new(name, method, MockBehavior::FailTimes { times, status_code })
    }

    /// Create a mock that answers after `delay_ms`
    pub fn slow(name: impl Into<String>, method: Method, delay_ms: u64) -> Self {
        Self::new(name, method, MockBehavior::Slow { delay_ms })
    }

    /// Flag the provider as free/default fallback
    pub fn with_free(mut self, free: bool) -> Self {
        self.descriptor.free = free;
        self
    }

    /// Enforce a per-call input cap
    pub fn with_max_input_chars(mut self, max_input_chars: usize) -> Self {
        self.descriptor.max_input_chars = Some(max_input_chars);
        self
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Make `validate_credentials` report failure
    pub fn with_invalid_credentials(mut self) -> Self {
        self.credentials_valid = false;
        self
    }

    /// Number of `translate_text` calls so far (shared with clones)
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Calls observed so far (shared with clones)
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    fn respond(&self, text: &str, target_language: &str) -> String {
        if let Some(generator) = self.custom_response {
            return generator(text);
        }
        match &self.behavior {
            MockBehavior::Identity | MockBehavior::Slow { .. } => text.to_string(),
            MockBehavior::Fixed(fixed) => fixed.clone(),
            _ => format!("[{}] {}", target_language, text),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            behavior: self.behavior.clone(),
            request_count: Arc::clone(&self.request_count),
            calls: Arc::clone(&self.calls),
            custom_response: self.custom_response,
            credentials_valid: self.credentials_valid,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
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
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall {
            text: text.to_string(),
            target_language: target_language.to_string(),
            source_language: source_language.map(str::to_string),
            context: options.context.clone(),
        });

        if let Some(max) = self.descriptor.max_input_chars {
            let chars = text.chars().count();
            if chars > max {
                return Err(ProviderError::InvalidRequest(format!(
                    "Input of {} characters exceeds the {} character limit",
                    chars, max
                )));
            }
        }

        match &self.behavior {
            MockBehavior::Failing { status_code } => {
                return Err(ProviderError::from_status(*status_code, "Simulated provider failure"));
            }
            MockBehavior::FailTimes { times, status_code } if count < *times => {
                return Err(ProviderError::from_status(
                    *status_code,
                    format!("Simulated failure (request #{})", count + 1),
                ));
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }
            _ => {}
        }

        let translated_text = self.respond(text, target_language);
        let usage = TokenUsage {
            prompt_tokens: estimate_tokens_by_chars(text),
            completion_tokens: estimate_tokens_by_chars(&translated_text),
        };

        Ok(ProviderTranslation {
            translated_text,
            token_usage: Some(usage),
            model_used: options.model.clone().unwrap_or_else(|| self.descriptor.default_model.clone()),
            confidence_score: None,
            request_id: Some(format!("{}-{}", self.descriptor.name, count + 1)),
            metadata: Default::default(),
        })
    }

    fn supported_languages(&self) -> Vec<Language> {
        vec![
            Language::new("en", "English"),
            Language::new("fr", "French"),
            Language::new("hi-IN", "Hindi"),
        ]
    }

    async fn validate_credentials(&self) -> bool {
        self.credentials_valid
    }
}
