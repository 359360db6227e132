/*!
 * Core translation service implementation.
 *
 * `TranslationService` is the strategy router: it resolves a method family
 * to a provider, translates (chunked when the text is long), and on failure
 * makes exactly one attempt with the alternate family. Every provider call
 * runs under the translation retry policy. The successful text is scored
 * with the quality evaluator for the family that produced it.
 */

use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::{ChunkContext, Method, Provider, ProviderRegistry, TranslateOptions};

use super::cache::{CacheKey, TranslationCache};
use super::chunking::TextChunker;
use super::quality::QualityEvaluator;
use super::retry::{RetryPolicy, execute_with_retry};
use super::{ProviderMetadata, TranslationResult};

/// Token usage statistics accumulated over one attempt
#[derive(Debug, Clone, Default)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,
    /// Number of completion tokens
    pub completion_tokens: u64,
    /// Estimated cost in USD
    pub estimated_cost: f64,
    /// Total time spent in provider calls
    pub api_duration: Duration,
}

impl TokenUsageStats {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Output of one provider family attempt
#[derive(Debug)]
struct Attempt {
    translated_text: String,
    provider: String,
    model: String,
    request_id: Option<String>,
    detected_source: Option<String>,
    chunk_count: usize,
    usage: TokenUsageStats,
    duration: Duration,
}

/// Strategy router over the provider registry
#[derive(Debug, Clone)]
pub struct TranslationService {
    registry: Arc<ProviderRegistry>,
    chunker: TextChunker,
    overlap_threshold: f32,
    retry_policy: RetryPolicy<ProviderError>,
    evaluator: QualityEvaluator,
    /// Translation cache for storing and retrieving results
    cache: TranslationCache,
}

impl TranslationService {
    /// Create a service over an existing registry
    pub fn new(registry: Arc<ProviderRegistry>, config: &Config) -> Self {
        Self {
            registry,
            chunker: TextChunker::from_config(&config.chunking),
            overlap_threshold: config.chunking.overlap_threshold,
            retry_policy: RetryPolicy::translation().with_config(&config.translation.common),
            evaluator: QualityEvaluator::new(),
            cache: TranslationCache::new(config.translation.common.enable_cache),
        }
    }

    /// Build the registry from the config and wrap it
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = ProviderRegistry::from_config(&config.translation)?;
        Ok(Self::new(Arc::new(registry), config))
    }

    /// Replace the retry policy used for provider calls
    pub fn with_retry_policy(mut self, policy: RetryPolicy<ProviderError>) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Replace the chunking parameters
    pub fn with_chunker(mut self, chunker: TextChunker, overlap_threshold: f32) -> Self {
        self.chunker = chunker;
        self.overlap_threshold = overlap_threshold;
        self
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &TranslationCache {
        &self.cache
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Translate `text` into `target_language` with the preferred `method`
    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        method: Method,
    ) -> Result<TranslationResult, TranslationError> {
        self.translate_with_cancellation(text, target_language, source_language, method, &CancellationToken::new())
            .await
    }

    /// Same as `translate`, checking `cancel` before every provider call
    pub async fn translate_with_cancellation(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        method: Method,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult, TranslationError> {
        validate_request(text, target_language, source_language)?;
        check_cancelled(cancel)?;

        let cacheable = !self.chunker.needs_split(text);
        let cache_key = CacheKey::new(text, source_language, target_language, method);
        if cacheable {
            if let Some(hit) = self.cache.get(&cache_key) {
                return Ok(hit);
            }
        }

        let preferred = self.registry.select(method).ok_or_else(|| {
            TranslationError::Configuration(format!("No translation provider registered for method '{}'", method))
        })?;

        let (attempt, produced_by, used_fallback) =
            match self.attempt(&preferred, text, target_language, source_language, cancel).await {
                Ok(attempt) => (attempt, method, false),
                Err(preferred_error) if !preferred_error.allows_fallback() => return Err(preferred_error),
                Err(preferred_error) => {
                    let fallback_method = method.fallback();
                    let Some(fallback) = self.registry.select(fallback_method) else {
                        warn!(
                            "Translation with {} failed and no {} provider is registered: {}",
                            method, fallback_method, preferred_error
                        );
                        return Err(TranslationError::FallbackExhausted {
                            preferred_method: method,
                            preferred: Box::new(preferred_error),
                            fallback: None,
                        });
                    };

                    info!(
                        "Translation with '{}' ({}) failed: {}. Falling back to '{}' ({})",
                        preferred.name(),
                        method,
                        preferred_error,
                        fallback.name(),
                        fallback_method
                    );
                    match self.attempt(&fallback, text, target_language, source_language, cancel).await {
                        Ok(attempt) => (attempt, fallback_method, true),
                        Err(TranslationError::Cancelled(reason)) => return Err(TranslationError::Cancelled(reason)),
                        Err(fallback_error) => {
                            return Err(TranslationError::FallbackExhausted {
                                preferred_method: method,
                                preferred: Box::new(preferred_error),
                                fallback: Some(Box::new(fallback_error)),
                            });
                        }
                    }
                }
            };

        let result = self.build_result(text, target_language, source_language, produced_by, used_fallback, attempt);
        if cacheable {
            self.cache.store(cache_key, &result);
        }
        Ok(result)
    }

    /// Chunker honouring the provider's per-call input cap
    fn chunker_for(&self, provider: &Arc<dyn Provider>) -> TextChunker {
        match provider.descriptor().max_input_chars {
            Some(cap) if cap < self.chunker.max_chunk_size() => {
                TextChunker::new(cap, self.chunker.overlap_size().min(cap / 4))
            }
            _ => self.chunker,
        }
    }

    /// Translate with one provider, chunk by chunk
    async fn attempt(
        &self,
        provider: &Arc<dyn Provider>,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Attempt, TranslationError> {
        let started = Instant::now();
        let chunker = self.chunker_for(provider);
        let chunks = chunker.split(text);
        let model = provider.descriptor().default_model.clone();
        debug!(
            "Translating {} characters with '{}' in {} chunk(s)",
            text.chars().count(),
            provider.name(),
            chunks.len()
        );

        let mut translations: Vec<String> = Vec::with_capacity(chunks.len());
        let mut usage = TokenUsageStats::default();
        let mut request_id = None;
        let mut detected_source = None;

        for (i, chunk) in chunks.iter().enumerate() {
            check_cancelled(cancel)?;

            // Chunk i sees the translation of chunk i-1
            let context = (i > 0).then(|| ChunkContext {
                previous_translation: translations.last().cloned(),
                next_source: chunks.get(i + 1).map(|next| next.text.clone()),
            });
            let options = TranslateOptions {
                model: Some(model.clone()),
                context,
                ..TranslateOptions::default()
            };

            let call_started = Instant::now();
            let response = execute_with_retry(&self.retry_policy, || {
                provider.translate_text(&chunk.text, target_language, source_language, &options)
            })
            .await
            .map_err(|e| classify_provider_error(provider.name(), e))?;
            usage.api_duration += call_started.elapsed();

            match response.token_usage {
                Some(reported) => {
                    usage.prompt_tokens += reported.prompt_tokens;
                    usage.completion_tokens += reported.completion_tokens;
                    usage.estimated_cost += provider
                        .descriptor()
                        .pricing_for(&response.model_used)
                        .map(|p| p.exact(reported.prompt_tokens as f64, reported.completion_tokens as f64))
                        .unwrap_or(0.0);
                }
                None => {
                    let prompt = provider.estimate_tokens(&chunk.text, &response.model_used);
                    let completion = provider.estimate_tokens(&response.translated_text, &response.model_used);
                    usage.prompt_tokens += prompt;
                    usage.completion_tokens += completion;
                    usage.estimated_cost += provider.estimate_cost(prompt + completion, &response.model_used);
                }
            }

            if request_id.is_none() {
                request_id = response.request_id.clone();
            }
            if detected_source.is_none() {
                detected_source = response.metadata.get("source_language_code").cloned();
            }
            translations.push(response.translated_text);
        }

        let translated_text = if translations.len() == 1 {
            translations.remove(0)
        } else {
            chunker.merge_chunks(&chunks, &translations, self.overlap_threshold)
        };

        Ok(Attempt {
            translated_text,
            provider: provider.name().to_string(),
            model,
            request_id,
            detected_source,
            chunk_count: chunks.len(),
            usage,
            duration: started.elapsed(),
        })
    }

    fn build_result(
        &self,
        source_text: &str,
        target_language: &str,
        source_language: Option<&str>,
        method: Method,
        used_fallback: bool,
        attempt: Attempt,
    ) -> TranslationResult {
        let score = self.evaluator.score(source_text, &attempt.translated_text, method);
        debug!("Quality for '{}': {}", attempt.provider, score.summary());
        if score.is_low_accuracy() {
            warn!("Low translation accuracy ({:.1}) from '{}'", score.overall_accuracy, attempt.provider);
        }

        let source_language = source_language
            .map(str::to_string)
            .or(attempt.detected_source)
            .unwrap_or_else(|| "auto".to_string());

        TranslationResult {
            translated_text: attempt.translated_text,
            source_language,
            target_language: target_language.to_string(),
            request_id: attempt.request_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            translation_accuracy: score.overall_accuracy,
            confidence_score: score.confidence_score,
            quality_metrics: score.metrics,
            method,
            chunk_count: attempt.chunk_count,
            used_fallback,
            provider_metadata: Some(ProviderMetadata {
                provider: attempt.provider,
                model: attempt.model,
                prompt_tokens: attempt.usage.prompt_tokens,
                completion_tokens: attempt.usage.completion_tokens,
                total_tokens: attempt.usage.total_tokens(),
                duration_ms: attempt.duration.as_millis() as u64,
                estimated_cost: attempt.usage.estimated_cost,
            }),
        }
    }
}

fn validate_request(text: &str, target_language: &str, source_language: Option<&str>) -> Result<(), TranslationError> {
    if text.trim().is_empty() {
        return Err(TranslationError::Validation("Text to translate is empty".to_string()));
    }
    if target_language.trim().is_empty() {
        return Err(TranslationError::Validation("Target language is required".to_string()));
    }
    language_utils::validate_language_tag(target_language)
        .map_err(|e| TranslationError::Validation(e.to_string()))?;
    if let Some(source) = source_language.filter(|s| *s != "auto") {
        language_utils::validate_language_tag(source).map_err(|e| TranslationError::Validation(e.to_string()))?;
    }
    Ok(())
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), TranslationError> {
    if cancel.is_cancelled() {
        Err(TranslationError::Cancelled("translation cancelled".to_string()))
    } else {
        Ok(())
    }
}

/// Credential failures surface as configuration problems
fn classify_provider_error(provider: &str, error: ProviderError) -> TranslationError {
    if error.is_credential_error() {
        TranslationError::Configuration(format!("Provider '{}' rejected its credentials: {}", provider, error))
    } else {
        TranslationError::Provider(error)
    }
}
