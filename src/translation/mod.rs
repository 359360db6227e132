/*!
 * Translation of free text through the registered providers.
 *
 * - `core`: the strategy router (provider selection, chunking, fallback)
 * - `chunking`: splitting long text and merging translated chunks
 * - `retry`: bounded exponential-backoff retry policies
 * - `quality`: heuristic scoring of finished translations
 * - `cache`: in-memory result cache
 */

use serde::{Deserialize, Serialize};

use crate::providers::Method;
use self::quality::{QualityMetrics, is_low_accuracy};

pub use self::chunking::{Chunk, MergeReport, TextChunker};
pub use self::core::TranslationService;
pub use self::quality::{QualityEvaluator, QualityScore};
pub use self::retry::{RetryPolicy, execute_with_retry};

pub mod cache;
pub mod chunking;
pub mod core;
pub mod quality;
pub mod retry;

/// Provider, model and usage behind a result
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    pub provider: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Wall-clock time of the successful attempt
    pub duration_ms: u64,
    /// Estimated cost in USD
    pub estimated_cost: f64,
}

/// A finished translation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationResult {
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub request_id: String,
    pub translation_accuracy: f32,
    pub confidence_score: f32,
    pub quality_metrics: QualityMetrics,
    /// Family that produced the text
    pub method: Method,
    pub chunk_count: usize,
    /// Whether the alternate family produced the text
    pub used_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_metadata: Option<ProviderMetadata>,
}

impl TranslationResult {
    pub fn is_low_accuracy(&self) -> bool {
        is_low_accuracy(self.translation_accuracy)
    }
}
