/*!
 * Quality score types.
 *
 * Every value is on a 0-100 scale. The composite accuracy is the
 * unweighted mean of the four sub-scores.
 */

use serde::{Deserialize, Serialize};

use crate::providers::Method;

/// Accuracy below which a result is flagged
pub const LOW_ACCURACY_THRESHOLD: f32 = 70.0;

/// Four heuristic sub-scores
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub fluency: f32,
    pub adequacy: f32,
    pub semantic_similarity: f32,
    pub grammar_score: f32,
}

impl QualityMetrics {
    /// Starting point for a method family
    pub fn base_for(method: Method) -> Self {
        match method {
            Method::Regional => Self {
                fluency: 80.0,
                adequacy: 78.0,
                semantic_similarity: 75.0,
                grammar_score: 80.0,
            },
            Method::LanguageModel => Self {
                fluency: 90.0,
                adequacy: 88.0,
                semantic_similarity: 85.0,
                grammar_score: 88.0,
            },
        }
    }

    /// Clamp every sub-score into [0, 100]
    pub fn clamped(self) -> Self {
        Self {
            fluency: clamp_score(self.fluency),
            adequacy: clamp_score(self.adequacy),
            semantic_similarity: clamp_score(self.semantic_similarity),
            grammar_score: clamp_score(self.grammar_score),
        }
    }

    /// Unweighted mean of the four sub-scores
    pub fn mean(&self) -> f32 {
        (self.fluency + self.adequacy + self.semantic_similarity + self.grammar_score) / 4.0
    }
}

/// Composite score for one translation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub metrics: QualityMetrics,
    pub overall_accuracy: f32,
    pub confidence_score: f32,
}

impl QualityScore {
    /// Derive the composite values from sub-scores
    pub fn from_metrics(metrics: QualityMetrics) -> Self {
        let metrics = metrics.clamped();
        let overall_accuracy = clamp_score(metrics.mean());
        Self {
            metrics,
            overall_accuracy,
            confidence_score: (overall_accuracy + 10.0).min(100.0),
        }
    }

    pub fn is_low_accuracy(&self) -> bool {
        is_low_accuracy(self.overall_accuracy)
    }

    /// Human-readable one-liner
    pub fn summary(&self) -> String {
        format!(
            "accuracy {:.1} (fluency {:.0}, adequacy {:.0}, semantic {:.0}, grammar {:.0})",
            self.overall_accuracy,
            self.metrics.fluency,
            self.metrics.adequacy,
            self.metrics.semantic_similarity,
            self.metrics.grammar_score
        )
    }
}

/// Whether an overall accuracy counts as low
pub fn is_low_accuracy(overall_accuracy: f32) -> bool {
    overall_accuracy < LOW_ACCURACY_THRESHOLD
}

fn clamp_score(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) }
}
