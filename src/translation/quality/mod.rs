/*!
 * Heuristic quality scoring for translations.
 *
 * Scores are cheap signals, not a linguistic evaluation:
 * - **Fluency**: word length, punctuation density, sentence length
 * - **Adequacy**: translated/source word-count ratio
 * - **Semantic similarity**: shared words; a no-op translation scores 30
 * - **Grammar**: capitalised sentence starts, word repetition
 *
 * Each sub-score starts from a base chosen by the method family that
 * produced the translation.
 */

pub mod metrics;

pub use metrics::{LOW_ACCURACY_THRESHOLD, QualityMetrics, QualityScore, is_low_accuracy};

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use crate::providers::Method;

/// Semantic similarity assigned when the translation equals the source
pub const IDENTICAL_TEXT_SIMILARITY: f32 = 30.0;

/// Sentence boundaries in Latin, Indic and CJK text
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?\u{0964}\u{0965}\u{3002}]+(\s+|$)").unwrap());

/// Scores (source, translation) pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityEvaluator;

impl QualityEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Score `translated` against `source` for a translation made by `method`
    pub fn score(&self, source: &str, translated: &str, method: Method) -> QualityScore {
        // Byte-identical output is an untranslated passthrough
        let identical = source == translated;
        let translated = translated.trim();
        if translated.is_empty() {
            return QualityScore::from_metrics(QualityMetrics::default());
        }

        let source = source.trim();
        let base = QualityMetrics::base_for(method);
        let source_words = words(source);
        let translated_words = words(translated);

        let semantic_similarity = if identical {
            IDENTICAL_TEXT_SIMILARITY
        } else {
            base.semantic_similarity + word_overlap_bonus(&source_words, translated)
        };

        QualityScore::from_metrics(QualityMetrics {
            fluency: base.fluency + fluency_adjustment(translated, &translated_words),
            adequacy: base.adequacy + adequacy_adjustment(source_words.len(), translated_words.len()),
            semantic_similarity,
            grammar_score: base.grammar_score + grammar_adjustment(translated, &translated_words),
        })
    }
}

fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && !is_indic_mark(c)))
        .filter(|w| !w.is_empty())
        .collect()
}

fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn fluency_adjustment(text: &str, words: &[&str]) -> f32 {
    if words.is_empty() {
        return -30.0;
    }
    let mut adjustment = 0.0;

    let average_word_length =
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f32 / words.len() as f32;
    if !(3.0..=12.0).contains(&average_word_length) {
        adjustment -= 10.0;
    }

    let punctuation = text.chars().filter(|c| c.is_ascii_punctuation()).count();
    if punctuation as f32 / words.len() as f32 > 0.3 {
        adjustment -= 10.0;
    }

    let sentence_count = sentences(text).len().max(1);
    let average_sentence_length = words.len() as f32 / sentence_count as f32;
    if (5.0..=20.0).contains(&average_sentence_length) {
        adjustment += 5.0;
    }

    adjustment
}

fn adequacy_adjustment(source_words: usize, translated_words: usize) -> f32 {
    if source_words == 0 {
        return 0.0;
    }
    let ratio = translated_words as f32 / source_words as f32;
    let mut adjustment = 0.0;

    if (0.7..=1.5).contains(&ratio) {
        adjustment += 5.0;
    } else if !(0.5..=2.0).contains(&ratio) {
        adjustment -= 25.0;
    }
    // Likely truncated
    if ratio < 0.3 {
        adjustment -= 20.0;
    }

    adjustment
}

fn word_overlap_bonus(source_words: &[&str], translated: &str) -> f32 {
    let candidates: Vec<String> = source_words
        .iter()
        .filter(|w| w.chars().count() > 2)
        .map(|w| w.to_lowercase())
        .collect();
    if candidates.is_empty() {
        return 0.0;
    }
    let haystack = translated.to_lowercase();
    let shared = candidates.iter().filter(|w| haystack.contains(w.as_str())).count();
    10.0 * shared as f32 / candidates.len() as f32
}

fn grammar_adjustment(text: &str, words: &[&str]) -> f32 {
    let mut adjustment = 0.0;

    let sentences = sentences(text);
    if !sentences.is_empty() {
        let capitalised = sentences
            .iter()
            .filter(|s| s.chars().next().is_some_and(starts_sentence_properly))
            .count();
        if capitalised as f32 / sentences.len() as f32 > 0.7 {
            adjustment += 5.0;
        }
    }

    if !words.is_empty() {
        let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let repetition = 1.0 - unique.len() as f32 / words.len() as f32;
        if repetition > 0.5 {
            adjustment -= 15.0;
        }
    }

    adjustment
}

/// Uppercase Latin, or a letter from a caseless Indic script
fn starts_sentence_properly(c: char) -> bool {
    c.is_uppercase() || ('\u{0900}'..='\u{0DFF}').contains(&c)
}

fn is_indic_mark(c: char) -> bool {
    ('\u{0900}'..='\u{0DFF}').contains(&c)
}
