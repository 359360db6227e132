/*!
 * Tests for the quality evaluator
 */

use reelingo::Method;
use reelingo::translation::quality::{LOW_ACCURACY_THRESHOLD, QualityMetrics};
use reelingo::translation::QualityEvaluator;

#[test]
fn test_empty_translation_should_score_zero() {
    let score = QualityEvaluator::new().score("Hello world", "   ", Method::LanguageModel);
    assert_eq!(score.metrics, QualityMetrics::default());
    assert_eq!(score.overall_accuracy, 0.0);
    assert!(score.is_low_accuracy());
}

#[test]
fn test_overall_accuracy_should_be_mean_of_metrics() {
    let score = QualityEvaluator::new().score(
        "The committee approved the new budget on Monday.",
        "La commission a approuvé le nouveau budget lundi.",
        Method::LanguageModel,
    );
    let mean = (score.metrics.fluency
        + score.metrics.adequacy
        + score.metrics.semantic_similarity
        + score.metrics.grammar_score)
        / 4.0;
    assert!((score.overall_accuracy - mean).abs() < 0.01);
    assert!(score.confidence_score >= score.overall_accuracy);
}

#[test]
fn test_truncated_translation_should_lose_adequacy() {
    let evaluator = QualityEvaluator::new();
    let source = "One two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen.";
    let full = evaluator.score(source, "Un deux trois quatre cinq six sept huit neuf dix onze douze treize quatorze quinze.", Method::Regional);
    let truncated = evaluator.score(source, "Un deux.", Method::Regional);

    assert!(truncated.metrics.adequacy < full.metrics.adequacy);
    assert!(truncated.metrics.adequacy <= QualityMetrics::base_for(Method::Regional).adequacy - 45.0);
}

#[test]
fn test_untranslated_output_should_be_flagged_low() {
    let text = "Hello world, this is a short note.";
    let score = QualityEvaluator::new().score(text, text, Method::Regional);
    assert_eq!(score.metrics.semantic_similarity, 30.0);
    assert!(score.overall_accuracy < 80.0);
}

#[test]
fn test_scores_should_stay_within_bounds() {
    let evaluator = QualityEvaluator::new();
    let cases = [
        ("Hi", "!!!!!!!!!!!!!!!!!!!!"),
        ("Hello world", "नमस्ते दुनिया"),
        ("a", "word word word word word word word word word word word word word"),
    ];
    for (source, translated) in cases {
        for method in [Method::Regional, Method::LanguageModel] {
            let score = evaluator.score(source, translated, method);
            for value in [
                score.metrics.fluency,
                score.metrics.adequacy,
                score.metrics.semantic_similarity,
                score.metrics.grammar_score,
                score.overall_accuracy,
                score.confidence_score,
            ] {
                assert!((0.0..=100.0).contains(&value), "{} out of range for {:?}", value, translated);
            }
        }
    }
}

#[test]
fn test_low_accuracy_threshold_should_be_seventy() {
    assert_eq!(LOW_ACCURACY_THRESHOLD, 70.0);
}
