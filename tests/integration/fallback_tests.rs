/*!
 * Integration tests for provider selection and the single fallback attempt
 */

use reelingo::providers::mock::MockProvider;
use reelingo::{Method, TranslationError};

use crate::common::service_with;

#[tokio::test]
async fn test_regional_failure_should_fall_back_to_llm() {
    let regional = MockProvider::failing("regional", Method::Regional, 500);
    let llm = MockProvider::fixed("llm", Method::LanguageModel, "Bonjour le monde");
    let service = service_with(vec![regional.clone(), llm.clone()]);

    let result = service.translate("Hello world", "fr", Some("en"), Method::Regional).await.unwrap();

    assert_eq!(result.translated_text, "Bonjour le monde");
    assert!(result.used_fallback);
    assert_eq!(result.method, Method::LanguageModel);
    assert_eq!(result.provider_metadata.unwrap().provider, "llm");
    assert_eq!(regional.call_count(), 3);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_llm_failure_should_fall_back_to_regional() {
    let llm = MockProvider::failing("llm", Method::LanguageModel, 429);
    let regional = MockProvider::working("regional", Method::Regional);
    let service = service_with(vec![llm, regional]);

    let result = service.translate("Hello", "hi-IN", None, Method::LanguageModel).await.unwrap();
    assert!(result.used_fallback);
    assert_eq!(result.method, Method::Regional);
}

#[tokio::test]
async fn test_both_families_failing_should_report_both_errors() {
    let service = service_with(vec![
        MockProvider::failing("regional", Method::Regional, 502),
        MockProvider::failing("llm", Method::LanguageModel, 400),
    ]);

    let error = service.translate("Hello", "fr", None, Method::Regional).await.unwrap_err();
    match &error {
        TranslationError::FallbackExhausted {
            preferred_method,
            preferred,
            fallback,
        } => {
            assert_eq!(*preferred_method, Method::Regional);
            assert!(preferred.is_retryable());
            assert!(fallback.as_ref().is_some_and(|f| !f.is_retryable()));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(error.is_retryable());
}

#[tokio::test]
async fn test_validation_error_should_not_trigger_fallback() {
    let regional = MockProvider::working("regional", Method::Regional);
    let llm = MockProvider::working("llm", Method::LanguageModel);
    let service = service_with(vec![regional.clone(), llm.clone()]);

    let error = service.translate("", "fr", None, Method::Regional).await.unwrap_err();
    assert!(matches!(error, TranslationError::Validation(_)));
    assert_eq!(regional.call_count() + llm.call_count(), 0);
}

#[tokio::test]
async fn test_llm_method_should_prefer_free_provider() {
    let paid = MockProvider::working("paid", Method::LanguageModel);
    let free = MockProvider::working("free", Method::LanguageModel).with_free(true);
    let service = service_with(vec![paid.clone(), free.clone()]);

    let result = service.translate("Hello", "fr", None, Method::LanguageModel).await.unwrap();
    assert_eq!(result.provider_metadata.unwrap().provider, "free");
    assert_eq!(paid.call_count(), 0);
}

#[tokio::test]
async fn test_long_text_should_pass_neighbour_context_after_first_chunk() {
    let llm = MockProvider::identity("llm", Method::LanguageModel);
    let service = service_with(vec![llm.clone()]);
    let text = "A calm sentence about the harbour at night. ".repeat(100);

    let result = service.translate(&text, "fr", Some("en"), Method::LanguageModel).await.unwrap();
    let calls = llm.calls();

    assert!(result.chunk_count >= 3);
    assert_eq!(calls.len(), result.chunk_count);
    assert!(calls[0].context.is_none());
    let second = calls[1].context.as_ref().unwrap();
    assert_eq!(second.previous_translation.as_deref(), Some(calls[0].text.as_str()));
    assert_eq!(second.next_source.as_deref(), Some(calls[2].text.as_str()));
    let last = calls.last().unwrap().context.as_ref().unwrap();
    assert!(last.next_source.is_none());
}

#[tokio::test]
async fn test_chunk_failure_should_abort_remaining_chunks() {
    let failing = MockProvider::failing("llm", Method::LanguageModel, 500);
    let service = service_with(vec![failing.clone()]);
    let text = "Words that will be chunked into several parts. ".repeat(80);

    let error = service.translate(&text, "fr", None, Method::LanguageModel).await.unwrap_err();
    assert!(matches!(error, TranslationError::FallbackExhausted { fallback: None, .. }));
    // Only the first chunk was attempted, once per retry
    assert_eq!(failing.call_count(), 3);
    assert!(failing.calls().iter().all(|c| c.context.is_none()));
}
