/*!
 * Tests for the provider registry and the mock provider
 */

use std::sync::Arc;

use reelingo::app_config::{ProviderKind, TranslationConfig};
use reelingo::providers::mock::MockProvider;
use reelingo::providers::{Provider, ProviderSelector, TranslateOptions};
use reelingo::{Method, ProviderRegistry};

#[test]
fn test_from_config_should_register_enabled_providers_only() {
    let config = TranslationConfig::default();
    let registry = ProviderRegistry::from_config(&config).unwrap();
    let expected = config.available_providers.iter().filter(|p| p.enabled).count();
    assert_eq!(registry.len(), expected);
    assert!(registry.has_method(Method::Regional));
    assert!(registry.get("anthropic").is_none());
}

#[test]
fn test_from_config_should_prefer_free_llm_provider() {
    let mut config = TranslationConfig::default();
    for provider in &mut config.available_providers {
        provider.enabled = matches!(provider.provider_type, ProviderKind::OpenAI | ProviderKind::Ollama);
    }
    let registry = ProviderRegistry::from_config(&config).unwrap();
    let selected = registry.select(Method::LanguageModel).unwrap();
    assert_eq!(selected.name(), "ollama");
}

#[test]
fn test_custom_selectors_should_change_priority() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(MockProvider::working("first", Method::LanguageModel)));
    registry.register(Arc::new(MockProvider::working("second", Method::LanguageModel)));
    assert_eq!(registry.select(Method::LanguageModel).unwrap().name(), "first");

    registry.set_selectors(Method::LanguageModel, vec![ProviderSelector::Named("second".into())]);
    assert_eq!(registry.select(Method::LanguageModel).unwrap().name(), "second");
}

#[test]
fn test_supported_languages_should_be_deduplicated_union() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(MockProvider::working("a", Method::Regional)));
    registry.register(Arc::new(MockProvider::working("b", Method::LanguageModel)));
    let languages = registry.supported_languages();
    assert_eq!(languages.len(), 3);
    assert!(languages.iter().any(|l| l.code == "hi-IN"));
}

#[tokio::test]
async fn test_validate_all_should_report_each_provider() {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(MockProvider::working("good", Method::Regional)));
    registry.register(Arc::new(MockProvider::working("bad", Method::LanguageModel).with_invalid_credentials()));

    let results = registry.validate_all().await;
    assert_eq!(results, vec![("good".to_string(), true), ("bad".to_string(), false)]);
}

#[tokio::test]
async fn test_mock_provider_should_record_calls_across_clones() {
    let provider = MockProvider::fixed("fixed", Method::Regional, "नमस्ते दुनिया");
    let shared = provider.clone();
    let response = provider
        .translate_text("Hello world", "hi-IN", Some("en"), &TranslateOptions::default())
        .await
        .unwrap();

    assert_eq!(response.translated_text, "नमस्ते दुनिया");
    assert_eq!(shared.call_count(), 1);
    assert_eq!(shared.calls()[0].source_language.as_deref(), Some("en"));
}

#[test]
fn test_method_should_parse_llm_alias() {
    assert_eq!("llm".parse::<Method>().unwrap(), Method::LanguageModel);
    assert_eq!(Method::Regional.fallback(), Method::LanguageModel);
    let parsed: Method = serde_json::from_str("\"llm\"").unwrap();
    assert_eq!(parsed, Method::LanguageModel);
}
