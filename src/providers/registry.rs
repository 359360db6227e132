/*!
 * Provider registry.
 *
 * Maps registry names to provider instances and resolves a method family to
 * a concrete provider through an ordered list of selectors.
 */

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::join_all;
use log::{debug, info, warn};

use crate::app_config::{ProviderKind, TranslationConfig};
use crate::language_utils::Language;

use super::anthropic::Anthropic;
use super::ollama::Ollama;
use super::openai::OpenAI;
use super::regional::RegionalTranslator;
use super::{Method, Provider};

/// One rule in a selection priority list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelector {
    /// First provider of the family flagged as free
    Free,
    /// The provider registered under this name, if it serves the family
    Named(String),
    /// First provider of the family in registration order
    AnyOfMethod,
}

/// Registry of provider instances
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    /// Registration order, used to make selection deterministic
    order: Vec<String>,
    selectors: HashMap<Method, Vec<ProviderSelector>>,
}

impl ProviderRegistry {
    /// Create an empty registry with the default selector lists
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.set_selectors(Method::Regional, vec![ProviderSelector::AnyOfMethod]);
        registry.set_selectors(
            Method::LanguageModel,
            vec![ProviderSelector::Free, ProviderSelector::AnyOfMethod],
        );
        registry
    }

    /// Build a registry from the enabled providers in the config
    pub fn from_config(config: &TranslationConfig) -> Result<Self> {
        let mut registry = Self::new();

        for provider_config in config.enabled_providers() {
            let timeout = Duration::from_secs(provider_config.timeout_secs);
            let provider: Arc<dyn Provider> = match provider_config.provider_type {
                ProviderKind::Regional => Arc::new(RegionalTranslator::from_config(provider_config, timeout)),
                ProviderKind::OpenAI => Arc::new(OpenAI::from_config(provider_config, &config.common, timeout)),
                ProviderKind::Anthropic => Arc::new(Anthropic::from_config(provider_config, &config.common, timeout)),
                ProviderKind::Ollama => Arc::new(Ollama::from_config(provider_config, &config.common, timeout)?),
            };
            registry.register(provider);
        }

        registry.set_selectors(
            Method::LanguageModel,
            vec![
                ProviderSelector::Free,
                ProviderSelector::Named(config.default_llm_provider.clone()),
                ProviderSelector::AnyOfMethod,
            ],
        );

        info!("Registered {} translation provider(s): {}", registry.len(), registry.order.join(", "));
        Ok(registry)
    }

    /// Add a provider; a provider with the same name is replaced
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            warn!("Replacing already registered provider '{}'", name);
        } else {
            self.order.push(name);
        }
    }

    /// Replace the selector priority list for a family
    pub fn set_selectors(&mut self, method: Method, selectors: Vec<ProviderSelector>) {
        self.selectors.insert(method, selectors);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Providers in registration order
    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.order.iter().filter_map(|name| self.providers.get(name))
    }

    fn of_method(&self, method: Method) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers().filter(move |p| p.method() == method)
    }

    /// Whether any provider serves the family
    pub fn has_method(&self, method: Method) -> bool {
        self.of_method(method).next().is_some()
    }

    /// Resolve a family to a provider by walking its selector list
    pub fn select(&self, method: Method) -> Option<Arc<dyn Provider>> {
        let selectors = self.selectors.get(&method)?;
        for selector in selectors {
            let found = match selector {
                ProviderSelector::Free => self.of_method(method).find(|p| p.descriptor().free),
                ProviderSelector::Named(name) => self.providers.get(name).filter(|p| p.method() == method),
                ProviderSelector::AnyOfMethod => self.of_method(method).next(),
            };
            if let Some(provider) = found {
                debug!("Selected provider '{}' for {} via {:?}", provider.name(), method, selector);
                return Some(Arc::clone(provider));
            }
        }
        None
    }

    /// Union of the languages of every registered provider
    pub fn supported_languages(&self) -> Vec<Language> {
        let languages: BTreeSet<Language> = self.providers().flat_map(|p| p.supported_languages()).collect();
        languages.into_iter().collect()
    }

    /// Check credentials of every provider, returning (name, ok) pairs
    pub async fn validate_all(&self) -> Vec<(String, bool)> {
        let checks = self.providers().map(|provider| async move {
            let ok = provider.validate_credentials().await;
            if !ok {
                warn!("Credential check failed for provider '{}'", provider.name());
            }
            (provider.name().to_string(), ok)
        });
        join_all(checks).await
    }
}
