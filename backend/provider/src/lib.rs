//! Chat-completion provider clients.
//!
//! Each upstream API lives behind the `ChatProvider` trait from
//! `parley-core`. The registry maps provider names from the model allow-list
//! to live clients; a `MockProvider` with scripted replies covers tests.

pub mod gemini;
pub mod mock;
pub mod openrouter;

pub use gemini::GeminiProvider;
pub use mock::MockProvider;
pub use openrouter::OpenRouterProvider;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parley_core::ChatProvider;

/// Upper bound on any single upstream request.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport-level failures worth one retry. HTTP status responses are never
/// retried; reaching a status means the request was delivered.
pub(crate) fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Registry of chat providers, looked up by name.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register a provider under its name.
    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ChatProvider>> {
        self.providers.get(name).cloned()
    }

    /// All registered provider names.
    pub fn list(&self) -> Vec<String> {
        self.providers.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lookup_by_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(MockProvider::new("openrouter")));
        assert!(registry.get("openrouter").is_some());
        assert!(registry.get("gemini").is_none());
        assert_eq!(registry.list(), vec!["openrouter".to_string()]);
    }
}
