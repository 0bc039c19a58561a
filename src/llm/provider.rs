//! Completion provider registry.
//!
//! Maps a provider identifier to a factory that builds a client bound to the
//! provider's credential and fixed model. Adding a provider means registering
//! a factory.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::{GeminiClient, LlmClient, OpenAiCompatClient};
use crate::config::{credential_env_var, Config, ConfigError, Credentials};

/// Builds a client from `(credential, model)`.
pub type ProviderFactory = Arc<dyn Fn(&str, &str) -> Arc<dyn LlmClient> + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub id: String,
    pub model: String,
    pub credential_env: String,
}

struct ProviderEntry {
    info: ProviderInfo,
    factory: ProviderFactory,
}

pub struct ProviderRegistry {
    providers: HashMap<String, ProviderEntry>,
    default_provider: String,
}

impl ProviderRegistry {
    /// Empty registry whose unnamed resolutions go to `default_provider`.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: normalize(&default_provider.into()),
        }
    }

    /// Registry with the built-in providers (`groq`, `gemini`).
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new(config.provider.clone());
        let timeout = config.request_timeout;
        registry.register("groq", "llama3-70b-8192", groq_factory(timeout));
        registry.register("gemini", "gemini-pro", gemini_factory(timeout));
        registry
    }

    pub fn register(&mut self, id: &str, model: impl Into<String>, factory: ProviderFactory) {
        let id = normalize(id);
        tracing::debug!("Registering completion provider '{}'", id);
        self.providers.insert(
            id.clone(),
            ProviderEntry {
                info: ProviderInfo {
                    credential_env: credential_env_var(&id),
                    id,
                    model: model.into(),
                },
                factory,
            },
        );
    }

    pub fn list(&self) -> Vec<ProviderInfo> {
        let mut list: Vec<_> = self.providers.values().map(|e| e.info.clone()).collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn contains(&self, id: &str) -> bool {
        self.providers.contains_key(&normalize(id))
    }

    pub fn default_id(&self) -> &str {
        &self.default_provider
    }

    /// Resolve a provider identifier to a client.
    ///
    /// `None` (or a blank identifier) selects the registry default. Matching
    /// is case-insensitive. No network traffic happens here.
    ///
    /// # Errors
    /// - `ConfigError::UnknownProvider` naming the identifier as given
    /// - `ConfigError::MissingCredential` when the provider has no secret
    pub fn resolve(
        &self,
        identifier: Option<&str>,
        credentials: &Credentials,
    ) -> Result<Arc<dyn LlmClient>, ConfigError> {
        let requested = identifier
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(&self.default_provider);
        let id = normalize(requested);

        let entry = self
            .providers
            .get(&id)
            .ok_or_else(|| ConfigError::UnknownProvider(requested.to_string()))?;

        let secret = credentials
            .get(&id)
            .ok_or_else(|| ConfigError::MissingCredential {
                provider: id.clone(),
                env_var: entry.info.credential_env.clone(),
            })?;

        tracing::debug!(
            "Resolved provider '{}' to model {}",
            id,
            entry.info.model
        );
        Ok((entry.factory)(secret, &entry.info.model))
    }
}

fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

fn groq_factory(timeout: Duration) -> ProviderFactory {
    Arc::new(move |secret: &str, model: &str| {
        Arc::new(OpenAiCompatClient::groq(secret, model, timeout)) as Arc<dyn LlmClient>
    })
}

fn gemini_factory(timeout: Duration) -> ProviderFactory {
    Arc::new(move |secret: &str, model: &str| {
        Arc::new(GeminiClient::new(secret, model, timeout)) as Arc<dyn LlmClient>
    })
}
