//! Configuration management for the article crew.
//!
//! Configuration can be set via environment variables (a `.env` file is
//! loaded by the binaries before this runs):
//! - `LLM_PROVIDER` - Optional. Completion provider identifier. Defaults to `groq`.
//! - `GROQ_API_KEY` - Credential for the `groq` provider.
//! - `GEMINI_API_KEY` - Credential for the `gemini` provider.
//! - `<ID>_API_KEY` - Credential for any other registered provider `<ID>`.
//! - `KNOWLEDGE_BASE_URL` - Optional. Summary endpoint used by the lookup tool.
//!   Defaults to the English Wikipedia REST summary API.
//! - `PIPELINE_STAGES` - Optional. Comma-separated stages. Defaults to `research,write,edit`.
//! - `MIN_WORDS` - Optional. Default minimum article length. Defaults to `300`.
//! - `MAX_ITERATIONS` - Optional. Tool-call loop bound per task. Defaults to `8`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Outbound HTTP timeout. Defaults to `120`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

use crate::article::Stage;

/// Provider used when `LLM_PROVIDER` is not set.
pub const DEFAULT_PROVIDER: &str = "groq";

/// Summary endpoint used when `KNOWLEDGE_BASE_URL` is not set.
pub const DEFAULT_KNOWLEDGE_BASE_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported LLM provider: {0}")]
    UnknownProvider(String),

    #[error("Missing credential for provider '{provider}' (set {env_var})")]
    MissingCredential { provider: String, env_var: String },

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Secret credentials keyed by lowercase provider identifier.
#[derive(Clone, Default)]
pub struct Credentials {
    secrets: HashMap<String, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests.
    pub fn with(mut self, provider: &str, secret: impl Into<String>) -> Self {
        self.insert(provider, secret);
        self
    }

    pub fn insert(&mut self, provider: &str, secret: impl Into<String>) {
        self.secrets.insert(credential_key(provider), secret.into());
    }

    pub fn get(&self, provider: &str) -> Option<&str> {
        self.secrets
            .get(&credential_key(provider))
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Collect every `<PROVIDER>_API_KEY` variable, so a provider registered
    /// later finds its secret without a code change here.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut credentials = Self::new();
        for (name, secret) in vars {
            if let Some(provider) = name.strip_suffix("_API_KEY").filter(|p| !p.is_empty()) {
                credentials.insert(provider, secret);
            }
        }
        credentials
    }

    fn from_env() -> Self {
        // `vars()` panics on non-UTF-8 entries; skip them instead.
        Self::from_vars(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
        )
    }
}

// `open-router`, `OPEN_ROUTER` and `open_router` name the same provider.
fn credential_key(provider: &str) -> String {
    provider.trim().to_lowercase().replace('-', "_")
}

// Secrets never reach logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.secrets.keys().collect();
        providers.sort();
        f.debug_struct("Credentials")
            .field("providers", &providers)
            .finish()
    }
}

/// Environment variable holding the credential for a provider.
pub fn credential_env_var(provider: &str) -> String {
    format!("{}_API_KEY", provider.trim().to_uppercase().replace('-', "_"))
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Completion provider identifier (free text, matched case-insensitively)
    pub provider: String,

    /// Per-provider secrets
    pub credentials: Credentials,

    /// Base URL of the knowledge-summary endpoint
    pub knowledge_base_url: String,

    /// Linear pipeline roster, first stage first
    pub stages: Vec<Stage>,

    /// Default minimum word count hint for the writing stage
    pub min_words: u32,

    /// Maximum completion rounds per task when the model keeps calling tools
    pub max_iterations: usize,

    /// Timeout applied by outbound HTTP clients
    pub request_timeout: Duration,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` when a numeric variable, the stage
    /// list, or the knowledge base URL cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = std::env::var("LLM_PROVIDER")
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());

        let credentials = Credentials::from_env();

        let knowledge_base_url = std::env::var("KNOWLEDGE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_KNOWLEDGE_BASE_URL.to_string());
        url::Url::parse(&knowledge_base_url).map_err(|e| {
            ConfigError::InvalidValue("KNOWLEDGE_BASE_URL".to_string(), e.to_string())
        })?;

        let stages = match std::env::var("PIPELINE_STAGES") {
            Ok(raw) => Stage::parse_list(&raw)
                .map_err(|e| ConfigError::InvalidValue("PIPELINE_STAGES".to_string(), e))?,
            Err(_) => Stage::default_roster(),
        };

        let min_words = parse_env("MIN_WORDS", 300)?;
        let max_iterations = parse_env("MAX_ITERATIONS", 8)?;
        let request_timeout = Duration::from_secs(parse_env("REQUEST_TIMEOUT_SECS", 120)?);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_env("PORT", 8000)?;

        Ok(Self {
            provider,
            credentials,
            knowledge_base_url,
            stages,
            min_words,
            max_iterations,
            request_timeout,
            host,
            port,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(provider: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            provider: provider.into(),
            credentials,
            knowledge_base_url: DEFAULT_KNOWLEDGE_BASE_URL.to_string(),
            stages: Stage::default_roster(),
            min_words: 300,
            max_iterations: 8,
            request_timeout: Duration::from_secs(120),
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }

    pub fn with_knowledge_base_url(mut self, url: impl Into<String>) -> Self {
        self.knowledge_base_url = url.into();
        self
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
