//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::article::Article;
use crate::llm::ProviderInfo;

/// Request to generate an article.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleRequest {
    /// Topic the article is about
    pub topic: String,

    /// Minimum word count hint; the configured default (300) when absent
    #[serde(default)]
    pub min_words: Option<u32>,
}

/// Generated article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub topic: String,
    pub title: String,
    pub content: String,
    pub word_count: usize,
    #[serde(default)]
    pub references: Vec<String>,
}

impl From<Article> for ArticleResponse {
    fn from(article: Article) -> Self {
        Self {
            topic: article.topic,
            title: article.title,
            content: article.content,
            word_count: article.word_count,
            references: article.references,
        }
    }
}

/// Error body: `{"detail": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Registered completion providers.
#[derive(Debug, Clone, Serialize)]
pub struct ProvidersResponse {
    pub default: String,
    pub providers: Vec<ProviderInfo>,
}
