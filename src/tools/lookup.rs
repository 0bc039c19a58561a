//! Knowledge-summary lookup (Wikipedia REST summary API by default).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{Tool, LOOKUP_FAILED_TAG};

/// Returned when the endpoint answers but has no summary for the topic.
pub const NO_INFORMATION_FOUND: &str = "No information found.";

/// Structured result of one lookup. Rendered to text via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(String),
    NotFound,
    Failed { status: Option<u16>, message: String },
}

impl LookupOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, LookupOutcome::Failed { .. })
    }
}

impl std::fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupOutcome::Found(summary) => write!(f, "{}", summary),
            LookupOutcome::NotFound => write!(f, "{}", NO_INFORMATION_FOUND),
            LookupOutcome::Failed {
                status: Some(code),
                message,
            } => write!(
                f,
                "{} status={}] Error fetching information from the knowledge source. Status code: {}. {}",
                LOOKUP_FAILED_TAG, code, code, message
            ),
            LookupOutcome::Failed {
                status: None,
                message,
            } => write!(
                f,
                "{} transport] Error fetching information from the knowledge source: {}",
                LOOKUP_FAILED_TAG, message
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    extract: Option<String>,
}

/// Looks up a topic summary: `GET {base_url}/{Topic_With_Underscores}`.
pub struct KnowledgeLookup {
    client: Client,
    base_url: String,
}

impl KnowledgeLookup {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(concat!("article_crew/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// URL for a query. Every space becomes `_`, so runs of spaces are kept.
    pub fn url_for(&self, query: &str) -> String {
        let slug = query.replace(' ', "_");
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&slug)
        )
    }

    pub async fn lookup(&self, query: &str) -> LookupOutcome {
        if query.trim().is_empty() {
            return LookupOutcome::NotFound;
        }

        let url = self.url_for(query);
        tracing::debug!("Knowledge lookup: {}", url);

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Knowledge lookup for '{}' failed: {}", query, e);
                return LookupOutcome::Failed {
                    status: None,
                    message: e.to_string(),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Knowledge lookup for '{}' returned status {}",
                query,
                status
            );
            return LookupOutcome::Failed {
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            };
        }

        match response.json::<SummaryResponse>().await {
            Ok(SummaryResponse {
                extract: Some(extract),
            }) if !extract.trim().is_empty() => LookupOutcome::Found(extract),
            Ok(_) => LookupOutcome::NotFound,
            Err(e) => {
                tracing::debug!("Knowledge lookup body for '{}' not usable: {}", query, e);
                LookupOutcome::NotFound
            }
        }
    }
}

#[async_trait]
impl Tool for KnowledgeLookup {
    fn name(&self) -> &str {
        "knowledge_lookup"
    }

    fn description(&self) -> &str {
        "Look up an encyclopedia summary for a topic. Pass the topic name as `query`."
    }

    async fn invoke(&self, query: &str) -> String {
        self.lookup(query).await.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::is_degraded;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool_for(server: &MockServer) -> KnowledgeLookup {
        KnowledgeLookup::new(
            format!("{}/page/summary", server.uri()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn returns_extract_and_translates_spaces() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page/summary/Solar_Energy"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Solar energy",
                "extract": "Solar energy is radiant light and heat from the Sun."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = tool_for(&server);
        let output = tool.invoke("Solar Energy").await;
        assert_eq!(output, "Solar energy is radiant light and heat from the Sun.");
    }

    #[tokio::test]
    async fn missing_extract_returns_sentinel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "title": "Something"
            })))
            .mount(&server)
            .await;

        let tool = tool_for(&server);
        assert_eq!(tool.invoke("Something").await, NO_INFORMATION_FOUND);
    }

    #[tokio::test]
    async fn non_success_status_becomes_tagged_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tool = tool_for(&server);
        let output = tool.invoke("No Such Page").await;
        assert!(is_degraded(&output), "expected tagged failure, got {}", output);
        assert!(output.contains("404"));
        assert_eq!(
            tool.lookup("No Such Page").await,
            LookupOutcome::Failed {
                status: Some(404),
                message: "Not Found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn transport_failure_becomes_tagged_text() {
        // Nothing listens on port 9 of localhost.
        let tool = KnowledgeLookup::new("http://127.0.0.1:9/summary", Duration::from_secs(2));
        let output = tool.invoke("Solar Energy").await;
        assert!(is_degraded(&output));
        assert!(output.contains("transport"));
    }

    #[tokio::test]
    async fn empty_query_never_calls_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let tool = tool_for(&server);
        assert_eq!(tool.invoke("").await, NO_INFORMATION_FOUND);
        assert_eq!(tool.invoke("   ").await, NO_INFORMATION_FOUND);
    }

    #[test]
    fn url_maps_each_space_and_encodes() {
        let tool = KnowledgeLookup::new("https://example.org/summary/", Duration::from_secs(1));
        assert_eq!(
            tool.url_for("Solar  Energy"),
            "https://example.org/summary/Solar__Energy"
        );
        assert_eq!(
            tool.url_for("Solar Energy"),
            "https://example.org/summary/Solar_Energy"
        );
        assert_eq!(
            tool.url_for("Energia Solar/Brasil"),
            "https://example.org/summary/Energia_Solar%2FBrasil"
        );
    }
}
