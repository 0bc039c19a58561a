//! Gemini `generateContent` client.
//!
//! Text only: tool definitions are not forwarded, so agents bound to this
//! client go through the tool-call fallback.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{from_reqwest, LlmError};
use super::{ChatMessage, ChatResponse, LlmClient, Role, TokenUsage, ToolDefinition};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(GEMINI_API_BASE, api_key, model, timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Split chat messages into Gemini's system instruction and turns.
    fn build_request(messages: &[ChatMessage]) -> GenerateRequest {
        let mut system_parts = Vec::new();
        let mut contents: Vec<Content> = Vec::new();

        for message in messages {
            let Some(text) = message.content.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            let role = match message.role {
                Role::System => {
                    system_parts.push(Part {
                        text: Some(text.to_string()),
                    });
                    continue;
                }
                Role::Assistant => "model",
                Role::User | Role::Tool => "user",
            };
            contents.push(Content {
                role: Some(role.to_string()),
                parts: vec![Part {
                    text: Some(text.to_string()),
                }],
            });
        }

        GenerateRequest {
            system_instruction: (!system_parts.is_empty()).then(|| Content {
                role: None,
                parts: system_parts,
            }),
            contents,
        }
    }

    async fn execute_request(&self, request: &GenerateRequest) -> Result<ChatResponse, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await
            .map_err(from_reqwest)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse_error("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        Ok(ChatResponse {
            content: (!text.is_empty()).then_some(text),
            tool_calls: None,
            finish_reason: candidate.finish_reason,
            usage: parsed
                .usage_metadata
                .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count)),
            model: Some(self.model.clone()),
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supports_tools(&self) -> bool {
        false
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChatResponse> {
        if tools.map_or(false, |t| !t.is_empty()) {
            tracing::debug!("Gemini client ignores {} tool definitions", tools.map_or(0, |t| t.len()));
        }
        let request = Self::build_request(messages);
        tracing::debug!("Sending request to gemini: model={}", self.model);

        self.execute_request(&request).await.map_err(|e| {
            e.log("gemini");
            anyhow::anyhow!("{}", e)
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}
