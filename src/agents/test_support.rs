//! In-process fakes for agent, crew and pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Agent, AgentProfile};
use crate::llm::{ChatMessage, ChatResponse, FunctionCall, LlmClient, ToolCall, ToolDefinition};
use crate::tools::Tool;

/// Replays canned responses and records every request it receives.
pub(crate) struct ScriptedClient {
    replies: Mutex<VecDeque<anyhow::Result<ChatResponse>>>,
    /// Answer used once `replies` runs dry
    repeat: Option<String>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    saw_tools: Mutex<bool>,
    native_tools: bool,
}

impl ScriptedClient {
    pub(crate) fn new(replies: Vec<anyhow::Result<ChatResponse>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            repeat: None,
            requests: Mutex::new(Vec::new()),
            saw_tools: Mutex::new(false),
            native_tools: true,
        }
    }

    pub(crate) fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(ChatResponse::text(*t))).collect())
    }

    /// Answers every request with `text`.
    pub(crate) fn repeating(text: impl Into<String>) -> Self {
        let mut client = Self::new(Vec::new());
        client.repeat = Some(text.into());
        client
    }

    pub(crate) fn without_tools(mut self) -> Self {
        self.native_tools = false;
        self
    }

    pub(crate) fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    /// Last user message of each request.
    pub(crate) fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.last().and_then(|m| m.content.clone()))
            .collect()
    }

    pub(crate) fn saw_tool_schemas(&self) -> bool {
        *self.saw_tools.lock().unwrap()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn supports_tools(&self) -> bool {
        self.native_tools
    }

    async fn chat_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> anyhow::Result<ChatResponse> {
        self.requests.lock().unwrap().push(messages.to_vec());
        if tools.is_some() {
            *self.saw_tools.lock().unwrap() = true;
        }
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }
        match &self.repeat {
            Some(text) => Ok(ChatResponse::text(text.clone())),
            None => Err(anyhow::anyhow!("scripted client has no reply left")),
        }
    }
}

/// Tool that returns a fixed answer and records the queries it saw.
pub(crate) struct RecordingTool {
    answer: String,
    queries: Mutex<Vec<String>>,
}

impl RecordingTool {
    pub(crate) fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for RecordingTool {
    fn name(&self) -> &str {
        "recording_tool"
    }

    fn description(&self) -> &str {
        "Returns a canned answer"
    }

    async fn invoke(&self, query: &str) -> String {
        self.queries.lock().unwrap().push(query.to_string());
        self.answer.clone()
    }
}

pub(crate) fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        call_type: "function".to_string(),
        function: FunctionCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        },
    }
}

pub(crate) fn agent_with(
    role: &str,
    client: Arc<dyn LlmClient>,
    tools: Vec<crate::tools::ToolRef>,
) -> Arc<Agent> {
    Arc::new(Agent::new(
        AgentProfile::new(role, format!("{} goal", role), format!("{} backstory", role)),
        client,
        tools,
        4,
    ))
}

/// Agent answering with `texts` in order.
pub(crate) fn scripted_agent(role: &str, texts: Vec<&str>) -> Arc<Agent> {
    agent_with(role, Arc::new(ScriptedClient::texts(&texts)), Vec::new())
}
