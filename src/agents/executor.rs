//! Completion loop for an agent.
//!
//! # Algorithm
//! 1. Build system prompt from the persona and available tools
//! 2. Call LLM with the prompt
//! 3. If LLM requests tool calls: execute, feed back results
//! 4. Repeat until LLM produces a final response or max iterations
//!
//! Clients without native tool calls get the tool results up front instead
//! (one lookup per tool, then a single completion).

use crate::llm::{ChatMessage, Role, ToolCall};
use crate::tools::{self, is_degraded};

use super::{Agent, AgentError};

impl Agent {
    /// Run the agent on a prompt. Tools invoked through the fallback path
    /// receive the prompt itself as their query.
    pub async fn perform(&self, prompt: &str) -> Result<String, AgentError> {
        self.perform_with_lookup(prompt, prompt).await
    }

    /// Run the agent on a prompt, using `lookup_query` for tools invoked on
    /// the model's behalf.
    pub async fn perform_with_lookup(
        &self,
        prompt: &str,
        lookup_query: &str,
    ) -> Result<String, AgentError> {
        let system_prompt = self.build_system_prompt();

        if !self.tools.is_empty() && !self.llm.supports_tools() {
            tracing::warn!(
                "Provider '{}' cannot call tools; pre-running {} tool(s) for '{}'",
                self.llm.provider(),
                self.tools.len(),
                self.role()
            );
            let findings = self.prefetch_tool_results(lookup_query).await;
            let messages = vec![
                ChatMessage::new(Role::System, system_prompt),
                ChatMessage::new(Role::User, format!("{}\n\n{}", findings, prompt)),
            ];
            return self.single_completion(&messages).await;
        }

        let messages = vec![
            ChatMessage::new(Role::System, system_prompt),
            ChatMessage::new(Role::User, prompt),
        ];
        self.run_loop(messages).await
    }

    /// Build the system prompt for this agent.
    fn build_system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are {role}.\n\n## Goal\n{goal}\n\n## Background\n{backstory}",
            role = self.profile.role,
            goal = self.profile.goal,
            backstory = self.profile.backstory,
        );

        if !self.tools.is_empty() {
            let tool_descriptions = tools::list_tools(&self.tools)
                .iter()
                .map(|t| format!("- **{}**: {}", t.name, t.description))
                .collect::<Vec<_>>()
                .join("\n");
            prompt.push_str(&format!("\n\n## Available Tools\n{}", tool_descriptions));
        }

        prompt.push_str(
            "\n\n## Rules\n\
             1. Work only on the task you are given; do not delegate it\n\
             2. Base factual claims on the provided material and tool results\n\
             3. Answer with the finished result only, no commentary about the process",
        );
        prompt
    }

    async fn run_loop(&self, mut messages: Vec<ChatMessage>) -> Result<String, AgentError> {
        let definitions = tools::tool_definitions(&self.tools);
        let tool_schemas = (!definitions.is_empty()).then_some(definitions.as_slice());

        for iteration in 0..self.max_iterations {
            tracing::debug!("Agent '{}' iteration {}", self.role(), iteration + 1);

            let response = self
                .llm
                .chat_completion(&messages, tool_schemas)
                .await
                .map_err(|e| AgentError::Llm(format!("{:#}", e)))?;

            let tool_calls = response.requested_tool_calls();
            if !tool_calls.is_empty() {
                let tool_calls = tool_calls.to_vec();
                messages.push(ChatMessage::assistant_tool_calls(
                    response.content.clone(),
                    tool_calls.clone(),
                ));

                for tool_call in &tool_calls {
                    let result = self.execute_tool_call(tool_call).await;
                    messages.push(ChatMessage::tool_result(tool_call.id.clone(), result));
                }
                continue;
            }

            return final_text(response.content);
        }

        Err(AgentError::MaxIterations(self.max_iterations))
    }

    async fn single_completion(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let response = self
            .llm
            .chat_completion(messages, None)
            .await
            .map_err(|e| AgentError::Llm(format!("{:#}", e)))?;
        final_text(response.content)
    }

    /// Execute a single tool call requested by the model.
    async fn execute_tool_call(&self, tool_call: &ToolCall) -> String {
        let name = &tool_call.function.name;
        let Some(tool) = tools::find_tool(&self.tools, name) else {
            tracing::warn!("Agent '{}' requested unknown tool '{}'", self.role(), name);
            return format!("Unknown tool: {}", name);
        };

        let query = tools::query_from_args(&tool_call.function.arguments);
        tracing::debug!("Tool: {} Query: {}", name, query);
        let output = tool.invoke(&query).await;
        if is_degraded(&output) {
            tracing::warn!("Tool '{}' degraded for '{}'", name, query);
        }
        output
    }

    async fn prefetch_tool_results(&self, query: &str) -> String {
        let mut findings = String::from("## Tool results");
        for tool in &self.tools {
            let output = tool.invoke(query).await;
            if is_degraded(&output) {
                tracing::warn!("Tool '{}' degraded for '{}'", tool.name(), query);
            }
            findings.push_str(&format!("\n\n### {} ({})\n{}", tool.name(), query, output));
        }
        findings
    }
}

fn final_text(content: Option<String>) -> Result<String, AgentError> {
    content
        .filter(|c| !c.trim().is_empty())
        .ok_or(AgentError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::agents::test_support::{agent_with, tool_call, RecordingTool, ScriptedClient};
    use crate::llm::ChatResponse;
    use crate::tools::ToolRef;

    #[tokio::test]
    async fn plain_answer_without_tools() {
        let client = Arc::new(ScriptedClient::texts(&["Solar power is growing."]));
        let agent = agent_with("Writer", client.clone(), vec![]);

        let out = agent.perform("Write about solar").await.unwrap();
        assert_eq!(out, "Solar power is growing.");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role, Role::System);
        assert!(requests[0][0].content.as_deref().unwrap().contains("You are Writer"));
        assert_eq!(requests[0][1].content.as_deref(), Some("Write about solar"));
        assert!(!client.saw_tool_schemas());
    }

    #[tokio::test]
    async fn tool_calls_are_executed_and_fed_back() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(ChatResponse {
                tool_calls: Some(vec![tool_call(
                    "call-1",
                    "recording_tool",
                    r#"{"query":"Solar Energy"}"#,
                )]),
                ..ChatResponse::default()
            }),
            Ok(ChatResponse::text("Findings about solar.")),
        ]));
        let tool = Arc::new(RecordingTool::new("Sunlight facts"));
        let agent = agent_with("Researcher", client.clone(), vec![tool.clone() as ToolRef]);

        let out = agent.perform("Research solar").await.unwrap();
        assert_eq!(out, "Findings about solar.");
        assert_eq!(tool.queries(), vec!["Solar Energy".to_string()]);
        assert!(client.saw_tool_schemas());

        let second = &client.requests()[1];
        let tool_msg = second.last().unwrap();
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call-1"));
        assert_eq!(tool_msg.content.as_deref(), Some("Sunlight facts"));
    }

    #[tokio::test]
    async fn unknown_tool_gets_text_result() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(ChatResponse {
                tool_calls: Some(vec![tool_call("c", "nonexistent", "{}")]),
                ..ChatResponse::default()
            }),
            Ok(ChatResponse::text("done")),
        ]));
        let tool = Arc::new(RecordingTool::new("x"));
        let agent = agent_with("Researcher", client.clone(), vec![tool as ToolRef]);

        assert_eq!(agent.perform("go").await.unwrap(), "done");
        let last = client.requests()[1].last().cloned().unwrap();
        assert_eq!(last.content.as_deref(), Some("Unknown tool: nonexistent"));
    }

    #[tokio::test]
    async fn endless_tool_calls_hit_iteration_limit() {
        let looping: Vec<_> = (0..3)
            .map(|i| {
                Ok(ChatResponse {
                    tool_calls: Some(vec![tool_call(
                        &format!("c{}", i),
                        "recording_tool",
                        r#"{"query":"x"}"#,
                    )]),
                    ..ChatResponse::default()
                })
            })
            .collect();
        let client = Arc::new(ScriptedClient::new(looping));
        let tool = Arc::new(RecordingTool::new("x"));
        let agent = Agent::new(
            crate::agents::AgentProfile::new("Researcher", "g", "b"),
            client,
            vec![tool as ToolRef],
            3,
        );

        assert_eq!(
            agent.perform("go").await.unwrap_err(),
            AgentError::MaxIterations(3)
        );
    }

    #[tokio::test]
    async fn fallback_prefetches_with_lookup_query() {
        let client = Arc::new(ScriptedClient::texts(&["Research notes"]).without_tools());
        let tool = Arc::new(RecordingTool::new("Encyclopedia summary"));
        let agent = agent_with("Researcher", client.clone(), vec![tool.clone() as ToolRef]);

        let out = agent
            .perform_with_lookup("Research the topic in depth", "Solar Energy")
            .await
            .unwrap();
        assert_eq!(out, "Research notes");
        assert_eq!(tool.queries(), vec!["Solar Energy".to_string()]);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let user = requests[0][1].content.clone().unwrap();
        assert!(user.contains("Encyclopedia summary"));
        assert!(user.ends_with("Research the topic in depth"));
        assert!(!client.saw_tool_schemas());
    }

    #[tokio::test]
    async fn completion_error_and_empty_reply() {
        let client = Arc::new(ScriptedClient::new(vec![Err(anyhow::anyhow!(
            "rate limited"
        ))]));
        let agent = agent_with("Writer", client, vec![]);
        match agent.perform("x").await {
            Err(AgentError::Llm(msg)) => assert!(msg.contains("rate limited")),
            other => panic!("unexpected: {:?}", other),
        }

        let client = Arc::new(ScriptedClient::texts(&["   "]));
        let agent = agent_with("Writer", client, vec![]);
        assert_eq!(
            agent.perform("x").await.unwrap_err(),
            AgentError::EmptyResponse
        );
    }
}
