//! Tool system for the agents.
//!
//! Tools perform external lookups and always answer with text. A transport
//! failure never escapes a tool: it is rendered as a `[lookup-failed ...]`
//! tagged string so agents can keep going on degraded input and callers can
//! still detect it.

mod lookup;

pub use lookup::{KnowledgeLookup, LookupOutcome, NO_INFORMATION_FOUND};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{FunctionDefinition, ToolDefinition};

/// Prefix of every degraded tool result.
pub const LOOKUP_FAILED_TAG: &str = "[lookup-failed";

/// Information about a tool for display purposes.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Trait for implementing tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// A description of what this tool does.
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The topic to look up"
                }
            },
            "required": ["query"]
        })
    }

    /// Run the tool. Total: failures are encoded in the returned text.
    async fn invoke(&self, query: &str) -> String;
}

/// Shared, read-only handle to a tool.
pub type ToolRef = Arc<dyn Tool>;

/// True when `output` is a degraded (failed lookup) result.
pub fn is_degraded(output: &str) -> bool {
    output.trim_start().starts_with(LOOKUP_FAILED_TAG)
}

/// Display info for a list of tools, in order.
pub fn list_tools(tools: &[ToolRef]) -> Vec<ToolInfo> {
    tools
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description().to_string(),
        })
        .collect()
}

/// Tool schemas in LLM-compatible format.
pub fn tool_definitions(tools: &[ToolRef]) -> Vec<ToolDefinition> {
    tools
        .iter()
        .map(|t| ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            },
        })
        .collect()
}

/// Find a tool by name.
pub fn find_tool<'a>(tools: &'a [ToolRef], name: &str) -> Option<&'a ToolRef> {
    tools.iter().find(|t| t.name() == name)
}

/// Extract the query from model-supplied call arguments.
///
/// Accepts `{"query": "..."}`, a bare JSON string, or (for models that
/// ignore the schema) the raw argument text.
pub fn query_from_args(arguments: &str) -> String {
    match serde_json::from_str::<Value>(arguments) {
        Ok(Value::Object(map)) => map
            .get("query")
            .or_else(|| map.get("topic"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Ok(Value::String(s)) => s,
        _ => arguments.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes the query"
        }

        async fn invoke(&self, query: &str) -> String {
            query.to_string()
        }
    }

    #[test]
    fn query_from_args_variants() {
        assert_eq!(query_from_args(r#"{"query": "Solar Energy"}"#), "Solar Energy");
        assert_eq!(query_from_args(r#"{"topic": "Wind"}"#), "Wind");
        assert_eq!(query_from_args(r#""Tides""#), "Tides");
        assert_eq!(query_from_args("  plain text "), "plain text");
        assert_eq!(query_from_args(r#"{"other": 1}"#), "");
    }

    #[test]
    fn degraded_detection() {
        assert!(is_degraded("[lookup-failed status=404] not found"));
        assert!(is_degraded("  [lookup-failed transport] timeout"));
        assert!(!is_degraded("Solar energy is radiant light"));
        assert!(!is_degraded(NO_INFORMATION_FOUND));
    }

    #[tokio::test]
    async fn definitions_follow_tool_order() {
        let tools: Vec<ToolRef> = vec![Arc::new(Echo)];
        let defs = tool_definitions(&tools);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].tool_type, "function");
        assert_eq!(defs[0].function.name, "echo");
        assert_eq!(defs[0].function.parameters["required"][0], "query");

        let tool = find_tool(&tools, "echo").unwrap();
        assert_eq!(tool.invoke("hi").await, "hi");
        assert!(find_tool(&tools, "missing").is_none());
        assert_eq!(list_tools(&tools)[0].description, "Echoes the query");
    }
}
