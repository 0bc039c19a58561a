//! Agents module - role-bound actors that turn a prompt into text.
//!
//! An [`Agent`] is immutable after construction: a persona, one completion
//! client resolved through the [`ProviderRegistry`], and an ordered list of
//! shared tools. Running a prompt is handled by the executor loop in
//! `executor.rs`.

mod executor;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use types::{AgentError, AgentId, AgentProfile};

use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::llm::{LlmClient, ProviderRegistry};
use crate::tools::ToolRef;

pub struct Agent {
    id: AgentId,
    profile: AgentProfile,
    allow_delegation: bool,
    llm: Arc<dyn LlmClient>,
    tools: Vec<ToolRef>,
    max_iterations: usize,
}

impl Agent {
    /// Build an agent whose client is resolved from the registry.
    ///
    /// `provider` of `None` selects the configured default. Nothing but the
    /// provider resolution can fail, and no request is sent.
    ///
    /// # Errors
    /// `ConfigError::UnknownProvider` or `ConfigError::MissingCredential`.
    pub fn create(
        profile: AgentProfile,
        tools: Vec<ToolRef>,
        provider: Option<&str>,
        registry: &ProviderRegistry,
        config: &Config,
    ) -> Result<Self, ConfigError> {
        let requested = provider.unwrap_or(&config.provider);
        let llm = registry.resolve(Some(requested), &config.credentials)?;
        tracing::debug!(
            "Created agent '{}' on {} ({} tool(s))",
            profile.role,
            llm.model(),
            tools.len()
        );
        Ok(Self::new(profile, llm, tools, config.max_iterations))
    }

    /// Build an agent around an existing client.
    pub fn new(
        profile: AgentProfile,
        llm: Arc<dyn LlmClient>,
        tools: Vec<ToolRef>,
        max_iterations: usize,
    ) -> Self {
        Self {
            id: AgentId::new(),
            profile,
            allow_delegation: false,
            llm,
            tools,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn role(&self) -> &str {
        &self.profile.role
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Always `false`: agents never hand work to each other.
    pub fn allow_delegation(&self) -> bool {
        self.allow_delegation
    }

    pub fn llm(&self) -> &Arc<dyn LlmClient> {
        &self.llm
    }

    pub fn tools(&self) -> &[ToolRef] {
        &self.tools
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("role", &self.profile.role)
            .field("provider", &self.llm.provider())
            .field("model", &self.llm.model())
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
