//! Article generation: the crew assembly for one topic.
//!
//! # Flow
//! 1. Build the shared lookup tool
//! 2. One agent per configured stage (only the researcher gets tools)
//! 3. One task per agent, each depending on the previous one
//! 4. Run the crew and parse the final text into an [`Article`]

mod parse;
mod stage;

pub use parse::word_count;
pub use stage::Stage;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agents::Agent;
use crate::config::{Config, ConfigError};
use crate::crew::{Crew, CrewError};
use crate::llm::ProviderRegistry;
use crate::task::Task;
use crate::tools::{KnowledgeLookup, ToolRef};

/// A generated article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub topic: String,
    pub title: String,
    pub content: String,
    pub word_count: usize,
    #[serde(default)]
    pub references: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ArticleError {
    #[error("Topic must not be empty")]
    EmptyTopic,

    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crew(#[from] CrewError),
}

/// Builds and runs an article crew per request.
pub struct ArticlePipeline {
    config: Config,
    registry: Arc<ProviderRegistry>,
}

impl ArticlePipeline {
    pub fn new(config: Config, registry: Arc<ProviderRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Generate an article about `topic`.
    ///
    /// # Errors
    /// - `ArticleError::EmptyTopic` for a blank topic
    /// - `ArticleError::Config` when the provider cannot be resolved (no task runs)
    /// - `ArticleError::Crew` when a task fails
    pub async fn generate(&self, topic: &str, min_words: u32) -> Result<Article, ArticleError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ArticleError::EmptyTopic);
        }

        let mut crew = self.assemble(topic, min_words)?;
        tracing::info!(
            "Generating article about '{}' with {} stage(s)",
            topic,
            crew.tasks().len()
        );

        let output = crew.execute().await?;
        let article = Article::from_raw(topic, &output.raw);
        tracing::info!(
            "Article '{}' ready: {} words, {} reference(s)",
            article.title,
            article.word_count,
            article.references.len()
        );
        if article.word_count < min_words as usize {
            tracing::warn!(
                "Article about '{}' has {} words, fewer than the requested {}",
                topic,
                article.word_count,
                min_words
            );
        }
        Ok(article)
    }

    /// Build the crew for a topic without running it.
    pub fn assemble(&self, topic: &str, min_words: u32) -> Result<Crew, ArticleError> {
        let stages = &self.config.stages;
        Stage::validate_roster(stages).map_err(|reason| {
            ArticleError::InvalidPipeline(format!(
                "stages [{}]: {}",
                stages
                    .iter()
                    .map(Stage::name)
                    .collect::<Vec<_>>()
                    .join(", "),
                reason
            ))
        })?;

        let lookup: ToolRef = Arc::new(KnowledgeLookup::new(
            self.config.knowledge_base_url.clone(),
            self.config.request_timeout,
        ));

        let mut agents = Vec::with_capacity(stages.len());
        for stage in stages {
            let tools = if stage.uses_tools() {
                vec![Arc::clone(&lookup)]
            } else {
                Vec::new()
            };
            let agent = Agent::create(stage.profile(), tools, None, &self.registry, &self.config)?;
            agents.push(Arc::new(agent));
        }

        let mut tasks: Vec<Task> = Vec::with_capacity(stages.len());
        for (stage, agent) in stages.iter().zip(&agents) {
            let mut task = Task::new(
                stage.task_description(topic, min_words),
                stage.expected_output(topic, min_words),
                agent,
            )
            .map_err(CrewError::from)?
            .with_lookup_query(topic);
            if let Some(previous) = tasks.last() {
                task = task.depends_on(previous);
            }
            tasks.push(task);
        }

        Ok(Crew::new(agents, tasks)?)
    }
}
